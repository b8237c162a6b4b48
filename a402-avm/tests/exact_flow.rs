//! End-to-end exact-scheme flows: 402 negotiation, payload assembly,
//! verification, and settlement, with a stub signer in place of the chain.

use std::sync::Arc;

use algonaut::core::Address;
use algonaut::transaction::account::Account;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use a402::config::{PayTo, ResourceConfig};
use a402::facilitator::X402Facilitator;
use a402::scheme::{BoxFuture, SchemeError};
use a402::server::{FacilitatorClient, X402ResourceServer};
use a402_avm::exact::register::{register_exact_avm_facilitator, register_exact_avm_server};
use a402_avm::exact::{GroupParams, build_payment_group};
use a402_avm::signer::{ClientAvmSigner, FacilitatorAvmSigner, SignerError};
use a402_avm::signers::AlgorandAccountSigner;
use a402_avm::{ALGORAND_TESTNET_CAIP2, USDC_TESTNET_ASA_ID};
use a402_proto::{
    PaymentPayload, PaymentRequirements, SettleResponse, SupportedResponse, VerifyResponse,
};

/// Facilitator signer with one managed fee-payer account; signs for real,
/// stubs out every chain call.
struct StubChainSigner {
    account: Account,
}

impl StubChainSigner {
    fn new() -> Self {
        Self {
            account: Account::generate(),
        }
    }

    fn fee_payer(&self) -> String {
        self.account.address().to_string()
    }
}

impl FacilitatorAvmSigner for StubChainSigner {
    fn addresses(&self) -> Vec<String> {
        vec![self.fee_payer()]
    }

    fn sign_group(
        &self,
        group: &[Vec<u8>],
        fee_payer: &str,
        indexes_to_sign: &[usize],
    ) -> Result<Vec<Vec<u8>>, SignerError> {
        if fee_payer != self.fee_payer() {
            return Err(SignerError::UnmanagedFeePayer(fee_payer.to_owned()));
        }
        let mut results = group.to_vec();
        for &idx in indexes_to_sign {
            let txn: algonaut::transaction::Transaction = rmp_serde::from_slice(&group[idx])
                .map_err(|e| SignerError::Decode(e.to_string()))?;
            let signed = self
                .account
                .sign_transaction(txn)
                .map_err(|e| SignerError::Signing(e.to_string()))?;
            results[idx] =
                rmp_serde::to_vec_named(&signed).map_err(|e| SignerError::Signing(e.to_string()))?;
        }
        Ok(results)
    }

    fn simulate_group<'a>(
        &'a self,
        _group: &'a [Vec<u8>],
        _network: &'a str,
    ) -> BoxFuture<'a, Result<(), SignerError>> {
        Box::pin(async { Ok(()) })
    }

    fn send_group<'a>(
        &'a self,
        _group: &'a [Vec<u8>],
        _network: &'a str,
    ) -> BoxFuture<'a, Result<String, SignerError>> {
        Box::pin(async { Ok("SETTLEDTX".to_owned()) })
    }

    fn wait_for_confirmation<'a>(
        &'a self,
        _txid: &'a str,
        _network: &'a str,
        _rounds: u64,
    ) -> BoxFuture<'a, Result<(), SignerError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Bridges the resource server to an in-process facilitator engine.
struct LocalFacilitatorClient {
    engine: Arc<X402Facilitator>,
}

impl FacilitatorClient for LocalFacilitatorClient {
    fn verify<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<VerifyResponse, SchemeError>> {
        Box::pin(self.engine.verify(payload, requirements))
    }

    fn settle<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SettleResponse, SchemeError>> {
        Box::pin(self.engine.settle(payload, requirements))
    }

    fn get_supported(&self) -> BoxFuture<'_, Result<SupportedResponse, SchemeError>> {
        Box::pin(async { Ok(self.engine.get_supported()) })
    }
}

fn group_params() -> GroupParams {
    let hash: [u8; 32] = BASE64
        .decode("SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=")
        .unwrap()
        .try_into()
        .unwrap();
    GroupParams {
        first_valid: 1000,
        last_valid: 2000,
        genesis_hash: hash,
        genesis_id: "testnet-v1.0".into(),
        min_fee: 1000,
    }
}

/// Builds and signs the client side of a payment against the given offer.
fn build_client_payload(
    client_account: Account,
    requirements: &PaymentRequirements,
    resource: Option<String>,
) -> PaymentPayload {
    let signer = AlgorandAccountSigner::new(client_account);
    let sender = signer.address();

    let (transactions, payment_index) =
        build_payment_group(&group_params(), requirements, &sender).unwrap();

    let unsigned: Vec<Vec<u8>> = transactions
        .iter()
        .map(|t| rmp_serde::to_vec_named(t).unwrap())
        .collect();

    // Sign only the transaction the client actually sends.
    let signed = signer.sign_transactions(&unsigned, &[payment_index]).unwrap();

    let payment_group: Vec<String> = unsigned
        .iter()
        .zip(&signed)
        .map(|(u, s)| BASE64.encode(s.as_deref().unwrap_or(u)))
        .collect();

    PaymentPayload {
        x402_version: 2,
        accepted: requirements.clone(),
        payload: serde_json::json!({
            "paymentGroup": payment_group,
            "paymentIndex": payment_index,
        }),
        resource,
        extensions: None,
    }
}

fn pay_to_address() -> String {
    Address([2u8; 32]).to_string()
}

async fn build_stack() -> (X402ResourceServer, Arc<X402Facilitator>, String) {
    let chain_signer = StubChainSigner::new();
    let fee_payer = chain_signer.fee_payer();

    let mut engine = X402Facilitator::new();
    register_exact_avm_facilitator(
        &mut engine,
        Arc::new(chain_signer),
        vec![ALGORAND_TESTNET_CAIP2.to_owned()],
    );
    let engine = Arc::new(engine);

    let mut server = X402ResourceServer::with_facilitator(Box::new(LocalFacilitatorClient {
        engine: Arc::clone(&engine),
    }));
    register_exact_avm_server(&mut server, None);
    server.initialize().await.unwrap();

    (server, engine, fee_payer)
}

#[tokio::test]
async fn fee_abstracted_payment_flows_from_402_to_settlement() {
    let (server, _engine, fee_payer) = build_stack().await;

    // Server side: 402 envelope for a protected route.
    let config = ResourceConfig {
        scheme: "exact".into(),
        pay_to: PayTo::Static(pay_to_address()),
        price: serde_json::json!("0.001"),
        network: ALGORAND_TESTNET_CAIP2.into(),
        max_timeout_seconds: None,
    };
    let accepts = server
        .build_payment_requirements(&config, &serde_json::json!({}))
        .unwrap();
    let envelope = server.create_payment_required(
        accepts.clone(),
        Some("https://api.example.com/report".into()),
        None,
        None,
    );
    assert_eq!(envelope.error.as_deref(), Some("payment_required"));

    let offer = &accepts[0];
    assert_eq!(offer.amount, "1000");
    assert_eq!(offer.asset, USDC_TESTNET_ASA_ID.to_string());
    // Enrichment propagated the engine's advertised fee payer.
    assert_eq!(offer.extra_str("feePayer"), Some(fee_payer.as_str()));

    // Client side: group of [unsigned fee txn, signed transfer].
    let payload = build_client_payload(
        Account::generate(),
        offer,
        envelope.resource.clone(),
    );
    let group = payload.payload["paymentGroup"].as_array().unwrap();
    assert_eq!(group.len(), 2);
    assert_eq!(payload.payload["paymentIndex"], 1);

    // Server matches the retried payload to its offer, verifies, settles.
    let matched = server.find_matching_requirements(&accepts, &payload).unwrap();
    let verdict = server.verify_payment(&payload, matched).await.unwrap();
    assert!(verdict.is_valid, "{verdict:?}");

    let receipt = server.settle_payment(&payload, matched).await.unwrap();
    assert!(receipt.success, "{receipt:?}");
    assert_eq!(receipt.transaction, "SETTLEDTX");
    assert_eq!(receipt.payer, verdict.payer);

    // Receipt survives the response header round-trip.
    let header = a402::headers::encode_settle_header(&receipt).unwrap();
    let decoded = a402::headers::decode_settle_header(&header).unwrap();
    assert_eq!(decoded, receipt);
}

#[tokio::test]
async fn tampered_amount_is_rejected_end_to_end() {
    let (server, _engine, _fee_payer) = build_stack().await;

    let config = ResourceConfig {
        scheme: "exact".into(),
        pay_to: PayTo::Static(pay_to_address()),
        price: serde_json::json!("0.001"),
        network: ALGORAND_TESTNET_CAIP2.into(),
        max_timeout_seconds: None,
    };
    let accepts = server
        .build_payment_requirements(&config, &serde_json::json!({}))
        .unwrap();

    // Client builds against a cheaper, self-invented offer.
    let mut cheaper = accepts[0].clone();
    cheaper.amount = "1".into();
    let payload = build_client_payload(Account::generate(), &cheaper, None);

    // The five-field match refuses to pair it with the real offer.
    assert!(server.find_matching_requirements(&accepts, &payload).is_none());

    // And even verified directly against the real offer, the amount check
    // rejects it.
    let mut forged = payload.clone();
    forged.accepted.amount = accepts[0].amount.clone();
    let verdict = server.verify_payment(&forged, &accepts[0]).await.unwrap();
    assert!(!verdict.is_valid);
    assert_eq!(verdict.invalid_reason.as_deref(), Some("amount_insufficient"));
}

#[tokio::test]
async fn direct_payment_without_fee_abstraction_verifies() {
    let chain_signer = StubChainSigner::new();
    let mut engine = X402Facilitator::new();
    register_exact_avm_facilitator(
        &mut engine,
        Arc::new(chain_signer),
        vec![ALGORAND_TESTNET_CAIP2.to_owned()],
    );

    // Requirements with no feePayer: the client pays its own fee.
    let requirements = PaymentRequirements {
        scheme: "exact".into(),
        network: ALGORAND_TESTNET_CAIP2.into(),
        amount: "1000".into(),
        pay_to: pay_to_address(),
        max_timeout_seconds: 300,
        asset: USDC_TESTNET_ASA_ID.to_string(),
        extra: None,
    };
    let payload = build_client_payload(Account::generate(), &requirements, None);
    assert_eq!(
        payload.payload["paymentGroup"].as_array().unwrap().len(),
        1
    );
    assert_eq!(payload.payload["paymentIndex"], 0);

    let verdict = engine.verify(&payload, &requirements).await.unwrap();
    assert!(verdict.is_valid, "{verdict:?}");

    let receipt = engine.settle(&payload, &requirements).await.unwrap();
    assert!(receipt.success);
}
