//! Facilitator role of the AVM exact scheme.
//!
//! Verification walks the payment group through a fixed gauntlet: scheme and
//! network gates, group shape, decode, group-id cohesion, genesis binding,
//! security screening of every transaction, the payment transaction's asset,
//! recipient, amount, and signature, the self-custody guard, fee-payer
//! validation, and a final sign-and-simulate against the chain. Settlement
//! re-runs verification before anything is signed or sent.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::seq::IndexedRandom;
use serde_json::Value;

use a402::scheme::{BoxFuture, SchemeFacilitator, SchemeId};
use a402_proto::codes::{NETWORK_MISMATCH, UNSUPPORTED_SCHEME};
use a402_proto::{PaymentPayload, PaymentRequirements, SettleResponse, VerifyResponse};

use crate::constants::{
    MAX_GROUP_SIZE, SCHEME_EXACT, TXN_TYPE_ASSET_TRANSFER, errors,
};
use crate::networks;
use crate::signer::FacilitatorAvmSigner;
use crate::signers::DEFAULT_CONFIRMATION_ROUNDS;
use crate::types::{DecodedTransactionInfo, ExactAvmPayload};
use crate::utils::{
    decode_base64_transaction, validate_fee_payer_transaction, validate_no_security_risks,
};

/// Facilitator role of the AVM exact scheme.
pub struct ExactAvmFacilitator {
    signer: Arc<dyn FacilitatorAvmSigner>,
    confirmation_rounds: u64,
}

impl std::fmt::Debug for ExactAvmFacilitator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExactAvmFacilitator")
            .field("addresses", &self.signer.addresses())
            .field("confirmation_rounds", &self.confirmation_rounds)
            .finish_non_exhaustive()
    }
}

/// Everything verification learns that settlement reuses.
struct VerifiedGroup {
    payer: String,
    caip2: &'static str,
    group_bytes: Vec<Vec<u8>>,
    fee_payer: Option<(String, usize)>,
}

/// Verification outcome: either a verified group or a structured refusal.
enum VerifyOutcome {
    Ok(VerifiedGroup),
    Invalid(VerifyResponse),
}

impl ExactAvmFacilitator {
    /// Creates the facilitator role around a signer.
    #[must_use]
    pub fn new(signer: Arc<dyn FacilitatorAvmSigner>) -> Self {
        Self {
            signer,
            confirmation_rounds: DEFAULT_CONFIRMATION_ROUNDS,
        }
    }

    /// Overrides the confirmation wait bound.
    #[must_use]
    pub const fn with_confirmation_rounds(mut self, rounds: u64) -> Self {
        self.confirmation_rounds = rounds;
        self
    }

    async fn do_verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> VerifyOutcome {
        let invalid = |reason: &str| VerifyOutcome::Invalid(VerifyResponse::invalid(reason));

        // Scheme and network gates.
        if payload.accepted.scheme != SCHEME_EXACT || requirements.scheme != SCHEME_EXACT {
            return invalid(UNSUPPORTED_SCHEME);
        }
        if payload.accepted.network != requirements.network {
            return invalid(NETWORK_MISMATCH);
        }
        let caip2 = match networks::normalize_network(&requirements.network) {
            Ok(caip2) => caip2,
            Err(e) => {
                return VerifyOutcome::Invalid(
                    VerifyResponse::invalid(NETWORK_MISMATCH).with_message(e.to_string()),
                );
            }
        };

        let avm_payload: ExactAvmPayload = match serde_json::from_value(payload.payload.clone()) {
            Ok(p) => p,
            Err(e) => {
                return VerifyOutcome::Invalid(
                    VerifyResponse::invalid(errors::INVALID_EXACT_AVM_PAYLOAD)
                        .with_message(e.to_string()),
                );
            }
        };

        // Group shape.
        let payment_group = &avm_payload.payment_group;
        let payment_index = avm_payload.payment_index;

        if payment_group.is_empty() {
            return invalid(errors::EMPTY_GROUP);
        }
        if payment_group.len() > MAX_GROUP_SIZE {
            return invalid(errors::GROUP_TOO_LARGE);
        }
        if payment_index >= payment_group.len() {
            return invalid(errors::INVALID_PAYMENT_INDEX);
        }

        // Decode every entry.
        let mut decoded: Vec<DecodedTransactionInfo> = Vec::with_capacity(payment_group.len());
        for b64_txn in payment_group {
            match decode_base64_transaction(b64_txn) {
                Ok(info) => decoded.push(info),
                Err(e) => {
                    return VerifyOutcome::Invalid(
                        VerifyResponse::invalid(errors::GROUP_DECODE_FAILED)
                            .with_message(e.to_string()),
                    );
                }
            }
        }

        // Group-id cohesion.
        if decoded.len() > 1 {
            let Some(first_group_id) = decoded[0].group.clone() else {
                return invalid(errors::MISSING_GROUP_ID);
            };
            for info in &decoded[1..] {
                if info.group.as_deref() != Some(first_group_id.as_str()) {
                    return invalid(errors::GROUP_ID_MISMATCH);
                }
            }
        }

        // Genesis binding.
        let expected_genesis_hash = match networks::genesis_hash(caip2) {
            Ok(hash) => hash,
            Err(e) => {
                return VerifyOutcome::Invalid(
                    VerifyResponse::invalid(NETWORK_MISMATCH).with_message(e.to_string()),
                );
            }
        };
        for info in &decoded {
            if info.genesis_hash != expected_genesis_hash {
                return invalid(errors::GENESIS_HASH_MISMATCH);
            }
        }

        // Security screening of every transaction.
        for info in &decoded {
            if let Some(code) = validate_no_security_risks(info) {
                return invalid(code);
            }
        }

        // The payment transaction itself.
        let payment = &decoded[payment_index];
        let payer = payment.sender.clone();
        let with_payer = |reason: &str| {
            VerifyOutcome::Invalid(VerifyResponse::invalid(reason).with_payer(payer.clone()))
        };

        if payment.txn_type != TXN_TYPE_ASSET_TRANSFER {
            return with_payer(errors::INVALID_TRANSACTION_TYPE);
        }

        let required_asset = requirements.asset.parse::<u64>().ok();
        if required_asset.is_none() || payment.asset_index != required_asset {
            return with_payer(errors::ASSET_ID_MISMATCH);
        }

        if payment.asset_receiver.as_deref() != Some(requirements.pay_to.as_str()) {
            return with_payer(errors::RECIPIENT_MISMATCH);
        }

        let required_amount = requirements.amount.parse::<u64>().unwrap_or(u64::MAX);
        if payment.asset_amount.unwrap_or(0) < required_amount {
            return with_payer(errors::AMOUNT_INSUFFICIENT);
        }

        if !payment.is_signed {
            return with_payer(errors::MISSING_SIGNATURE);
        }

        // Self-custody guard: a managed account must never be the payer, or
        // verification would let the facilitator spend its own funds.
        let managed = self.signer.addresses();
        if managed.contains(&payment.sender) {
            return with_payer(errors::FEE_PAYER_TRANSFERRING_FUNDS);
        }

        // Fee-payer validation, only when the requirements advertise one.
        let mut fee_payer: Option<(String, usize)> = None;
        if let Some(fee_payer_address) = requirements.extra_str("feePayer") {
            if !managed.iter().any(|a| a == fee_payer_address) {
                return with_payer(errors::FEE_PAYER_NOT_MANAGED);
            }

            let Some(index) = decoded.iter().position(|t| t.sender == fee_payer_address)
            else {
                return with_payer(errors::MISSING_FEE_PAYER);
            };

            if let Some(code) = validate_fee_payer_transaction(&decoded[index], fee_payer_address)
            {
                return with_payer(code);
            }

            fee_payer = Some((fee_payer_address.to_owned(), index));
        }

        // Sign the fee payer (if any) and simulate the whole group.
        let mut group_bytes: Vec<Vec<u8>> = Vec::with_capacity(payment_group.len());
        for b64_txn in payment_group {
            match BASE64.decode(b64_txn) {
                Ok(bytes) => group_bytes.push(bytes),
                Err(e) => {
                    return VerifyOutcome::Invalid(
                        VerifyResponse::invalid(errors::GROUP_DECODE_FAILED)
                            .with_message(e.to_string()),
                    );
                }
            }
        }

        let simulated = if let Some((address, index)) = &fee_payer {
            match self.signer.sign_group(&group_bytes, address, &[*index]) {
                Ok(signed) => signed,
                Err(e) => {
                    return VerifyOutcome::Invalid(
                        VerifyResponse::invalid(errors::SIMULATION_FAILED)
                            .with_message(e.to_string())
                            .with_payer(payer),
                    );
                }
            }
        } else {
            group_bytes.clone()
        };

        if let Err(e) = self.signer.simulate_group(&simulated, caip2).await {
            return VerifyOutcome::Invalid(
                VerifyResponse::invalid(errors::SIMULATION_FAILED)
                    .with_message(e.to_string())
                    .with_payer(payer),
            );
        }

        VerifyOutcome::Ok(VerifiedGroup {
            payer,
            caip2,
            group_bytes,
            fee_payer,
        })
    }

    async fn do_settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> SettleResponse {
        let network = payload.accepted.network.clone();

        // Settlement never trusts a stale verdict: re-verify first.
        let verified = match self.do_verify(payload, requirements).await {
            VerifyOutcome::Ok(verified) => verified,
            VerifyOutcome::Invalid(response) => {
                let mut settle = SettleResponse::error(
                    response
                        .invalid_reason
                        .unwrap_or_else(|| errors::TRANSACTION_FAILED.into()),
                    network,
                );
                if let Some(message) = response.invalid_message {
                    settle = settle.with_message(message);
                }
                if let Some(payer) = response.payer {
                    settle = settle.with_payer(payer);
                }
                return settle;
            }
        };

        let group = if let Some((address, index)) = &verified.fee_payer {
            match self
                .signer
                .sign_group(&verified.group_bytes, address, &[*index])
            {
                Ok(signed) => signed,
                Err(e) => {
                    return SettleResponse::error(errors::TRANSACTION_FAILED, network)
                        .with_message(e.to_string())
                        .with_payer(verified.payer);
                }
            }
        } else {
            verified.group_bytes.clone()
        };

        let txid = match self.signer.send_group(&group, verified.caip2).await {
            Ok(txid) => txid,
            Err(e) => {
                return SettleResponse::error(errors::TRANSACTION_FAILED, network)
                    .with_message(e.to_string())
                    .with_payer(verified.payer);
            }
        };

        if let Err(e) = self
            .signer
            .wait_for_confirmation(&txid, verified.caip2, self.confirmation_rounds)
            .await
        {
            return SettleResponse::error(errors::TRANSACTION_FAILED, network)
                .with_message(e.to_string())
                .with_transaction(txid)
                .with_payer(verified.payer);
        }

        SettleResponse::success(txid, network, verified.payer)
    }
}

impl SchemeId for ExactAvmFacilitator {
    fn scheme(&self) -> &str {
        SCHEME_EXACT
    }

    fn caip_family(&self) -> &str {
        "algorand:*"
    }
}

impl SchemeFacilitator for ExactAvmFacilitator {
    fn get_extra(&self, _network: &str) -> Option<Value> {
        let addresses = self.signer.addresses();
        // Random pick spreads fee load across managed signers.
        let fee_payer = addresses.choose(&mut rand::rng())?;
        Some(serde_json::json!({ "feePayer": fee_payer }))
    }

    fn get_signers(&self, _network: &str) -> Vec<String> {
        self.signer.addresses()
    }

    fn verify<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, VerifyResponse> {
        Box::pin(async move {
            match self.do_verify(payload, requirements).await {
                VerifyOutcome::Ok(verified) => VerifyResponse::valid(verified.payer),
                VerifyOutcome::Invalid(response) => response,
            }
        })
    }

    fn settle<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, SettleResponse> {
        Box::pin(self.do_settle(payload, requirements))
    }
}
