//! Client role of the AVM exact scheme.
//!
//! Builds the atomic transaction group a payment payload carries. With fee
//! abstraction (the requirements name a `feePayer`), the group is
//! `[self-pay fee txn (unsigned), asset transfer (signed)]` and the fee txn's
//! pooled flat fee covers both slots; without it, the group is a single
//! asset transfer paying its own fee. Flat fees are set on every constructed
//! transaction so the chain library cannot recompute them after signing.

use std::str::FromStr;
use std::sync::Arc;

use algonaut::algod::v2::Algod;
use algonaut::core::{Address, MicroAlgos, Round};
use algonaut::crypto::HashDigest;
use algonaut::transaction::Transaction;
use algonaut::transaction::transaction::{AssetTransferTransaction, Payment, TransactionType};
use algonaut::transaction::tx_group::TxGroup;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use dashmap::DashMap;

use a402::scheme::{BoxFuture, InnerPayload, SchemeClient, SchemeError, SchemeId};
use a402_proto::PaymentRequirements;

use crate::constants::{FEE_PAYER_NOTE, MIN_TXN_FEE, PAYMENT_NOTE, SCHEME_EXACT};
use crate::networks;
use crate::signer::ClientAvmSigner;
use crate::types::ExactAvmPayload;

/// Placeholder API token for public endpoints (no auth, fixed length).
const ALGOD_TOKEN: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

/// Chain parameters a payment group is built against.
///
/// A trimmed view of the node's suggested parameters; tests construct it
/// directly instead of calling a node.
#[derive(Debug, Clone)]
pub struct GroupParams {
    /// First round the group is valid in.
    pub first_valid: u64,
    /// Last round the group is valid in.
    pub last_valid: u64,
    /// Genesis hash of the bound network.
    pub genesis_hash: [u8; 32],
    /// Genesis id of the bound network.
    pub genesis_id: String,
    /// Minimum transaction fee in microalgos.
    pub min_fee: u64,
}

/// Errors raised while building a payment group.
#[derive(Debug, thiserror::Error)]
pub enum BuildGroupError {
    /// An address in the requirements did not parse.
    #[error("invalid address {field}: {message}")]
    InvalidAddress {
        /// Which requirements field carried the address.
        field: &'static str,
        /// Parser message.
        message: String,
    },

    /// The asset id is not a number.
    #[error("invalid asset id: {0}")]
    InvalidAsset(String),

    /// The amount is not a non-negative integer.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Group id assignment failed.
    #[error("cannot assign group id: {0}")]
    Group(String),
}

/// Builds the unsigned transaction group for a payment.
///
/// Returns the transactions in group order and the payment index.
///
/// # Errors
///
/// Returns [`BuildGroupError`] if the requirements carry malformed
/// addresses or numbers.
pub fn build_payment_group(
    params: &GroupParams,
    requirements: &PaymentRequirements,
    sender: &str,
) -> Result<(Vec<Transaction>, usize), BuildGroupError> {
    let sender = Address::from_str(sender).map_err(|e| BuildGroupError::InvalidAddress {
        field: "sender",
        message: e.to_string(),
    })?;
    let pay_to =
        Address::from_str(&requirements.pay_to).map_err(|e| BuildGroupError::InvalidAddress {
            field: "payTo",
            message: e.to_string(),
        })?;
    let asset_id = requirements
        .asset
        .parse::<u64>()
        .map_err(|e| BuildGroupError::InvalidAsset(e.to_string()))?;
    let amount = requirements
        .amount
        .parse::<u64>()
        .map_err(|e| BuildGroupError::InvalidAmount(e.to_string()))?;

    let fee_payer = requirements
        .extra_str("feePayer")
        .map(|address| {
            Address::from_str(address).map_err(|e| BuildGroupError::InvalidAddress {
                field: "feePayer",
                message: e.to_string(),
            })
        })
        .transpose()?;

    let base = |fee: u64, txn_type: TransactionType, note: &[u8]| Transaction {
        fee: MicroAlgos(fee),
        first_valid: Round(params.first_valid),
        last_valid: Round(params.last_valid),
        genesis_hash: HashDigest(params.genesis_hash),
        txn_type,
        genesis_id: Some(params.genesis_id.clone()),
        group: None,
        lease: None,
        note: Some(note.to_vec()),
        rekey_to: None,
    };

    let min_fee = params.min_fee.max(MIN_TXN_FEE);

    if let Some(fee_payer) = fee_payer {
        // Pooled flat fee on the self-pay covers the whole group.
        let pooled_fee = min_fee * 2;
        let mut fee_txn = base(
            pooled_fee,
            TransactionType::Payment(Payment {
                sender: fee_payer,
                receiver: fee_payer,
                amount: MicroAlgos(0),
                close_remainder_to: None,
            }),
            FEE_PAYER_NOTE,
        );
        let mut payment_txn = base(
            0,
            TransactionType::AssetTransferTransaction(AssetTransferTransaction {
                sender,
                xfer: asset_id,
                amount,
                receiver: pay_to,
                close_to: None,
            }),
            PAYMENT_NOTE,
        );

        TxGroup::assign_group_id(vec![&mut fee_txn, &mut payment_txn])
            .map_err(|e| BuildGroupError::Group(e.to_string()))?;

        Ok((vec![fee_txn, payment_txn], 1))
    } else {
        let payment_txn = base(
            min_fee,
            TransactionType::AssetTransferTransaction(AssetTransferTransaction {
                sender,
                xfer: asset_id,
                amount,
                receiver: pay_to,
                close_to: None,
            }),
            PAYMENT_NOTE,
        );

        Ok((vec![payment_txn], 0))
    }
}

/// Client role of the AVM exact scheme.
///
/// Holds a [`ClientAvmSigner`] and a lazily-built Algod client per network.
pub struct ExactAvmClient {
    signer: Arc<dyn ClientAvmSigner>,
    algod_url_override: Option<String>,
    clients: DashMap<String, Arc<Algod>>,
}

impl std::fmt::Debug for ExactAvmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExactAvmClient")
            .field("address", &self.signer.address())
            .field("algod_url_override", &self.algod_url_override)
            .finish_non_exhaustive()
    }
}

impl ExactAvmClient {
    /// Creates the client role around a signer.
    #[must_use]
    pub fn new(signer: Arc<dyn ClientAvmSigner>) -> Self {
        Self {
            signer,
            algod_url_override: None,
            clients: DashMap::new(),
        }
    }

    /// Overrides the Algod endpoint for every network.
    #[must_use]
    pub fn with_algod_url(mut self, url: impl Into<String>) -> Self {
        self.algod_url_override = Some(url.into());
        self
    }

    fn algod(&self, network: &str) -> Result<Arc<Algod>, SchemeError> {
        let caip2 = networks::normalize_network(network)?;
        if let Some(client) = self.clients.get(caip2) {
            return Ok(Arc::clone(&client));
        }

        let url = match &self.algod_url_override {
            Some(url) => url.clone(),
            None => networks::network_config(caip2)?.algod_endpoint(),
        };
        let algod = Algod::new(&url, ALGOD_TOKEN)?;
        let entry = self
            .clients
            .entry(caip2.to_owned())
            .or_insert_with(|| Arc::new(algod));
        Ok(Arc::clone(&entry))
    }

    async fn build_payload(
        &self,
        requirements: &PaymentRequirements,
    ) -> Result<InnerPayload, SchemeError> {
        let algod = self.algod(&requirements.network)?;
        let suggested = algod.suggested_transaction_params().await?;
        let params = GroupParams {
            first_valid: suggested.first_valid.0,
            last_valid: suggested.last_valid.0,
            genesis_hash: suggested.genesis_hash.0,
            genesis_id: suggested.genesis_id.clone(),
            min_fee: suggested.min_fee.0,
        };

        let sender = self.signer.address();
        let (transactions, payment_index) = build_payment_group(&params, requirements, &sender)?;

        let unsigned: Vec<Vec<u8>> = transactions
            .iter()
            .map(rmp_serde::to_vec_named)
            .collect::<Result<_, _>>()?;

        // Only transactions we actually send are ours to sign; the fee-payer
        // slot travels unsigned for the facilitator.
        let own_indexes: Vec<usize> = transactions
            .iter()
            .enumerate()
            .filter_map(|(i, txn)| (txn_sender(txn) == sender).then_some(i))
            .collect();

        let signed = self.signer.sign_transactions(&unsigned, &own_indexes)?;

        let payment_group: Vec<String> = unsigned
            .iter()
            .zip(&signed)
            .map(|(unsigned_bytes, signed_bytes)| {
                BASE64.encode(signed_bytes.as_deref().unwrap_or(unsigned_bytes))
            })
            .collect();

        let payload = ExactAvmPayload {
            payment_group,
            payment_index,
        };
        InnerPayload::from_typed(&payload)
    }
}

impl SchemeId for ExactAvmClient {
    fn scheme(&self) -> &str {
        SCHEME_EXACT
    }

    fn caip_family(&self) -> &str {
        "algorand:*"
    }
}

impl SchemeClient for ExactAvmClient {
    fn create_payment_payload<'a>(
        &'a self,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<InnerPayload, SchemeError>> {
        Box::pin(self.build_payload(requirements))
    }
}

/// Extracts a transaction's sender address as a string.
fn txn_sender(txn: &Transaction) -> String {
    match &txn.txn_type {
        TransactionType::Payment(p) => p.sender.to_string(),
        TransactionType::AssetTransferTransaction(x) => x.sender.to_string(),
        TransactionType::AssetAcceptTransaction(a) => a.sender.to_string(),
        TransactionType::KeyRegistration(k) => k.sender.to_string(),
        _ => String::new(),
    }
}
