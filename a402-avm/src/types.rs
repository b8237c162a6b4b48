//! AVM payload and transaction view types.

use serde::{Deserialize, Serialize};

/// Exact payment payload for AVM networks.
///
/// Contains an atomic group of base64-encoded msgpack transactions.
/// `payment_index` identifies the transaction that pays the resource server;
/// any other entries (e.g., an unsigned fee-payer transaction) exist to make
/// the group commit atomically.
///
/// # JSON Format
///
/// ```json
/// {"paymentGroup": ["gqNzaWf..."], "paymentIndex": 0}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactAvmPayload {
    /// Base64-encoded msgpack transactions, in group order.
    #[serde(default)]
    pub payment_group: Vec<String>,

    /// Index of the payment transaction in the group.
    #[serde(default)]
    pub payment_index: usize,
}

/// Normalized view of a decoded Algorand transaction.
///
/// Presents the same fields whether the source bytes were a bare transaction
/// or a signed-transaction envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedTransactionInfo {
    /// Transaction type tag (`"pay"`, `"axfer"`, `"keyreg"`, ...).
    pub txn_type: String,
    /// Sender address.
    pub sender: String,
    /// Fee in microalgos.
    pub fee: u64,
    /// First valid round.
    pub first_valid: u64,
    /// Last valid round.
    pub last_valid: u64,
    /// Base64-encoded genesis hash.
    pub genesis_hash: String,
    /// Genesis id string, when present.
    pub genesis_id: Option<String>,
    /// Base64-encoded group id, when the transaction belongs to a group.
    pub group: Option<String>,
    /// Whether the source bytes carried a signature.
    pub is_signed: bool,
    /// Transaction note bytes.
    pub note: Option<Vec<u8>>,

    /// Payment receiver (type `"pay"`).
    pub receiver: Option<String>,
    /// Payment amount in microalgos (type `"pay"`).
    pub amount: Option<u64>,
    /// Close-remainder-to address (type `"pay"`).
    pub close_remainder_to: Option<String>,

    /// ASA id (type `"axfer"`).
    pub asset_index: Option<u64>,
    /// Asset receiver (type `"axfer"`).
    pub asset_receiver: Option<String>,
    /// Asset amount (type `"axfer"`).
    pub asset_amount: Option<u64>,
    /// Asset close-to address (type `"axfer"`).
    pub asset_close_to: Option<String>,

    /// Rekey-to address. Any value here fails verification.
    pub rekey_to: Option<String>,
}

/// Aggregate view of a decoded payment group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionGroupInfo {
    /// Decoded transactions, in group order.
    pub transactions: Vec<DecodedTransactionInfo>,
    /// Base64-encoded group id shared by the group, if any.
    pub group_id: Option<String>,
    /// Sum of all transaction fees.
    pub total_fee: u64,
    /// Whether a fee-payer transaction (self-pay, zero amount) was detected.
    pub has_fee_payer: bool,
    /// Index of the detected fee-payer transaction.
    pub fee_payer_index: Option<usize>,
    /// Index of the payment transaction.
    pub payment_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_wire_format() {
        let payload = ExactAvmPayload {
            payment_group: vec!["AAAA".into(), "BBBB".into()],
            payment_index: 1,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["paymentGroup"][0], "AAAA");
        assert_eq!(json["paymentIndex"], 1);

        let back: ExactAvmPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn payload_defaults_are_empty() {
        let payload: ExactAvmPayload = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(payload.payment_group.is_empty());
        assert_eq!(payload.payment_index, 0);
    }
}
