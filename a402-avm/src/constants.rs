//! AVM constants: network identifiers, ASA ids, fee limits, error codes.

/// Scheme identifier for exact payments.
pub const SCHEME_EXACT: &str = "exact";

/// Algorand mainnet genesis hash (base64).
pub const MAINNET_GENESIS_HASH: &str = "wGHE2Pwdvd7S12BL5FaOP20EGYesN73ktiC1qzkkit8=";

/// Algorand testnet genesis hash (base64).
pub const TESTNET_GENESIS_HASH: &str = "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=";

/// Algorand mainnet genesis id.
pub const MAINNET_GENESIS_ID: &str = "mainnet-v1.0";

/// Algorand testnet genesis id.
pub const TESTNET_GENESIS_ID: &str = "testnet-v1.0";

/// CAIP-2 identifier for Algorand mainnet.
pub const ALGORAND_MAINNET_CAIP2: &str = "algorand:wGHE2Pwdvd7S12BL5FaOP20EGYesN73ktiC1qzkkit8=";

/// CAIP-2 identifier for Algorand testnet.
pub const ALGORAND_TESTNET_CAIP2: &str = "algorand:SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=";

/// Default Algod endpoint for mainnet.
pub const MAINNET_ALGOD_URL: &str = "https://mainnet-api.algonode.cloud";

/// Default Algod endpoint for testnet.
pub const TESTNET_ALGOD_URL: &str = "https://testnet-api.algonode.cloud";

/// Default Indexer endpoint for mainnet.
pub const MAINNET_INDEXER_URL: &str = "https://mainnet-idx.algonode.cloud";

/// Default Indexer endpoint for testnet.
pub const TESTNET_INDEXER_URL: &str = "https://testnet-idx.algonode.cloud";

/// USDC ASA id on Algorand mainnet.
pub const USDC_MAINNET_ASA_ID: u64 = 31_566_704;

/// USDC ASA id on Algorand testnet.
pub const USDC_TESTNET_ASA_ID: u64 = 10_458_941;

/// USDC decimals on Algorand.
pub const DEFAULT_DECIMALS: u32 = 6;

/// Minimum transaction fee in microalgos.
pub const MIN_TXN_FEE: u64 = 1000;

/// Maximum transactions in an atomic group.
pub const MAX_GROUP_SIZE: usize = 16;

/// Maximum acceptable fee on a fee-payer transaction, in microalgos.
///
/// Equals `MAX_GROUP_SIZE * MIN_TXN_FEE` — the pooled fee for a full group.
/// Caps what a crafted group can drain from a facilitator fee-payer account.
pub const MAX_REASONABLE_FEE: u64 = 16_000;

/// Transaction type tag for payments.
pub const TXN_TYPE_PAYMENT: &str = "pay";

/// Transaction type tag for asset transfers.
pub const TXN_TYPE_ASSET_TRANSFER: &str = "axfer";

/// Transaction type tag for key registration.
pub const TXN_TYPE_KEY_REGISTRATION: &str = "keyreg";

/// Transaction types refused in payment groups.
pub const BLOCKED_TXN_TYPES: &[&str] = &[TXN_TYPE_KEY_REGISTRATION];

/// Algorand address shape: 58 characters of base32 with a trailing checksum.
pub const AVM_ADDRESS_REGEX: &str = r"^[A-Z2-7]{58}$";

/// Note attached to fee-payer transactions.
pub const FEE_PAYER_NOTE: &[u8] = b"x402-fee-payer";

/// Note attached to payment transactions.
pub const PAYMENT_NOTE: &[u8] = b"x402-payment";

/// V1 network name for Algorand mainnet.
pub const V1_ALGORAND_MAINNET: &str = "algorand-mainnet";

/// V1 network name for Algorand testnet.
pub const V1_ALGORAND_TESTNET: &str = "algorand-testnet";

/// All V1 network names served by the AVM schemes.
pub const V1_NETWORKS: &[&str] = &[V1_ALGORAND_MAINNET, V1_ALGORAND_TESTNET];

/// Error codes reported in verify/settle responses.
pub mod errors {
    /// Payload is not a well-formed exact AVM payload.
    pub const INVALID_EXACT_AVM_PAYLOAD: &str = "invalid_exact_avm_payload";
    /// The payment group is empty.
    pub const EMPTY_GROUP: &str = "empty_group";
    /// The payment group exceeds the atomic group limit.
    pub const GROUP_TOO_LARGE: &str = "group_too_large";
    /// The payment index is outside the group.
    pub const INVALID_PAYMENT_INDEX: &str = "invalid_payment_index";
    /// A group entry could not be decoded.
    pub const GROUP_DECODE_FAILED: &str = "group_decode_failed";
    /// A single transaction could not be decoded.
    pub const TRANSACTION_DECODE_FAILED: &str = "transaction_decode_failed";
    /// A multi-transaction group entry is missing its group id.
    pub const MISSING_GROUP_ID: &str = "missing_group_id";
    /// Group ids differ within the group.
    pub const GROUP_ID_MISMATCH: &str = "group_id_mismatch";
    /// A transaction is bound to the wrong network.
    pub const GENESIS_HASH_MISMATCH: &str = "genesis_hash_mismatch";
    /// The payment transaction moves the wrong asset.
    pub const ASSET_ID_MISMATCH: &str = "asset_id_mismatch";
    /// The payment transaction pays the wrong recipient.
    pub const RECIPIENT_MISMATCH: &str = "recipient_mismatch";
    /// The payment amount is below the required amount.
    pub const AMOUNT_INSUFFICIENT: &str = "amount_insufficient";
    /// The payment transaction is unsigned.
    pub const MISSING_SIGNATURE: &str = "missing_signature";
    /// A signature failed verification.
    pub const INVALID_SIGNATURE: &str = "invalid_signature";
    /// The payment transaction is not an asset transfer.
    pub const INVALID_TRANSACTION_TYPE: &str = "invalid_transaction_type";
    /// A transaction attempts to rekey an account.
    pub const REKEY_DETECTED: &str = "rekey_detected";
    /// A transaction attempts to close out an account or asset balance.
    pub const CLOSE_TO_DETECTED: &str = "close_to_detected";
    /// A transaction has a refused type.
    pub const BLOCKED_TRANSACTION_TYPE: &str = "blocked_transaction_type";
    /// A facilitator-managed account is the payer.
    pub const FEE_PAYER_TRANSFERRING_FUNDS: &str = "fee_payer_transferring_funds";
    /// The advertised fee payer has no transaction in the group.
    pub const MISSING_FEE_PAYER: &str = "missing_fee_payer";
    /// The advertised fee payer is not managed by this facilitator.
    pub const FEE_PAYER_NOT_MANAGED: &str = "fee_payer_not_managed";
    /// The fee-payer transaction has the wrong shape.
    pub const FEE_PAYER_INVALID_TXN: &str = "fee_payer_invalid_txn";
    /// The fee-payer transaction moves value.
    pub const FEE_PAYER_HAS_AMOUNT: &str = "fee_payer_has_amount";
    /// The fee-payer transaction has a close-to field.
    pub const FEE_PAYER_HAS_CLOSE: &str = "fee_payer_has_close";
    /// The fee-payer transaction has a rekey field.
    pub const FEE_PAYER_HAS_REKEY: &str = "fee_payer_has_rekey";
    /// Group simulation reported a failure.
    pub const SIMULATION_FAILED: &str = "simulation_failed";
    /// Submission or confirmation failed.
    pub const TRANSACTION_FAILED: &str = "transaction_failed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caip2_identifiers_embed_genesis_hashes() {
        assert_eq!(
            ALGORAND_MAINNET_CAIP2,
            format!("algorand:{MAINNET_GENESIS_HASH}")
        );
        assert_eq!(
            ALGORAND_TESTNET_CAIP2,
            format!("algorand:{TESTNET_GENESIS_HASH}")
        );
    }

    #[test]
    fn fee_limits_are_consistent() {
        assert_eq!(MAX_REASONABLE_FEE, MAX_GROUP_SIZE as u64 * MIN_TXN_FEE);
        assert_eq!(MIN_TXN_FEE, 1000);
        assert_eq!(MAX_GROUP_SIZE, 16);
    }

    #[test]
    fn usdc_asa_ids() {
        assert_eq!(USDC_MAINNET_ASA_ID, 31_566_704);
        assert_eq!(USDC_TESTNET_ASA_ID, 10_458_941);
        assert_eq!(DEFAULT_DECIMALS, 6);
    }

    #[test]
    fn keyreg_is_blocked() {
        assert!(BLOCKED_TXN_TYPES.contains(&TXN_TYPE_KEY_REGISTRATION));
        assert!(!BLOCKED_TXN_TYPES.contains(&TXN_TYPE_PAYMENT));
        assert!(!BLOCKED_TXN_TYPES.contains(&TXN_TYPE_ASSET_TRANSFER));
    }
}
