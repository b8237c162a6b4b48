//! Shared helpers for in-crate tests: deterministic addresses and transaction
//! constructors bound to the testnet genesis hash.

use algonaut::core::{Address, MicroAlgos, Round};
use algonaut::crypto::HashDigest;
use algonaut::transaction::Transaction;
use algonaut::transaction::transaction::{
    AssetClawbackTransaction, AssetTransferTransaction, Payment, TransactionType,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::constants::TESTNET_GENESIS_HASH;

/// A deterministic address derived from a single seed byte.
pub fn address(seed: u8) -> Address {
    Address([seed; 32])
}

/// The testnet genesis hash as raw bytes.
pub fn genesis_hash_bytes() -> [u8; 32] {
    let decoded = BASE64
        .decode(TESTNET_GENESIS_HASH)
        .expect("genesis hash constant is valid base64");
    decoded.try_into().expect("genesis hash is 32 bytes")
}

fn base_txn(fee: u64, txn_type: TransactionType) -> Transaction {
    Transaction {
        fee: MicroAlgos(fee),
        first_valid: Round(1000),
        last_valid: Round(2000),
        genesis_hash: HashDigest(genesis_hash_bytes()),
        txn_type,
        genesis_id: Some("testnet-v1.0".into()),
        group: None,
        lease: None,
        note: None,
        rekey_to: None,
    }
}

/// Builds a payment transaction.
pub fn pay_txn(
    sender: Address,
    receiver: Address,
    amount: u64,
    fee: u64,
    close_remainder_to: Option<Address>,
    rekey_to: Option<Address>,
) -> Transaction {
    let mut txn = base_txn(
        fee,
        TransactionType::Payment(Payment {
            sender,
            receiver,
            amount: MicroAlgos(amount),
            close_remainder_to,
        }),
    );
    txn.rekey_to = rekey_to;
    txn
}

/// Builds an asset transfer transaction.
pub fn transfer_txn(
    sender: Address,
    receiver: Address,
    asset_id: u64,
    amount: u64,
    fee: u64,
    close_to: Option<Address>,
    rekey_to: Option<Address>,
) -> Transaction {
    let mut txn = base_txn(
        fee,
        TransactionType::AssetTransferTransaction(AssetTransferTransaction {
            sender,
            xfer: asset_id,
            amount,
            receiver,
            close_to,
        }),
    );
    txn.rekey_to = rekey_to;
    txn
}

/// Builds an asset clawback transaction (axfer with an `asnd` slot).
pub fn clawback_txn(
    sender: Address,
    asset_sender: Address,
    receiver: Address,
    asset_id: u64,
    amount: u64,
    close_to: Option<Address>,
) -> Transaction {
    base_txn(
        1000,
        TransactionType::AssetClawbackTransaction(AssetClawbackTransaction {
            sender,
            xfer: asset_id,
            asset_amount: amount,
            asset_sender,
            asset_receiver: receiver,
            asset_close_to: close_to,
        }),
    )
}

/// Msgpack-encodes an unsigned transaction.
pub fn unsigned_bytes(txn: &Transaction) -> Vec<u8> {
    rmp_serde::to_vec_named(txn).expect("transaction encodes")
}

/// Base64 group entry for an unsigned transaction.
pub fn unsigned_entry(txn: &Transaction) -> String {
    BASE64.encode(unsigned_bytes(txn))
}
