//! Transaction decoding, validation, and money conversion for AVM payments.
//!
//! Group entries travel as base64-encoded msgpack, either a bare transaction
//! (the unsigned fee-payer slot) or a signed-transaction envelope. Decoding
//! normalizes both into [`DecodedTransactionInfo`] so the verification state
//! machine never branches on the envelope shape.

use std::str::FromStr;
use std::sync::LazyLock;

use algonaut::core::Address;
use algonaut::transaction::transaction::TransactionType;
use algonaut::transaction::{SignedTransaction, Transaction};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

use crate::constants::{
    AVM_ADDRESS_REGEX, BLOCKED_TXN_TYPES, MAX_REASONABLE_FEE, TXN_TYPE_ASSET_TRANSFER,
    TXN_TYPE_KEY_REGISTRATION, TXN_TYPE_PAYMENT, errors,
};
use crate::types::{DecodedTransactionInfo, TransactionGroupInfo};

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(AVM_ADDRESS_REGEX).expect("address regex is valid")
});

/// Errors raised while decoding transactions or parsing money values.
#[derive(Debug, thiserror::Error)]
pub enum AvmDecodeError {
    /// A group entry is not valid base64.
    #[error("invalid base64 encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Bytes decode as neither a signed envelope nor a bare transaction.
    #[error("failed to decode transaction: {0}")]
    Msgpack(String),

    /// A money value could not be parsed.
    #[error("invalid money value: {0}")]
    Money(String),
}

/// Validates an Algorand address: 58 characters of base32 with a checksum
/// that survives a full decode.
#[must_use]
pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_RE.is_match(address) && Address::from_str(address).is_ok()
}

/// Decodes msgpack transaction bytes into a normalized view.
///
/// Tries the signed-transaction envelope first (its required `txn` key makes
/// it unambiguous), then falls back to a bare unsigned transaction.
///
/// # Errors
///
/// Returns [`AvmDecodeError::Msgpack`] if both decodings fail.
pub fn decode_transaction_bytes(bytes: &[u8]) -> Result<DecodedTransactionInfo, AvmDecodeError> {
    if let Ok(signed) = rmp_serde::from_slice::<SignedTransaction>(bytes) {
        return Ok(info_from_transaction(&signed.transaction, true));
    }
    match rmp_serde::from_slice::<Transaction>(bytes) {
        Ok(txn) => Ok(info_from_transaction(&txn, false)),
        Err(e) => Err(AvmDecodeError::Msgpack(e.to_string())),
    }
}

/// Decodes a base64-encoded msgpack transaction.
///
/// # Errors
///
/// Returns [`AvmDecodeError`] on base64 or msgpack failure.
pub fn decode_base64_transaction(b64_txn: &str) -> Result<DecodedTransactionInfo, AvmDecodeError> {
    let bytes = BASE64.decode(b64_txn)?;
    decode_transaction_bytes(&bytes)
}

/// Decodes a payment group into its aggregate view.
///
/// Detects the fee-payer slot (a self-pay with zero amount) and sums fees.
///
/// # Errors
///
/// Returns [`AvmDecodeError`] if any entry fails to decode.
pub fn decode_payment_group(
    payment_group: &[String],
    payment_index: usize,
) -> Result<TransactionGroupInfo, AvmDecodeError> {
    let mut transactions = Vec::with_capacity(payment_group.len());
    let mut total_fee = 0u64;
    let mut group_id = None;
    let mut has_fee_payer = false;
    let mut fee_payer_index = None;

    for (i, b64_txn) in payment_group.iter().enumerate() {
        let info = decode_base64_transaction(b64_txn)?;
        total_fee = total_fee.saturating_add(info.fee);

        if i == 0 {
            group_id.clone_from(&info.group);
        }

        if info.txn_type == TXN_TYPE_PAYMENT
            && info.receiver.as_deref() == Some(info.sender.as_str())
            && info.amount.unwrap_or(0) == 0
        {
            has_fee_payer = true;
            fee_payer_index = Some(i);
        }

        transactions.push(info);
    }

    Ok(TransactionGroupInfo {
        transactions,
        group_id,
        total_fee,
        has_fee_payer,
        fee_payer_index,
        payment_index,
    })
}

/// Encodes raw transaction bytes as base64 group entries.
#[must_use]
pub fn encode_transaction_group(txn_bytes_list: &[Vec<u8>]) -> Vec<String> {
    txn_bytes_list.iter().map(|b| BASE64.encode(b)).collect()
}

/// Checks a transaction for fields no payment group may carry.
///
/// Rejected: rekey operations, close-to operations (account or asset
/// draining), and blocked transaction types (key registration).
///
/// Returns the error code of the first violation, or `None`.
#[must_use]
pub fn validate_no_security_risks(info: &DecodedTransactionInfo) -> Option<&'static str> {
    if info.rekey_to.is_some() {
        return Some(errors::REKEY_DETECTED);
    }

    if info.txn_type == TXN_TYPE_PAYMENT && info.close_remainder_to.is_some() {
        return Some(errors::CLOSE_TO_DETECTED);
    }

    if info.txn_type == TXN_TYPE_ASSET_TRANSFER && info.asset_close_to.is_some() {
        return Some(errors::CLOSE_TO_DETECTED);
    }

    if BLOCKED_TXN_TYPES.contains(&info.txn_type.as_str()) {
        return Some(errors::BLOCKED_TRANSACTION_TYPE);
    }

    None
}

/// Validates a fee-payer transaction against the shape the scheme requires:
/// a self-pay of zero microalgos from `expected_fee_payer`, with no close-to
/// or rekey, and a fee no higher than the pooled fee of a full group.
///
/// Returns the error code of the first violation, or `None`.
#[must_use]
pub fn validate_fee_payer_transaction(
    info: &DecodedTransactionInfo,
    expected_fee_payer: &str,
) -> Option<&'static str> {
    if info.txn_type != TXN_TYPE_PAYMENT {
        return Some(errors::FEE_PAYER_INVALID_TXN);
    }

    if info.sender != expected_fee_payer {
        return Some(errors::FEE_PAYER_INVALID_TXN);
    }

    if info.receiver.as_deref() != Some(expected_fee_payer) {
        return Some(errors::FEE_PAYER_INVALID_TXN);
    }

    if info.amount.unwrap_or(0) > 0 {
        return Some(errors::FEE_PAYER_HAS_AMOUNT);
    }

    if info.close_remainder_to.is_some() {
        return Some(errors::FEE_PAYER_HAS_CLOSE);
    }

    if info.rekey_to.is_some() {
        return Some(errors::FEE_PAYER_HAS_REKEY);
    }

    if info.fee > MAX_REASONABLE_FEE {
        return Some(errors::FEE_PAYER_INVALID_TXN);
    }

    None
}

/// Parses a money value (string or number) to a decimal.
///
/// Strings may carry a leading `$` and thousands separators.
///
/// # Errors
///
/// Returns [`AvmDecodeError::Money`] for anything unparsable.
pub fn parse_money_to_decimal(money: &Value) -> Result<Decimal, AvmDecodeError> {
    match money {
        Value::String(s) => {
            let cleaned = s.trim().trim_start_matches('$').replace(',', "");
            Decimal::from_str(&cleaned).map_err(|e| AvmDecodeError::Money(e.to_string()))
        }
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(Decimal::from(u))
            } else if let Some(i) = n.as_i64() {
                Ok(Decimal::from(i))
            } else {
                n.as_f64()
                    .and_then(Decimal::from_f64_retain)
                    .ok_or_else(|| AvmDecodeError::Money(n.to_string()))
            }
        }
        other => Err(AvmDecodeError::Money(other.to_string())),
    }
}

/// Converts a decimal amount to atomic units, rounding half-up.
///
/// # Errors
///
/// Returns [`AvmDecodeError::Money`] if the result is negative or does not
/// fit in a `u64`.
pub fn to_atomic_amount(amount: Decimal, decimals: u32) -> Result<u64, AvmDecodeError> {
    let scale = Decimal::from(10u64.pow(decimals));
    (amount * scale)
        .round()
        .to_u64()
        .ok_or_else(|| AvmDecodeError::Money(format!("{amount} out of range")))
}

/// Converts atomic units back to a decimal amount.
#[must_use]
pub fn from_atomic_amount(amount: u64, decimals: u32) -> Decimal {
    Decimal::from(amount) / Decimal::from(10u64.pow(decimals))
}

fn info_from_transaction(txn: &Transaction, is_signed: bool) -> DecodedTransactionInfo {
    let mut info = DecodedTransactionInfo {
        fee: txn.fee.0,
        first_valid: txn.first_valid.0,
        last_valid: txn.last_valid.0,
        genesis_hash: BASE64.encode(txn.genesis_hash.0),
        genesis_id: txn.genesis_id.clone(),
        group: txn.group.as_ref().map(|g| BASE64.encode(g.0)),
        is_signed,
        note: txn.note.clone(),
        rekey_to: txn.rekey_to.as_ref().map(ToString::to_string),
        ..DecodedTransactionInfo::default()
    };

    match &txn.txn_type {
        TransactionType::Payment(payment) => {
            info.txn_type = TXN_TYPE_PAYMENT.into();
            info.sender = payment.sender.to_string();
            info.receiver = Some(payment.receiver.to_string());
            info.amount = Some(payment.amount.0);
            info.close_remainder_to = payment.close_remainder_to.as_ref().map(ToString::to_string);
        }
        TransactionType::AssetTransferTransaction(xfer) => {
            info.txn_type = TXN_TYPE_ASSET_TRANSFER.into();
            info.sender = xfer.sender.to_string();
            info.asset_index = Some(xfer.xfer);
            info.asset_receiver = Some(xfer.receiver.to_string());
            info.asset_amount = Some(xfer.amount);
            info.asset_close_to = xfer.close_to.as_ref().map(ToString::to_string);
        }
        TransactionType::AssetAcceptTransaction(accept) => {
            // Opt-in: an axfer of zero to self.
            info.txn_type = TXN_TYPE_ASSET_TRANSFER.into();
            info.sender = accept.sender.to_string();
            info.asset_index = Some(accept.xfer);
            info.asset_receiver = Some(accept.sender.to_string());
            info.asset_amount = Some(0);
        }
        TransactionType::KeyRegistration(keyreg) => {
            info.txn_type = TXN_TYPE_KEY_REGISTRATION.into();
            info.sender = keyreg.sender.to_string();
        }
        TransactionType::AssetConfigurationTransaction(_) => {
            info.txn_type = "acfg".into();
        }
        TransactionType::AssetClawbackTransaction(clawback) => {
            // Clawback is axfer-shaped on the wire; populate the same
            // fields so the security pass sees its close-to.
            info.txn_type = TXN_TYPE_ASSET_TRANSFER.into();
            info.sender = clawback.sender.to_string();
            info.asset_index = Some(clawback.xfer);
            info.asset_receiver = Some(clawback.asset_receiver.to_string());
            info.asset_amount = Some(clawback.asset_amount);
            info.asset_close_to = clawback.asset_close_to.as_ref().map(ToString::to_string);
        }
        TransactionType::AssetFreezeTransaction(_) => {
            info.txn_type = "afrz".into();
        }
        TransactionType::ApplicationCallTransaction(_) => {
            info.txn_type = "appl".into();
        }
    }

    info
}
