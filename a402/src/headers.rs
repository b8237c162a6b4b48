//! HTTP header encoding and decoding for x402 protocol messages.
//!
//! The client retries a 402'd request with `X-PAYMENT: base64(json(payload))`;
//! after settlement the server attaches the receipt in
//! `X-PAYMENT-RESPONSE: base64(json(settle response))`. Both headers accept
//! standard or URL-safe base64, padded or not.

use a402_proto::envelope::PaymentPayloadEnum;
use a402_proto::{PaymentPayload, PaymentPayloadV1, ProtocolError, SettleResponse};

use crate::encoding;

/// Request header carrying the payment payload.
pub const X_PAYMENT: &str = "X-PAYMENT";

/// Response header carrying the settlement receipt.
pub const X_PAYMENT_RESPONSE: &str = "X-PAYMENT-RESPONSE";

/// Errors from header encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    /// Base64 decoding failed.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// JSON (de)serialization failed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The decoded JSON is not a recognizable payment message.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),
}

/// Encodes a V2 [`PaymentPayload`] for the `X-PAYMENT` header.
///
/// # Errors
///
/// Returns [`HeaderError::Json`] if serialization fails.
pub fn encode_payment_header(payload: &PaymentPayload) -> Result<String, HeaderError> {
    let json = serde_json::to_vec(payload)?;
    Ok(encoding::encode(&json))
}

/// Encodes a V1 [`PaymentPayloadV1`] for the `X-PAYMENT` header.
///
/// # Errors
///
/// Returns [`HeaderError::Json`] if serialization fails.
pub fn encode_payment_header_v1(payload: &PaymentPayloadV1) -> Result<String, HeaderError> {
    let json = serde_json::to_vec(payload)?;
    Ok(encoding::encode(&json))
}

/// Decodes an `X-PAYMENT` header value into a version-tagged payload.
///
/// # Errors
///
/// Returns [`HeaderError`] on base64, JSON, or shape failure; callers map
/// this to the `invalid_payment_header` protocol code.
pub fn decode_payment_header(header_value: &str) -> Result<PaymentPayloadEnum, HeaderError> {
    let bytes = encoding::decode_lenient(header_value)?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;
    Ok(PaymentPayloadEnum::from_value(&value)?)
}

/// Encodes a [`SettleResponse`] for the `X-PAYMENT-RESPONSE` header.
///
/// # Errors
///
/// Returns [`HeaderError::Json`] if serialization fails.
pub fn encode_settle_header(response: &SettleResponse) -> Result<String, HeaderError> {
    let json = serde_json::to_vec(response)?;
    Ok(encoding::encode(&json))
}

/// Decodes an `X-PAYMENT-RESPONSE` header value into a [`SettleResponse`].
///
/// # Errors
///
/// Returns [`HeaderError`] on base64 or JSON decode failure.
pub fn decode_settle_header(header_value: &str) -> Result<SettleResponse, HeaderError> {
    let bytes = encoding::decode_lenient(header_value)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use a402_proto::PaymentRequirements;

    fn payload() -> PaymentPayload {
        PaymentPayload {
            x402_version: 2,
            accepted: PaymentRequirements {
                scheme: "exact".into(),
                network: "algorand:SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=".into(),
                amount: "1000".into(),
                pay_to: "RECEIVER".into(),
                max_timeout_seconds: 300,
                asset: "10458941".into(),
                extra: None,
            },
            payload: serde_json::json!({"paymentGroup": [], "paymentIndex": 0}),
            resource: Some("https://api.example.com/data".into()),
            extensions: None,
        }
    }

    #[test]
    fn payment_header_roundtrip() {
        let encoded = encode_payment_header(&payload()).unwrap();
        match decode_payment_header(&encoded).unwrap() {
            PaymentPayloadEnum::V2(decoded) => assert_eq!(*decoded, payload()),
            PaymentPayloadEnum::V1(_) => panic!("decoded as V1"),
        }
    }

    #[test]
    fn payment_header_accepts_url_safe_unpadded() {
        let encoded = encode_payment_header(&payload()).unwrap();
        let url_safe = encoded
            .replace('+', "-")
            .replace('/', "_")
            .trim_end_matches('=')
            .to_owned();
        assert!(decode_payment_header(&url_safe).is_ok());
    }

    #[test]
    fn garbage_header_is_rejected() {
        assert!(decode_payment_header("!!not-base64!!").is_err());
        // Valid base64, but not a payment payload.
        let encoded = encoding::encode(b"{\"hello\": 1}");
        assert!(decode_payment_header(&encoded).is_err());
    }

    #[test]
    fn settle_header_roundtrip() {
        let response = SettleResponse::success("TXID", "algorand-testnet", "PAYER");
        let encoded = encode_settle_header(&response).unwrap();
        assert_eq!(decode_settle_header(&encoded).unwrap(), response);
    }
}
