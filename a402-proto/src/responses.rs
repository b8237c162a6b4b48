//! Facilitator response types for the x402 protocol.
//!
//! These types flow from facilitator to resource server during payment
//! verification and settlement, and from the `/supported` catalogue endpoint.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Network;

/// Response from payment verification.
///
/// Verification failures are data, not errors: `is_valid: false` with a
/// machine-readable `invalid_reason` code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Whether the payment is valid.
    pub is_valid: bool,

    /// Machine-readable reason for invalidity (if `is_valid` is false).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,

    /// Human-readable message for invalidity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_message: Option<String>,

    /// The payer's address (if known).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl VerifyResponse {
    /// Creates a valid verification response.
    #[must_use]
    pub fn valid(payer: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            invalid_reason: None,
            invalid_message: None,
            payer: Some(payer.into()),
        }
    }

    /// Creates an invalid verification response.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            invalid_reason: Some(reason.into()),
            invalid_message: None,
            payer: None,
        }
    }

    /// Sets the human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.invalid_message = Some(message.into());
        self
    }

    /// Sets the payer address.
    #[must_use]
    pub fn with_payer(mut self, payer: impl Into<String>) -> Self {
        self.payer = Some(payer.into());
        self
    }
}

/// Response from payment settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    /// Whether settlement was successful.
    pub success: bool,

    /// Machine-readable reason for failure (if `success` is false).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,

    /// Human-readable message for failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// The payer's address (if known).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,

    /// Transaction hash/identifier (empty on failure before submission).
    #[serde(default)]
    pub transaction: String,

    /// Network where settlement occurred.
    pub network: Network,
}

impl SettleResponse {
    /// Creates a successful settlement response.
    #[must_use]
    pub fn success(
        transaction: impl Into<String>,
        network: impl Into<String>,
        payer: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            error_reason: None,
            error_message: None,
            payer: Some(payer.into()),
            transaction: transaction.into(),
            network: network.into(),
        }
    }

    /// Creates a failed settlement response.
    #[must_use]
    pub fn error(reason: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            success: false,
            error_reason: Some(reason.into()),
            error_message: None,
            payer: None,
            transaction: String::new(),
            network: network.into(),
        }
    }

    /// Sets the human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Sets the transaction identifier.
    #[must_use]
    pub fn with_transaction(mut self, tx: impl Into<String>) -> Self {
        self.transaction = tx.into();
        self
    }

    /// Sets the payer address.
    #[must_use]
    pub fn with_payer(mut self, payer: impl Into<String>) -> Self {
        self.payer = Some(payer.into());
        self
    }
}

/// A supported payment configuration.
///
/// Describes a single (version, scheme, network) combination that a
/// facilitator supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedKind {
    /// Protocol version for this kind (1 or 2).
    pub x402_version: u32,

    /// Payment scheme identifier (e.g., "exact").
    pub scheme: String,

    /// Network identifier (CAIP-2 for V2, legacy name for V1).
    pub network: Network,

    /// Additional scheme-specific data (e.g., a fee payer address).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// Describes what payment kinds a facilitator supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedResponse {
    /// List of supported payment kinds.
    pub kinds: Vec<SupportedKind>,

    /// List of supported extension keys.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Map of CAIP family pattern to signer addresses.
    ///
    /// Example: `{"algorand:*": ["FEEPAYERADDRESS..."]}`
    #[serde(default)]
    pub signers: HashMap<String, Vec<String>>,
}

impl SupportedResponse {
    /// Creates a new `SupportedResponse`.
    #[must_use]
    pub const fn new(
        kinds: Vec<SupportedKind>,
        extensions: Vec<String>,
        signers: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            kinds,
            extensions,
            signers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_response_builders() {
        let ok = VerifyResponse::valid("PAYER");
        assert!(ok.is_valid);
        assert_eq!(ok.payer.as_deref(), Some("PAYER"));

        let bad = VerifyResponse::invalid("amount_insufficient")
            .with_message("need 2000, got 1000")
            .with_payer("PAYER");
        assert!(!bad.is_valid);
        assert_eq!(bad.invalid_reason.as_deref(), Some("amount_insufficient"));
        assert_eq!(bad.payer.as_deref(), Some("PAYER"));
    }

    #[test]
    fn settle_error_has_empty_transaction() {
        let err = SettleResponse::error("transaction_failed", "algorand-testnet");
        assert!(!err.success);
        assert_eq!(err.transaction, "");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["errorReason"], "transaction_failed");
    }

    #[test]
    fn supported_kind_skips_absent_extra() {
        let kind = SupportedKind {
            x402_version: 2,
            scheme: "exact".into(),
            network: "algorand:wGHE2Pwdvd7S12BL5FaOP20EGYesN73ktiC1qzkkit8=".into(),
            extra: None,
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert!(json.get("extra").is_none());
        assert_eq!(json["x402Version"], 2);
    }
}
