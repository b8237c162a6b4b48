//! V1 legacy payment types for the x402 protocol.
//!
//! V1 identifies chains by human-readable network names (e.g.,
//! `"algorand-testnet"`), calls the amount `maxAmountRequired`, and carries
//! resource metadata inline in the requirements rather than in the payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Network;

/// V1 payment requirements (legacy).
///
/// # JSON Format
///
/// ```json
/// {
///   "scheme": "exact",
///   "network": "algorand-testnet",
///   "maxAmountRequired": "1000",
///   "resource": "/api/data",
///   "payTo": "RECEIVER...",
///   "maxTimeoutSeconds": 300,
///   "asset": "10458941"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirementsV1 {
    /// Payment scheme identifier (e.g., "exact").
    pub scheme: String,

    /// Network identifier (legacy format, e.g., "algorand-testnet").
    pub network: Network,

    /// Maximum amount in smallest unit.
    pub max_amount_required: String,

    /// Resource URL.
    pub resource: String,

    /// Optional resource description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Recipient address.
    pub pay_to: String,

    /// Maximum time in seconds for payment validity.
    pub max_timeout_seconds: u64,

    /// Asset address/identifier.
    pub asset: String,

    /// Optional output schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,

    /// Additional scheme-specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl PaymentRequirementsV1 {
    /// Returns the payment amount (V1 calls it `maxAmountRequired`).
    #[must_use]
    pub fn amount(&self) -> &str {
        &self.max_amount_required
    }

    /// Returns the extra metadata.
    #[must_use]
    pub const fn extra(&self) -> Option<&Value> {
        self.extra.as_ref()
    }
}

/// V1 402 response (legacy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredV1 {
    /// Protocol version (always 1 for V1).
    #[serde(default = "default_v1")]
    pub x402_version: u32,

    /// Machine-readable error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// List of accepted payment requirements.
    pub accepts: Vec<PaymentRequirementsV1>,
}

/// V1 payment payload (legacy).
///
/// In V1, `scheme` and `network` sit at the top level; there is no embedded
/// `accepted` copy of the requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayloadV1 {
    /// Protocol version (always 1 for V1).
    #[serde(default = "default_v1")]
    pub x402_version: u32,

    /// Payment scheme identifier (at top level in V1).
    pub scheme: String,

    /// Network identifier (at top level in V1).
    pub network: Network,

    /// Scheme-specific payload data.
    pub payload: Value,
}

impl PaymentPayloadV1 {
    /// Returns the payment scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the network.
    #[must_use]
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Returns `true` if the payload targets this offer.
    ///
    /// V1 payloads carry no embedded offer copy, so only scheme and network
    /// can be compared.
    #[must_use]
    pub fn matches_requirements(&self, requirements: &PaymentRequirementsV1) -> bool {
        self.scheme == requirements.scheme && self.network == requirements.network
    }
}

/// V1 request to verify a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequestV1 {
    /// The payment payload to verify.
    pub payment_payload: PaymentPayloadV1,

    /// The requirements to verify against.
    pub payment_requirements: PaymentRequirementsV1,
}

/// V1 request to settle a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequestV1 {
    /// The payment payload to settle.
    pub payment_payload: PaymentPayloadV1,

    /// The requirements for settlement.
    pub payment_requirements: PaymentRequirementsV1,
}

/// V1 supported response (legacy — no extensions or signers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedResponseV1 {
    /// List of supported payment kinds.
    pub kinds: Vec<crate::SupportedKind>,
}

const fn default_v1() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirements_use_max_amount_required() {
        let req = PaymentRequirementsV1 {
            scheme: "exact".into(),
            network: "algorand-testnet".into(),
            max_amount_required: "1000".into(),
            resource: "/api/data".into(),
            description: None,
            mime_type: None,
            pay_to: "RECEIVER".into(),
            max_timeout_seconds: 300,
            asset: "10458941".into(),
            output_schema: None,
            extra: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["maxAmountRequired"], "1000");
        assert_eq!(req.amount(), "1000");
    }

    #[test]
    fn payload_version_defaults_to_one() {
        let body = serde_json::json!({
            "scheme": "exact",
            "network": "algorand-testnet",
            "payload": {},
        });
        let payload: PaymentPayloadV1 = serde_json::from_value(body).unwrap();
        assert_eq!(payload.x402_version, 1);
    }
}
