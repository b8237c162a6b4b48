//! V2 payment types for the x402 protocol.
//!
//! V2 identifies chains by CAIP-2 identifiers (`"algorand:<genesis_hash>"`,
//! `"eip155:8453"`) and embeds the accepted payment requirements inside the
//! payment payload, so the facilitator can check that the buyer agreed to the
//! exact terms the seller advertised.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Network;

/// V2 payment requirements: one payment option offered by a seller.
///
/// # JSON Format
///
/// ```json
/// {
///   "scheme": "exact",
///   "network": "algorand:SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=",
///   "amount": "1000",
///   "payTo": "RECEIVER...",
///   "maxTimeoutSeconds": 300,
///   "asset": "10458941",
///   "extra": {"decimals": 6}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Payment scheme identifier (e.g., "exact").
    pub scheme: String,

    /// CAIP-2 network identifier.
    pub network: Network,

    /// Amount in the asset's smallest unit, as a decimal string.
    pub amount: String,

    /// Recipient address.
    pub pay_to: String,

    /// Maximum time in seconds for payment validity.
    pub max_timeout_seconds: u64,

    /// Asset identifier (chain-specific; an ASA id for AVM).
    pub asset: String,

    /// Additional scheme-specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl PaymentRequirements {
    /// Returns the payment amount.
    #[must_use]
    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Returns the extra metadata.
    #[must_use]
    pub const fn extra(&self) -> Option<&Value> {
        self.extra.as_ref()
    }

    /// Looks up a string field inside `extra`.
    #[must_use]
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.as_ref()?.get(key)?.as_str()
    }
}

/// V2 payment payload: the buyer's signed payment proof.
///
/// The `accepted` field is a verbatim copy of the chosen
/// [`PaymentRequirements`]; the seller rejects the payment if it does not
/// match one of the options it offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Protocol version (always 2 for V2).
    #[serde(default = "default_v2")]
    pub x402_version: u32,

    /// The payment requirements the buyer accepted.
    pub accepted: PaymentRequirements,

    /// Scheme-specific inner payload (e.g., an atomic transaction group).
    pub payload: Value,

    /// URL of the resource being paid for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Protocol extension data keyed by extension name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl PaymentPayload {
    /// Returns the payment scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.accepted.scheme
    }

    /// Returns the network.
    #[must_use]
    pub fn network(&self) -> &str {
        &self.accepted.network
    }

    /// Returns `true` if the buyer accepted exactly this offer.
    ///
    /// Compares the five protocol-critical fields — scheme, network, amount,
    /// asset, and `pay_to` — and deliberately ignores `max_timeout_seconds`
    /// and `extra`, which facilitator enrichment may alter between the 402
    /// and the retry.
    #[must_use]
    pub fn matches_requirements(&self, requirements: &PaymentRequirements) -> bool {
        self.accepted.scheme == requirements.scheme
            && self.accepted.network == requirements.network
            && self.accepted.amount == requirements.amount
            && self.accepted.asset == requirements.asset
            && self.accepted.pay_to == requirements.pay_to
    }
}

/// V2 402 response body.
///
/// Returned with HTTP status 402 to advertise acceptable payment options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version (always 2 for V2).
    #[serde(default = "default_v2")]
    pub x402_version: u32,

    /// List of accepted payment requirements.
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,

    /// Machine-readable error code (usually `"payment_required"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// URL of the protected resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Protocol extension declarations keyed by extension name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// V2 request to verify a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// The payment payload to verify.
    pub payment_payload: PaymentPayload,

    /// The requirements to verify against.
    pub payment_requirements: PaymentRequirements,
}

/// V2 request to settle a payment.
///
/// Structurally identical to [`VerifyRequest`] on the wire, but kept as a
/// distinct type so a verify body cannot be passed where a settle body is
/// expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    /// The payment payload to settle.
    pub payment_payload: PaymentPayload,

    /// The requirements for settlement.
    pub payment_requirements: PaymentRequirements,
}

impl From<VerifyRequest> for SettleRequest {
    fn from(request: VerifyRequest) -> Self {
        Self {
            payment_payload: request.payment_payload,
            payment_requirements: request.payment_requirements,
        }
    }
}

const fn default_v2() -> u32 {
    2
}
