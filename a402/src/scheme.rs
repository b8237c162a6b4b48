//! Payment scheme contracts.
//!
//! A scheme implementation is split into three roles that live in different
//! processes: the client builds payment payloads, the resource server prices
//! routes, and the facilitator verifies and settles. All three share one
//! identity ([`SchemeId`]), so a role can be registered under its own CAIP
//! family without the caller restating it.
//!
//! Two value types police the protocol's open-map boundaries:
//!
//! - [`InnerPayload`] is what a client role hands back — always a JSON
//!   object produced from the scheme's typed payload struct (the AVM exact
//!   scheme serializes its `paymentGroup`/`paymentIndex` pair), never a
//!   free-form scalar.
//! - [`Price`] is what a server role receives — route config either names a
//!   human money amount or spells out an explicit asset amount, and the
//!   distinction is made once here instead of in every scheme.
//!
//! I/O-bound methods return [`BoxFuture`] so the traits stay dyn-compatible
//! for registry storage; signing and chain RPC happen behind them.

use std::future::Future;
use std::pin::Pin;

use a402_proto::{
    PaymentPayload, PaymentPayloadV1, PaymentRequirements, PaymentRequirementsV1, SettleResponse,
    SupportedKind, VerifyResponse,
};
use serde::Serialize;
use serde_json::Value;

/// Boxed, `Send` future — the standard dyn-compatible async return type.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Boxed error type used across scheme trait boundaries.
pub type SchemeError = Box<dyn std::error::Error + Send + Sync>;

/// Identity shared by every role of a payment scheme implementation.
pub trait SchemeId {
    /// Payment scheme identifier (e.g., `"exact"`).
    fn scheme(&self) -> &str;

    /// CAIP-2 family pattern this implementation can serve
    /// (e.g., `"algorand:*"`).
    ///
    /// Used as the default registration pattern and to group signer
    /// addresses in the supported-kinds catalogue.
    fn caip_family(&self) -> &str;
}

/// A scheme-defined inner payload, ready to embed in a
/// [`PaymentPayload`].
///
/// Constructed from the scheme's typed payload struct; construction fails
/// if the struct does not serialize to a JSON object, so malformed inner
/// payloads are caught at build time rather than by the recipient.
#[derive(Debug, Clone)]
pub struct InnerPayload(Value);

impl InnerPayload {
    /// Serializes a typed scheme payload into an inner payload.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the result is not a JSON
    /// object.
    pub fn from_typed<T: Serialize>(payload: &T) -> Result<Self, SchemeError> {
        let value = serde_json::to_value(payload)?;
        if !value.is_object() {
            return Err("inner payload must serialize to a JSON object".into());
        }
        Ok(Self(value))
    }

    /// Unwraps the JSON value for embedding in a wire payload.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

/// A route price as configured by the seller.
///
/// Sellers write either a human money amount (`"1.50"`, `"$0.01"`, a bare
/// number) or an explicit asset amount object. [`Price::from_value`]
/// classifies the raw config value once; scheme servers then match on the
/// variants instead of probing JSON.
#[derive(Debug, Clone)]
pub enum Price {
    /// A human money amount, to be resolved by the scheme's money parsing.
    Money(Value),
    /// An explicit amount in atomic units, with an optional asset override.
    Amount {
        /// Amount in the asset's smallest unit.
        amount: String,
        /// Asset identifier; the scheme fills its network default if absent.
        asset: Option<String>,
        /// Additional metadata to carry into the requirements.
        extra: Option<Value>,
    },
}

impl Price {
    /// Classifies a raw config value.
    ///
    /// An object with a string `amount` field is an explicit
    /// [`Price::Amount`]; everything else is money to be parsed.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        if let Some(object) = value.as_object()
            && let Some(amount) = object.get("amount").and_then(Value::as_str)
        {
            return Self::Amount {
                amount: amount.to_owned(),
                asset: object
                    .get("asset")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                extra: object.get("extra").cloned(),
            };
        }
        Self::Money(value.clone())
    }
}

/// Amount in smallest unit with asset identifier.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAmount {
    /// Amount in smallest unit (e.g., `"1500000"` for 1.5 USDC).
    pub amount: String,

    /// Asset address/identifier.
    pub asset: String,

    /// Optional additional metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// V2 client-side payment role.
///
/// Builds the scheme-specific signed payload for an accepted offer; the
/// x402 client wraps the result into a full [`PaymentPayload`] with the
/// verbatim `accepted` copy.
pub trait SchemeClient: SchemeId + Send + Sync {
    /// Creates the scheme-specific inner payload.
    ///
    /// Async because it typically fetches chain parameters and invokes a
    /// signer.
    fn create_payment_payload<'a>(
        &'a self,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<InnerPayload, SchemeError>>;
}

/// V1 (legacy) client-side payment role.
pub trait SchemeClientV1: SchemeId + Send + Sync {
    /// Creates the scheme-specific inner payload for a V1 offer.
    fn create_payment_payload<'a>(
        &'a self,
        requirements: &'a PaymentRequirementsV1,
    ) -> BoxFuture<'a, Result<InnerPayload, SchemeError>>;
}

/// V2 server-side payment role.
///
/// Prices routes and enriches payment requirements. Does **not**
/// verify or settle — that is delegated to a facilitator.
///
/// These methods are sync because they perform pure computation (no I/O).
pub trait SchemeServer: SchemeId + Send + Sync {
    /// Resolves a route price to an atomic asset amount on a network.
    ///
    /// [`Price::Amount`] passes through with defaults filled;
    /// [`Price::Money`] runs the scheme's money conversion (for AVM, USD to
    /// USDC at six decimals, via the registered parser chain).
    ///
    /// # Errors
    ///
    /// Returns an error if the money value is unparsable or the network is
    /// unsupported.
    fn parse_price(&self, price: &Price, network: &str) -> Result<AssetAmount, SchemeError>;

    /// Adds scheme-specific fields to payment requirements.
    ///
    /// For AVM this fills `extra.decimals`, propagates the facilitator's
    /// optional fee payer from the matched supported kind, and binds the
    /// network's genesis hash so clients can detect a wrong-chain offer
    /// before signing.
    fn enhance_payment_requirements(
        &self,
        requirements: PaymentRequirements,
        supported_kind: &SupportedKind,
        extension_keys: &[String],
    ) -> PaymentRequirements;
}

/// V2 facilitator-side payment role.
///
/// Verifies and settles payments. Validation failures are returned as
/// structured responses (`is_valid: false` / `success: false`), never as
/// panics or errors; settlement re-verifies before anything is signed or
/// submitted.
pub trait SchemeFacilitator: SchemeId + Send + Sync {
    /// Returns extra catalogue data for a network (AVM publishes a managed
    /// fee-payer address here).
    fn get_extra(&self, network: &str) -> Option<Value>;

    /// Returns signer addresses for a network.
    fn get_signers(&self, network: &str) -> Vec<String>;

    /// Assembles the catalogue row this handler advertises for a network.
    fn supported_kind(&self, network: &str) -> SupportedKind {
        SupportedKind {
            x402_version: 2,
            scheme: self.scheme().to_owned(),
            network: network.to_owned(),
            extra: self.get_extra(network),
        }
    }

    /// Verifies a payment asynchronously (decode, validate, simulate).
    fn verify<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, VerifyResponse>;

    /// Settles a payment on-chain asynchronously.
    fn settle<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, SettleResponse>;
}

/// V1 (legacy) facilitator-side payment role.
pub trait SchemeFacilitatorV1: SchemeId + Send + Sync {
    /// Returns extra catalogue data for a network.
    fn get_extra(&self, network: &str) -> Option<Value>;

    /// Returns signer addresses for a network.
    fn get_signers(&self, network: &str) -> Vec<String>;

    /// Assembles the catalogue row this handler advertises for a network.
    fn supported_kind(&self, network: &str) -> SupportedKind {
        SupportedKind {
            x402_version: 1,
            scheme: self.scheme().to_owned(),
            network: network.to_owned(),
            extra: self.get_extra(network),
        }
    }

    /// Verifies a V1 payment asynchronously.
    fn verify<'a>(
        &'a self,
        payload: &'a PaymentPayloadV1,
        requirements: &'a PaymentRequirementsV1,
    ) -> BoxFuture<'a, VerifyResponse>;

    /// Settles a V1 payment on-chain asynchronously.
    fn settle<'a>(
        &'a self,
        payload: &'a PaymentPayloadV1,
        requirements: &'a PaymentRequirementsV1,
    ) -> BoxFuture<'a, SettleResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_payload_requires_an_object() {
        #[derive(Serialize)]
        struct Typed {
            payment_group: Vec<String>,
            payment_index: usize,
        }

        let ok = InnerPayload::from_typed(&Typed {
            payment_group: vec!["AA==".into()],
            payment_index: 0,
        })
        .unwrap();
        assert!(ok.into_value().is_object());

        assert!(InnerPayload::from_typed(&"just a string").is_err());
        assert!(InnerPayload::from_typed(&42u64).is_err());
    }

    #[test]
    fn price_classification() {
        match Price::from_value(&serde_json::json!("1.50")) {
            Price::Money(v) => assert_eq!(v, serde_json::json!("1.50")),
            Price::Amount { .. } => panic!("string prices are money"),
        }

        match Price::from_value(&serde_json::json!({"amount": "42", "asset": "123"})) {
            Price::Amount { amount, asset, extra } => {
                assert_eq!(amount, "42");
                assert_eq!(asset.as_deref(), Some("123"));
                assert!(extra.is_none());
            }
            Price::Money(_) => panic!("explicit amounts are not money"),
        }

        // An object without a string amount is still money (a custom money
        // parser may understand it).
        match Price::from_value(&serde_json::json!({"currency": "EUR"})) {
            Price::Money(_) => {}
            Price::Amount { .. } => panic!("no amount field means money"),
        }
    }
}
