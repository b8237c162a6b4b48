//! Version-tagged protocol envelopes.
//!
//! Wire messages arrive as raw JSON whose generation is only known at
//! runtime (a 402 body, an `X-PAYMENT` header, a facilitator request).
//! These enums pair each message family with a constructor that sniffs the
//! generation via [`ProtocolVersion`] and accessors that erase it again, so
//! nothing downstream probes raw JSON for protocol fields.

use serde_json::Value;

use crate::v1::{PaymentPayloadV1, PaymentRequiredV1, PaymentRequirementsV1};
use crate::v2::{PaymentPayload, PaymentRequired, PaymentRequirements};
use crate::version::ProtocolVersion;
use crate::ProtocolError;

/// A 402 response body of either generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRequiredEnum {
    /// V1 format.
    V1(Box<PaymentRequiredV1>),
    /// V2 format.
    V2(Box<PaymentRequired>),
}

impl PaymentRequiredEnum {
    /// Parses a 402 body, sniffing the generation from `x402Version`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] on version or shape failure.
    pub fn from_value(data: &Value) -> Result<Self, ProtocolError> {
        match ProtocolVersion::detect(data)? {
            ProtocolVersion::V1 => Ok(Self::V1(Box::new(serde_json::from_value(data.clone())?))),
            ProtocolVersion::V2 => Ok(Self::V2(Box::new(serde_json::from_value(data.clone())?))),
        }
    }

    /// The generation of this body.
    #[must_use]
    pub const fn version(&self) -> ProtocolVersion {
        match self {
            Self::V1(_) => ProtocolVersion::V1,
            Self::V2(_) => ProtocolVersion::V2,
        }
    }
}

/// A payment payload of either generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentPayloadEnum {
    /// V1 format.
    V1(Box<PaymentPayloadV1>),
    /// V2 format.
    V2(Box<PaymentPayload>),
}

impl PaymentPayloadEnum {
    /// Parses a payment payload, sniffing the generation from
    /// `x402Version`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] on version or shape failure.
    pub fn from_value(data: &Value) -> Result<Self, ProtocolError> {
        match ProtocolVersion::detect(data)? {
            ProtocolVersion::V1 => Ok(Self::V1(Box::new(serde_json::from_value(data.clone())?))),
            ProtocolVersion::V2 => Ok(Self::V2(Box::new(serde_json::from_value(data.clone())?))),
        }
    }

    /// The generation of this payload.
    #[must_use]
    pub const fn version(&self) -> ProtocolVersion {
        match self {
            Self::V1(_) => ProtocolVersion::V1,
            Self::V2(_) => ProtocolVersion::V2,
        }
    }

    /// The payment scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        match self {
            Self::V1(p) => p.scheme(),
            Self::V2(p) => p.scheme(),
        }
    }

    /// The network identifier.
    #[must_use]
    pub fn network(&self) -> &str {
        match self {
            Self::V1(p) => p.network(),
            Self::V2(p) => p.network(),
        }
    }

    /// Typed protocol match against an offer of the same generation.
    ///
    /// Delegates to the per-generation rules: V2 compares the five
    /// protocol-critical fields, V1 only scheme and network. Mixed
    /// generations never match.
    #[must_use]
    pub fn matches(&self, requirements: &PaymentRequirementsEnum) -> bool {
        match (self, requirements) {
            (Self::V1(p), PaymentRequirementsEnum::V1(r)) => p.matches_requirements(r),
            (Self::V2(p), PaymentRequirementsEnum::V2(r)) => p.matches_requirements(r),
            _ => false,
        }
    }
}

/// Payment requirements of either generation.
///
/// Requirements do not carry `x402Version` on the wire; the generation
/// comes from the payload they accompany.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRequirementsEnum {
    /// V1 format.
    V1(Box<PaymentRequirementsV1>),
    /// V2 format.
    V2(Box<PaymentRequirements>),
}

impl PaymentRequirementsEnum {
    /// Parses requirements for the given generation.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] on shape failure.
    pub fn from_value(version: ProtocolVersion, data: &Value) -> Result<Self, ProtocolError> {
        match version {
            ProtocolVersion::V1 => Ok(Self::V1(Box::new(serde_json::from_value(data.clone())?))),
            ProtocolVersion::V2 => Ok(Self::V2(Box::new(serde_json::from_value(data.clone())?))),
        }
    }

    /// The payment scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        match self {
            Self::V1(r) => &r.scheme,
            Self::V2(r) => &r.scheme,
        }
    }

    /// The network identifier.
    #[must_use]
    pub fn network(&self) -> &str {
        match self {
            Self::V1(r) => &r.network,
            Self::V2(r) => &r.network,
        }
    }

    /// The payment amount.
    #[must_use]
    pub fn amount(&self) -> &str {
        match self {
            Self::V1(r) => r.amount(),
            Self::V2(r) => r.amount(),
        }
    }
}
