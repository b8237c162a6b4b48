//! Protocol generation detection.
//!
//! Wire messages carry their generation in `x402Version`, but verify/settle
//! request bodies nest it inside `paymentPayload` — and some V1 senders omit
//! it entirely, in which case the legacy `maxAmountRequired` key in the
//! requirements gives the generation away. [`ProtocolVersion`] centralizes
//! both sniffs so no caller branches on raw JSON.

use serde_json::Value;

use crate::ProtocolError;

/// The two wire generations of the x402 protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// Legacy: network names, `maxAmountRequired`, flat payloads.
    V1,
    /// Current: CAIP-2 networks, typed amounts, embedded `accepted` copy.
    V2,
}

impl ProtocolVersion {
    /// Reads the `x402Version` field of a protocol message.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MissingVersion`] if the field is absent and
    /// [`ProtocolError::InvalidVersion`] for anything but 1 or 2.
    pub fn detect(data: &Value) -> Result<Self, ProtocolError> {
        let version = data
            .get("x402Version")
            .ok_or(ProtocolError::MissingVersion)?;
        let number = version.as_u64().ok_or(ProtocolError::InvalidVersion(0))?;
        Self::try_from(number)
    }

    /// Classifies a verify/settle request body by shape.
    ///
    /// V2 bodies declare themselves inside `paymentPayload`; V1 bodies
    /// either do the same (value 1) or are recognized by the legacy
    /// `maxAmountRequired` key in their requirements.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MissingVersion`] if the body matches
    /// neither shape.
    pub fn of_request(body: &Value) -> Result<Self, ProtocolError> {
        if let Some(payload) = body.get("paymentPayload")
            && let Ok(version) = Self::detect(payload)
        {
            return Ok(version);
        }
        if body
            .get("paymentRequirements")
            .and_then(|r| r.get("maxAmountRequired"))
            .is_some()
        {
            return Ok(Self::V1);
        }
        Err(ProtocolError::MissingVersion)
    }

    /// The wire number of this generation.
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }
}

impl TryFrom<u64> for ProtocolVersion {
    type Error = ProtocolError;

    fn try_from(value: u64) -> Result<Self, ProtocolError> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(ProtocolError::InvalidVersion(
                u32::try_from(other).unwrap_or(u32::MAX),
            )),
        }
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_accepts_only_known_generations() {
        assert_eq!(
            ProtocolVersion::detect(&serde_json::json!({"x402Version": 1})).unwrap(),
            ProtocolVersion::V1
        );
        assert_eq!(
            ProtocolVersion::detect(&serde_json::json!({"x402Version": 2})).unwrap(),
            ProtocolVersion::V2
        );
        assert!(ProtocolVersion::detect(&serde_json::json!({"x402Version": 3})).is_err());
        assert!(ProtocolVersion::detect(&serde_json::json!({})).is_err());
    }

    #[test]
    fn request_classification_by_shape() {
        let v2 = serde_json::json!({
            "paymentPayload": {"x402Version": 2},
            "paymentRequirements": {"amount": "1000"},
        });
        assert_eq!(ProtocolVersion::of_request(&v2).unwrap(), ProtocolVersion::V2);

        // Declared V1.
        let declared = serde_json::json!({
            "paymentPayload": {"x402Version": 1},
            "paymentRequirements": {"maxAmountRequired": "1000"},
        });
        assert_eq!(
            ProtocolVersion::of_request(&declared).unwrap(),
            ProtocolVersion::V1
        );

        // Undeclared V1, recognized by the legacy amount key.
        let legacy = serde_json::json!({
            "paymentPayload": {"scheme": "exact", "network": "algorand-testnet"},
            "paymentRequirements": {"maxAmountRequired": "1000"},
        });
        assert_eq!(
            ProtocolVersion::of_request(&legacy).unwrap(),
            ProtocolVersion::V1
        );

        assert!(ProtocolVersion::of_request(&serde_json::json!({"nope": 1})).is_err());
    }

    #[test]
    fn wire_numbers() {
        assert_eq!(ProtocolVersion::V1.number(), 1);
        assert_eq!(ProtocolVersion::V2.number(), 2);
        assert_eq!(ProtocolVersion::try_from(2u64).unwrap(), ProtocolVersion::V2);
        assert!(ProtocolVersion::try_from(0u64).is_err());
        assert!(ProtocolVersion::try_from(u64::MAX).is_err());
    }
}
