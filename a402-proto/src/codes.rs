//! Protocol-level error code strings.
//!
//! These codes travel in `VerifyResponse.invalidReason`,
//! `SettleResponse.errorReason`, and the `error` field of 402 envelopes.
//! Scheme implementations define additional, scheme-specific codes.

/// A protected resource requires payment.
pub const PAYMENT_REQUIRED: &str = "payment_required";

/// The `X-PAYMENT` header could not be decoded.
pub const INVALID_PAYMENT_HEADER: &str = "invalid_payment_header";

/// The payload's accepted requirements match none of the offered options.
pub const PAYMENT_REQUIREMENTS_MISMATCH: &str = "payment_requirements_mismatch";

/// No handler is registered for the requested scheme.
pub const UNSUPPORTED_SCHEME: &str = "unsupported_scheme";

/// The payload and requirements name different networks.
pub const NETWORK_MISMATCH: &str = "network_mismatch";
