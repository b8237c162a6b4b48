//! Lifecycle hook contexts and results.
//!
//! Every externally observable operation — payload creation on the client,
//! verify and settle everywhere else — is framed by before/after/failure
//! hooks. A hook observes one [`HookContext`] (or [`CreationContext`] on the
//! client), whose `Outcome` parameter tracks the operation's phase: `()`
//! before it runs, the response after success, [`FailureDetail`] on failure.
//! Contexts are value types, so hook mutations never leak back into the
//! operation.
//!
//! The payload and requirements views expose what payment hooks actually
//! want to look at — the payer-facing offer fields, the advertised fee
//! payer, and for group-based schemes like AVM the shape of the transaction
//! group — without hooks re-parsing wire JSON.

use a402_proto::{
    PaymentPayload, PaymentPayloadV1, PaymentRequired, PaymentRequiredV1, PaymentRequirements,
    PaymentRequirementsV1, SettleResponse, VerifyResponse,
};
use serde_json::Value;

use crate::scheme::BoxFuture;

/// Async hook called before verification. Return `Some(AbortResult)` to abort.
pub type BeforeVerifyHook =
    Box<dyn Fn(&VerifyContext) -> BoxFuture<'_, Option<AbortResult>> + Send + Sync>;

/// Async hook called after successful verification.
pub type AfterVerifyHook = Box<dyn Fn(&VerifyResultContext) -> BoxFuture<'_, ()> + Send + Sync>;

/// Async hook called on verification failure. Return recovery result to override.
pub type OnVerifyFailureHook = Box<
    dyn Fn(&VerifyFailureContext) -> BoxFuture<'_, Option<RecoveredVerifyResult>> + Send + Sync,
>;

/// Async hook called before settlement. Return `Some(AbortResult)` to abort.
pub type BeforeSettleHook =
    Box<dyn Fn(&SettleContext) -> BoxFuture<'_, Option<AbortResult>> + Send + Sync>;

/// Async hook called after successful settlement.
pub type AfterSettleHook = Box<dyn Fn(&SettleResultContext) -> BoxFuture<'_, ()> + Send + Sync>;

/// Async hook called on settlement failure. Return recovery result to override.
pub type OnSettleFailureHook = Box<
    dyn Fn(&SettleFailureContext) -> BoxFuture<'_, Option<RecoveredSettleResult>> + Send + Sync,
>;

/// Return from a before-hook to abort the operation.
#[derive(Debug, Clone)]
pub struct AbortResult {
    /// Machine-readable reason for aborting.
    pub reason: String,
}

impl AbortResult {
    /// Creates a new abort result.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Return from a client failure hook to recover with a payload.
#[derive(Debug, Clone)]
pub enum RecoveredPayloadResult {
    /// Recovered V2 payload.
    V2(Box<PaymentPayload>),
    /// Recovered V1 payload.
    V1(PaymentPayloadV1),
}

/// Return from a verify failure hook to recover with a result.
#[derive(Debug, Clone)]
pub struct RecoveredVerifyResult {
    /// The recovered verify response.
    pub result: VerifyResponse,
}

/// Return from a settle failure hook to recover with a result.
#[derive(Debug, Clone)]
pub struct RecoveredSettleResult {
    /// The recovered settle response.
    pub result: SettleResponse,
}

/// Why an operation failed, as observed by failure hooks.
#[derive(Debug, Clone)]
pub struct FailureDetail {
    /// Machine-readable failure code (e.g., `amount_insufficient`,
    /// `rekey_detected`) or error description.
    pub reason: String,
    /// Human-readable detail, when the scheme provided one.
    pub message: Option<String>,
}

impl FailureDetail {
    /// Creates a failure detail with no message.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            message: None,
        }
    }
}

/// Context around a verify or settle operation.
///
/// `Outcome` is `()` before the operation, the response type after success,
/// and [`FailureDetail`] on failure.
#[derive(Debug, Clone)]
pub struct HookContext<Outcome = ()> {
    /// The payment payload being processed.
    pub payment_payload: PayloadView,
    /// The requirements it is processed against.
    pub requirements: RequirementsView,
    /// Phase-specific outcome data.
    pub outcome: Outcome,
}

impl HookContext {
    /// Attaches an outcome, moving the context into its next phase.
    #[must_use]
    pub fn with_outcome<Outcome>(self, outcome: Outcome) -> HookContext<Outcome> {
        HookContext {
            payment_payload: self.payment_payload,
            requirements: self.requirements,
            outcome,
        }
    }
}

/// Context for before-verify hooks.
pub type VerifyContext = HookContext;
/// Context for after-verify hooks.
pub type VerifyResultContext = HookContext<VerifyResponse>;
/// Context for verify-failure hooks.
pub type VerifyFailureContext = HookContext<FailureDetail>;
/// Context for before-settle hooks.
pub type SettleContext = HookContext;
/// Context for after-settle hooks.
pub type SettleResultContext = HookContext<SettleResponse>;
/// Context for settle-failure hooks.
pub type SettleFailureContext = HookContext<FailureDetail>;

/// Context around client-side payment creation.
///
/// `Outcome` is `()` before creation, the created payload after success,
/// and [`FailureDetail`] on failure.
#[derive(Debug, Clone)]
pub struct CreationContext<Outcome = ()> {
    /// The 402 response from the server.
    pub payment_required: PaymentRequiredView,
    /// The offer the selection policy chose.
    pub selected_requirements: RequirementsView,
    /// Phase-specific outcome data.
    pub outcome: Outcome,
}

impl CreationContext {
    /// Attaches an outcome, moving the context into its next phase.
    #[must_use]
    pub fn with_outcome<Outcome>(self, outcome: Outcome) -> CreationContext<Outcome> {
        CreationContext {
            payment_required: self.payment_required,
            selected_requirements: self.selected_requirements,
            outcome,
        }
    }
}

/// Context for before-payment-creation hooks.
pub type PaymentCreationContext = CreationContext;
/// Context for after-payment-creation hooks.
pub type PaymentCreatedContext = CreationContext<PayloadView>;
/// Context for payment-creation-failure hooks.
pub type PaymentCreationFailureContext = CreationContext<FailureDetail>;

/// Version-agnostic view of a payment payload.
#[derive(Debug, Clone)]
pub enum PayloadView {
    /// V2 payload.
    V2(Box<PaymentPayload>),
    /// V1 payload.
    V1(PaymentPayloadV1),
}

impl PayloadView {
    /// Returns the payment scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        match self {
            Self::V2(p) => p.scheme(),
            Self::V1(p) => p.scheme(),
        }
    }

    /// Returns the network identifier.
    #[must_use]
    pub fn network(&self) -> &str {
        match self {
            Self::V2(p) => p.network(),
            Self::V1(p) => p.network(),
        }
    }

    /// Returns the scheme-defined inner payload.
    #[must_use]
    pub fn inner_payload(&self) -> &Value {
        match self {
            Self::V2(p) => &p.payload,
            Self::V1(p) => &p.payload,
        }
    }

    /// For group-based schemes (AVM): the number of transactions in the
    /// atomic group, read from the inner payload's `paymentGroup`.
    #[must_use]
    pub fn group_size(&self) -> Option<usize> {
        Some(self.inner_payload().get("paymentGroup")?.as_array()?.len())
    }

    /// For group-based schemes (AVM): the index of the value-moving
    /// transaction, read from the inner payload's `paymentIndex`.
    #[must_use]
    pub fn payment_index(&self) -> Option<usize> {
        let index = self.inner_payload().get("paymentIndex")?.as_u64()?;
        usize::try_from(index).ok()
    }
}

/// Version-agnostic view of a payment required response.
#[derive(Debug, Clone)]
pub enum PaymentRequiredView {
    /// V2 payment required.
    V2(PaymentRequired),
    /// V1 payment required.
    V1(PaymentRequiredV1),
}

/// Version-agnostic view of payment requirements.
#[derive(Debug, Clone)]
pub enum RequirementsView {
    /// V2 requirements.
    V2(PaymentRequirements),
    /// V1 requirements.
    V1(PaymentRequirementsV1),
}

impl RequirementsView {
    /// Returns the scheme identifier.
    #[must_use]
    pub fn scheme(&self) -> &str {
        match self {
            Self::V2(r) => &r.scheme,
            Self::V1(r) => &r.scheme,
        }
    }

    /// Returns the network identifier.
    #[must_use]
    pub fn network(&self) -> &str {
        match self {
            Self::V2(r) => &r.network,
            Self::V1(r) => &r.network,
        }
    }

    /// Returns the payment amount as a string.
    #[must_use]
    pub fn amount(&self) -> &str {
        match self {
            Self::V2(r) => r.amount(),
            Self::V1(r) => r.amount(),
        }
    }

    /// Returns the recipient address.
    #[must_use]
    pub fn pay_to(&self) -> &str {
        match self {
            Self::V2(r) => &r.pay_to,
            Self::V1(r) => &r.pay_to,
        }
    }

    /// Returns the asset identifier.
    #[must_use]
    pub fn asset(&self) -> &str {
        match self {
            Self::V2(r) => &r.asset,
            Self::V1(r) => &r.asset,
        }
    }

    /// Returns the fee payer advertised for fee abstraction, when present.
    #[must_use]
    pub fn fee_payer(&self) -> Option<&str> {
        let extra = match self {
            Self::V2(r) => r.extra.as_ref()?,
            Self::V1(r) => r.extra.as_ref()?,
        };
        extra.get("feePayer")?.as_str()
    }
}
