//! x402 client base logic.
//!
//! Contains shared logic for client implementations: scheme registration,
//! requirement selection policies, and payment creation with the full hook
//! lifecycle. Transport bindings (e.g., an HTTP client middleware) sit on
//! top of [`X402Client`] and only move headers around.

use a402_proto::{
    PaymentPayload, PaymentPayloadV1, PaymentRequired, PaymentRequiredV1, PaymentRequirements,
    PaymentRequirementsV1,
};

use crate::error::{NoMatchingRequirementsError, PaymentAbortedError, SchemeNotFoundError};
use crate::hooks::{
    AbortResult, CreationContext, FailureDetail, PaymentCreatedContext, PaymentCreationContext,
    PaymentCreationFailureContext, PaymentRequiredView, PayloadView, RecoveredPayloadResult,
    RequirementsView,
};
use crate::registry::{SchemeRegistry, SchemeRegistryV1};
use crate::scheme::{BoxFuture, SchemeClient, SchemeClientV1, SchemeError, SchemeId};

/// Policy function that filters and reorders requirements.
///
/// Takes the protocol version and a list of requirements, returns a
/// filtered/reordered list.
pub type PaymentPolicy =
    Box<dyn Fn(u32, Vec<RequirementsView>) -> Vec<RequirementsView> + Send + Sync>;

/// Selector function that picks the final requirement from a filtered list.
pub type PaymentRequirementsSelector = Box<dyn Fn(u32, &[RequirementsView]) -> usize + Send + Sync>;

/// Async hook called before payload creation. Return `Some(AbortResult)` to abort.
pub type BeforePaymentCreationHook =
    Box<dyn Fn(&PaymentCreationContext) -> BoxFuture<'_, Option<AbortResult>> + Send + Sync>;

/// Async hook called after successful payload creation.
pub type AfterPaymentCreationHook =
    Box<dyn Fn(&PaymentCreatedContext) -> BoxFuture<'_, ()> + Send + Sync>;

/// Async hook called on payload creation failure. Return a recovered payload to override.
pub type OnPaymentCreationFailureHook = Box<
    dyn Fn(&PaymentCreationFailureContext) -> BoxFuture<'_, Option<RecoveredPayloadResult>>
        + Send
        + Sync,
>;

/// Creates a policy that prefers a specific network.
///
/// Requirements matching the given network are placed first.
#[must_use]
pub fn prefer_network(network: String) -> PaymentPolicy {
    Box::new(move |_version, reqs| {
        let (mut preferred, others): (Vec<_>, Vec<_>) =
            reqs.into_iter().partition(|r| r.network() == network);
        preferred.extend(others);
        preferred
    })
}

/// Creates a policy that prefers a specific scheme.
///
/// Requirements matching the given scheme are placed first.
#[must_use]
pub fn prefer_scheme(scheme: String) -> PaymentPolicy {
    Box::new(move |_version, reqs| {
        let (mut preferred, others): (Vec<_>, Vec<_>) =
            reqs.into_iter().partition(|r| r.scheme() == scheme);
        preferred.extend(others);
        preferred
    })
}

/// Creates a policy that filters by maximum amount.
///
/// Only requirements with `amount <= max_value` are kept.
#[must_use]
pub fn max_amount(max_value: u128) -> PaymentPolicy {
    Box::new(move |_version, reqs| {
        reqs.into_iter()
            .filter(|r| r.amount().parse::<u128>().is_ok_and(|a| a <= max_value))
            .collect()
    })
}

/// Default selector: returns the first requirement.
const fn default_selector(_version: u32, _reqs: &[RequirementsView]) -> usize {
    0
}

/// x402 client with scheme registration, policy, selection, and payment
/// creation logic.
pub struct X402Client {
    schemes: SchemeRegistry<Box<dyn SchemeClient>>,
    schemes_v1: SchemeRegistryV1<Box<dyn SchemeClientV1>>,
    policies: Vec<PaymentPolicy>,
    selector: PaymentRequirementsSelector,
    before_creation_hooks: Vec<BeforePaymentCreationHook>,
    after_creation_hooks: Vec<AfterPaymentCreationHook>,
    on_creation_failure_hooks: Vec<OnPaymentCreationFailureHook>,
}

impl std::fmt::Debug for X402Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X402Client")
            .field("schemes", &self.schemes)
            .field("schemes_v1", &self.schemes_v1)
            .field("policies_count", &self.policies.len())
            .finish_non_exhaustive()
    }
}

impl Default for X402Client {
    fn default() -> Self {
        Self::new()
    }
}

impl X402Client {
    /// Creates a new client with the default (first match) selector.
    #[must_use]
    pub fn new() -> Self {
        Self::with_selector(Box::new(default_selector))
    }

    /// Creates a new client with a custom selector.
    #[must_use]
    pub fn with_selector(selector: PaymentRequirementsSelector) -> Self {
        Self {
            schemes: SchemeRegistry::new(),
            schemes_v1: SchemeRegistryV1::new(),
            policies: Vec::new(),
            selector,
            before_creation_hooks: Vec::new(),
            after_creation_hooks: Vec::new(),
            on_creation_failure_hooks: Vec::new(),
        }
    }

    /// Registers a V2 scheme client under a network pattern
    /// (e.g., `"algorand:*"` or a full CAIP-2 identifier).
    pub fn register(
        &mut self,
        pattern: impl Into<String>,
        client: Box<dyn SchemeClient>,
    ) -> &mut Self {
        let scheme = client.scheme().to_owned();
        self.schemes.register(scheme, pattern.into(), client);
        self
    }

    /// Registers a V2 scheme client under its own CAIP family pattern.
    pub fn register_family(&mut self, client: Box<dyn SchemeClient>) -> &mut Self {
        let pattern = client.caip_family().to_owned();
        self.register(pattern, client)
    }

    /// Registers a V1 scheme client under a legacy network name.
    pub fn register_v1(
        &mut self,
        network: impl Into<String>,
        client: Box<dyn SchemeClientV1>,
    ) -> &mut Self {
        let scheme = client.scheme().to_owned();
        self.schemes_v1.register(scheme, network, client);
        self
    }

    /// Adds a requirement filter policy.
    pub fn register_policy(&mut self, policy: PaymentPolicy) -> &mut Self {
        self.policies.push(policy);
        self
    }

    /// Registers a before-payment-creation hook.
    pub fn on_payment_creation(&mut self, hook: BeforePaymentCreationHook) -> &mut Self {
        self.before_creation_hooks.push(hook);
        self
    }

    /// Registers an after-payment-creation hook.
    pub fn on_payment_created(&mut self, hook: AfterPaymentCreationHook) -> &mut Self {
        self.after_creation_hooks.push(hook);
        self
    }

    /// Registers a payment-creation-failure hook.
    pub fn on_payment_creation_failure(
        &mut self,
        hook: OnPaymentCreationFailureHook,
    ) -> &mut Self {
        self.on_creation_failure_hooks.push(hook);
        self
    }

    /// Selects V2 requirements using policies and selector.
    ///
    /// # Errors
    ///
    /// Returns [`NoMatchingRequirementsError`] if no requirements match.
    pub fn select_requirements_v2(
        &self,
        requirements: &[PaymentRequirements],
    ) -> Result<PaymentRequirements, NoMatchingRequirementsError> {
        let supported: Vec<RequirementsView> = requirements
            .iter()
            .filter(|req| self.schemes.contains(&req.scheme, &req.network))
            .cloned()
            .map(RequirementsView::V2)
            .collect();

        let filtered = self.apply_policies(2, supported)?;
        let idx = (self.selector)(2, &filtered);
        match filtered.into_iter().nth(idx) {
            Some(RequirementsView::V2(r)) => Ok(r),
            _ => Err(NoMatchingRequirementsError::new(
                "Selector returned invalid index",
            )),
        }
    }

    /// Selects V1 requirements using policies and selector.
    ///
    /// # Errors
    ///
    /// Returns [`NoMatchingRequirementsError`] if no requirements match.
    pub fn select_requirements_v1(
        &self,
        requirements: &[PaymentRequirementsV1],
    ) -> Result<PaymentRequirementsV1, NoMatchingRequirementsError> {
        let supported: Vec<RequirementsView> = requirements
            .iter()
            .filter(|req| self.schemes_v1.lookup(&req.scheme, &req.network).is_some())
            .cloned()
            .map(RequirementsView::V1)
            .collect();

        let filtered = self.apply_policies(1, supported)?;
        let idx = (self.selector)(1, &filtered);
        match filtered.into_iter().nth(idx) {
            Some(RequirementsView::V1(r)) => Ok(r),
            _ => Err(NoMatchingRequirementsError::new(
                "Selector returned invalid index",
            )),
        }
    }

    /// Creates a V2 payment payload from a 402 response.
    ///
    /// The chosen requirements are embedded verbatim as `accepted`, and the
    /// 402's resource URL and extensions are carried over.
    ///
    /// # Errors
    ///
    /// Returns an error if requirement selection fails, no scheme client is
    /// registered, a before hook aborts, or payload creation fails without a
    /// hook recovering.
    pub async fn create_payment_payload_v2(
        &self,
        payment_required: &PaymentRequired,
    ) -> Result<PaymentPayload, SchemeError> {
        let selected = self.select_requirements_v2(&payment_required.accepts)?;

        let client = self
            .schemes
            .lookup(&selected.scheme, &selected.network)
            .ok_or_else(|| SchemeNotFoundError::new(&selected.scheme, &selected.network))?;

        let creation_ctx = CreationContext {
            payment_required: PaymentRequiredView::V2(payment_required.clone()),
            selected_requirements: RequirementsView::V2(selected.clone()),
            outcome: (),
        };
        for hook in &self.before_creation_hooks {
            if let Some(abort) = hook(&creation_ctx).await {
                return Err(Box::new(PaymentAbortedError::new(abort.reason)));
            }
        }

        match client.create_payment_payload(&selected).await {
            Ok(inner_payload) => {
                let payload = PaymentPayload {
                    x402_version: 2,
                    accepted: selected,
                    payload: inner_payload.into_value(),
                    resource: payment_required.resource.clone(),
                    extensions: payment_required.extensions.clone(),
                };
                let created_ctx = creation_ctx
                    .with_outcome(PayloadView::V2(Box::new(payload.clone())));
                for hook in &self.after_creation_hooks {
                    hook(&created_ctx).await;
                }
                Ok(payload)
            }
            Err(e) => {
                let failure_ctx =
                    creation_ctx.with_outcome(FailureDetail::new(e.to_string()));
                for hook in &self.on_creation_failure_hooks {
                    if let Some(RecoveredPayloadResult::V2(recovered)) = hook(&failure_ctx).await {
                        return Ok(*recovered);
                    }
                }
                Err(e)
            }
        }
    }

    /// Creates a V1 payment payload from a V1 402 response.
    ///
    /// # Errors
    ///
    /// Returns an error if requirement selection fails, no scheme client is
    /// registered, a before hook aborts, or payload creation fails without a
    /// hook recovering.
    pub async fn create_payment_payload_v1(
        &self,
        payment_required: &PaymentRequiredV1,
    ) -> Result<PaymentPayloadV1, SchemeError> {
        let selected = self.select_requirements_v1(&payment_required.accepts)?;

        let client = self
            .schemes_v1
            .lookup(&selected.scheme, &selected.network)
            .ok_or_else(|| SchemeNotFoundError::new(&selected.scheme, &selected.network))?;

        let creation_ctx = CreationContext {
            payment_required: PaymentRequiredView::V1(payment_required.clone()),
            selected_requirements: RequirementsView::V1(selected.clone()),
            outcome: (),
        };
        for hook in &self.before_creation_hooks {
            if let Some(abort) = hook(&creation_ctx).await {
                return Err(Box::new(PaymentAbortedError::new(abort.reason)));
            }
        }

        match client.create_payment_payload(&selected).await {
            Ok(inner_payload) => {
                let payload = PaymentPayloadV1 {
                    x402_version: 1,
                    scheme: selected.scheme,
                    network: selected.network,
                    payload: inner_payload.into_value(),
                };
                let created_ctx = creation_ctx.with_outcome(PayloadView::V1(payload.clone()));
                for hook in &self.after_creation_hooks {
                    hook(&created_ctx).await;
                }
                Ok(payload)
            }
            Err(e) => {
                let failure_ctx =
                    creation_ctx.with_outcome(FailureDetail::new(e.to_string()));
                for hook in &self.on_creation_failure_hooks {
                    if let Some(RecoveredPayloadResult::V1(recovered)) = hook(&failure_ctx).await {
                        return Ok(recovered);
                    }
                }
                Err(e)
            }
        }
    }

    fn apply_policies(
        &self,
        version: u32,
        supported: Vec<RequirementsView>,
    ) -> Result<Vec<RequirementsView>, NoMatchingRequirementsError> {
        if supported.is_empty() {
            return Err(NoMatchingRequirementsError::new(
                "No payment requirements match registered schemes",
            ));
        }

        let mut filtered = supported;
        for policy in &self.policies {
            filtered = policy(version, filtered);
            if filtered.is_empty() {
                return Err(NoMatchingRequirementsError::new(
                    "All requirements filtered out by policies",
                ));
            }
        }
        Ok(filtered)
    }
}
