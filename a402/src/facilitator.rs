//! x402 facilitator engine.
//!
//! [`X402Facilitator`] owns the scheme handler registries and dispatches
//! verify/settle requests to the handler resolved for the payment's scheme
//! and network, framing every operation with the before/after/failure hook
//! lifecycle. It also assembles the `supported` catalogue advertised to
//! resource servers.

use std::collections::HashMap;
use std::sync::Arc;

use a402_proto::{
    PaymentPayload, PaymentPayloadV1, PaymentRequirements, PaymentRequirementsV1, SettleResponse,
    SupportedResponse, VerifyResponse,
};

use crate::error::{PaymentAbortedError, SchemeNotFoundError};
use crate::hooks::{
    AfterSettleHook, AfterVerifyHook, BeforeSettleHook, BeforeVerifyHook, FailureDetail,
    OnSettleFailureHook, OnVerifyFailureHook, PayloadView, RequirementsView, SettleContext,
    VerifyContext,
};
use crate::registry::{SchemeRegistry, SchemeRegistryV1};
use crate::scheme::{SchemeError, SchemeFacilitator, SchemeFacilitatorV1, SchemeId};

/// x402 facilitator engine: verify/settle dispatch with lifecycle hooks.
///
/// Handlers are registered at process startup; the registries are read-only
/// afterwards. The same handler instance may back several networks (pass all
/// of them to [`register`](Self::register)).
pub struct X402Facilitator {
    schemes: SchemeRegistry<Arc<dyn SchemeFacilitator>>,
    schemes_v1: SchemeRegistryV1<Arc<dyn SchemeFacilitatorV1>>,
    extensions: Vec<String>,
    before_verify_hooks: Vec<BeforeVerifyHook>,
    after_verify_hooks: Vec<AfterVerifyHook>,
    on_verify_failure_hooks: Vec<OnVerifyFailureHook>,
    before_settle_hooks: Vec<BeforeSettleHook>,
    after_settle_hooks: Vec<AfterSettleHook>,
    on_settle_failure_hooks: Vec<OnSettleFailureHook>,
}

impl std::fmt::Debug for X402Facilitator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X402Facilitator")
            .field("schemes", &self.schemes)
            .field("schemes_v1", &self.schemes_v1)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl Default for X402Facilitator {
    fn default() -> Self {
        Self::new()
    }
}

impl X402Facilitator {
    /// Creates an empty facilitator engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schemes: SchemeRegistry::new(),
            schemes_v1: SchemeRegistryV1::new(),
            extensions: Vec::new(),
            before_verify_hooks: Vec::new(),
            after_verify_hooks: Vec::new(),
            on_verify_failure_hooks: Vec::new(),
            before_settle_hooks: Vec::new(),
            after_settle_hooks: Vec::new(),
            on_settle_failure_hooks: Vec::new(),
        }
    }

    /// Registers a V2 scheme handler for one or more networks.
    ///
    /// Networks are concrete CAIP-2 identifiers or patterns; the handler's
    /// own scheme name keys the rows.
    pub fn register(
        &mut self,
        networks: Vec<String>,
        handler: Arc<dyn SchemeFacilitator>,
    ) -> &mut Self {
        let scheme = handler.scheme().to_owned();
        for network in networks {
            self.schemes
                .register(scheme.clone(), network, Arc::clone(&handler));
        }
        self
    }

    /// Registers a V1 scheme handler for one or more legacy network names.
    pub fn register_v1(
        &mut self,
        networks: Vec<String>,
        handler: Arc<dyn SchemeFacilitatorV1>,
    ) -> &mut Self {
        let scheme = handler.scheme().to_owned();
        for network in networks {
            self.schemes_v1
                .register(scheme.clone(), network, Arc::clone(&handler));
        }
        self
    }

    /// Declares a supported protocol extension key.
    pub fn declare_extension(&mut self, key: impl Into<String>) -> &mut Self {
        self.extensions.push(key.into());
        self
    }

    /// Registers a before-verify hook.
    pub fn on_before_verify(&mut self, hook: BeforeVerifyHook) -> &mut Self {
        self.before_verify_hooks.push(hook);
        self
    }

    /// Registers an after-verify hook.
    pub fn on_after_verify(&mut self, hook: AfterVerifyHook) -> &mut Self {
        self.after_verify_hooks.push(hook);
        self
    }

    /// Registers a verify-failure hook.
    pub fn on_verify_failure(&mut self, hook: OnVerifyFailureHook) -> &mut Self {
        self.on_verify_failure_hooks.push(hook);
        self
    }

    /// Registers a before-settle hook.
    pub fn on_before_settle(&mut self, hook: BeforeSettleHook) -> &mut Self {
        self.before_settle_hooks.push(hook);
        self
    }

    /// Registers an after-settle hook.
    pub fn on_after_settle(&mut self, hook: AfterSettleHook) -> &mut Self {
        self.after_settle_hooks.push(hook);
        self
    }

    /// Registers a settle-failure hook.
    pub fn on_settle_failure(&mut self, hook: OnSettleFailureHook) -> &mut Self {
        self.on_settle_failure_hooks.push(hook);
        self
    }

    /// Verifies a V2 payment via the handler registered for its
    /// scheme/network, with full hook lifecycle.
    ///
    /// Validation failures come back as `is_valid: false` responses; an
    /// `Err` means no handler is registered or a hook aborted.
    ///
    /// # Errors
    ///
    /// Returns [`SchemeNotFoundError`] if no handler matches, or
    /// [`PaymentAbortedError`] if a before hook aborts.
    pub async fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse, SchemeError> {
        let handler = self
            .schemes
            .lookup(payload.scheme(), payload.network())
            .ok_or_else(|| SchemeNotFoundError::new(payload.scheme(), payload.network()))?;

        let ctx = VerifyContext {
            payment_payload: PayloadView::V2(Box::new(payload.clone())),
            requirements: RequirementsView::V2(requirements.clone()),
            outcome: (),
        };

        for hook in &self.before_verify_hooks {
            if let Some(abort) = hook(&ctx).await {
                return Err(Box::new(PaymentAbortedError::new(abort.reason)));
            }
        }

        let response = handler.verify(payload, requirements).await;
        self.finish_verify(ctx, response).await
    }

    /// Verifies a V1 payment via the legacy registry, with full hook
    /// lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`SchemeNotFoundError`] if no handler matches, or
    /// [`PaymentAbortedError`] if a before hook aborts.
    pub async fn verify_v1(
        &self,
        payload: &PaymentPayloadV1,
        requirements: &PaymentRequirementsV1,
    ) -> Result<VerifyResponse, SchemeError> {
        let handler = self
            .schemes_v1
            .lookup(payload.scheme(), payload.network())
            .ok_or_else(|| SchemeNotFoundError::new(payload.scheme(), payload.network()))?;

        let ctx = VerifyContext {
            payment_payload: PayloadView::V1(payload.clone()),
            requirements: RequirementsView::V1(requirements.clone()),
            outcome: (),
        };

        for hook in &self.before_verify_hooks {
            if let Some(abort) = hook(&ctx).await {
                return Err(Box::new(PaymentAbortedError::new(abort.reason)));
            }
        }

        let response = handler.verify(payload, requirements).await;
        self.finish_verify(ctx, response).await
    }

    /// Settles a V2 payment via the handler registered for its
    /// scheme/network, with full hook lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`SchemeNotFoundError`] if no handler matches, or
    /// [`PaymentAbortedError`] if a before hook aborts.
    pub async fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse, SchemeError> {
        let handler = self
            .schemes
            .lookup(payload.scheme(), payload.network())
            .ok_or_else(|| SchemeNotFoundError::new(payload.scheme(), payload.network()))?;

        let ctx = SettleContext {
            payment_payload: PayloadView::V2(Box::new(payload.clone())),
            requirements: RequirementsView::V2(requirements.clone()),
            outcome: (),
        };

        for hook in &self.before_settle_hooks {
            if let Some(abort) = hook(&ctx).await {
                return Err(Box::new(PaymentAbortedError::new(abort.reason)));
            }
        }

        let response = handler.settle(payload, requirements).await;
        self.finish_settle(ctx, response).await
    }

    /// Settles a V1 payment via the legacy registry, with full hook
    /// lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`SchemeNotFoundError`] if no handler matches, or
    /// [`PaymentAbortedError`] if a before hook aborts.
    pub async fn settle_v1(
        &self,
        payload: &PaymentPayloadV1,
        requirements: &PaymentRequirementsV1,
    ) -> Result<SettleResponse, SchemeError> {
        let handler = self
            .schemes_v1
            .lookup(payload.scheme(), payload.network())
            .ok_or_else(|| SchemeNotFoundError::new(payload.scheme(), payload.network()))?;

        let ctx = SettleContext {
            payment_payload: PayloadView::V1(payload.clone()),
            requirements: RequirementsView::V1(requirements.clone()),
            outcome: (),
        };

        for hook in &self.before_settle_hooks {
            if let Some(abort) = hook(&ctx).await {
                return Err(Box::new(PaymentAbortedError::new(abort.reason)));
            }
        }

        let response = handler.settle(payload, requirements).await;
        self.finish_settle(ctx, response).await
    }

    /// Assembles the supported-kinds catalogue.
    ///
    /// Each concrete registered route contributes the handler's own
    /// [`supported_kind`](SchemeFacilitator::supported_kind) row (AVM
    /// handlers publish a fee payer address in its `extra`). Signer
    /// addresses are grouped by the handler's CAIP family pattern.
    #[must_use]
    pub fn get_supported(&self) -> SupportedResponse {
        let mut kinds = Vec::new();
        let mut signers: HashMap<String, Vec<String>> = HashMap::new();

        for (_, network, handler) in self.schemes.registered() {
            kinds.push(handler.supported_kind(network));
            let family = signers.entry(handler.caip_family().to_owned()).or_default();
            for address in handler.get_signers(network) {
                if !family.contains(&address) {
                    family.push(address);
                }
            }
        }

        for (_, network, handler) in self.schemes_v1.registered() {
            kinds.push(handler.supported_kind(network));
            let family = signers.entry(handler.caip_family().to_owned()).or_default();
            for address in handler.get_signers(network) {
                if !family.contains(&address) {
                    family.push(address);
                }
            }
        }

        SupportedResponse {
            kinds,
            extensions: self.extensions.clone(),
            signers,
        }
    }

    async fn finish_verify(
        &self,
        ctx: VerifyContext,
        response: VerifyResponse,
    ) -> Result<VerifyResponse, SchemeError> {
        if response.is_valid {
            let result_ctx = ctx.with_outcome(response.clone());
            for hook in &self.after_verify_hooks {
                hook(&result_ctx).await;
            }
            Ok(response)
        } else {
            let failure_ctx = ctx.with_outcome(FailureDetail {
                reason: response.invalid_reason.clone().unwrap_or_default(),
                message: response.invalid_message.clone(),
            });
            for hook in &self.on_verify_failure_hooks {
                if let Some(recovered) = hook(&failure_ctx).await {
                    return Ok(recovered.result);
                }
            }
            Ok(response)
        }
    }

    async fn finish_settle(
        &self,
        ctx: SettleContext,
        response: SettleResponse,
    ) -> Result<SettleResponse, SchemeError> {
        if response.success {
            let result_ctx = ctx.with_outcome(response.clone());
            for hook in &self.after_settle_hooks {
                hook(&result_ctx).await;
            }
            Ok(response)
        } else {
            let failure_ctx = ctx.with_outcome(FailureDetail {
                reason: response.error_reason.clone().unwrap_or_default(),
                message: response.error_message.clone(),
            });
            for hook in &self.on_settle_failure_hooks {
                if let Some(recovered) = hook(&failure_ctx).await {
                    return Ok(recovered.result);
                }
            }
            Ok(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{AbortResult, RecoveredVerifyResult};
    use crate::scheme::BoxFuture;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubFacilitatorScheme {
        name: &'static str,
        valid: bool,
        verify_calls: AtomicUsize,
    }

    impl StubFacilitatorScheme {
        fn new(name: &'static str, valid: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                valid,
                verify_calls: AtomicUsize::new(0),
            })
        }
    }

    impl SchemeId for StubFacilitatorScheme {
        fn scheme(&self) -> &str {
            "exact"
        }

        fn caip_family(&self) -> &str {
            "algorand:*"
        }
    }

    impl SchemeFacilitator for StubFacilitatorScheme {
        fn get_extra(&self, _network: &str) -> Option<Value> {
            Some(serde_json::json!({"feePayer": self.name}))
        }

        fn get_signers(&self, _network: &str) -> Vec<String> {
            vec![self.name.to_owned()]
        }

        fn verify<'a>(
            &'a self,
            _payload: &'a PaymentPayload,
            _requirements: &'a PaymentRequirements,
        ) -> BoxFuture<'a, VerifyResponse> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            let response = if self.valid {
                VerifyResponse::valid(self.name)
            } else {
                VerifyResponse::invalid("amount_insufficient")
            };
            Box::pin(async move { response })
        }

        fn settle<'a>(
            &'a self,
            payload: &'a PaymentPayload,
            _requirements: &'a PaymentRequirements,
        ) -> BoxFuture<'a, SettleResponse> {
            let name = self.name;
            Box::pin(async move {
                SettleResponse::success("TXID", payload.network().to_owned(), name)
            })
        }
    }

    fn requirements(network: &str) -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".into(),
            network: network.into(),
            amount: "1000".into(),
            pay_to: "RECEIVER".into(),
            max_timeout_seconds: 300,
            asset: "10458941".into(),
            extra: None,
        }
    }

    fn payload(network: &str) -> PaymentPayload {
        PaymentPayload {
            x402_version: 2,
            accepted: requirements(network),
            payload: serde_json::json!({}),
            resource: None,
            extensions: None,
        }
    }

    #[tokio::test]
    async fn dispatch_prefers_specific_network_row() {
        let family = StubFacilitatorScheme::new("FAMILY", true);
        let mainnet = StubFacilitatorScheme::new("MAINNET", true);

        let mut facilitator = X402Facilitator::new();
        facilitator.register(vec!["algorand:*".into()], family.clone());
        facilitator.register(vec!["algorand:mainnethash".into()], mainnet.clone());

        let response = facilitator
            .verify(&payload("algorand:mainnethash"), &requirements("algorand:mainnethash"))
            .await
            .unwrap();
        assert_eq!(response.payer.as_deref(), Some("MAINNET"));

        let response = facilitator
            .verify(&payload("algorand:otherhash"), &requirements("algorand:otherhash"))
            .await
            .unwrap();
        assert_eq!(response.payer.as_deref(), Some("FAMILY"));

        assert_eq!(mainnet.verify_calls.load(Ordering::SeqCst), 1);
        assert_eq!(family.verify_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_scheme_is_an_error_not_a_response() {
        let facilitator = X402Facilitator::new();
        let err = facilitator
            .verify(&payload("algorand:net"), &requirements("algorand:net"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No scheme"));
    }

    #[tokio::test]
    async fn before_verify_abort_short_circuits_handler() {
        let handler = StubFacilitatorScheme::new("H", true);
        let mut facilitator = X402Facilitator::new();
        facilitator.register(vec!["algorand:*".into()], handler.clone());
        facilitator.on_before_verify(Box::new(|_ctx| {
            Box::pin(async { Some(AbortResult::new("blocked payer")) })
        }));

        let err = facilitator
            .verify(&payload("algorand:net"), &requirements("algorand:net"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("blocked payer"));
        assert_eq!(handler.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn verify_failure_hook_substitutes_response() {
        let mut facilitator = X402Facilitator::new();
        facilitator.register(
            vec!["algorand:*".into()],
            StubFacilitatorScheme::new("H", false),
        );
        facilitator.on_verify_failure(Box::new(|ctx| {
            assert_eq!(ctx.outcome.reason, "amount_insufficient");
            Box::pin(async {
                Some(RecoveredVerifyResult {
                    result: VerifyResponse::valid("RECOVERED"),
                })
            })
        }));

        let response = facilitator
            .verify(&payload("algorand:net"), &requirements("algorand:net"))
            .await
            .unwrap();
        assert!(response.is_valid);
        assert_eq!(response.payer.as_deref(), Some("RECOVERED"));
    }

    #[tokio::test]
    async fn supported_lists_concrete_routes_with_extra_and_signers() {
        let mut facilitator = X402Facilitator::new();
        facilitator.register(
            vec!["algorand:net".into(), "algorand:*".into()],
            StubFacilitatorScheme::new("FEEPAYER", true),
        );
        facilitator.declare_extension("bazaar");

        let supported = facilitator.get_supported();
        // The wildcard row resolves lookups but advertises nothing.
        assert_eq!(supported.kinds.len(), 1);
        assert_eq!(supported.kinds[0].network, "algorand:net");
        assert_eq!(supported.kinds[0].x402_version, 2);
        assert_eq!(
            supported.kinds[0].extra.as_ref().unwrap()["feePayer"],
            "FEEPAYER"
        );
        assert_eq!(supported.extensions, vec!["bazaar".to_owned()]);
        assert_eq!(
            supported.signers.get("algorand:*").map(Vec::as_slice),
            Some(&["FEEPAYER".to_owned()][..])
        );
    }
}
