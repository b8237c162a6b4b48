//! x402 resource server base logic.
//!
//! Contains the async-first x402 resource server: scheme server registration,
//! facilitator client initialization, payment requirement building, 402
//! envelope construction, payload matching, and verify/settle delegation with
//! the full hook lifecycle. HTTP framework adapters sit on top of
//! [`X402ResourceServer`] and only translate requests and responses.

use std::collections::HashMap;

use a402_proto::codes::PAYMENT_REQUIRED;
use a402_proto::pattern::NetworkPattern;
use a402_proto::{
    Network, PaymentPayload, PaymentRequired, PaymentRequirements, SettleResponse, SupportedKind,
    SupportedResponse, VerifyResponse,
};

use crate::config::ResourceConfig;
use crate::error::{PaymentAbortedError, SchemeNotFoundError};
use crate::hooks::{
    AfterSettleHook, AfterVerifyHook, BeforeSettleHook, BeforeVerifyHook, FailureDetail,
    HookContext, OnSettleFailureHook, OnVerifyFailureHook, PayloadView, RequirementsView,
};
use crate::registry::SchemeRegistry;
use crate::scheme::{AssetAmount, BoxFuture, Price, SchemeError, SchemeId, SchemeServer};

/// Async facilitator client trait for resource servers.
///
/// Resource servers delegate verify/settle to a facilitator via this trait.
/// Implementations typically make HTTP calls to a facilitator service.
pub trait FacilitatorClient: Send + Sync {
    /// Verifies a V2 payment asynchronously.
    fn verify<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<VerifyResponse, SchemeError>>;

    /// Settles a V2 payment asynchronously.
    fn settle<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SettleResponse, SchemeError>>;

    /// Returns the supported payment kinds asynchronously.
    ///
    /// Called during [`X402ResourceServer::initialize`] to discover which
    /// (scheme, network) pairs the facilitator can handle.
    fn get_supported(&self) -> BoxFuture<'_, Result<SupportedResponse, SchemeError>>;
}

/// Extension interface for enriching payment declarations with
/// transport-specific data (e.g., HTTP request context).
pub trait ResourceServerExtension: Send + Sync {
    /// Unique extension key (e.g., `"bazaar"`).
    fn key(&self) -> &str;

    /// Enriches an extension declaration with transport-specific data.
    ///
    /// Called by the HTTP server middleware before building the 402 response.
    ///
    /// - `declaration` — the extension declaration from the route config.
    /// - `transport_context` — opaque transport context (e.g., serialized
    ///   HTTP request metadata).
    fn enrich_declaration(
        &self,
        declaration: serde_json::Value,
        transport_context: &serde_json::Value,
    ) -> serde_json::Value;
}

/// Async-first x402 resource server with scheme registration, facilitator
/// client initialization, requirement building, and verify/settle delegation.
pub struct X402ResourceServer {
    facilitator_clients: Vec<Box<dyn FacilitatorClient>>,
    schemes: SchemeRegistry<Box<dyn SchemeServer>>,
    facilitator_map: HashMap<Network, HashMap<String, usize>>,
    supported_responses: HashMap<Network, HashMap<String, SupportedResponse>>,
    extensions: HashMap<String, Box<dyn ResourceServerExtension>>,
    before_verify_hooks: Vec<BeforeVerifyHook>,
    after_verify_hooks: Vec<AfterVerifyHook>,
    on_verify_failure_hooks: Vec<OnVerifyFailureHook>,
    before_settle_hooks: Vec<BeforeSettleHook>,
    after_settle_hooks: Vec<AfterSettleHook>,
    on_settle_failure_hooks: Vec<OnSettleFailureHook>,
    initialized: bool,
}

impl std::fmt::Debug for X402ResourceServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X402ResourceServer")
            .field("facilitator_clients_count", &self.facilitator_clients.len())
            .field("schemes", &self.schemes)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl Default for X402ResourceServer {
    fn default() -> Self {
        Self::new()
    }
}

impl X402ResourceServer {
    /// Creates a new resource server with no facilitator clients.
    #[must_use]
    pub fn new() -> Self {
        Self {
            facilitator_clients: Vec::new(),
            schemes: SchemeRegistry::new(),
            facilitator_map: HashMap::new(),
            supported_responses: HashMap::new(),
            extensions: HashMap::new(),
            before_verify_hooks: Vec::new(),
            after_verify_hooks: Vec::new(),
            on_verify_failure_hooks: Vec::new(),
            before_settle_hooks: Vec::new(),
            after_settle_hooks: Vec::new(),
            on_settle_failure_hooks: Vec::new(),
            initialized: false,
        }
    }

    /// Creates a new resource server with one facilitator client.
    #[must_use]
    pub fn with_facilitator(client: Box<dyn FacilitatorClient>) -> Self {
        let mut server = Self::new();
        server.facilitator_clients.push(client);
        server
    }

    /// Adds a facilitator client.
    pub fn add_facilitator(&mut self, client: Box<dyn FacilitatorClient>) -> &mut Self {
        self.facilitator_clients.push(client);
        self
    }

    /// Registers a V2 scheme server under a network pattern.
    pub fn register(
        &mut self,
        pattern: impl Into<String>,
        server: Box<dyn SchemeServer>,
    ) -> &mut Self {
        let scheme = server.scheme().to_owned();
        self.schemes.register(scheme, pattern.into(), server);
        self
    }

    /// Registers a V2 scheme server under its own CAIP family pattern.
    pub fn register_family(&mut self, server: Box<dyn SchemeServer>) -> &mut Self {
        let pattern = server.caip_family().to_owned();
        self.register(pattern, server)
    }

    /// Checks if a scheme is registered for a network (with wildcard matching).
    #[must_use]
    pub fn has_registered_scheme(&self, network: &str, scheme: &str) -> bool {
        self.schemes.contains(scheme, network)
    }

    /// Returns the `SupportedKind` for a given version/network/scheme, or `None`.
    #[must_use]
    pub fn get_supported_kind(
        &self,
        version: u32,
        network: &str,
        scheme: &str,
    ) -> Option<&SupportedKind> {
        // Exact network match
        if let Some(kind) = self.find_kind_in(network, scheme, version, network) {
            return Some(kind);
        }
        // Wildcard match on the stored key
        let prefix = network.split(':').next().unwrap_or("");
        let wildcard = format!("{prefix}:*");
        if let Some(kind) = self.find_kind_in(&wildcard, scheme, version, network) {
            return Some(kind);
        }
        // Scan all stored responses for wildcard kind patterns
        for schemes in self.supported_responses.values() {
            if let Some(supported) = schemes.get(scheme) {
                for kind in &supported.kinds {
                    if kind.x402_version == version
                        && kind.scheme == scheme
                        && NetworkPattern::new(kind.network.as_str()).is_wildcard()
                        && NetworkPattern::new(kind.network.as_str()).matches(network)
                    {
                        return Some(kind);
                    }
                }
            }
        }
        None
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

    /// Registers a [`ResourceServerExtension`].
    ///
    /// Extensions enrich payment declarations with transport-specific data
    /// (e.g., discovery metadata from an HTTP request).
    pub fn register_extension(&mut self, ext: Box<dyn ResourceServerExtension>) -> &mut Self {
        self.extensions.insert(ext.key().to_owned(), ext);
        self
    }

    /// Enriches extension declarations using registered extensions.
    ///
    /// For each key in `declarations` that has a matching registered
    /// extension, calls [`ResourceServerExtension::enrich_declaration`]
    /// with the given `transport_context`.
    ///
    /// Returns the enriched extensions object.
    #[must_use]
    pub fn enrich_extensions(
        &self,
        declarations: &serde_json::Value,
        transport_context: &serde_json::Value,
    ) -> serde_json::Value {
        let Some(obj) = declarations.as_object() else {
            return declarations.clone();
        };

        let mut result = obj.clone();
        for (key, value) in obj {
            if let Some(ext) = self.extensions.get(key) {
                result.insert(
                    key.clone(),
                    ext.enrich_declaration(value.clone(), transport_context),
                );
            }
        }

        serde_json::Value::Object(result)
    }

    /// Initializes the server by fetching supported kinds from all
    /// registered facilitator clients.
    ///
    /// Must be called before `verify_payment` / `settle_payment`. The first
    /// facilitator advertising a (network, scheme) pair wins it.
    ///
    /// # Errors
    ///
    /// Returns an error if any facilitator client fails to respond.
    pub async fn initialize(&mut self) -> Result<(), SchemeError> {
        for (idx, client) in self.facilitator_clients.iter().enumerate() {
            let supported = client.get_supported().await?;
            tracing::debug!(
                facilitator = idx,
                kinds = supported.kinds.len(),
                "fetched supported kinds"
            );

            for kind in &supported.kinds {
                let network = &kind.network;
                let scheme = &kind.scheme;

                self.facilitator_map
                    .entry(network.clone())
                    .or_default()
                    .entry(scheme.clone())
                    .or_insert(idx);

                self.supported_responses
                    .entry(network.clone())
                    .or_default()
                    .entry(scheme.clone())
                    .or_insert_with(|| supported.clone());
            }
        }

        self.initialized = true;
        Ok(())
    }

    /// Returns whether the server has been initialized.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Builds payment requirements for a protected resource.
    ///
    /// Classifies the route's price once via [`Price::from_value`], resolves
    /// it through the scheme server, resolves a dynamic `pay_to` with the
    /// transport context, and enhances the result with scheme-specific data
    /// from the facilitator's matching supported kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is not initialized, the scheme is not
    /// registered, no facilitator supports the route, or price parsing fails.
    pub fn build_payment_requirements(
        &self,
        config: &ResourceConfig,
        transport_context: &serde_json::Value,
    ) -> Result<Vec<PaymentRequirements>, SchemeError> {
        if !self.initialized {
            return Err("Server not initialized. Call initialize() first.".into());
        }

        let server = self
            .schemes
            .lookup(&config.scheme, &config.network)
            .ok_or_else(|| SchemeNotFoundError::new(&config.scheme, &config.network))?;

        let supported_kind = self
            .get_supported_kind(2, &config.network, &config.scheme)
            .ok_or_else(|| SchemeNotFoundError::new(&config.scheme, &config.network))?;

        let price = Price::from_value(&config.price);
        let AssetAmount {
            amount,
            asset,
            extra,
        } = server.parse_price(&price, &config.network)?;

        let base = PaymentRequirements {
            scheme: config.scheme.clone(),
            network: config.network.clone(),
            asset,
            amount,
            pay_to: config.pay_to.resolve(transport_context),
            max_timeout_seconds: config.max_timeout_seconds.unwrap_or(300),
            extra,
        };

        let extension_keys: Vec<String> = self.extensions.keys().cloned().collect();
        let enhanced = server.enhance_payment_requirements(base, supported_kind, &extension_keys);

        Ok(vec![enhanced])
    }

    /// Creates a 402 Payment Required envelope from a list of requirements.
    ///
    /// When `error` is `None` the envelope carries the standard
    /// `payment_required` code.
    #[must_use]
    pub fn create_payment_required(
        &self,
        requirements: Vec<PaymentRequirements>,
        resource: Option<String>,
        error: Option<String>,
        extensions: Option<serde_json::Value>,
    ) -> PaymentRequired {
        PaymentRequired {
            x402_version: 2,
            error: error.or_else(|| Some(PAYMENT_REQUIRED.into())),
            resource,
            accepts: requirements,
            extensions,
        }
    }

    /// Finds requirements from a list that match a given payload, per the
    /// protocol's five-field rule
    /// ([`PaymentPayload::matches_requirements`]).
    #[must_use]
    pub fn find_matching_requirements<'a>(
        &self,
        available: &'a [PaymentRequirements],
        payload: &PaymentPayload,
    ) -> Option<&'a PaymentRequirements> {
        available
            .iter()
            .find(|req| payload.matches_requirements(req))
    }

    /// Verifies a V2 payment via the appropriate facilitator client,
    /// with full hook lifecycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is not initialized, no facilitator is
    /// registered, or a hook aborts.
    pub async fn verify_payment(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse, SchemeError> {
        if !self.initialized {
            return Err("Server not initialized. Call initialize() first.".into());
        }

        let ctx = HookContext {
            payment_payload: PayloadView::V2(Box::new(payload.clone())),
            requirements: RequirementsView::V2(requirements.clone()),
            outcome: (),
        };

        for hook in &self.before_verify_hooks {
            if let Some(abort) = hook(&ctx).await {
                return Err(Box::new(PaymentAbortedError::new(abort.reason)));
            }
        }

        let result = self.do_verify(payload, requirements).await;

        match result {
            Ok(ref response) if response.is_valid => {
                let result_ctx = ctx.with_outcome(response.clone());
                for hook in &self.after_verify_hooks {
                    hook(&result_ctx).await;
                }
                result
            }
            Ok(ref response) => {
                let failure_ctx = ctx.with_outcome(FailureDetail {
                    reason: response.invalid_reason.clone().unwrap_or_default(),
                    message: response.invalid_message.clone(),
                });
                for hook in &self.on_verify_failure_hooks {
                    if let Some(recovered) = hook(&failure_ctx).await {
                        return Ok(recovered.result);
                    }
                }
                result
            }
            Err(e) => {
                let failure_ctx = ctx.with_outcome(FailureDetail::new(e.to_string()));
                for hook in &self.on_verify_failure_hooks {
                    if let Some(recovered) = hook(&failure_ctx).await {
                        return Ok(recovered.result);
                    }
                }
                Err(e)
            }
        }
    }

    /// Settles a V2 payment via the appropriate facilitator client,
    /// with full hook lifecycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is not initialized, no facilitator is
    /// registered, or a hook aborts.
    pub async fn settle_payment(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse, SchemeError> {
        if !self.initialized {
            return Err("Server not initialized. Call initialize() first.".into());
        }

        let ctx = HookContext {
            payment_payload: PayloadView::V2(Box::new(payload.clone())),
            requirements: RequirementsView::V2(requirements.clone()),
            outcome: (),
        };

        for hook in &self.before_settle_hooks {
            if let Some(abort) = hook(&ctx).await {
                return Err(Box::new(PaymentAbortedError::new(abort.reason)));
            }
        }

        let result = self.do_settle(payload, requirements).await;

        match result {
            Ok(ref response) if response.success => {
                let result_ctx = ctx.with_outcome(response.clone());
                for hook in &self.after_settle_hooks {
                    hook(&result_ctx).await;
                }
                result
            }
            Ok(ref response) => {
                let failure_ctx = ctx.with_outcome(FailureDetail {
                    reason: response.error_reason.clone().unwrap_or_default(),
                    message: response.error_message.clone(),
                });
                for hook in &self.on_settle_failure_hooks {
                    if let Some(recovered) = hook(&failure_ctx).await {
                        return Ok(recovered.result);
                    }
                }
                result
            }
            Err(e) => {
                let failure_ctx = ctx.with_outcome(FailureDetail::new(e.to_string()));
                for hook in &self.on_settle_failure_hooks {
                    if let Some(recovered) = hook(&failure_ctx).await {
                        return Ok(recovered.result);
                    }
                }
                Err(e)
            }
        }
    }

    /// Looks up a `SupportedKind` from stored responses.
    fn find_kind_in<'a>(
        &'a self,
        stored_network: &str,
        scheme: &str,
        version: u32,
        target_network: &str,
    ) -> Option<&'a SupportedKind> {
        self.supported_responses
            .get(stored_network)
            .and_then(|m| m.get(scheme))
            .and_then(|supported| {
                supported.kinds.iter().find(|k| {
                    k.x402_version == version
                        && k.scheme == scheme
                        && (k.network == target_network || k.network == stored_network)
                })
            })
    }

    /// Delegates verify to the facilitator client for the given scheme/network.
    async fn do_verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse, SchemeError> {
        let client = self.find_facilitator_client(payload.scheme(), payload.network())?;
        client.verify(payload, requirements).await
    }

    /// Delegates settle to the facilitator client for the given scheme/network.
    async fn do_settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse, SchemeError> {
        let client = self.find_facilitator_client(payload.scheme(), payload.network())?;
        client.settle(payload, requirements).await
    }

    /// Finds the facilitator client for a given scheme/network.
    ///
    /// Facilitator kinds may advertise wildcard networks; an exact entry
    /// wins, else any pattern covering the network.
    fn find_facilitator_client(
        &self,
        scheme: &str,
        network: &str,
    ) -> Result<&dyn FacilitatorClient, SchemeError> {
        let by_network = self.facilitator_map.get(network).or_else(|| {
            self.facilitator_map.iter().find_map(|(pattern, schemes)| {
                NetworkPattern::new(pattern.as_str())
                    .matches(network)
                    .then_some(schemes)
            })
        });

        let idx = by_network
            .and_then(|m| m.get(scheme))
            .copied()
            .ok_or_else(|| SchemeNotFoundError::new(scheme, network))?;

        self.facilitator_clients
            .get(idx)
            .map(AsRef::as_ref)
            .ok_or_else(|| {
                let err: SchemeError = Box::new(SchemeNotFoundError::new(scheme, network));
                err
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PayTo;
    use crate::hooks::{AbortResult, RecoveredVerifyResult};

    const NET: &str = "algorand:SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=";

    struct StubSchemeServer;

    impl SchemeId for StubSchemeServer {
        fn scheme(&self) -> &str {
            "exact"
        }

        fn caip_family(&self) -> &str {
            "algorand:*"
        }
    }

    impl SchemeServer for StubSchemeServer {
        fn parse_price(&self, price: &Price, _network: &str) -> Result<AssetAmount, SchemeError> {
            match price {
                Price::Money(value) => Ok(AssetAmount {
                    amount: value.as_str().ok_or("price must be a string")?.to_owned(),
                    asset: "10458941".into(),
                    extra: None,
                }),
                Price::Amount { amount, asset, extra } => Ok(AssetAmount {
                    amount: amount.clone(),
                    asset: asset.clone().unwrap_or_else(|| "10458941".into()),
                    extra: extra.clone(),
                }),
            }
        }

        fn enhance_payment_requirements(
            &self,
            mut requirements: PaymentRequirements,
            supported_kind: &SupportedKind,
            _extension_keys: &[String],
        ) -> PaymentRequirements {
            requirements.extra = supported_kind.extra.clone();
            requirements
        }
    }

    struct StubFacilitatorClient {
        verify_valid: bool,
    }

    impl FacilitatorClient for StubFacilitatorClient {
        fn verify<'a>(
            &'a self,
            payload: &'a PaymentPayload,
            _requirements: &'a PaymentRequirements,
        ) -> BoxFuture<'a, Result<VerifyResponse, SchemeError>> {
            let valid = self.verify_valid;
            Box::pin(async move {
                if valid {
                    Ok(VerifyResponse::valid(payload.accepted.pay_to.clone()))
                } else {
                    Ok(VerifyResponse::invalid("amount_insufficient"))
                }
            })
        }

        fn settle<'a>(
            &'a self,
            payload: &'a PaymentPayload,
            _requirements: &'a PaymentRequirements,
        ) -> BoxFuture<'a, Result<SettleResponse, SchemeError>> {
            Box::pin(async move {
                Ok(SettleResponse::success(
                    "TXID",
                    payload.network().to_owned(),
                    "PAYER",
                ))
            })
        }

        fn get_supported(&self) -> BoxFuture<'_, Result<SupportedResponse, SchemeError>> {
            Box::pin(async {
                Ok(SupportedResponse {
                    kinds: vec![SupportedKind {
                        x402_version: 2,
                        scheme: "exact".into(),
                        network: NET.into(),
                        extra: Some(serde_json::json!({"feePayer": "FEEPAYER"})),
                    }],
                    extensions: vec![],
                    signers: HashMap::new(),
                })
            })
        }
    }

    async fn server(verify_valid: bool) -> X402ResourceServer {
        let mut server =
            X402ResourceServer::with_facilitator(Box::new(StubFacilitatorClient { verify_valid }));
        server.register_family(Box::new(StubSchemeServer));
        server.initialize().await.unwrap();
        server
    }

    fn config() -> ResourceConfig {
        ResourceConfig {
            scheme: "exact".into(),
            pay_to: PayTo::Static("RECEIVER".into()),
            price: serde_json::json!("1000"),
            network: NET.into(),
            max_timeout_seconds: None,
        }
    }

    fn payload_for(req: &PaymentRequirements) -> PaymentPayload {
        PaymentPayload {
            x402_version: 2,
            accepted: req.clone(),
            payload: serde_json::json!({}),
            resource: None,
            extensions: None,
        }
    }

    #[tokio::test]
    async fn build_requirements_enhances_from_supported_kind() {
        let server = server(true).await;
        let reqs = server
            .build_payment_requirements(&config(), &serde_json::json!({}))
            .unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].amount, "1000");
        assert_eq!(reqs[0].pay_to, "RECEIVER");
        assert_eq!(reqs[0].max_timeout_seconds, 300);
        assert_eq!(reqs[0].extra_str("feePayer"), Some("FEEPAYER"));
    }

    #[tokio::test]
    async fn explicit_amount_prices_pass_through_the_scheme() {
        let server = server(true).await;
        let mut cfg = config();
        cfg.price = serde_json::json!({"amount": "42", "asset": "777"});
        let reqs = server
            .build_payment_requirements(&cfg, &serde_json::json!({}))
            .unwrap();
        assert_eq!(reqs[0].amount, "42");
        assert_eq!(reqs[0].asset, "777");
    }

    #[tokio::test]
    async fn dynamic_pay_to_sees_transport_context() {
        let server = server(true).await;
        let mut cfg = config();
        cfg.pay_to = PayTo::dynamic(|ctx| {
            ctx.get("tenant")
                .and_then(|t| t.as_str())
                .unwrap_or("FALLBACK")
                .to_owned()
        });
        let reqs = server
            .build_payment_requirements(&cfg, &serde_json::json!({"tenant": "TENANTADDR"}))
            .unwrap();
        assert_eq!(reqs[0].pay_to, "TENANTADDR");
    }

    #[tokio::test]
    async fn envelope_defaults_to_payment_required_code() {
        let server = server(true).await;
        let envelope = server.create_payment_required(
            vec![],
            Some("https://api.example.com/data".into()),
            None,
            None,
        );
        assert_eq!(envelope.error.as_deref(), Some("payment_required"));
        assert_eq!(envelope.x402_version, 2);
    }

    #[tokio::test]
    async fn matching_requires_all_five_fields() {
        let server = server(true).await;
        let reqs = server
            .build_payment_requirements(&config(), &serde_json::json!({}))
            .unwrap();
        let payload = payload_for(&reqs[0]);
        assert!(server.find_matching_requirements(&reqs, &payload).is_some());

        let mut tampered = payload.clone();
        tampered.accepted.amount = "999".into();
        assert!(server.find_matching_requirements(&reqs, &tampered).is_none());
    }

    #[tokio::test]
    async fn verify_requires_initialization() {
        let server = X402ResourceServer::new();
        let req = PaymentRequirements {
            scheme: "exact".into(),
            network: NET.into(),
            amount: "1".into(),
            pay_to: "B".into(),
            max_timeout_seconds: 300,
            asset: "1".into(),
            extra: None,
        };
        let payload = payload_for(&req);
        assert!(server.verify_payment(&payload, &req).await.is_err());
    }

    #[tokio::test]
    async fn verify_failure_hook_can_recover() {
        let mut server = server(false).await;
        server.on_verify_failure(Box::new(|ctx| {
            assert_eq!(ctx.outcome.reason, "amount_insufficient");
            Box::pin(async {
                Some(RecoveredVerifyResult {
                    result: VerifyResponse::valid("RECOVERED"),
                })
            })
        }));

        let reqs = server
            .build_payment_requirements(&config(), &serde_json::json!({}))
            .unwrap();
        let payload = payload_for(&reqs[0]);
        let response = server.verify_payment(&payload, &reqs[0]).await.unwrap();
        assert!(response.is_valid);
        assert_eq!(response.payer.as_deref(), Some("RECOVERED"));
    }

    #[tokio::test]
    async fn before_settle_hook_aborts() {
        let mut server = server(true).await;
        server.on_before_settle(Box::new(|_ctx| {
            Box::pin(async { Some(AbortResult::new("maintenance window")) })
        }));

        let reqs = server
            .build_payment_requirements(&config(), &serde_json::json!({}))
            .unwrap();
        let payload = payload_for(&reqs[0]);
        let err = server.settle_payment(&payload, &reqs[0]).await.unwrap_err();
        assert!(err.to_string().contains("maintenance window"));
    }
}
