//! V1 (legacy) wrappers for the AVM exact scheme.
//!
//! V1 names networks (`algorand-testnet`) instead of CAIP-2 identifiers and
//! calls the amount `maxAmountRequired`. These wrappers translate in both
//! directions and delegate to the V2 implementations; there is no separate
//! V1 execution path.

use std::sync::Arc;

use serde_json::Value;

use a402::scheme::{
    BoxFuture, InnerPayload, SchemeClientV1, SchemeError, SchemeFacilitatorV1, SchemeId,
};
use a402_proto::{
    PaymentPayload, PaymentPayloadV1, PaymentRequirements, PaymentRequirementsV1, SettleResponse,
    VerifyResponse,
};

use crate::constants::SCHEME_EXACT;
use crate::exact::{ExactAvmClient, ExactAvmFacilitator};
use crate::networks;
use crate::signer::{ClientAvmSigner, FacilitatorAvmSigner};

/// Translates V1 requirements into their V2 shape.
///
/// # Errors
///
/// Fails if the V1 network name is unknown.
fn requirements_to_v2(v1: &PaymentRequirementsV1) -> Result<PaymentRequirements, SchemeError> {
    let caip2 = networks::normalize_network(&v1.network)?;
    Ok(PaymentRequirements {
        scheme: v1.scheme.clone(),
        network: caip2.to_owned(),
        amount: v1.max_amount_required.clone(),
        pay_to: v1.pay_to.clone(),
        max_timeout_seconds: v1.max_timeout_seconds,
        asset: v1.asset.clone(),
        extra: v1.extra.clone(),
    })
}

/// Wraps a V1 payload into a V2 payload against translated requirements.
fn payload_to_v2(
    v1: &PaymentPayloadV1,
    accepted: PaymentRequirements,
) -> PaymentPayload {
    PaymentPayload {
        x402_version: 1,
        accepted,
        payload: v1.payload.clone(),
        resource: None,
        extensions: None,
    }
}

/// V1 client role: translates requirements and delegates to the V2 client.
pub struct ExactAvmClientV1 {
    inner: ExactAvmClient,
}

impl std::fmt::Debug for ExactAvmClientV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExactAvmClientV1")
            .field("inner", &self.inner)
            .finish()
    }
}

impl ExactAvmClientV1 {
    /// Creates the V1 client role around a signer.
    #[must_use]
    pub fn new(signer: Arc<dyn ClientAvmSigner>) -> Self {
        Self {
            inner: ExactAvmClient::new(signer),
        }
    }

    /// Overrides the Algod endpoint for every network.
    #[must_use]
    pub fn with_algod_url(mut self, url: impl Into<String>) -> Self {
        self.inner = self.inner.with_algod_url(url);
        self
    }
}

impl SchemeId for ExactAvmClientV1 {
    fn scheme(&self) -> &str {
        SCHEME_EXACT
    }

    fn caip_family(&self) -> &str {
        "algorand:*"
    }
}

impl SchemeClientV1 for ExactAvmClientV1 {
    fn create_payment_payload<'a>(
        &'a self,
        requirements: &'a PaymentRequirementsV1,
    ) -> BoxFuture<'a, Result<InnerPayload, SchemeError>> {
        Box::pin(async move {
            let v2 = requirements_to_v2(requirements)?;
            use a402::scheme::SchemeClient as _;
            self.inner.create_payment_payload(&v2).await
        })
    }
}

/// V1 facilitator role: translates both directions around the V2
/// facilitator.
pub struct ExactAvmFacilitatorV1 {
    inner: ExactAvmFacilitator,
}

impl std::fmt::Debug for ExactAvmFacilitatorV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExactAvmFacilitatorV1")
            .field("inner", &self.inner)
            .finish()
    }
}

impl ExactAvmFacilitatorV1 {
    /// Creates the V1 facilitator role around a signer.
    #[must_use]
    pub fn new(signer: Arc<dyn FacilitatorAvmSigner>) -> Self {
        Self {
            inner: ExactAvmFacilitator::new(signer),
        }
    }
}

impl SchemeId for ExactAvmFacilitatorV1 {
    fn scheme(&self) -> &str {
        SCHEME_EXACT
    }

    fn caip_family(&self) -> &str {
        "algorand:*"
    }
}

impl SchemeFacilitatorV1 for ExactAvmFacilitatorV1 {
    fn get_extra(&self, network: &str) -> Option<Value> {
        use a402::scheme::SchemeFacilitator as _;
        let caip2 = networks::normalize_network(network).ok()?;
        self.inner.get_extra(caip2)
    }

    fn get_signers(&self, network: &str) -> Vec<String> {
        use a402::scheme::SchemeFacilitator as _;
        match networks::normalize_network(network) {
            Ok(caip2) => self.inner.get_signers(caip2),
            Err(_) => Vec::new(),
        }
    }

    fn verify<'a>(
        &'a self,
        payload: &'a PaymentPayloadV1,
        requirements: &'a PaymentRequirementsV1,
    ) -> BoxFuture<'a, VerifyResponse> {
        Box::pin(async move {
            use a402::scheme::SchemeFacilitator as _;
            let v2_requirements = match requirements_to_v2(requirements) {
                Ok(v2) => v2,
                Err(e) => {
                    return VerifyResponse::invalid(a402_proto::codes::NETWORK_MISMATCH)
                        .with_message(e.to_string());
                }
            };
            let v2_payload = payload_to_v2(payload, v2_requirements.clone());
            self.inner.verify(&v2_payload, &v2_requirements).await
        })
    }

    fn settle<'a>(
        &'a self,
        payload: &'a PaymentPayloadV1,
        requirements: &'a PaymentRequirementsV1,
    ) -> BoxFuture<'a, SettleResponse> {
        Box::pin(async move {
            use a402::scheme::SchemeFacilitator as _;
            let v2_requirements = match requirements_to_v2(requirements) {
                Ok(v2) => v2,
                Err(e) => {
                    return SettleResponse::error(
                        a402_proto::codes::NETWORK_MISMATCH,
                        requirements.network.clone(),
                    )
                    .with_message(e.to_string());
                }
            };
            let v2_payload = payload_to_v2(payload, v2_requirements.clone());
            let mut response = self.inner.settle(&v2_payload, &v2_requirements).await;

            // Report the network in the caller's dialect.
            if let Some(name) = networks::v1_name(&response.network) {
                response.network = name.to_owned();
            }
            response
        })
    }
}
