//! Axum route handlers for the facilitator service.
//!
//! `/verify` and `/settle` accept both protocol generations on the same
//! route: the body's shape (`x402Version` inside `paymentPayload`, or the
//! legacy `maxAmountRequired` key) selects the V1 or V2 engine entry point.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde_json::Value;

use a402::facilitator::X402Facilitator;
use a402_proto::{
    ProtocolVersion, SettleRequest, SettleRequestV1, SettleResponse, SupportedResponse,
    VerifyRequest, VerifyRequestV1, VerifyResponse,
};

use crate::error::FacilitatorHttpError;

/// Shared application state for the facilitator service.
pub type FacilitatorState = Arc<X402Facilitator>;

/// `GET /supported` — Returns the list of supported payment kinds.
pub async fn get_supported(State(fac): State<FacilitatorState>) -> Json<SupportedResponse> {
    Json(fac.get_supported())
}

/// `GET /health` — Liveness probe.
pub async fn get_health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /verify` — Verifies a payment payload (V1 or V2).
///
/// # Errors
///
/// Returns 400 for malformed bodies and 500 when no handler serves the
/// payment's scheme/network.
pub async fn post_verify(
    State(fac): State<FacilitatorState>,
    Json(body): Json<Value>,
) -> Result<Json<VerifyResponse>, FacilitatorHttpError> {
    let response = match ProtocolVersion::of_request(&body)? {
        ProtocolVersion::V1 => {
            let request: VerifyRequestV1 = serde_json::from_value(body)?;
            fac.verify_v1(&request.payment_payload, &request.payment_requirements)
                .await
                .map_err(FacilitatorHttpError::engine)?
        }
        ProtocolVersion::V2 => {
            let request: VerifyRequest = serde_json::from_value(body)?;
            fac.verify(&request.payment_payload, &request.payment_requirements)
                .await
                .map_err(FacilitatorHttpError::engine)?
        }
    };
    Ok(Json(response))
}

/// `POST /settle` — Settles a payment on-chain (V1 or V2).
///
/// # Errors
///
/// Returns 400 for malformed bodies and 500 when no handler serves the
/// payment's scheme/network.
pub async fn post_settle(
    State(fac): State<FacilitatorState>,
    Json(body): Json<Value>,
) -> Result<Json<SettleResponse>, FacilitatorHttpError> {
    let response = match ProtocolVersion::of_request(&body)? {
        ProtocolVersion::V1 => {
            let request: SettleRequestV1 = serde_json::from_value(body)?;
            fac.settle_v1(&request.payment_payload, &request.payment_requirements)
                .await
                .map_err(FacilitatorHttpError::engine)?
        }
        ProtocolVersion::V2 => {
            let request: SettleRequest = serde_json::from_value(body)?;
            fac.settle(&request.payment_payload, &request.payment_requirements)
                .await
                .map_err(FacilitatorHttpError::engine)?
        }
    };
    Ok(Json(response))
}

/// Creates the facilitator [`axum::Router`].
///
/// Routes: `POST /verify`, `POST /settle`, `GET /supported`, `GET /health`.
pub fn facilitator_router(state: FacilitatorState) -> axum::Router {
    axum::Router::new()
        .route("/supported", axum::routing::get(get_supported))
        .route("/verify", axum::routing::post(post_verify))
        .route("/settle", axum::routing::post(post_settle))
        .route("/health", axum::routing::get(get_health))
        .with_state(state)
}
