//! x402 facilitator server.
//!
//! A runnable HTTP service implementing the facilitator side of the x402
//! payment protocol with Algorand (AVM) settlement.
//!
//! # Endpoints
//!
//! - `POST /verify` — verify a payment (V1 and V2 bodies auto-detected)
//! - `POST /settle` — settle a payment on-chain (V1 and V2 auto-detected)
//! - `GET /supported` — supported payment kinds, extensions, and signers
//! - `GET /health` — liveness probe
//!
//! # Modules
//!
//! - [`config`] — TOML configuration with environment expansion
//! - [`handlers`] — Axum route handlers
//! - [`error`] — HTTP error mapping

pub mod config;
pub mod error;
pub mod handlers;
