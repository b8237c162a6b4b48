//! x402 payment protocol engine.
//!
//! This crate contains the chain-agnostic core of the x402 protocol: the
//! scheme registry, the client-side payment negotiation, the resource-server
//! negotiation and hook lifecycle, and the facilitator engine that dispatches
//! verify/settle to registered scheme handlers. Chain-specific scheme
//! implementations live in separate crates (e.g., `a402-avm` for Algorand).
//!
//! # Modules
//!
//! - [`scheme`] — Traits implemented by payment scheme handlers
//! - [`registry`] — Pattern-routed scheme registries (V2 CAIP-2 + V1 names)
//! - [`client`] — [`X402Client`](client::X402Client): selects an offer and builds the payment payload
//! - [`server`] — [`X402ResourceServer`](server::X402ResourceServer): 402 envelopes, matching, verify/settle delegation
//! - [`facilitator`] — [`X402Facilitator`](facilitator::X402Facilitator): verify/settle dispatch with hooks
//! - [`hooks`] — Lifecycle hook context and result types
//! - [`headers`] — `X-PAYMENT` / `X-PAYMENT-RESPONSE` codecs
//! - [`config`] — Protected-resource configuration
//! - [`error`] — Error types
//! - [`encoding`] — Base64 utilities

pub mod client;
pub mod config;
pub mod encoding;
pub mod error;
pub mod facilitator;
pub mod headers;
pub mod hooks;
pub mod registry;
pub mod scheme;
pub mod server;

pub use a402_proto as proto;
pub use a402_proto::{
    PaymentPayload, PaymentPayloadV1, PaymentRequired, PaymentRequiredV1, PaymentRequirements,
    PaymentRequirementsV1, ProtocolError, SettleResponse, SupportedKind, SupportedResponse,
    VerifyResponse,
};
