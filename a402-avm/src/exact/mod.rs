//! The `exact` payment scheme on Algorand networks.
//!
//! Three roles, matching the protocol engine's trait split:
//!
//! - [`ExactAvmClient`] — builds atomic-group payment payloads
//! - [`ExactAvmServer`] — parses prices and enhances payment requirements
//! - [`ExactAvmFacilitator`] — verifies and settles payment groups
//!
//! V1 wrappers ([`v1`]) translate legacy network names and field names and
//! delegate to the V2 implementations. The [`register`] helpers wire all
//! roles into the protocol engine in one call.

mod client;
mod facilitator;
pub mod register;
mod server;
pub mod v1;

pub use client::{BuildGroupError, ExactAvmClient, GroupParams, build_payment_group};
pub use facilitator::ExactAvmFacilitator;
pub use server::{ExactAvmServer, MoneyParser};
