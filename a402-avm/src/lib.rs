//! Algorand (AVM) chain support for the x402 payment protocol.
//!
//! Implements the `exact` payment scheme on Algorand networks using atomic
//! transaction groups of ASA transfers, with optional fee abstraction: the
//! facilitator co-signs a self-pay zero-amount transaction whose pooled fee
//! covers the whole group, so the payer spends no ALGO at all.
//!
//! # Modules
//!
//! - [`constants`] — Network identifiers, ASA ids, fee limits, error codes
//! - [`networks`] — Network configuration and V1 name normalization
//! - [`types`] — Payload and decoded-transaction types
//! - [`utils`] — Transaction decoding, validation, and money conversion
//! - [`signer`] — [`ClientAvmSigner`](signer::ClientAvmSigner) and
//!   [`FacilitatorAvmSigner`](signer::FacilitatorAvmSigner) capabilities
//! - [`signers`] — Single-key implementations backed by `algonaut`
//! - [`exact`] — The exact scheme's client, server, and facilitator roles
//!
//! # Environment Variables
//!
//! - `ALGOD_MAINNET_URL` / `ALGOD_TESTNET_URL` — Algod endpoint overrides
//! - `INDEXER_MAINNET_URL` / `INDEXER_TESTNET_URL` — Indexer endpoint overrides
//!
//! AlgoNode public endpoints are used when unset.

pub mod constants;
pub mod exact;
pub mod networks;
pub mod signer;
pub mod signers;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;
pub mod utils;

pub use constants::{
    ALGORAND_MAINNET_CAIP2, ALGORAND_TESTNET_CAIP2, DEFAULT_DECIMALS, MAX_GROUP_SIZE,
    MAX_REASONABLE_FEE, MIN_TXN_FEE, SCHEME_EXACT, USDC_MAINNET_ASA_ID, USDC_TESTNET_ASA_ID,
};
pub use signer::{ClientAvmSigner, FacilitatorAvmSigner};
pub use signers::{AlgorandAccountSigner, FacilitatorAlgorandSigner};
pub use types::{DecodedTransactionInfo, ExactAvmPayload, TransactionGroupInfo};
