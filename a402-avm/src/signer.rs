//! AVM signer capabilities.
//!
//! Two narrow, deliberately unrelated interfaces keep private keys on the
//! integrator's side of the boundary:
//!
//! - [`ClientAvmSigner`] — used when building payment payloads: an address
//!   plus sign-selected-transactions.
//! - [`FacilitatorAvmSigner`] — used during verification and settlement:
//!   managed fee-payer addresses plus sign/simulate/send/confirm.
//!
//! Transaction bytes are raw msgpack end to end; base64 appears only at the
//! wire boundary. Signing is synchronous (CPU-bound); everything that talks
//! to the chain returns a [`BoxFuture`].

use a402::scheme::BoxFuture;

/// Errors surfaced by signer implementations.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The requested fee payer is not managed by this signer.
    #[error("fee payer {0} is not managed by this signer")]
    UnmanagedFeePayer(String),

    /// Transaction bytes could not be decoded for signing.
    #[error("cannot decode transaction for signing: {0}")]
    Decode(String),

    /// Producing a signature failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A chain RPC call failed.
    #[error("chain RPC failed: {0}")]
    Rpc(String),

    /// The simulate endpoint reported a failure.
    #[error("simulation failed: {0}")]
    Simulation(String),

    /// The transaction was not confirmed within the allotted rounds.
    #[error("transaction {txid} not confirmed within {rounds} rounds")]
    Confirmation {
        /// Transaction id that was awaited.
        txid: String,
        /// Number of rounds waited.
        rounds: u64,
    },

    /// The network identifier is unknown.
    #[error(transparent)]
    Network(#[from] crate::networks::UnsupportedNetworkError),
}

/// Client-side signing capability.
pub trait ClientAvmSigner: Send + Sync {
    /// The signer's Algorand address.
    fn address(&self) -> String;

    /// Signs the transactions at `indexes_to_sign`.
    ///
    /// Returns a vector parallel to `unsigned_txns`: signed envelope bytes at
    /// the requested indexes, `None` elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError`] if decoding or signing fails.
    fn sign_transactions(
        &self,
        unsigned_txns: &[Vec<u8>],
        indexes_to_sign: &[usize],
    ) -> Result<Vec<Option<Vec<u8>>>, SignerError>;
}

/// Facilitator-side signing capability.
///
/// Manages one or more fee-payer accounts and performs the chain operations
/// verification and settlement need.
pub trait FacilitatorAvmSigner: Send + Sync {
    /// All managed fee-payer addresses.
    ///
    /// Several addresses let the facilitator spread fee load across signers.
    fn addresses(&self) -> Vec<String>;

    /// Signs the group entries at `indexes_to_sign` with the fee payer's key.
    ///
    /// Entries outside `indexes_to_sign` pass through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::UnmanagedFeePayer`] if `fee_payer` is unknown,
    /// or a decode/signing error.
    fn sign_group(
        &self,
        group: &[Vec<u8>],
        fee_payer: &str,
        indexes_to_sign: &[usize],
    ) -> Result<Vec<Vec<u8>>, SignerError>;

    /// Dry-runs a transaction group against the chain.
    ///
    /// Entries may still be unsigned; the implementation submits with
    /// empty-signature allowance. Resolves to `Ok(())` only if the chain
    /// reports no failure message for the group or any transaction.
    fn simulate_group<'a>(
        &'a self,
        group: &'a [Vec<u8>],
        network: &'a str,
    ) -> BoxFuture<'a, Result<(), SignerError>>;

    /// Submits a fully signed group and returns the transaction id.
    fn send_group<'a>(
        &'a self,
        group: &'a [Vec<u8>],
        network: &'a str,
    ) -> BoxFuture<'a, Result<String, SignerError>>;

    /// Waits for the transaction to be confirmed, bounded by `rounds`.
    ///
    /// Algorand blocks are final once written, so confirmation implies
    /// irreversibility.
    fn wait_for_confirmation<'a>(
        &'a self,
        txid: &'a str,
        network: &'a str,
        rounds: u64,
    ) -> BoxFuture<'a, Result<(), SignerError>>;
}
