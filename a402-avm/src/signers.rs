//! Single-key signer implementations backed by `algonaut`.
//!
//! [`AlgorandAccountSigner`] wraps one client account.
//! [`FacilitatorAlgorandSigner`] manages a set of fee-payer accounts together
//! with per-network Algod clients. Key derivation beyond the standard 25-word
//! mnemonic is the integrator's concern.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use algonaut::algod::v2::Algod;
use algonaut::transaction::account::Account;
use algonaut::transaction::{SignedTransaction, Transaction};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use dashmap::DashMap;
use serde::Serialize;

use a402::scheme::BoxFuture;

use crate::networks;
use crate::signer::{ClientAvmSigner, FacilitatorAvmSigner, SignerError};

/// Default number of rounds to await confirmation.
pub const DEFAULT_CONFIRMATION_ROUNDS: u64 = 4;

/// Polls per awaited round (Algorand rounds land roughly every 3 seconds).
const CONFIRMATION_POLLS_PER_ROUND: u64 = 4;

/// Poll interval while awaiting confirmation.
const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(800);

/// Placeholder API token: AlgoNode endpoints take no auth, but the client
/// constructor requires a token of the right length.
const ALGOD_TOKEN: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

/// Signed-transaction envelope around an unsigned transaction, as the
/// simulate endpoint expects for empty-signature entries.
#[derive(Serialize)]
struct UnsignedEnvelope<'a> {
    #[serde(rename = "txn")]
    txn: &'a Transaction,
}

/// Client-side signer holding a single Algorand account.
pub struct AlgorandAccountSigner {
    account: Account,
}

impl std::fmt::Debug for AlgorandAccountSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorandAccountSigner")
            .field("address", &self.account.address().to_string())
            .finish()
    }
}

impl AlgorandAccountSigner {
    /// Wraps an existing account.
    #[must_use]
    pub const fn new(account: Account) -> Self {
        Self { account }
    }

    /// Creates a signer from a 25-word Algorand mnemonic.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Signing`] if the mnemonic is invalid.
    pub fn from_mnemonic(mnemonic: &str) -> Result<Self, SignerError> {
        let account = Account::from_mnemonic(mnemonic)
            .map_err(|e| SignerError::Signing(format!("invalid mnemonic: {e}")))?;
        Ok(Self { account })
    }
}

impl ClientAvmSigner for AlgorandAccountSigner {
    fn address(&self) -> String {
        self.account.address().to_string()
    }

    fn sign_transactions(
        &self,
        unsigned_txns: &[Vec<u8>],
        indexes_to_sign: &[usize],
    ) -> Result<Vec<Option<Vec<u8>>>, SignerError> {
        let mut results: Vec<Option<Vec<u8>>> = vec![None; unsigned_txns.len()];

        for &idx in indexes_to_sign {
            let Some(bytes) = unsigned_txns.get(idx) else {
                continue;
            };
            let txn: Transaction = rmp_serde::from_slice(bytes)
                .map_err(|e| SignerError::Decode(e.to_string()))?;
            let signed = self
                .account
                .sign_transaction(txn)
                .map_err(|e| SignerError::Signing(e.to_string()))?;
            let encoded = rmp_serde::to_vec_named(&signed)
                .map_err(|e| SignerError::Signing(e.to_string()))?;
            results[idx] = Some(encoded);
        }

        Ok(results)
    }
}

/// Facilitator-side signer managing fee-payer accounts and Algod clients.
///
/// Algod clients are created lazily per network; a racing double-insert
/// keeps the first client and drops the second, so initialization is
/// idempotent.
pub struct FacilitatorAlgorandSigner {
    accounts: HashMap<String, Account>,
    clients: DashMap<String, Arc<Algod>>,
    http: reqwest::Client,
    algod_url_override: Option<String>,
}

impl std::fmt::Debug for FacilitatorAlgorandSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacilitatorAlgorandSigner")
            .field("accounts", &self.accounts.keys().collect::<Vec<_>>())
            .field("algod_url_override", &self.algod_url_override)
            .finish_non_exhaustive()
    }
}

impl Default for FacilitatorAlgorandSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl FacilitatorAlgorandSigner {
    /// Creates a signer with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            clients: DashMap::new(),
            http: reqwest::Client::new(),
            algod_url_override: None,
        }
    }

    /// Overrides the Algod endpoint for every network (useful against a
    /// local node or sandbox).
    #[must_use]
    pub fn with_algod_url(mut self, url: impl Into<String>) -> Self {
        self.algod_url_override = Some(url.into());
        self
    }

    /// Adds a fee-payer account.
    #[must_use]
    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.insert(account.address().to_string(), account);
        self
    }

    /// Adds a fee-payer account from a 25-word mnemonic.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Signing`] if the mnemonic is invalid.
    pub fn with_account_from_mnemonic(self, mnemonic: &str) -> Result<Self, SignerError> {
        let account = Account::from_mnemonic(mnemonic)
            .map_err(|e| SignerError::Signing(format!("invalid mnemonic: {e}")))?;
        Ok(self.with_account(account))
    }

    fn endpoint(&self, network: &str) -> Result<String, SignerError> {
        if let Some(url) = &self.algod_url_override {
            return Ok(url.clone());
        }
        Ok(networks::network_config(network)?.algod_endpoint())
    }

    fn algod(&self, network: &str) -> Result<Arc<Algod>, SignerError> {
        let caip2 = networks::normalize_network(network)?;
        if let Some(client) = self.clients.get(caip2) {
            return Ok(Arc::clone(&client));
        }

        let url = self.endpoint(caip2)?;
        let algod = Algod::new(&url, ALGOD_TOKEN).map_err(|e| SignerError::Rpc(e.to_string()))?;
        let entry = self
            .clients
            .entry(caip2.to_owned())
            .or_insert_with(|| Arc::new(algod));
        Ok(Arc::clone(&entry))
    }

    fn account(&self, fee_payer: &str) -> Result<&Account, SignerError> {
        self.accounts
            .get(fee_payer)
            .ok_or_else(|| SignerError::UnmanagedFeePayer(fee_payer.to_owned()))
    }

    /// Re-encodes a group entry for the simulate endpoint, wrapping unsigned
    /// transactions into an empty-signature envelope.
    fn simulate_entry(bytes: &[u8]) -> Result<String, SignerError> {
        if rmp_serde::from_slice::<SignedTransaction>(bytes).is_ok() {
            return Ok(BASE64.encode(bytes));
        }
        let txn: Transaction =
            rmp_serde::from_slice(bytes).map_err(|e| SignerError::Decode(e.to_string()))?;
        let wrapped = rmp_serde::to_vec_named(&UnsignedEnvelope { txn: &txn })
            .map_err(|e| SignerError::Decode(e.to_string()))?;
        Ok(BASE64.encode(wrapped))
    }
}

impl FacilitatorAvmSigner for FacilitatorAlgorandSigner {
    fn addresses(&self) -> Vec<String> {
        self.accounts.keys().cloned().collect()
    }

    fn sign_group(
        &self,
        group: &[Vec<u8>],
        fee_payer: &str,
        indexes_to_sign: &[usize],
    ) -> Result<Vec<Vec<u8>>, SignerError> {
        let account = self.account(fee_payer)?;
        let mut results: Vec<Vec<u8>> = group.to_vec();

        for &idx in indexes_to_sign {
            let Some(bytes) = group.get(idx) else {
                continue;
            };
            // Accept a re-sign of an already wrapped entry by unwrapping it.
            let txn = match rmp_serde::from_slice::<SignedTransaction>(bytes) {
                Ok(signed) => signed.transaction,
                Err(_) => rmp_serde::from_slice::<Transaction>(bytes)
                    .map_err(|e| SignerError::Decode(e.to_string()))?,
            };
            let signed = account
                .sign_transaction(txn)
                .map_err(|e| SignerError::Signing(e.to_string()))?;
            results[idx] = rmp_serde::to_vec_named(&signed)
                .map_err(|e| SignerError::Signing(e.to_string()))?;
        }

        Ok(results)
    }

    fn simulate_group<'a>(
        &'a self,
        group: &'a [Vec<u8>],
        network: &'a str,
    ) -> BoxFuture<'a, Result<(), SignerError>> {
        Box::pin(async move {
            let caip2 = networks::normalize_network(network)?;
            let url = format!("{}/v2/transactions/simulate", self.endpoint(caip2)?);

            let entries = group
                .iter()
                .map(|bytes| {
                    Self::simulate_entry(bytes).map(|b64| serde_json::json!({ "txn": b64 }))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let body = serde_json::json!({
                "txn-groups": [{ "txns": entries }],
                "allow-empty-signatures": true,
            });

            tracing::debug!(url = %url, group_size = group.len(), "simulating transaction group");

            let response = self
                .http
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| SignerError::Rpc(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(SignerError::Simulation(format!("{status}: {text}")));
            }

            let result: serde_json::Value = response
                .json()
                .await
                .map_err(|e| SignerError::Rpc(e.to_string()))?;

            check_simulation_result(&result)
        })
    }

    fn send_group<'a>(
        &'a self,
        group: &'a [Vec<u8>],
        network: &'a str,
    ) -> BoxFuture<'a, Result<String, SignerError>> {
        Box::pin(async move {
            let algod = self.algod(network)?;

            // Submit the raw concatenation; re-encoding decoded transactions
            // risks corrupting client signatures.
            let raw: Vec<u8> = group.iter().flatten().copied().collect();
            let response = algod
                .broadcast_raw_transaction(&raw)
                .await
                .map_err(|e| SignerError::Rpc(e.to_string()))?;

            tracing::info!(
                txid = %response.tx_id,
                group_size = group.len(),
                "submitted transaction group"
            );
            Ok(response.tx_id)
        })
    }

    fn wait_for_confirmation<'a>(
        &'a self,
        txid: &'a str,
        network: &'a str,
        rounds: u64,
    ) -> BoxFuture<'a, Result<(), SignerError>> {
        Box::pin(async move {
            let algod = self.algod(network)?;
            let attempts = rounds.max(1) * CONFIRMATION_POLLS_PER_ROUND;

            for _ in 0..attempts {
                match algod.pending_transaction_with_id(txid).await {
                    Ok(info) => {
                        if info.confirmed_round.is_some() {
                            tracing::info!(txid = %txid, "transaction confirmed");
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        tracing::warn!(txid = %txid, error = %e, "pending transaction lookup failed");
                    }
                }
                tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
            }

            Err(SignerError::Confirmation {
                txid: txid.to_owned(),
                rounds,
            })
        })
    }
}

/// Scans a simulate response for group- or transaction-level failures.
fn check_simulation_result(result: &serde_json::Value) -> Result<(), SignerError> {
    let Some(groups) = result.get("txn-groups").and_then(|g| g.as_array()) else {
        return Ok(());
    };

    for group in groups {
        if let Some(failure) = group.get("failure-message").and_then(|f| f.as_str())
            && !failure.is_empty()
        {
            return Err(SignerError::Simulation(failure.to_owned()));
        }

        let Some(txn_results) = group.get("txn-results").and_then(|r| r.as_array()) else {
            continue;
        };
        for txn_result in txn_results {
            if let Some(failure) = txn_result
                .get("txn-result")
                .and_then(|r| r.get("failure-message"))
                .and_then(|f| f.as_str())
                && !failure.is_empty()
            {
                return Err(SignerError::Simulation(failure.to_owned()));
            }
        }
    }

    Ok(())
}
