//! Configuration types for protected resources.

use std::sync::Arc;

use a402_proto::Network;
use serde_json::Value;

/// Producer for per-request recipient addresses.
///
/// Receives the transport context (e.g., serialized HTTP request metadata)
/// and returns the address payments for this request should go to.
pub type PayToProducer = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Recipient address for a protected resource: fixed, or derived per request.
#[derive(Clone)]
pub enum PayTo {
    /// A fixed recipient address.
    Static(String),
    /// A producer called with the transport context on every request.
    Dynamic(PayToProducer),
}

impl PayTo {
    /// Creates a dynamic recipient from a producer function.
    pub fn dynamic<F>(producer: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(producer))
    }

    /// Resolves the recipient address for the given transport context.
    #[must_use]
    pub fn resolve(&self, transport_context: &Value) -> String {
        match self {
            Self::Static(address) => address.clone(),
            Self::Dynamic(producer) => producer(transport_context),
        }
    }
}

impl std::fmt::Debug for PayTo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(address) => f.debug_tuple("Static").field(address).finish(),
            Self::Dynamic(_) => f.debug_tuple("Dynamic").field(&"<fn>").finish(),
        }
    }
}

impl From<String> for PayTo {
    fn from(address: String) -> Self {
        Self::Static(address)
    }
}

impl From<&str> for PayTo {
    fn from(address: &str) -> Self {
        Self::Static(address.into())
    }
}

/// Configuration for a protected resource.
///
/// Defines what a resource server charges for a specific endpoint.
///
/// # Example
///
/// ```rust
/// use a402::config::{PayTo, ResourceConfig};
///
/// let config = ResourceConfig {
///     scheme: "exact".into(),
///     pay_to: PayTo::Static("RECEIVER".into()),
///     price: serde_json::json!("1.50"),
///     network: "algorand:SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=".into(),
///     max_timeout_seconds: Some(300),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ResourceConfig {
    /// Payment scheme identifier (e.g., `"exact"`).
    pub scheme: String,

    /// Recipient address, fixed or per-request.
    pub pay_to: PayTo,

    /// Price for the resource — a money string (`"1.50"`), a number, or an
    /// [`AssetAmount`](crate::scheme::AssetAmount) object.
    pub price: Value,

    /// CAIP-2 network identifier.
    pub network: Network,

    /// Maximum time in seconds for payment validity.
    /// Defaults to 300 if not set.
    pub max_timeout_seconds: Option<u64>,
}
