//! Pattern-routed scheme registries.
//!
//! [`SchemeRegistry`] maps `(scheme, network pattern)` rows to handlers,
//! with [`NetworkPattern`] providing the wildcard and specificity rules:
//! an exact row beats every wildcard, and among matching wildcards the
//! longest prefix beats shorter ones. This lets an integrator hold, say,
//! all EVM chains behind one handler and a single mainnet behind another,
//! with the specific row winning.
//!
//! [`SchemeRegistryV1`] is the parallel legacy registry keyed by V1 network
//! names with plain lookup.
//!
//! Both registries are written during process startup and read-only
//! afterwards; the owning engine types never expose the internal maps.

use std::collections::HashMap;

use a402_proto::pattern::NetworkPattern;

/// Registry row key: a scheme name plus a network pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    scheme: String,
    pattern: NetworkPattern,
}

/// Registry row key for the V1 registry: a scheme name plus a legacy
/// network name (no wildcards).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKeyV1 {
    scheme: String,
    network: String,
}

/// Registry of V2 scheme handlers routed by network pattern.
///
/// # Type Parameters
///
/// - `T` — The handler type (e.g., `Box<dyn SchemeClient>`,
///   `Arc<dyn SchemeFacilitator>`)
pub struct SchemeRegistry<T> {
    routes: HashMap<RouteKey, T>,
}

impl<T> std::fmt::Debug for SchemeRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut routes: Vec<String> = self
            .routes
            .keys()
            .map(|k| format!("{}@{}", k.scheme, k.pattern))
            .collect();
        routes.sort();
        f.debug_tuple("SchemeRegistry").field(&routes).finish()
    }
}

impl<T> Default for SchemeRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SchemeRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Registers a handler for a scheme under a network pattern.
    ///
    /// Registering the same `(scheme, pattern)` row again replaces the
    /// previous handler.
    pub fn register(
        &mut self,
        scheme: impl Into<String>,
        pattern: impl Into<NetworkPattern>,
        handler: T,
    ) -> &mut Self {
        self.routes.insert(
            RouteKey {
                scheme: scheme.into(),
                pattern: pattern.into(),
            },
            handler,
        );
        self
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(
        mut self,
        scheme: impl Into<String>,
        pattern: impl Into<NetworkPattern>,
        handler: T,
    ) -> Self {
        self.register(scheme, pattern, handler);
        self
    }

    /// Resolves the handler for a `(scheme, network)` pair.
    ///
    /// Resolution is most-specific-wins, per
    /// [`NetworkPattern::specificity`]: the exact row if one exists, else
    /// the matching wildcard with the longest prefix (the bare family
    /// wildcard only wins when nothing narrower is registered).
    ///
    /// Deterministic: the same inputs always resolve to the same row.
    #[must_use]
    pub fn lookup(&self, scheme: &str, network: &str) -> Option<&T> {
        let exact = RouteKey {
            scheme: scheme.into(),
            pattern: NetworkPattern::new(network),
        };
        if let Some(handler) = self.routes.get(&exact) {
            return Some(handler);
        }

        self.routes
            .iter()
            .filter(|(key, _)| {
                key.scheme == scheme && key.pattern.is_wildcard() && key.pattern.matches(network)
            })
            .max_by_key(|(key, _)| key.pattern.specificity())
            .map(|(_, handler)| handler)
    }

    /// Returns `true` if [`lookup`](Self::lookup) would resolve a handler.
    #[must_use]
    pub fn contains(&self, scheme: &str, network: &str) -> bool {
        self.lookup(scheme, network).is_some()
    }

    /// Enumerates concrete (non-wildcard) routes as `(scheme, network, handler)`.
    ///
    /// Wildcard rows are excluded: they only resolve against concrete
    /// networks at lookup time and advertise nothing by themselves.
    pub fn registered(&self) -> impl Iterator<Item = (&str, &str, &T)> {
        self.routes.iter().filter_map(|(key, handler)| {
            (!key.pattern.is_wildcard())
                .then_some((key.scheme.as_str(), key.pattern.as_str(), handler))
        })
    }

    /// Returns an iterator over all handlers, wildcard rows included.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.routes.values()
    }

    /// Returns `true` if no rows are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Registry of V1 (legacy) scheme handlers keyed by network name.
pub struct SchemeRegistryV1<T> {
    routes: HashMap<RouteKeyV1, T>,
}

impl<T> std::fmt::Debug for SchemeRegistryV1<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut routes: Vec<String> = self
            .routes
            .keys()
            .map(|k| format!("{}@{}", k.scheme, k.network))
            .collect();
        routes.sort();
        f.debug_tuple("SchemeRegistryV1").field(&routes).finish()
    }
}

impl<T> Default for SchemeRegistryV1<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SchemeRegistryV1<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Registers a handler for a scheme under a legacy network name.
    pub fn register(
        &mut self,
        scheme: impl Into<String>,
        network: impl Into<String>,
        handler: T,
    ) -> &mut Self {
        self.routes.insert(
            RouteKeyV1 {
                scheme: scheme.into(),
                network: network.into(),
            },
            handler,
        );
        self
    }

    /// Looks up a handler by scheme and legacy network name.
    #[must_use]
    pub fn lookup(&self, scheme: &str, network: &str) -> Option<&T> {
        self.routes.get(&RouteKeyV1 {
            scheme: scheme.into(),
            network: network.into(),
        })
    }

    /// Enumerates all routes as `(scheme, network, handler)`.
    pub fn registered(&self) -> impl Iterator<Item = (&str, &str, &T)> {
        self.routes
            .iter()
            .map(|(key, handler)| (key.scheme.as_str(), key.network.as_str(), handler))
    }

    /// Returns `true` if no rows are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
