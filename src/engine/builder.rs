//! Builder for configuring decision engines

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::DecisionEngine;
use crate::Result;
use crate::cache::{CacheConfig, DecisionCache, InFlightGuard};
use crate::classifier::{ChatCompletionsClassifier, Classifier};
use crate::resolver::{DecisionResolver, ResolverConfig};

/// Main entry point for creating engine instances.
pub struct Crest;

impl Crest {
    /// Create a new builder for configuring the engine.
    pub fn builder() -> CrestBuilder {
        CrestBuilder::new()
    }
}

/// Builder for configuring engine instances.
///
/// Live mode needs either an explicit [`classifier`](Self::classifier) or
/// both an API key and a gateway base URL. Anything less builds a mock-mode
/// engine.
#[derive(Default)]
pub struct CrestBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    classifier: Option<Arc<dyn Classifier>>,
    cache: CacheConfig,
    resolver: ResolverConfig,
}

impl CrestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the OpenAI-compatible gateway used in live mode.
    pub fn gateway(mut self, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the API key alone; live mode also needs [`base_url`](Self::base_url).
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the model routed through the gateway.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Use a custom classifier instead of the HTTP gateway.
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Replace the cache configuration.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl = ttl;
        self
    }

    pub fn cache_max_entries(mut self, n: usize) -> Self {
        self.cache.max_entries = n;
        self
    }

    /// Replace the resolver configuration.
    pub fn resolver(mut self, config: ResolverConfig) -> Self {
        self.resolver = config;
        self
    }

    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.resolver.upstream_timeout = timeout;
        self
    }

    /// Whether fallbacks caused by upstream failures are cached.
    pub fn cache_failures(mut self, cache: bool) -> Self {
        self.resolver.cache_failures = cache;
        self
    }

    pub fn stale_after(mut self, max_age: Duration) -> Self {
        self.resolver.stale_after = max_age;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<DecisionEngine> {
        let classifier = match (self.classifier, self.api_key, self.base_url) {
            (Some(classifier), _, _) => Some(classifier),
            (None, Some(key), Some(url)) if !key.is_empty() && !url.is_empty() => {
                let mut client = ChatCompletionsClassifier::new(key, url)?;
                if let Some(model) = self.model {
                    client = client.with_model(model);
                }
                Some(Arc::new(client) as Arc<dyn Classifier>)
            }
            _ => None,
        };

        let Some(classifier) = classifier else {
            warn!("no classifier credentials configured, running in mock mode");
            return Ok(DecisionEngine::mock());
        };

        info!(
            classifier = classifier.name(),
            ttl_secs = self.cache.ttl.as_secs(),
            max_entries = self.cache.max_entries,
            timeout_ms = self.resolver.upstream_timeout.as_millis() as u64,
            cache_failures = self.resolver.cache_failures,
            "running in live mode"
        );

        let resolver = DecisionResolver::new(
            Arc::new(DecisionCache::new(&self.cache)),
            Arc::new(InFlightGuard::new()),
            classifier,
            self.resolver,
        )?;
        Ok(DecisionEngine::live(resolver))
    }
}
