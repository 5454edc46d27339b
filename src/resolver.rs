//! Cached, deduplicated decision resolution.
//!
//! [`DecisionResolver`] wraps the upstream classifier:
//!
//! 1. Fingerprint the input and consult the [`DecisionCache`]. A live entry
//!    is returned as-is; upstream and the in-flight guard are not touched.
//! 2. On a miss, reclaim stale in-flight markers, then try to take the
//!    marker for this fingerprint. If another resolution holds it, return
//!    the safe fallback immediately. Followers never wait on the leader.
//! 3. Call the classifier once, bounded by `upstream_timeout`. Timeouts,
//!    transport errors, and tokens other than `YES`/`NO` all become the
//!    safe fallback. There is no retry.
//! 4. Store the decision, release the marker, and return.
//!
//! A classifier that panics is treated as a transport failure. The marker
//! is held as an [`InFlightPermit`](crate::InFlightPermit), so it is
//! released on every exit path, including cancellation of the resolving
//! future.
//!
//! # Caching failure fallbacks
//!
//! With `cache_failures = true` (the default) a fallback produced by a
//! timeout, transport error, or malformed answer is cached like a genuine
//! `NO`. A brief upstream outage then pins the affected inputs to quiet
//! for a full TTL after upstream recovers. Set it to `false` to leave
//! those inputs uncached so the next request retries upstream. Duplicate
//! fallbacks are never cached: the leader's answer will be.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::cache::{DecisionCache, Fingerprint, InFlightGuard};
use crate::classifier::{Classifier, prompt};
use crate::telemetry;
use crate::types::{Decision, DecisionInput, Outcome, Verdict};
use crate::{CrestError, Result};

/// Tunables for [`DecisionResolver`].
///
/// ```rust
/// # use crest::ResolverConfig;
/// # use std::time::Duration;
/// let config = ResolverConfig::new()
///     .upstream_timeout(Duration::from_millis(800))
///     .cache_failures(false);
/// ```
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Bound on a single upstream call. Default: 1 second.
    pub upstream_timeout: Duration,
    /// Whether failure fallbacks are cached. Default: true.
    pub cache_failures: bool,
    /// In-flight markers older than this are swept. Default: 30 seconds.
    pub stale_after: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            upstream_timeout: Duration::from_secs(1),
            cache_failures: true,
            stale_after: Duration::from_secs(30),
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn cache_failures(mut self, cache: bool) -> Self {
        self.cache_failures = cache;
        self
    }

    pub fn stale_after(mut self, max_age: Duration) -> Self {
        self.stale_after = max_age;
        self
    }

    /// Reject settings that would break the guard's guarantees.
    ///
    /// `stale_after` must exceed `upstream_timeout`, otherwise a live
    /// resolution's marker could be swept and a duplicate upstream call
    /// issued.
    pub fn validate(&self) -> Result<()> {
        if self.upstream_timeout.is_zero() {
            return Err(CrestError::Configuration(
                "upstream timeout must be greater than zero".to_string(),
            ));
        }
        if self.stale_after <= self.upstream_timeout {
            return Err(CrestError::Configuration(format!(
                "stale in-flight age ({:?}) must exceed the upstream timeout ({:?})",
                self.stale_after, self.upstream_timeout
            )));
        }
        Ok(())
    }
}

/// Orchestrates cache, in-flight guard, and upstream classifier.
///
/// Always produces a [`Verdict`]; upstream errors never reach the caller.
pub struct DecisionResolver {
    cache: Arc<DecisionCache>,
    inflight: Arc<InFlightGuard>,
    classifier: Arc<dyn Classifier>,
    config: ResolverConfig,
}

impl DecisionResolver {
    /// Fails with [`CrestError::Configuration`] if `config` does not pass
    /// [`ResolverConfig::validate`].
    pub fn new(
        cache: Arc<DecisionCache>,
        inflight: Arc<InFlightGuard>,
        classifier: Arc<dyn Classifier>,
        config: ResolverConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cache,
            inflight,
            classifier,
            config,
        })
    }

    /// Resolve a decision for `input`.
    #[instrument(name = "resolver.resolve", skip(self, input), fields(input = input.kind()))]
    pub async fn resolve(&self, input: &DecisionInput) -> Verdict {
        let kind = input.kind();
        let fp = Fingerprint::of(input);

        if let Some(decision) = self.cache.lookup(&fp) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "input" => kind).increment(1);
            debug!(fingerprint = %fp, decision = decision.as_token(), "cache hit");
            return Verdict::new(decision, Outcome::CacheHit);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "input" => kind).increment(1);

        let swept = self.inflight.sweep_stale(self.config.stale_after);
        if swept > 0 {
            metrics::counter!(telemetry::INFLIGHT_STALE_TOTAL).increment(swept as u64);
        }

        let Some(permit) = self.inflight.acquire(fp) else {
            metrics::counter!(telemetry::INFLIGHT_DUPLICATES_TOTAL, "input" => kind).increment(1);
            debug!(fingerprint = %fp, "duplicate of in-flight request, using fallback");
            return Verdict::new(Decision::SAFE_FALLBACK, Outcome::Duplicate);
        };

        let (decision, outcome) = self.call_upstream(kind, &prompt::for_input(input)).await;

        if !outcome.is_fallback() || self.config.cache_failures {
            self.cache.store(fp, decision);
        }
        drop(permit);

        Verdict::new(decision, outcome)
    }

    /// One bounded upstream attempt, folded into a decision.
    async fn call_upstream(&self, kind: &'static str, prompt: &str) -> (Decision, Outcome) {
        let provider = self.classifier.name().to_owned();
        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
            "input" => kind,
            "classifier" => provider.clone(),
        )
        .increment(1);

        let start = Instant::now();
        let call = AssertUnwindSafe(self.classifier.classify(prompt)).catch_unwind();
        let result = tokio::time::timeout(self.config.upstream_timeout, call).await;
        let elapsed = start.elapsed();
        metrics::histogram!(telemetry::UPSTREAM_DURATION_SECONDS,
            "input" => kind,
            "classifier" => provider.clone(),
        )
        .record(elapsed.as_secs_f64());

        match result {
            Err(_) => {
                warn!(
                    classifier = %provider,
                    timeout_ms = self.config.upstream_timeout.as_millis() as u64,
                    "classifier timed out, using fallback"
                );
                Self::record_upstream_error(kind, "timeout");
                (Decision::SAFE_FALLBACK, Outcome::Timeout)
            }
            Ok(Err(_panic)) => {
                warn!(classifier = %provider, "classifier panicked, using fallback");
                Self::record_upstream_error(kind, "panic");
                (Decision::SAFE_FALLBACK, Outcome::TransportFailure)
            }
            Ok(Ok(Err(err))) => {
                warn!(
                    classifier = %provider,
                    error = %err,
                    error_kind = err.kind(),
                    "classifier call failed, using fallback"
                );
                Self::record_upstream_error(kind, "transport");
                (Decision::SAFE_FALLBACK, Outcome::TransportFailure)
            }
            Ok(Ok(Ok(token))) => match Decision::from_token(&token) {
                Some(decision) => {
                    info!(
                        classifier = %provider,
                        decision = decision.as_token(),
                        duration_ms = elapsed.as_millis() as u64,
                        "classifier decision"
                    );
                    (decision, Outcome::Upstream)
                }
                None => {
                    warn!(
                        classifier = %provider,
                        response = %token,
                        expected = "YES or NO",
                        "classifier returned unexpected response, using fallback"
                    );
                    Self::record_upstream_error(kind, "malformed");
                    (Decision::SAFE_FALLBACK, Outcome::Malformed)
                }
            },
        }
    }

    fn record_upstream_error(kind: &'static str, error: &'static str) {
        metrics::counter!(telemetry::UPSTREAM_ERRORS_TOTAL,
            "input" => kind,
            "kind" => error,
        )
        .increment(1);
    }

    pub fn cache(&self) -> &DecisionCache {
        &self.cache
    }

    pub fn inflight(&self) -> &InFlightGuard {
        &self.inflight
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ResolverConfig::default();
        assert_eq!(config.upstream_timeout, Duration::from_secs(1));
        assert!(config.cache_failures);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = ResolverConfig::new().upstream_timeout(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(CrestError::Configuration(_))
        ));
    }

    struct Unused;

    #[async_trait::async_trait]
    impl Classifier for Unused {
        fn name(&self) -> &str {
            "unused"
        }

        async fn classify(&self, _prompt: &str) -> Result<String> {
            Ok("NO".to_string())
        }
    }

    #[test]
    fn new_rejects_stale_age_within_timeout() {
        let result = DecisionResolver::new(
            Arc::new(DecisionCache::default()),
            Arc::new(InFlightGuard::new()),
            Arc::new(Unused),
            ResolverConfig::new()
                .upstream_timeout(Duration::from_secs(10))
                .stale_after(Duration::from_secs(2)),
        );
        assert!(matches!(result, Err(CrestError::Configuration(_))));
    }

    #[test]
    fn stale_age_must_exceed_timeout() {
        let config = ResolverConfig::new()
            .upstream_timeout(Duration::from_secs(5))
            .stale_after(Duration::from_secs(5));
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("must exceed the upstream timeout"));
    }
}
