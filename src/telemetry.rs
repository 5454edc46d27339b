//! Telemetry metric name constants.
//!
//! Centralised metric names for crest operations. The daemon installs a
//! prometheus recorder; library consumers install their own. Without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `crest_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `input`: input kind: "subtitle" or "audio"
//! - `outcome`: how a resolution ended (see [`Outcome::as_str`](crate::Outcome::as_str))
//! - `decision`: "yes" or "no"
//! - `endpoint`: HTTP route path

/// Total HTTP requests handled by the server.
///
/// Labels: `endpoint`, `method`.
pub const REQUESTS_TOTAL: &str = "crest_requests_total";

/// HTTP request processing time in seconds.
///
/// Labels: `endpoint`.
pub const PROCESSING_DURATION_SECONDS: &str = "crest_processing_duration_seconds";

/// Total decision cache hits.
///
/// Labels: `input`.
pub const CACHE_HITS_TOTAL: &str = "crest_cache_hits_total";

/// Total decision cache misses.
///
/// Labels: `input`.
pub const CACHE_MISSES_TOTAL: &str = "crest_cache_misses_total";

/// Total cache entries reclaimed by capacity-triggered sweeps.
pub const CACHE_SWEPT_TOTAL: &str = "crest_cache_swept_total";

/// Total requests answered with the fallback because an identical request
/// was already in flight.
///
/// Labels: `input`.
pub const INFLIGHT_DUPLICATES_TOTAL: &str = "crest_inflight_duplicates_total";

/// Total in-flight markers removed by the stale sweep.
pub const INFLIGHT_STALE_TOTAL: &str = "crest_inflight_stale_total";

/// Total upstream classifier calls issued.
///
/// Labels: `input`, `classifier`.
pub const UPSTREAM_REQUESTS_TOTAL: &str = "crest_upstream_requests_total";

/// Upstream classifier call duration in seconds.
///
/// Labels: `input`, `classifier`.
pub const UPSTREAM_DURATION_SECONDS: &str = "crest_upstream_duration_seconds";

/// Total upstream calls that did not yield a usable decision.
///
/// Labels: `input`, `kind` ("timeout" | "transport" | "panic" | "malformed").
pub const UPSTREAM_ERRORS_TOTAL: &str = "crest_upstream_errors_total";

/// Total decisions returned to callers.
///
/// Labels: `input`, `decision`, `outcome`.
pub const DECISIONS_TOTAL: &str = "crest_decisions_total";

/// Total loud events that produced a volume reduction directive.
///
/// Labels: `input`.
pub const LOUD_EVENTS_TOTAL: &str = "crest_loud_events_total";

/// Total user corrections reported by the extension.
///
/// Labels: `source`.
pub const USER_CORRECTIONS_TOTAL: &str = "crest_user_corrections_total";
