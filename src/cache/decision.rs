//! TTL-bounded decision cache.
//!
//! [`DecisionCache`] maps a [`Fingerprint`] to the decision last resolved
//! for it. Entries expire lazily: a lookup that finds an expired entry
//! removes it and reports a miss. Growth is bounded by a capacity-triggered
//! sweep: when an insert pushes the entry count past `max_entries`, every
//! expired entry is dropped in one pass. This is purely TTL reclamation,
//! not LRU; a cache full of live entries may temporarily exceed capacity.
//!
//! All access is serialized through one mutex per instance. Critical
//! sections never await.
//!
//! Time is read from [`tokio::time::Instant`], so tests can drive expiry
//! with a paused clock and `tokio::time::advance`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::Fingerprint;
use crate::telemetry;
use crate::types::Decision;

/// Configuration for the decision cache.
///
/// ```rust
/// # use crest::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(5_000)
///     .ttl(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entry count above which an insert triggers a sweep. Default: 1,000.
    pub max_entries: usize,
    /// Time-to-live for cached decisions. Default: 5 minutes.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sweep threshold.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached decisions.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    decision: Decision,
    created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

/// In-memory TTL cache of resolved decisions.
pub struct DecisionCache {
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl DecisionCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: config.ttl,
            max_entries: config.max_entries,
        }
    }

    /// Look up a live decision.
    ///
    /// An expired entry is evicted before the miss is returned, so this
    /// mutates the map even though it reads like a query. Other keys are
    /// never affected.
    pub fn lookup(&self, fp: &Fingerprint) -> Option<Decision> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(fp) {
            Some(entry) if !entry.is_expired(now, self.ttl) => Some(entry.decision),
            Some(_) => {
                entries.remove(fp);
                debug!(fingerprint = %fp, "evicted expired decision on lookup");
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite the decision for `fp`, stamped with the current time.
    ///
    /// If the cache now holds more than `max_entries`, every expired entry
    /// is removed before returning.
    pub fn store(&self, fp: Fingerprint, decision: Decision) {
        let now = Instant::now();
        let mut entries = self.lock();
        entries.insert(
            fp,
            CacheEntry {
                decision,
                created_at: now,
            },
        );
        if entries.len() > self.max_entries {
            let removed = Self::sweep_locked(&mut entries, now, self.ttl);
            debug!(
                removed,
                remaining = entries.len(),
                "capacity sweep of decision cache"
            );
            metrics::counter!(telemetry::CACHE_SWEPT_TOTAL).increment(removed as u64);
        }
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        Self::sweep_locked(&mut entries, now, self.ttl)
    }

    /// Number of entries currently stored, including expired ones not yet
    /// reclaimed.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn sweep_locked(
        entries: &mut HashMap<Fingerprint, CacheEntry>,
        now: Instant,
        ttl: Duration,
    ) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, ttl));
        before - entries.len()
    }

    // A panic while the lock is held cannot leave a half-written entry
    // (HashMap::insert is the only mutation), so a poisoned lock is still
    // consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<Fingerprint, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
