//! Concurrent-request guard.
//!
//! [`InFlightGuard`] records which fingerprints currently have an upstream
//! call executing. A resolution that finds its fingerprint already marked
//! does not call upstream and does not wait; it answers with the safe
//! fallback instead. N identical concurrent requests therefore cost one
//! upstream call.
//!
//! Markers are released through [`InFlightPermit`], which removes its
//! marker on drop. Early returns, panics, and cancelled futures all
//! release. [`InFlightGuard::sweep_stale`] reclaims markers that outlived
//! any plausible upstream call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use super::Fingerprint;

#[derive(Debug, Clone, Copy)]
struct InFlightMarker {
    started_at: Instant,
    /// Distinguishes successive markers for the same fingerprint.
    token: u64,
}

#[derive(Default)]
struct Markers {
    by_fingerprint: HashMap<Fingerprint, InFlightMarker>,
    next_token: u64,
}

impl Markers {
    fn insert(&mut self, fp: Fingerprint, now: Instant) -> Option<u64> {
        if self.by_fingerprint.contains_key(&fp) {
            return None;
        }
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        self.by_fingerprint.insert(
            fp,
            InFlightMarker {
                started_at: now,
                token,
            },
        );
        Some(token)
    }
}

/// Tracks fingerprints with an upstream call in progress.
#[derive(Default)]
pub struct InFlightGuard {
    markers: Mutex<Markers>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `fp` as in flight.
    ///
    /// Returns `true` if the caller now owns the marker and must call
    /// [`end`](Self::end) on every exit path. Returns `false` if another
    /// resolution already holds it. Prefer [`acquire`](Self::acquire),
    /// which releases automatically.
    pub fn try_begin(&self, fp: Fingerprint) -> bool {
        self.lock().insert(fp, Instant::now()).is_some()
    }

    /// Unconditionally remove the marker for `fp`.
    pub fn end(&self, fp: &Fingerprint) {
        self.lock().by_fingerprint.remove(fp);
    }

    /// Scoped form of [`try_begin`](Self::try_begin).
    ///
    /// The returned permit releases the marker when dropped. `None` means
    /// the fingerprint is already in flight.
    pub fn acquire(&self, fp: Fingerprint) -> Option<InFlightPermit<'_>> {
        let token = self.lock().insert(fp, Instant::now())?;
        Some(InFlightPermit {
            guard: self,
            fingerprint: fp,
            token,
        })
    }

    /// Remove markers older than `max_age`, completed or not.
    ///
    /// Returns the number removed. A non-zero result means some resolution
    /// held its marker far longer than the upstream timeout allows.
    pub fn sweep_stale(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut markers = self.lock();
        let before = markers.by_fingerprint.len();
        markers
            .by_fingerprint
            .retain(|_, m| now.saturating_duration_since(m.started_at) < max_age);
        let removed = before - markers.by_fingerprint.len();
        if removed > 0 {
            warn!(
                removed,
                max_age_ms = max_age.as_millis() as u64,
                "swept stale in-flight markers"
            );
        }
        removed
    }

    /// Whether `fp` is currently marked.
    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.lock().by_fingerprint.contains_key(fp)
    }

    /// Number of markers currently held.
    pub fn len(&self) -> usize {
        self.lock().by_fingerprint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release only if the marker is still the one this permit created.
    fn release(&self, fp: &Fingerprint, token: u64) {
        let mut markers = self.lock();
        if markers
            .by_fingerprint
            .get(fp)
            .is_some_and(|m| m.token == token)
        {
            markers.by_fingerprint.remove(fp);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Markers> {
        self.markers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ownership of one in-flight marker. Dropping it releases the marker.
///
/// If the marker was swept as stale and the fingerprint re-acquired by a
/// newer resolution, dropping this permit leaves the newer marker alone.
#[must_use = "dropping the permit immediately releases the in-flight marker"]
pub struct InFlightPermit<'a> {
    guard: &'a InFlightGuard,
    fingerprint: Fingerprint,
    token: u64,
}

impl InFlightPermit<'_> {
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

impl Drop for InFlightPermit<'_> {
    fn drop(&mut self) {
        self.guard.release(&self.fingerprint, self.token);
    }
}
