//! Caching and deduplication state.
//!
//! Two independent structures, both keyed on [`Fingerprint`]:
//!
//! - [`DecisionCache`]: TTL cache of resolved decisions, with lazy expiry
//!   on lookup and a capacity-triggered sweep.
//!
//! - [`InFlightGuard`]: markers for fingerprints whose upstream call is
//!   still running, so concurrent duplicates skip upstream entirely.
//!
//! Each owns its own lock. Only [`DecisionResolver`](crate::DecisionResolver)
//! mutates them, and it never holds both locks at once.

pub mod decision;
pub mod fingerprint;
pub mod inflight;

pub use decision::{CacheConfig, DecisionCache};
pub use fingerprint::Fingerprint;
pub use inflight::{InFlightGuard, InFlightPermit};
