//! Crest - loud-event decisions for a volume-ducking browser extension
//!
//! Crest receives subtitle text or audio-level telemetry, decides whether
//! the moment is a loud event, and returns a volume directive. In live mode
//! decisions come from an upstream language-model classifier, wrapped in a
//! TTL cache and an in-flight guard that collapses concurrent duplicates
//! into one upstream call. Without credentials, local rules decide.
//!
//! # Example
//!
//! ```rust,no_run
//! use crest::{Crest, Decision};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> crest::Result<()> {
//!     let engine = Crest::builder()
//!         .gateway("tfy-api-key", "https://gateway.example.com/api/inference/openai")
//!         .upstream_timeout(Duration::from_secs(1))
//!         .cache_ttl(Duration::from_secs(300))
//!         .build()?;
//!
//!     let (verdict, directive) = engine.subtitle_directive("[explosion]").await;
//!     if verdict.decision == Decision::Loud {
//!         println!("lower to {:?} for {:?} ms", directive.level, directive.duration_ms);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod rules;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types at crate root
pub use cache::{CacheConfig, DecisionCache, Fingerprint, InFlightGuard, InFlightPermit};
pub use classifier::{ChatCompletionsClassifier, Classifier};
pub use engine::{Crest, CrestBuilder, DecisionEngine, Mode};
pub use error::{CrestError, Result};
pub use resolver::{DecisionResolver, ResolverConfig};
pub use types::{
    AudioSample, Decision, DecisionInput, Outcome, Verdict, VolumeAction, VolumeDirective,
};
