//! Upstream classifier seam.
//!
//! The resolver treats the classifier as an untrusted, slow, fallible
//! collaborator: it returns a raw token that the resolver validates, and
//! any error is folded into the safe fallback. Implementations should not
//! retry or apply their own short timeouts; the resolver bounds every call.

pub mod openai;
pub mod prompt;

pub use openai::{ChatCompletionsClassifier, DEFAULT_MODEL};

use async_trait::async_trait;

use crate::Result;

/// External loud-event classifier.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Name for logs and metrics (e.g. "truefoundry").
    fn name(&self) -> &str;

    /// Ask the classifier about `prompt`.
    ///
    /// Expected to return `YES` or `NO`, but callers must not rely on it.
    async fn classify(&self, prompt: &str) -> Result<String>;
}
