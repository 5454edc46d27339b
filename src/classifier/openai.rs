//! OpenAI-compatible chat-completions classifier.
//!
//! Talks to any gateway exposing `POST {base_url}/chat/completions`
//! (TrueFoundry, OpenAI, OpenRouter, a local proxy). The completion text is
//! returned trimmed and upper-cased; validation is the resolver's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::Classifier;
use crate::{CrestError, Result};

/// Model routed through the gateway by default.
pub const DEFAULT_MODEL: &str = "openai-main/gpt-4o-mini";

/// Yes/no answers need only a couple of tokens.
const MAX_TOKENS: u32 = 10;
const TEMPERATURE: f32 = 0.1;

/// Default per-request ceiling. The resolver applies a much tighter bound;
/// this only stops abandoned connections from lingering.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct ChatCompletionsClassifier {
    api_key: String,
    http: Client,
    base_url: String,
    model: String,
    name: String,
    request_timeout: Duration,
}

impl ChatCompletionsClassifier {
    /// Create a classifier for the gateway at `base_url`.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| CrestError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            name: "truefoundry".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Override the model ID sent to the gateway.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Bound each HTTP request. Expiry surfaces as [`CrestError::Timeout`].
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn transport_error(&self, err: reqwest::Error) -> CrestError {
        if err.is_timeout() {
            CrestError::Timeout(self.request_timeout)
        } else {
            CrestError::Http(err.to_string())
        }
    }

    fn handle_response_errors(&self, response: &reqwest::Response) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            401 | 403 => Err(CrestError::AuthenticationFailed),
            code => Err(CrestError::Api {
                status: code,
                message: format!("chat completions error: {status}"),
            }),
        }
    }
}

#[async_trait]
impl Classifier for ChatCompletionsClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "classifier.classify", skip(self, prompt), fields(provider = %self.name, model = %self.model))]
    async fn classify(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .json(&ChatRequest {
                model: &self.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                max_tokens: MAX_TOKENS,
                temperature: TEMPERATURE,
            })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.handle_response_errors(&response)?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(CrestError::EmptyResponse)?;

        Ok(content.trim().to_uppercase())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
