//! Gemini `generateContent` client used as a [`RemoteClassifier`].

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{ClassifierError, RemoteClassifier};
use crate::config::RemoteClassifierConfig;

/// Remote classifier backed by the Gemini REST API.
pub struct GeminiClassifier {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClassifier {
    /// Client for `model` at `endpoint` authenticated with `api_key`.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from configuration, reading the key from the configured environment
    /// variable. Returns `None` when the variable is unset or empty.
    #[must_use]
    pub fn from_config(cfg: &RemoteClassifierConfig) -> Option<Self> {
        let key = std::env::var(&cfg.api_key_env).ok().filter(|k| !k.trim().is_empty())?;
        Some(Self::new(cfg.endpoint.clone(), cfg.model.clone(), key))
    }

    fn url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request_body(prompt: &str) -> serde_json::Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.0 },
        })
    }

    /// Any 2xx carries a body worth parsing.
    fn is_accepted(status: reqwest::StatusCode) -> bool {
        status.is_success()
    }

    fn extract_text(resp: &serde_json::Value) -> Result<String, ClassifierError> {
        resp["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| {
                ClassifierError::Malformed("missing candidates[0].content.parts[0].text".into())
            })
    }
}

#[async_trait]
impl RemoteClassifier for GeminiClassifier {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifierError> {
        debug!(model = %self.model, "gemini classification request");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_request_body(prompt))
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !Self::is_accepted(status) {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClassifierError::Malformed(e.to_string()))?;
        Self::extract_text(&resp)
    }
}
