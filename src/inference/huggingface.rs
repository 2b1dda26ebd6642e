//! Hugging Face Inference API client.

use super::{parse_generated_text, InferenceClient, InferenceError, RetryPolicy};
use crate::config::InferenceSettings;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

/// Client for `POST {base_url}/models/{model}` with bearer authentication.
pub struct HfInferenceClient {
    client: reqwest::Client,
    endpoint: Url,
    token: String,
    fallback_text: String,
    retry: RetryPolicy,
}

fn transport_error(e: reqwest::Error) -> InferenceError {
    if e.is_timeout() {
        InferenceError::Timeout
    } else {
        InferenceError::Transport(e.to_string())
    }
}

impl HfInferenceClient {
    /// Build a client from the inference settings and the bearer token.
    pub fn new(settings: &InferenceSettings, token: &str) -> Result<Self> {
        let endpoint = Url::parse(&format!(
            "{}/models/{}",
            settings.base_url.trim_end_matches('/'),
            settings.model
        ))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.timeout())
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint,
            token: token.to_string(),
            fallback_text: settings.fallback_text.clone(),
            retry: RetryPolicy::from(&settings.retry),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn attempt(&self, prompt: &str) -> std::result::Result<String, InferenceError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&json!({ "inputs": prompt }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                InferenceError::UnexpectedResponseShape(format!("body is not JSON: {}", e))
            } else {
                transport_error(e)
            }
        })?;

        parse_generated_text(&body, &self.fallback_text)
    }
}

#[async_trait]
impl InferenceClient for HfInferenceClient {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, prompt_chars = prompt.len()))]
    async fn infer(&self, prompt: &str) -> std::result::Result<String, InferenceError> {
        let text = self
            .retry
            .run(|attempt| {
                debug!("Inference attempt {}", attempt + 1);
                self.attempt(prompt)
            })
            .await?;
        debug!("Received {} chars of generated text", text.len());
        Ok(text)
    }
}
