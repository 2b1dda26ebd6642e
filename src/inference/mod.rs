//! Hosted text-generation client.
//!
//! Every call returns a tagged result: the generated text, or an
//! [`InferenceError`] naming what went wrong at the boundary.

mod huggingface;
mod retry;

pub use huggingface::HfInferenceClient;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure modes of an inference call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// The endpoint answered with a status other than 200.
    #[error("inference endpoint returned HTTP {code}")]
    Status { code: u16, body: String },

    #[error("inference request timed out")]
    Timeout,

    /// Connection refused, DNS failure, reset, and similar.
    #[error("inference transport error: {0}")]
    Transport(String),

    /// HTTP 200 with a body that is not one of the known shapes.
    #[error("unexpected inference response shape: {0}")]
    UnexpectedResponseShape(String),
}

impl InferenceError {
    /// Server errors and transport failures are worth retrying; client errors
    /// and malformed bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            InferenceError::Status { code, .. } => *code >= 500,
            InferenceError::Timeout | InferenceError::Transport(_) => true,
            InferenceError::UnexpectedResponseShape(_) => false,
        }
    }
}

/// A text-generation backend.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn infer(&self, prompt: &str) -> Result<String, InferenceError>;
}

/// Extract the generated text from a successful response body.
///
/// - array: the first element's `generated_text`
/// - object: `generated_text`, or `fallback` when the key is absent
/// - anything else: [`InferenceError::UnexpectedResponseShape`]
pub fn parse_generated_text(body: &Value, fallback: &str) -> Result<String, InferenceError> {
    match body {
        Value::Array(items) => {
            let first = items.first().ok_or_else(|| {
                InferenceError::UnexpectedResponseShape("empty array".to_string())
            })?;
            first
                .get("generated_text")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    InferenceError::UnexpectedResponseShape(
                        "first array element has no string generated_text".to_string(),
                    )
                })
        }
        Value::Object(map) => match map.get("generated_text") {
            None => Ok(fallback.to_string()),
            Some(Value::String(text)) => Ok(text.clone()),
            Some(other) => Err(InferenceError::UnexpectedResponseShape(format!(
                "generated_text is not a string: {}",
                other
            ))),
        },
        other => Err(InferenceError::UnexpectedResponseShape(format!(
            "expected array or object, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
