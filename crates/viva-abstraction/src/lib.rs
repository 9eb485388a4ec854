//! Model abstraction layer for Viva.
//!
//! This crate defines the core trait and types for talking to generative
//! AI models that score audio recordings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents an error that can occur when interacting with an AI model.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelError {
    /// An error occurred during the API request (e.g., network issues, invalid request).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The model returned an error response (e.g., invalid input, server failure).
    #[error("Model Response Error: {0}")]
    ModelResponseError(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// The client is misconfigured (e.g., missing or rejected credentials).
    #[error("Configuration Error: {0}")]
    ConfigurationError(String),

    /// Provider quota exceeded or rate limit hit.
    #[error("Provider '{provider}' quota exceeded{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    QuotaExceeded {
        /// The provider name (e.g., "gemini").
        provider: String,
        /// Optional error message from the provider.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Other unexpected errors.
    #[error("Other Model Error: {0}")]
    Other(String),
}

impl ModelError {
    /// Returns `true` for rate-limit failures that are worth retrying.
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// An audio clip attached to a model request.
///
/// The bytes are sent as-is; no decoding or transcoding happens here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioData {
    /// MIME type tag for the clip (e.g., "audio/mp3").
    pub mime_type: String,
    /// Raw audio bytes.
    pub data: Vec<u8>,
}

impl AudioData {
    /// Creates a new `AudioData` with an explicit MIME type.
    #[must_use]
    pub const fn new(mime_type: String, data: Vec<u8>) -> Self {
        Self { mime_type, data }
    }

    /// Creates an `AudioData` tagged as MP3.
    #[must_use]
    pub fn mp3(data: Vec<u8>) -> Self {
        Self { mime_type: "audio/mp3".to_string(), data }
    }
}

/// The response from a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated content.
    pub content: String,

    /// Optional: The ID of the model used to generate the response.
    pub model_id: Option<String>,

    /// Optional: Usage statistics for the request.
    pub usage: Option<ModelUsage>,
}

/// Usage statistics for a model request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUsage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,

    /// Number of tokens in the completion.
    pub completion_tokens: u32,

    /// Total number of tokens used.
    pub total_tokens: u32,
}

/// A trait for interacting with different AI models.
///
/// All models must be `Send + Sync` to allow concurrent use across threads.
#[async_trait]
pub trait Model: Send + Sync + std::fmt::Debug {
    /// Generates a text completion based on the given prompt.
    ///
    /// # Errors
    /// Returns a `ModelError` if generation fails.
    async fn generate_text(&self, prompt: &str) -> Result<ModelResponse, ModelError>;

    /// Generates a completion from a prompt plus an attached audio clip.
    ///
    /// # Arguments
    /// * `prompt` - The instruction text sent alongside the audio
    /// * `audio` - The audio clip the model should listen to
    ///
    /// # Errors
    /// Returns a `ModelError` if generation fails.
    async fn generate_with_audio(
        &self,
        prompt: &str,
        audio: &AudioData,
    ) -> Result<ModelResponse, ModelError>;

    /// Returns the ID of the model.
    fn model_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_data_mp3() {
        let audio = AudioData::mp3(vec![1, 2, 3]);
        assert_eq!(audio.mime_type, "audio/mp3");
        assert_eq!(audio.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_model_error_is_rate_limit() {
        let err = ModelError::QuotaExceeded { provider: "gemini".to_string(), message: None };
        assert!(err.is_rate_limit());

        let err = ModelError::RequestError("boom".to_string());
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn test_quota_exceeded_display() {
        let err = ModelError::QuotaExceeded {
            provider: "gemini".to_string(),
            message: Some("429 Too Many Requests".to_string()),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("gemini"));
        assert!(rendered.contains("429 Too Many Requests"));
    }
}
