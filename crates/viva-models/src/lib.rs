//! Model implementations for Viva.
//!
//! This crate provides concrete implementations of the `Model` trait.
//!
//! # Supported Providers
//!
//! - **Mock**: Testing and development
//! - **Gemini**: Google's Gemini models (API key required)

pub mod factory;
pub mod gemini;
pub mod retry;

use async_trait::async_trait;
use tracing::debug;
use viva_abstraction::{AudioData, Model, ModelError, ModelResponse, ModelUsage};

pub use factory::{ModelConfig, ModelFactory, ModelType};
pub use gemini::GeminiModel;
pub use retry::{RetryPolicy, RetryingModel};

/// A mock implementation of the `Model` trait for testing and demonstration.
#[derive(Debug, Default)]
pub struct MockModel {
    id: String,
}

impl MockModel {
    /// Creates a new `MockModel` with the given ID.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self { id }
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_text(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.id,
            prompt = %prompt,
            "MockModel generating text"
        );

        let response_content = format!("Mock response for: {prompt}\nModel ID: {}", self.id);

        let prompt_tokens = count_tokens(prompt);
        let completion_tokens = count_tokens(&response_content);
        let total_tokens = prompt_tokens + completion_tokens;

        Ok(ModelResponse {
            content: response_content,
            model_id: Some(self.id.clone()),
            usage: Some(ModelUsage { prompt_tokens, completion_tokens, total_tokens }),
        })
    }

    async fn generate_with_audio(
        &self,
        prompt: &str,
        audio: &AudioData,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.id,
            prompt = %prompt,
            audio_bytes = audio.data.len(),
            "MockModel generating from audio"
        );

        let response_content = format!(
            "Mock response for: {prompt}\nModel ID: {}\nAudio: {} bytes of {}",
            self.id,
            audio.data.len(),
            audio.mime_type
        );

        let prompt_tokens = count_tokens(prompt);
        let completion_tokens = count_tokens(&response_content);
        let total_tokens = prompt_tokens + completion_tokens;

        Ok(ModelResponse {
            content: response_content,
            model_id: Some(self.id.clone()),
            usage: Some(ModelUsage { prompt_tokens, completion_tokens, total_tokens }),
        })
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}

/// Count tokens in a string (simplified: word count).
///
/// For a real implementation, this would use a proper tokenizer.
#[allow(clippy::cast_possible_truncation)]
fn count_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_model_echoes_prompt() {
        let model = MockModel::new("test-mock".to_string());
        let response = model.generate_text("Hello").await.unwrap();
        assert!(response.content.contains("Hello"));
        assert_eq!(response.model_id, Some("test-mock".to_string()));
        assert!(response.usage.is_some());
    }

    #[tokio::test]
    async fn test_mock_model_reports_audio_details() {
        let model = MockModel::new("test-mock".to_string());
        let audio = AudioData::mp3(vec![0u8; 16]);
        let response = model.generate_with_audio("Describe", &audio).await.unwrap();
        assert!(response.content.contains("16 bytes of audio/mp3"));
    }

    #[test]
    fn test_count_tokens() {
        assert_eq!(count_tokens("one two three"), 3);
        assert_eq!(count_tokens(""), 0);
    }
}
