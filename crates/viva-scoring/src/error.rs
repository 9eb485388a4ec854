// Error types for scoring operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type for scoring operations
pub type Result<T> = std::result::Result<T, ScoringError>;

/// Scoring errors
#[derive(Debug, Error)]
pub enum ScoringError {
    /// File name does not follow the `<student>-<session>-t<task>.mp3` convention
    #[error("Invalid file name format: {0}")]
    InvalidFileName(String),

    /// No task definition configured for the session/task pair
    #[error("No task definition found for session '{session_id}', task '{task_id}'")]
    MissingTaskDefinition {
        /// Session identifier parsed from the file name
        session_id: String,
        /// Task identifier parsed from the file name
        task_id: String,
    },

    /// Model reply could not be parsed into a score record
    #[error("Failed to parse response: {raw}")]
    UnparseableResponse {
        /// The raw reply text, kept for the error log
        raw: String,
    },

    /// Folder contained no MP3 files
    #[error("No MP3 files found in the selected folder.")]
    NoAudioFiles(PathBuf),

    /// Model error
    #[error("Model error: {0}")]
    Model(#[from] viva_abstraction::ModelError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScoringError::InvalidFileName("notes.mp3".to_string());
        assert_eq!(err.to_string(), "Invalid file name format: notes.mp3");

        let err = ScoringError::MissingTaskDefinition {
            session_id: "6".to_string(),
            task_id: "t9".to_string(),
        };
        assert_eq!(err.to_string(), "No task definition found for session '6', task 't9'");

        let err = ScoringError::NoAudioFiles(PathBuf::from("/tmp/empty"));
        assert_eq!(err.to_string(), "No MP3 files found in the selected folder.");
    }

    #[test]
    fn test_model_error_conversion() {
        let model_err = viva_abstraction::ModelError::QuotaExceeded {
            provider: "gemini".to_string(),
            message: None,
        };
        let err: ScoringError = model_err.into();
        assert!(matches!(err, ScoringError::Model(_)));
    }
}
