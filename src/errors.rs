/*!
 * Error types for the dubsmith application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to a model service (speech recognition,
/// translation or speech synthesis)
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The service answered but the audio it produced is unusable
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),
}

/// Errors that can occur while formatting or parsing subtitles
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// A timestamp does not follow the expected `HH:MM:SS,mmm` layout
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A subtitle block could not be interpreted
    #[error("Malformed subtitle block {block}: {reason}")]
    MalformedBlock {
        /// 1-based position of the block in the file
        block: usize,
        /// What was wrong with it
        reason: String,
    },

    /// No usable entries were found
    #[error("No valid subtitle entries were found")]
    Empty,
}

/// Errors raised by the dubbing pipeline.
///
/// `ChunkSynthesisFailure` is the only non-fatal variant: the audio assembler
/// counts it and moves on. Every other variant aborts the running job.
#[derive(Error, Debug)]
pub enum DubbingError {
    /// An external tool or service could not be reached at all
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// A single text chunk could not be synthesized
    #[error("Synthesis failed for chunk {index}: {reason}")]
    ChunkSynthesisFailure {
        /// Index of the failing chunk
        index: usize,
        /// Why it failed
        reason: String,
    },

    /// Every chunk failed, there is no audio to return
    #[error("No audio segments were generated ({attempted} chunks attempted)")]
    EmptyOutput {
        /// Number of chunks that were tried
        attempted: usize,
    },

    /// The media tool exited with a non-zero status while extracting or merging
    #[error("Media merge failed: {0}")]
    MergeFailure(String),

    /// Burning subtitles failed with both the styled and the plain rendering
    #[error("Subtitle burn-in failed: {0}")]
    SubtitleBurnFailure(String),

    /// A required input file is missing
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The input exists but cannot be processed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A model collaborator failed inside a named pipeline stage
    #[error("{stage} failed: {source}")]
    Stage {
        /// Name of the stage that failed
        stage: &'static str,
        /// Underlying collaborator error
        #[source]
        source: ProviderError,
    },

    /// Error with subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from a file operation
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl DubbingError {
    /// Whether this error should abort the pipeline
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ChunkSynthesisFailure { .. })
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the dubbing pipeline
    #[error("Dubbing error: {0}")]
    Dubbing(#[from] DubbingError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
