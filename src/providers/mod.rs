/*!
 * Model collaborators of the dubbing pipeline.
 *
 * Speech recognition, translation and speech synthesis all run in external
 * services. This module defines the interfaces the pipeline needs from them
 * and contains the HTTP clients:
 * - Whisper: `/asr` speech recognition service
 * - Ollama: local LLM server used for translation
 * - XTTS: voice-cloning speech synthesis service
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::errors::ProviderError;
use crate::segment_aligner::TimedSegment;

/// Output of the speech recognizer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcription {
    /// Full transcript
    pub text: String,
    /// Timed segments, ordered by start; may be empty
    pub segments: Vec<TimedSegment>,
    /// Language reported by the service, if any
    pub language: Option<String>,
}

/// Input of one synthesis call
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Text chunk to speak
    pub text: String,
    /// Short reference recording of the voice to clone
    pub voice: PathBuf,
    /// Target language tag
    pub language: String,
}

/// Turns speech into timed text
#[async_trait]
pub trait SpeechRecognizer: Send + Sync + Debug {
    /// Transcribe a mono PCM WAV file
    ///
    /// # Arguments
    /// * `audio_path` - Extracted audio track
    /// * `language` - Source language tag
    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<Transcription, ProviderError>;
}

/// Turns text in one language into text in another
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate a piece of text
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String, ProviderError>;
}

/// Turns a text chunk into speech in a given voice
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + Debug {
    /// Synthesize `request` and write the audio (WAV) to `output_path`
    async fn synthesize(&self, request: &SynthesisRequest, output_path: &Path) -> Result<(), ProviderError>;
}

/// Classify a transport-level failure
pub(crate) fn request_error(service: &str, error: reqwest::Error) -> ProviderError {
    if error.is_connect() || error.is_timeout() {
        ProviderError::ConnectionError(format!("{}: {}", service, error))
    } else {
        ProviderError::RequestFailed(format!("{}: {}", service, error))
    }
}

/// Turn a non-success HTTP response into an error
pub(crate) async fn api_error(response: reqwest::Response) -> ProviderError {
    let status_code = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    ProviderError::ApiError { status_code, message }
}

pub mod whisper;
pub mod ollama;
pub mod xtts;
pub mod mock;
