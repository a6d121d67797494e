// HTTP client for a whisper-style speech recognition service

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{api_error, request_error, SpeechRecognizer, Transcription};
use crate::segment_aligner::{TimedSegment, DEFAULT_SEGMENT_SECS};

/// Request to the `/asr` endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AsrRequest {
    /// Base64 encoded audio (WAV format, 16kHz mono)
    pub audio_b64: String,
    /// Language code, None for auto-detect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Model size/name
    pub model: String,
    /// Task type: "transcribe" or "translate"
    pub task: String,
}

/// One segment as returned by the service
#[derive(Debug, Clone, Deserialize)]
pub struct AsrSegment {
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub text: String,
}

/// Response of the `/asr` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AsrResponse {
    /// Full transcribed text
    pub text: String,
    /// Timed segments
    #[serde(default)]
    pub segments: Vec<AsrSegment>,
    /// Detected language
    #[serde(default)]
    pub language: Option<String>,
}

impl From<AsrResponse> for Transcription {
    fn from(response: AsrResponse) -> Self {
        let segments = response
            .segments
            .into_iter()
            .map(|s| {
                let end = s.end.unwrap_or(s.start + DEFAULT_SEGMENT_SECS);
                TimedSegment::new(s.start, end, s.text.trim())
            })
            .collect();

        Transcription {
            text: response.text.trim().to_string(),
            segments,
            language: response.language,
        }
    }
}

/// HTTP client for the speech recognition service
#[derive(Debug)]
pub struct WhisperClient {
    client: Client,
    service_url: String,
    model: String,
}

impl WhisperClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `service_url` - Base URL of the service (e.g., "http://localhost:9000")
    /// * `model` - Model size requested from the service
    /// * `timeout_secs` - Request timeout in seconds
    pub fn new(service_url: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            service_url: service_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperClient {
    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<Transcription, ProviderError> {
        let audio_data = tokio::fs::read(audio_path)
            .await
            .map_err(|e| ProviderError::InvalidAudio(format!("{}: {}", audio_path.display(), e)))?;

        let request = AsrRequest {
            audio_b64: BASE64.encode(&audio_data),
            language: crate::language_utils::normalize_code(language).ok(),
            model: self.model.clone(),
            task: "transcribe".to_string(),
        };

        let url = format!("{}/asr", self.service_url);
        debug!("Sending {} bytes of audio to {}", audio_data.len(), url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error("speech recognition", e))?;

        if !response.status().is_success() {
            let err = api_error(response).await;
            error!("Speech recognition service error: {}", err);
            return Err(err);
        }

        let asr_response: AsrResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse ASR response: {}", e)))?;

        debug!(
            "Received transcript: {} segments, {} chars, language: {:?}",
            asr_response.segments.len(),
            asr_response.text.chars().count(),
            asr_response.language
        );

        Ok(asr_response.into())
    }
}
