//! HTTP client for a voice-cloning speech synthesis service.
//!
//! The service receives the text, the target language and a base64 copy of
//! the reference recording, and answers with WAV bytes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::app_config::SynthesisConfig;
use crate::errors::ProviderError;
use crate::providers::{api_error, request_error, SpeechSynthesizer, SynthesisRequest};

/// Request body of the `/tts` endpoint
#[derive(Debug, Serialize)]
struct XttsRequest<'a> {
    text: &'a str,
    language: String,
    speaker_wav_b64: &'a str,
}

/// XTTS client
#[derive(Debug)]
pub struct XttsClient {
    client: reqwest::Client,
    endpoint: String,
    /// Encoded voice references, read from disk once per client
    voices: Mutex<HashMap<PathBuf, Arc<String>>>,
}

impl XttsClient {
    pub fn new(config: &SynthesisConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            voices: Mutex::new(HashMap::new()),
        })
    }

    /// Base64 of the voice reference, loaded on first use
    async fn voice_reference(&self, voice: &Path) -> Result<Arc<String>, ProviderError> {
        let mut voices = self.voices.lock().await;
        if let Some(encoded) = voices.get(voice) {
            return Ok(Arc::clone(encoded));
        }

        let bytes = tokio::fs::read(voice)
            .await
            .map_err(|e| ProviderError::InvalidAudio(format!("voice reference {}: {}", voice.display(), e)))?;
        debug!("Loaded voice reference {} ({} bytes)", voice.display(), bytes.len());

        let encoded = Arc::new(BASE64.encode(&bytes));
        voices.insert(voice.to_path_buf(), Arc::clone(&encoded));
        Ok(encoded)
    }
}

#[async_trait]
impl SpeechSynthesizer for XttsClient {
    async fn synthesize(&self, request: &SynthesisRequest, output_path: &Path) -> Result<(), ProviderError> {
        let voice = self.voice_reference(&request.voice).await?;
        let language = crate::language_utils::normalize_code(&request.language)
            .unwrap_or_else(|_| request.language.clone());

        let body = XttsRequest {
            text: &request.text,
            language,
            speaker_wav_b64: voice.as_str(),
        };

        let response = self
            .client
            .post(format!("{}/tts", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error("speech synthesis", e))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| request_error("speech synthesis", e))?;

        tokio::fs::write(output_path, &audio_data)
            .await
            .map_err(|e| ProviderError::InvalidAudio(format!("{}: {}", output_path.display(), e)))?;

        Ok(())
    }
}
