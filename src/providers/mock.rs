/*!
 * Mock collaborators for testing.
 *
 * - `MockSynthesizer::working()` - always writes a fixed-length tone
 * - `MockSynthesizer::intermittent(n)` - every nth call fails
 * - `MockSynthesizer::failing()` - always fails with an error
 * - `MockSynthesizer::silent()` - succeeds but writes a useless tiny file
 * - `MockRecognizer` - returns a canned transcription
 * - `MockTranslator` - echoes or maps sentences
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::AudioBuffer;
use crate::errors::ProviderError;
use crate::providers::{SpeechRecognizer, SpeechSynthesizer, SynthesisRequest, Transcription, Translator};

/// Behavior mode for the mock synthesizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails on every Nth request (1-based)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Reports success but writes a file too small to contain audio
    Silent,
    /// Simulates a slow service
    Slow { delay_ms: u64 },
}

/// Mock speech synthesizer. Clones share counters.
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    behavior: MockBehavior,
    /// Length of every produced clip
    clip_ms: u64,
    sample_rate: u32,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Texts received, in call order
    received: Arc<Mutex<Vec<String>>>,
}

impl MockSynthesizer {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            clip_ms: 500,
            sample_rate: 16000,
            request_count: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock failing on every `fail_every`th call
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock producing files below any sensible size threshold
    pub fn silent() -> Self {
        Self::new(MockBehavior::Silent)
    }

    /// Set the produced clip format
    pub fn with_clip(mut self, clip_ms: u64, sample_rate: u32) -> Self {
        self.clip_ms = clip_ms;
        self.sample_rate = sample_rate;
        self
    }

    /// Number of synthesize calls so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts received so far
    pub fn received(&self) -> Vec<String> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn clip(&self) -> AudioBuffer {
        let frames = (self.sample_rate as u64 * self.clip_ms / 1000) as usize;
        AudioBuffer {
            sample_rate: self.sample_rate,
            channels: 1,
            samples: (0..frames).map(|i| ((i % 64) as i16 - 32) * 256).collect(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest, output_path: &Path) -> Result<(), ProviderError> {
        let call = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut received) = self.received.lock() {
            received.push(request.text.clone());
        }

        match self.behavior {
            MockBehavior::Working => {}
            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && call % fail_every == 0 {
                    return Err(ProviderError::ApiError {
                        status_code: 500,
                        message: format!("simulated failure on call {}", call),
                    });
                }
            }
            MockBehavior::Failing => {
                return Err(ProviderError::ConnectionError("simulated outage".to_string()));
            }
            MockBehavior::Silent => {
                std::fs::write(output_path, b"RIFF")
                    .map_err(|e| ProviderError::InvalidAudio(e.to_string()))?;
                return Ok(());
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            }
        }

        self.clip()
            .write_wav(output_path)
            .map_err(|e| ProviderError::InvalidAudio(e.to_string()))
    }
}

/// Mock speech recognizer returning a canned transcription
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    result: Option<Transcription>,
}

impl MockRecognizer {
    pub fn new(transcription: Transcription) -> Self {
        Self {
            result: Some(transcription),
        }
    }

    pub fn failing() -> Self {
        Self { result: None }
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn transcribe(&self, audio_path: &Path, _language: &str) -> Result<Transcription, ProviderError> {
        if !audio_path.exists() {
            return Err(ProviderError::InvalidAudio(format!("missing audio: {}", audio_path.display())));
        }
        self.result
            .clone()
            .ok_or_else(|| ProviderError::ConnectionError("simulated outage".to_string()))
    }
}

/// Mock translator: mapped sentences are replaced, everything else is echoed
#[derive(Debug, Clone, Default)]
pub struct MockTranslator {
    mapping: HashMap<String, String>,
    failing: bool,
    request_count: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Echo every input unchanged
    pub fn echo() -> Self {
        Self::default()
    }

    /// Translate with a fixed phrase table
    pub fn with_mapping(pairs: &[(&str, &str)]) -> Self {
        Self {
            mapping: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, _source_language: &str, _target_language: &str) -> Result<String, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(ProviderError::ApiError {
                status_code: 503,
                message: "simulated outage".to_string(),
            });
        }
        Ok(self.mapping.get(text.trim()).cloned().unwrap_or_else(|| text.to_string()))
    }
}
