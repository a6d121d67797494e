//! Scriptable media tool for tests. Every operation writes a small
//! placeholder file so the orchestrator's file bookkeeping can be checked.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::AudioBuffer;
use crate::errors::DubbingError;
use crate::media::{BurnVariant, MediaTool};

/// A recorded media call
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    Extract,
    Merge { output: PathBuf },
    Burn { variant: BurnVariant, subtitles: PathBuf, output: PathBuf },
    Probe,
}

/// Mock media tool. Clones share the call log.
#[derive(Debug, Clone)]
pub struct MockMediaTool {
    duration: f64,
    unavailable: bool,
    fail_extract: bool,
    fail_merge: bool,
    /// Number of leading burn calls that fail
    burn_failures: usize,
    burn_delay_ms: u64,
    burn_calls: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<MediaCall>>>,
}

impl Default for MockMediaTool {
    fn default() -> Self {
        Self {
            duration: 12.0,
            unavailable: false,
            fail_extract: false,
            fail_merge: false,
            burn_failures: 0,
            burn_delay_ms: 0,
            burn_calls: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockMediaTool {
    /// Every operation succeeds
    pub fn working() -> Self {
        Self::default()
    }

    /// The tool is not installed
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn failing_extract(mut self) -> Self {
        self.fail_extract = true;
        self
    }

    pub fn failing_merge(mut self) -> Self {
        self.fail_merge = true;
        self
    }

    /// The first `count` burn attempts fail with a non-zero exit
    pub fn failing_burns(mut self, count: usize) -> Self {
        self.burn_failures = count;
        self
    }

    /// Each burn writes a partial file, then stalls for `delay_ms`
    pub fn with_burn_delay(mut self, delay_ms: u64) -> Self {
        self.burn_delay_ms = delay_ms;
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: MediaCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn guard(&self) -> Result<(), DubbingError> {
        if self.unavailable {
            return Err(DubbingError::CollaboratorUnavailable("mock ffmpeg not installed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaTool for MockMediaTool {
    async fn check_available(&self) -> Result<(), DubbingError> {
        self.guard()
    }

    async fn extract_audio(&self, _video: &Path, output: &Path) -> Result<(), DubbingError> {
        self.guard()?;
        self.record(MediaCall::Extract);
        if self.fail_extract {
            return Err(DubbingError::MergeFailure("simulated extraction failure".to_string()));
        }
        AudioBuffer::silence(1000, 16000, 1).write_wav(output)
    }

    async fn merge_audio_video(&self, _video: &Path, audio: &Path, output: &Path) -> Result<(), DubbingError> {
        self.guard()?;
        self.record(MediaCall::Merge { output: output.to_path_buf() });
        if self.fail_merge {
            // a failed encode leaves a truncated file behind
            std::fs::write(output, b"partial")?;
            return Err(DubbingError::MergeFailure("simulated merge failure".to_string()));
        }
        if !audio.exists() {
            return Err(DubbingError::MergeFailure(format!("missing audio {}", audio.display())));
        }
        std::fs::write(output, b"merged video")?;
        Ok(())
    }

    async fn burn_subtitles(
        &self,
        _video: &Path,
        subtitles: &Path,
        output: &Path,
        variant: BurnVariant,
    ) -> Result<(), DubbingError> {
        self.guard()?;
        self.record(MediaCall::Burn {
            variant,
            subtitles: subtitles.to_path_buf(),
            output: output.to_path_buf(),
        });

        let attempt = self.burn_calls.fetch_add(1, Ordering::SeqCst);
        if self.burn_delay_ms > 0 {
            std::fs::write(output, b"partial")?;
            tokio::time::sleep(std::time::Duration::from_millis(self.burn_delay_ms)).await;
        }
        if attempt < self.burn_failures {
            std::fs::write(output, b"partial")?;
            return Err(DubbingError::SubtitleBurnFailure(format!("simulated {} burn failure", variant)));
        }
        if !subtitles.exists() {
            return Err(DubbingError::SubtitleBurnFailure(format!("missing subtitles {}", subtitles.display())));
        }
        std::fs::write(output, b"burned video")?;
        Ok(())
    }

    async fn probe_duration(&self, _media: &Path) -> Result<f64, DubbingError> {
        self.guard()?;
        self.record(MediaCall::Probe);
        Ok(self.duration)
    }
}
