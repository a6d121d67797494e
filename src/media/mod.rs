/*!
 * Media tool collaborator.
 *
 * Audio extraction, audio/video merge, subtitle burn-in and duration probing
 * are delegated to an external tool. `FfmpegTool` is the real one, `mock`
 * holds a scriptable stand-in for tests.
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

use crate::errors::DubbingError;

pub mod ffmpeg;
pub mod mock;

pub use ffmpeg::FfmpegTool;

/// How subtitles are rendered when burned in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnVariant {
    /// ASS script carrying the configured style header
    Styled,
    /// Bare SRT file, no style options
    Plain,
}

impl std::fmt::Display for BurnVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BurnVariant::Styled => write!(f, "styled"),
            BurnVariant::Plain => write!(f, "plain"),
        }
    }
}

/// Operations consumed from the media tool
#[async_trait]
pub trait MediaTool: Send + Sync + Debug {
    /// Fail with `CollaboratorUnavailable` when the tool cannot be run
    async fn check_available(&self) -> Result<(), DubbingError>;

    /// Extract the audio track as mono PCM WAV
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<(), DubbingError>;

    /// Replace the audio of `video` with `audio`, cutting to the shorter stream
    async fn merge_audio_video(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DubbingError>;

    /// Burn a subtitle file into the video pixels.
    /// A non-zero exit is reported as `SubtitleBurnFailure`.
    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        output: &Path,
        variant: BurnVariant,
    ) -> Result<(), DubbingError>;

    /// Container duration in seconds
    async fn probe_duration(&self, media: &Path) -> Result<f64, DubbingError>;
}
