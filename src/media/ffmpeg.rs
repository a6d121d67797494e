use std::ffi::OsString;
use std::path::Path;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use tokio::process::Command;

use crate::app_config::MediaConfig;
use crate::errors::DubbingError;
use crate::media::{BurnVariant, MediaTool};

// @struct: ffmpeg/ffprobe driver
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    config: MediaConfig,
}

/// Which error a failed command turns into
#[derive(Debug, Clone, Copy)]
enum Stage {
    Merge,
    Burn,
}

impl FfmpegTool {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Run a command with the configured timeout.
    /// The child is killed if the future is dropped.
    async fn run(&self, program: &str, args: Vec<OsString>, stage: Stage) -> Result<Output, DubbingError> {
        debug!("Running {} {:?}", program, args);

        let child = Command::new(program)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = tokio::select! {
            result = child => result,
            _ = tokio::time::sleep(timeout_duration) => {
                return Err(stage_error(stage, format!(
                    "{} timed out after {} seconds", program, self.config.timeout_secs
                )));
            }
        };

        let output = match result {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DubbingError::CollaboratorUnavailable(format!(
                    "'{}' was not found; install ffmpeg and make sure it is on PATH",
                    program
                )));
            }
            Err(e) => return Err(stage_error(stage, format!("Failed to execute {}: {}", program, e))),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("{} exited with {}: {}", program, output.status, filtered);
            return Err(stage_error(stage, filtered));
        }

        Ok(output)
    }

    fn ensure_output(output: &Path) -> Result<(), DubbingError> {
        let size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(DubbingError::MergeFailure(format!(
                "ffmpeg reported success but {} is missing or empty",
                output.display()
            )));
        }
        Ok(())
    }

    /// `-vf` argument for the subtitle filter
    pub fn subtitle_filter(subtitles: &Path) -> String {
        format!("subtitles='{}'", escape_filter_path(subtitles))
    }
}

fn stage_error(stage: Stage, message: String) -> DubbingError {
    match stage {
        Stage::Merge => DubbingError::MergeFailure(message),
        Stage::Burn => DubbingError::SubtitleBurnFailure(message),
    }
}

fn os(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

/// Escape a path for use inside a quoted ffmpeg filter argument
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "'\\''")
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "title",
        "encoder",
        "handler_name",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn check_available(&self) -> Result<(), DubbingError> {
        self.run(&self.config.ffmpeg_path, os(&["-version"]), Stage::Merge).await?;
        self.run(&self.config.ffprobe_path, os(&["-version"]), Stage::Merge).await?;
        Ok(())
    }

    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<(), DubbingError> {
        let sample_rate = self.config.sample_rate.to_string();
        let mut args = os(&["-i"]);
        args.push(video.as_os_str().to_owned());
        args.extend(os(&["-vn", "-acodec", "pcm_s16le", "-ar", sample_rate.as_str(), "-ac", "1", "-y"]));
        args.push(output.as_os_str().to_owned());

        self.run(&self.config.ffmpeg_path, args, Stage::Merge).await?;
        Self::ensure_output(output)
    }

    async fn merge_audio_video(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DubbingError> {
        let mut args = os(&["-i"]);
        args.push(video.as_os_str().to_owned());
        args.push("-i".into());
        args.push(audio.as_os_str().to_owned());
        args.extend(os(&[
            "-c:v", "copy",
            "-c:a", self.config.audio_codec.as_str(),
            "-b:a", self.config.audio_bitrate.as_str(),
            "-map", "0:v:0",
            "-map", "1:a:0",
            "-shortest",
            "-y",
        ]));
        args.push(output.as_os_str().to_owned());

        self.run(&self.config.ffmpeg_path, args, Stage::Merge).await?;
        Self::ensure_output(output)
    }

    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        output: &Path,
        variant: BurnVariant,
    ) -> Result<(), DubbingError> {
        debug!("Burning {} subtitles from {}", variant, subtitles.display());
        let filter = Self::subtitle_filter(subtitles);

        let mut args = os(&["-i"]);
        args.push(video.as_os_str().to_owned());
        args.extend(os(&[
            "-vf", filter.as_str(),
            "-c:v", self.config.video_codec.as_str(),
            "-preset", self.config.video_preset.as_str(),
            "-c:a", "copy",
            "-y",
        ]));
        args.push(output.as_os_str().to_owned());

        self.run(&self.config.ffmpeg_path, args, Stage::Burn).await?;
        Self::ensure_output(output).map_err(|e| DubbingError::SubtitleBurnFailure(e.to_string()))
    }

    async fn probe_duration(&self, media: &Path) -> Result<f64, DubbingError> {
        let mut args = os(&[
            "-v", "error",
            "-show_entries", "format=duration",
            "-of", "default=noprint_wrappers=1:nokey=1",
        ]);
        args.push(media.as_os_str().to_owned());

        let output = self.run(&self.config.ffprobe_path, args, Stage::Merge).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse::<f64>()
            .map_err(|_| DubbingError::MergeFailure(format!("ffprobe returned no duration: '{}'", stdout.trim())))
    }
}
