use anyhow::{anyhow, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::app_config::Config;
use crate::audio_assembler::{AssemblerOptions, AudioAssembler};
use crate::errors::DubbingError;
use crate::file_utils::FileManager;
use crate::media::{BurnVariant, FfmpegTool, MediaTool};
use crate::providers::ollama::Ollama;
use crate::providers::whisper::WhisperClient;
use crate::providers::xtts::XttsClient;
use crate::providers::{SpeechRecognizer, SpeechSynthesizer, Translator};
use crate::segment_aligner::SegmentAligner;
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};
use crate::text_chunker::TextChunker;
use crate::translation_service::TranslationService;

// @module: Dubbing pipeline orchestration

/// Pipeline states, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Init,
    AudioExtracted,
    Transcribed,
    Translated,
    Synthesized,
    Merged,
    SubtitlesBurned,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Init => "init",
            PipelineStage::AudioExtracted => "audio extracted",
            PipelineStage::Transcribed => "transcribed",
            PipelineStage::Translated => "translated",
            PipelineStage::Synthesized => "synthesized",
            PipelineStage::Merged => "merged",
            PipelineStage::SubtitlesBurned => "subtitles burned",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// One message on the progress channel
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// 0..=100, non-decreasing by convention
    pub percent: u8,
    pub message: String,
}

/// Which reference recording the synthesizer clones
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceSelection {
    Male,
    Female,
    Custom(PathBuf),
}

impl VoiceSelection {
    /// Path of the reference recording
    pub fn resolve(&self, voices_dir: &Path) -> PathBuf {
        match self {
            VoiceSelection::Male => voices_dir.join("male_voice.wav"),
            VoiceSelection::Female => voices_dir.join("female_voice.wav"),
            VoiceSelection::Custom(path) => path.clone(),
        }
    }
}

impl FromStr for VoiceSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" => Err(anyhow!("Voice must not be empty")),
            "male" => Ok(VoiceSelection::Male),
            "female" => Ok(VoiceSelection::Female),
            _ => Ok(VoiceSelection::Custom(PathBuf::from(s.trim()))),
        }
    }
}

/// Everything one dubbing invocation needs
#[derive(Debug, Clone)]
pub struct DubbingJob {
    pub video_path: PathBuf,
    pub voice: VoiceSelection,
    pub source_language: String,
    pub target_language: String,
    pub dialect: Option<String>,
    pub add_subtitles: bool,
}

impl DubbingJob {
    /// A job using the languages, dialect and subtitle default of `config`
    pub fn from_config(video_path: impl Into<PathBuf>, voice: VoiceSelection, config: &Config) -> Self {
        Self {
            video_path: video_path.into(),
            voice,
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            dialect: config.dialect.clone(),
            add_subtitles: config.pipeline.add_subtitles,
        }
    }
}

/// What a finished job produced
#[derive(Debug, Clone)]
pub struct DubbingOutcome {
    pub output_path: PathBuf,
    pub transcript: String,
    pub translated_text: String,
    pub subtitles: Vec<SubtitleEntry>,
    /// Variant that made it into the video, if subtitles were burned
    pub burn_variant: Option<BurnVariant>,
    pub succeeded_chunks: usize,
    pub failed_chunks: usize,
    /// States visited, `Init` through `Done`
    pub stages: Vec<PipelineStage>,
}

/// The external collaborators a controller drives
#[derive(Debug)]
pub struct Collaborators {
    pub recognizer: Box<dyn SpeechRecognizer>,
    pub translator: Box<dyn Translator>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub media: Box<dyn MediaTool>,
}

impl Collaborators {
    /// HTTP model clients plus ffmpeg, as configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let services = &config.services;
        Ok(Self {
            recognizer: Box::new(WhisperClient::new(
                &services.speech_recognition.endpoint,
                &services.speech_recognition.model,
                services.speech_recognition.timeout_secs,
            )?),
            translator: Box::new(Ollama::from_config(&services.translation)?),
            synthesizer: Box::new(XttsClient::new(&services.synthesis)?),
            media: Box::new(FfmpegTool::new(config.media.clone())),
        })
    }
}

/// Temporary artifacts of one job.
///
/// Paths handed out by [`ScratchSpace::artifact`] are removed by
/// [`ScratchSpace::cleanup`], or on drop if the job never got that far
/// (failure or a dropped future). Removal errors are swallowed.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: PathBuf,
    artifacts: Vec<PathBuf>,
}

impl ScratchSpace {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DubbingError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            artifacts: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Register and return a unique path for a new artifact
    pub fn artifact(&mut self, kind: &str, extension: &str) -> PathBuf {
        let path = FileManager::scratch_path(&self.dir, kind, extension);
        self.artifacts.push(path.clone());
        path
    }

    /// Registered paths not yet cleaned up
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Remove every registered artifact; returns how many files were deleted
    pub fn cleanup(&mut self) -> usize {
        self.artifacts
            .drain(..)
            .filter(|path| FileManager::remove_quietly(path))
            .count()
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        if !self.artifacts.is_empty() {
            let removed = self.cleanup();
            debug!("Scratch space dropped, removed {} leftover file(s)", removed);
        }
    }
}

/// Routes progress to the caller and the log
struct ProgressReporter<'a> {
    sink: &'a mut (dyn FnMut(ProgressUpdate) + Send),
    last: u8,
}

impl ProgressReporter<'_> {
    fn report(&mut self, percent: u8, message: impl Into<String>) {
        let message = message.into();
        let percent = percent.min(100);
        info!("[{:>3}%] {}", percent, message);
        self.last = percent;
        (self.sink)(ProgressUpdate { percent, message });
    }

    /// Percent inside `[from, to]` for `done` of `total` units
    fn span(from: u8, to: u8, done: usize, total: usize) -> u8 {
        if total == 0 {
            return to;
        }
        let width = (to - from) as usize;
        from + (width * done.min(total) / total) as u8
    }
}

/// Main application controller for video dubbing
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Model services and media tool
    collaborators: Collaborators,
}

impl Controller {
    // @method: Create a controller talking to the configured services
    pub fn with_config(config: Config) -> Result<Self> {
        let collaborators = Collaborators::from_config(&config)?;
        Ok(Self::with_collaborators(config, collaborators))
    }

    /// Create a controller with explicit collaborators
    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> Self {
        Self { config, collaborators }
    }

    /// Run one dubbing job end to end.
    ///
    /// Input problems are reported before any processing starts. Whatever the
    /// outcome, temporary artifacts are removed before returning.
    pub async fn dub<F>(&self, job: &DubbingJob, mut on_progress: F) -> Result<DubbingOutcome, DubbingError>
    where
        F: FnMut(ProgressUpdate) + Send,
    {
        let mut reporter = ProgressReporter {
            sink: &mut on_progress,
            last: 0,
        };

        reporter.report(0, "Validating input");
        FileManager::validate_video_input(&job.video_path, self.config.pipeline.max_video_size_mb)?;

        let voice = job.voice.resolve(&self.config.pipeline.voices_dir);
        if !FileManager::file_exists(&voice) {
            return Err(DubbingError::InputNotFound(voice));
        }

        self.collaborators.media.check_available().await?;

        std::fs::create_dir_all(&self.config.pipeline.output_dir)?;
        let mut scratch = ScratchSpace::new(&self.config.pipeline.scratch_dir)?;
        let mut stages = vec![PipelineStage::Init];

        let result = self.run_stages(job, &voice, &mut scratch, &mut stages, &mut reporter).await;

        reporter.report(reporter.last.max(98), "Cleaning up temporary files");
        let removed = scratch.cleanup();
        debug!("Removed {} temporary file(s)", removed);

        match result {
            Ok(mut outcome) => {
                stages.push(PipelineStage::Done);
                outcome.stages = stages;
                reporter.report(100, format!("Done: {}", outcome.output_path.display()));
                Ok(outcome)
            }
            Err(e) => {
                let reached = stages.last().copied().unwrap_or(PipelineStage::Init);
                stages.push(PipelineStage::Failed);
                error!("Dubbing {} after stage '{}': {}", PipelineStage::Failed, reached, e);
                reporter.report(0, format!("Failed: {}", e));
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        job: &DubbingJob,
        voice: &Path,
        scratch: &mut ScratchSpace,
        stages: &mut Vec<PipelineStage>,
        reporter: &mut ProgressReporter<'_>,
    ) -> Result<DubbingOutcome, DubbingError> {
        let pipeline = &self.config.pipeline;
        let media = self.collaborators.media.as_ref();

        // Init -> AudioExtracted
        reporter.report(10, "Extracting audio from video");
        let extracted_audio = scratch.artifact("extracted_audio", "wav");
        media.extract_audio(&job.video_path, &extracted_audio).await?;
        stages.push(PipelineStage::AudioExtracted);
        reporter.report(15, "Audio extracted");

        // AudioExtracted -> Transcribed
        reporter.report(20, "Transcribing speech");
        let transcription = self
            .collaborators
            .recognizer
            .transcribe(&extracted_audio, &job.source_language)
            .await
            .map_err(|source| DubbingError::Stage { stage: "Transcription", source })?;
        stages.push(PipelineStage::Transcribed);
        reporter.report(
            30,
            format!(
                "Transcribed {} chars in {} segments",
                transcription.text.chars().count(),
                transcription.segments.len()
            ),
        );

        // Transcribed -> Translated
        let mut service = TranslationService::new(self.collaborators.translator.as_ref());
        let rules = job
            .dialect
            .as_deref()
            .and_then(|tag| self.config.dialect_rules_for(&job.target_language, tag));
        if let Some(rules) = rules {
            service = service.with_dialect_rules(rules);
        }
        let translated_text = service
            .translate(&transcription.text, &job.source_language, &job.target_language, |done, total| {
                reporter.report(
                    ProgressReporter::span(30, 45, done, total),
                    format!("Translated {}/{} sentences", done, total),
                )
            })
            .await
            .map_err(|source| DubbingError::Stage { stage: "Translation", source })?;
        stages.push(PipelineStage::Translated);
        reporter.report(45, "Translation complete");

        // Translated -> Synthesized
        let chunks = TextChunker::new(pipeline.max_chunk_chars)
            .with_min_chars(pipeline.min_chunk_chars)
            .chunk(&translated_text);
        reporter.report(50, format!("Synthesizing {} chunks", chunks.len()));

        let assembler = AudioAssembler::new(
            self.collaborators.synthesizer.as_ref(),
            AssemblerOptions {
                silence_ms: pipeline.inter_chunk_silence_ms,
                min_audio_bytes: pipeline.min_audio_bytes,
                scratch_dir: scratch.dir().to_path_buf(),
            },
        );
        let track = assembler
            .assemble(&chunks, voice, &job.target_language, |done, total| {
                reporter.report(
                    ProgressReporter::span(50, 80, done, total),
                    format!("Synthesized chunk {}/{}", done, total),
                )
            })
            .await?;

        if track.failure_count() > 0 {
            reporter.report(
                80,
                format!("Warning: {} of {} chunks failed to synthesize", track.failure_count(), chunks.len()),
            );
        }

        let synthesized_audio = scratch.artifact("synthesized", "wav");
        track.audio.write_wav(&synthesized_audio)?;
        stages.push(PipelineStage::Synthesized);
        reporter.report(82, format!("Synthesized {:.1}s of audio", track.audio.duration_secs()));

        // Subtitles are built before the merge so a bad caption set never costs an encode
        let subtitles = if job.add_subtitles {
            self.build_subtitles(job, &translated_text, &transcription.segments, track.audio.duration_secs())
                .await
        } else {
            Vec::new()
        };
        if job.add_subtitles && subtitles.is_empty() {
            warn!("No captions could be built, the video will have no subtitles");
        }
        let burn = !subtitles.is_empty();

        // Synthesized -> Merged
        // Media output stays in scratch until it is complete, then moves into place
        let staged_output = scratch.artifact("dubbed", "mp4");
        let merged_video = if burn {
            scratch.artifact("merged_video", "mp4")
        } else {
            staged_output.clone()
        };

        reporter.report(85, "Merging dubbed audio with video");
        media.merge_audio_video(&job.video_path, &synthesized_audio, &merged_video).await?;
        stages.push(PipelineStage::Merged);

        // Merged -> SubtitlesBurned
        let mut burn_variant = None;
        if burn {
            reporter.report(88, format!("Creating {} subtitle entries", subtitles.len()));
            let collection = SubtitleCollection::new(subtitles.clone()).with_line_width(pipeline.subtitle_line_width);

            let styled_path = scratch.artifact("subtitles", "ass");
            let plain_path = scratch.artifact("subtitles", "srt");
            collection.write_to_ass(&styled_path, &self.config.subtitle_style)?;
            collection.write_to_srt(&plain_path)?;

            let variant = self
                .burn_with_fallback(&merged_video, &styled_path, &plain_path, &staged_output, reporter)
                .await?;
            burn_variant = Some(variant);
            stages.push(PipelineStage::SubtitlesBurned);
            reporter.report(95, "Subtitles burned in");
        } else {
            reporter.report(95, "Merge complete");
        }

        let output_path = FileManager::output_path(&pipeline.output_dir, burn);
        FileManager::move_file(&staged_output, &output_path)?;

        Ok(DubbingOutcome {
            output_path,
            transcript: transcription.text,
            translated_text,
            subtitles,
            burn_variant,
            succeeded_chunks: track.succeeded,
            failed_chunks: track.failure_count(),
            stages: Vec::new(),
        })
    }

    /// Styled burn first, one plain retry on a non-zero exit
    async fn burn_with_fallback(
        &self,
        video: &Path,
        styled: &Path,
        plain: &Path,
        output: &Path,
        reporter: &mut ProgressReporter<'_>,
    ) -> Result<BurnVariant, DubbingError> {
        let media = self.collaborators.media.as_ref();

        reporter.report(90, "Burning styled subtitles");
        let styled_error = match media.burn_subtitles(video, styled, output, BurnVariant::Styled).await {
            Ok(()) => return Ok(BurnVariant::Styled),
            Err(DubbingError::SubtitleBurnFailure(message)) => message,
            Err(other) => return Err(other),
        };

        warn!("Styled subtitle burn failed, retrying without style: {}", styled_error);
        FileManager::remove_quietly(output);
        reporter.report(92, "Retrying subtitle burn without styling");

        match media.burn_subtitles(video, plain, output, BurnVariant::Plain).await {
            Ok(()) => Ok(BurnVariant::Plain),
            Err(DubbingError::SubtitleBurnFailure(plain_error)) => Err(DubbingError::SubtitleBurnFailure(format!(
                "styled: {}; plain: {}",
                styled_error, plain_error
            ))),
            Err(other) => Err(other),
        }
    }

    /// Captions from recognizer timing, or spread over the video duration
    async fn build_subtitles(
        &self,
        job: &DubbingJob,
        translated_text: &str,
        segments: &[crate::segment_aligner::TimedSegment],
        audio_duration: f64,
    ) -> Vec<SubtitleEntry> {
        let aligner = SegmentAligner::new(self.config.pipeline.overflow_policy);
        if !segments.is_empty() {
            return aligner.align(translated_text, segments, 0.0);
        }

        let duration = match self.collaborators.media.probe_duration(&job.video_path).await {
            Ok(duration) if duration > 0.0 => duration,
            Ok(_) | Err(_) => {
                warn!("Could not probe video duration, using the dubbed audio length");
                audio_duration
            }
        };
        aligner.align_uniform(translated_text, duration)
    }

    /// Dub one file with a terminal progress bar
    pub async fn run(&self, input_file: PathBuf, voice: VoiceSelection) -> Result<PathBuf> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(input_file, voice, &multi_progress).await
    }

    async fn run_with_progress(&self, input_file: PathBuf, voice: VoiceSelection, multi_progress: &MultiProgress) -> Result<PathBuf> {
        let start_time = std::time::Instant::now();
        let job = DubbingJob::from_config(&input_file, voice, &self.config);

        let progress_bar = multi_progress.add(ProgressBar::new(100));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let pb = progress_bar.clone();
        let result = self
            .dub(&job, move |update| {
                pb.set_position(update.percent as u64);
                pb.set_message(update.message);
            })
            .await;
        progress_bar.finish_and_clear();

        let outcome = result?;
        if outcome.failed_chunks > 0 {
            warn!(
                "{} of {} chunks could not be synthesized and were skipped",
                outcome.failed_chunks,
                outcome.failed_chunks + outcome.succeeded_chunks
            );
        }
        info!(
            "Dubbed {} in {}: {}",
            input_file.display(),
            Self::format_duration(start_time.elapsed()),
            outcome.output_path.display()
        );
        Ok(outcome.output_path)
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Dub every supported video in a directory, continuing past failures
    pub async fn run_folder(&self, input_dir: PathBuf, voice: VoiceSelection) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let video_files = FileManager::find_videos(&input_dir)?;
        if video_files.is_empty() {
            return Err(anyhow!("No video files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(video_files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));

        let mut summary = FolderSummary::default();
        for video_file in &video_files {
            let file_name = video_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            match self.run_with_progress(video_file.clone(), voice.clone(), &multi_progress).await {
                Ok(output) => summary.outputs.push(output),
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.failures.push((video_file.clone(), format!("{:#}", e)));
                }
            }
            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");
        info!(
            "Folder processing completed in {}: {} dubbed, {} errors",
            Self::format_duration(start_time.elapsed()),
            summary.outputs.len(),
            summary.failures.len()
        );

        Ok(summary)
    }
}

/// Result of a folder run
#[derive(Debug, Default)]
pub struct FolderSummary {
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
}
