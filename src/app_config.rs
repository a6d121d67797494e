use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::dialect::{self, DialectRule};
use crate::segment_aligner::OverflowPolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Optional dialect tag applied after translation (e.g. "gulf")
    #[serde(default)]
    pub dialect: Option<String>,

    /// Model service endpoints
    #[serde(default)]
    pub services: ServicesConfig,

    /// Media tool settings
    #[serde(default)]
    pub media: MediaConfig,

    /// Chunking, assembly and file layout settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Style used for the styled subtitle burn-in
    #[serde(default)]
    pub subtitle_style: SubtitleStyle,

    /// Lexical substitution tables keyed by dialect tag
    #[serde(default = "dialect::builtin_tables")]
    pub dialects: BTreeMap<String, Vec<DialectRule>>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// The three model collaborators
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ServicesConfig {
    #[serde(default)]
    pub speech_recognition: SpeechRecognitionConfig,

    #[serde(default)]
    pub translation: TranslationServiceConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

/// Whisper-style speech recognition service
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeechRecognitionConfig {
    // @field: Service URL
    #[serde(default = "default_asr_endpoint")]
    pub endpoint: String,

    // @field: Model size/name requested from the service
    #[serde(default = "default_asr_model")]
    pub model: String,

    // @field: Timeout seconds
    #[serde(default = "default_asr_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechRecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_asr_endpoint(),
            model: default_asr_model(),
            timeout_secs: default_asr_timeout_secs(),
        }
    }
}

/// Ollama translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationServiceConfig {
    /// Model name (e.g., "llama3.2:3b", "mistral")
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationServiceConfig {
    fn default() -> Self {
        Self {
            model: default_ollama_model(),
            endpoint: default_ollama_endpoint(),
            timeout_secs: default_timeout_secs(),
            system_prompt: default_system_prompt(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Voice-cloning speech synthesis service
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SynthesisConfig {
    // @field: Service URL
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,

    // @field: Timeout seconds per chunk
    #[serde(default = "default_tts_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tts_endpoint(),
            timeout_secs: default_tts_timeout_secs(),
        }
    }
}

/// ffmpeg/ffprobe settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MediaConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Timeout for a single media command in seconds
    #[serde(default = "default_media_timeout_secs")]
    pub timeout_secs: u64,

    /// Sample rate of the extracted mono PCM track
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Audio codec of the dubbed output
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate of the dubbed output
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Video codec used when burning subtitles
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encoder preset used when burning subtitles
    #[serde(default = "default_video_preset")]
    pub video_preset: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_media_timeout_secs(),
            sample_rate: default_sample_rate(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            video_codec: default_video_codec(),
            video_preset: default_video_preset(),
        }
    }
}

/// Pipeline policy values
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Upper bound on a synthesis chunk, in characters
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Chunks shorter than this are dropped
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,

    /// Silence inserted between consecutive synthesized chunks
    #[serde(default = "default_inter_chunk_silence_ms")]
    pub inter_chunk_silence_ms: u64,

    /// Synthesized files at or below this size count as failed
    #[serde(default = "default_min_audio_bytes")]
    pub min_audio_bytes: u64,

    /// Caption wrap width in characters
    #[serde(default = "default_subtitle_line_width")]
    pub subtitle_line_width: usize,

    /// What to do with sentences that have no timing segment
    #[serde(default)]
    pub overflow_policy: OverflowPolicy,

    /// Burn subtitles into the output unless told otherwise
    #[serde(default = "default_true")]
    pub add_subtitles: bool,

    /// Process-wide directory for temporary artifacts
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Where dubbed videos are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where the built-in voice references live
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,

    /// Largest accepted input video
    #[serde(default = "default_max_video_size_mb")]
    pub max_video_size_mb: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            min_chunk_chars: default_min_chunk_chars(),
            inter_chunk_silence_ms: default_inter_chunk_silence_ms(),
            min_audio_bytes: default_min_audio_bytes(),
            subtitle_line_width: default_subtitle_line_width(),
            overflow_policy: OverflowPolicy::default(),
            add_subtitles: default_true(),
            scratch_dir: default_scratch_dir(),
            output_dir: default_output_dir(),
            voices_dir: default_voices_dir(),
            max_video_size_mb: default_max_video_size_mb(),
        }
    }
}

/// Look of burned-in captions (ASS `V4+ Styles` fields)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubtitleStyle {
    #[serde(default = "default_font_name")]
    pub font_name: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// ASS colour, `&HAABBGGRR`
    #[serde(default = "default_primary_colour")]
    pub primary_colour: String,

    #[serde(default = "default_outline_colour")]
    pub outline_colour: String,

    #[serde(default = "default_back_colour")]
    pub back_colour: String,

    #[serde(default = "default_true")]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    /// 1 = outline and drop shadow, 3 = opaque box
    #[serde(default = "default_border_style")]
    pub border_style: u8,

    #[serde(default = "default_outline")]
    pub outline: u32,

    #[serde(default = "default_shadow")]
    pub shadow: u32,

    /// Numpad layout, 2 = bottom centre
    #[serde(default = "default_alignment")]
    pub alignment: u8,

    #[serde(default = "default_margin_v")]
    pub margin_v: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_name: default_font_name(),
            font_size: default_font_size(),
            primary_colour: default_primary_colour(),
            outline_colour: default_outline_colour(),
            back_colour: default_back_colour(),
            bold: true,
            italic: false,
            border_style: default_border_style(),
            outline: default_outline(),
            shadow: default_shadow(),
            alignment: default_alignment(),
            margin_v: default_margin_v(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "ar".to_string()
}

fn default_asr_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_asr_model() -> String {
    "base".to_string()
}

fn default_asr_timeout_secs() -> u64 {
    600
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_system_prompt() -> String {
    "You are a professional translator. Translate the following text from {source_language} to {target_language}. \
     Reply with the translation only, without notes or quotes."
        .to_string()
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_tts_endpoint() -> String {
    "http://localhost:8020".to_string()
}

fn default_tts_timeout_secs() -> u64 {
    120
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_media_timeout_secs() -> u64 {
    1800
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_video_preset() -> String {
    "fast".to_string()
}

fn default_max_chunk_chars() -> usize {
    crate::text_chunker::DEFAULT_MAX_CHUNK_CHARS
}

fn default_min_chunk_chars() -> usize {
    crate::text_chunker::DEFAULT_MIN_CHUNK_CHARS
}

fn default_inter_chunk_silence_ms() -> u64 {
    150
}

fn default_min_audio_bytes() -> u64 {
    1000
}

fn default_subtitle_line_width() -> usize {
    crate::subtitle_processor::DEFAULT_LINE_WIDTH
}

fn default_true() -> bool {
    true
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("dubsmith")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("voices")
}

fn default_max_video_size_mb() -> u64 {
    500
}

fn default_font_name() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    20
}

fn default_primary_colour() -> String {
    "&H00FFFFFF".to_string()
}

fn default_outline_colour() -> String {
    "&H00000000".to_string()
}

fn default_back_colour() -> String {
    "&H80000000".to_string()
}

fn default_border_style() -> u8 {
    1
}

fn default_outline() -> u32 {
    2
}

fn default_shadow() -> u32 {
    2
}

fn default_alignment() -> u8 {
    2
}

fn default_margin_v() -> u32 {
    20
}

impl Config {
    /// Load configuration from a JSON file, writing the defaults there first
    /// when the file does not exist yet
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if let Some(dialect) = &self.dialect {
            if dialect != dialect::MSA && !self.dialects.contains_key(dialect) {
                return Err(anyhow!(
                    "Unknown dialect '{}'. Known dialects: {}, {}",
                    dialect,
                    dialect::MSA,
                    self.dialects.keys().cloned().collect::<Vec<_>>().join(", ")
                ));
            }
        }

        for (name, endpoint) in [
            ("speech recognition", &self.services.speech_recognition.endpoint),
            ("translation", &self.services.translation.endpoint),
            ("synthesis", &self.services.synthesis.endpoint),
        ] {
            url::Url::parse(endpoint)
                .with_context(|| format!("Invalid {} endpoint: {}", name, endpoint))?;
        }

        let pipeline = &self.pipeline;
        if pipeline.max_chunk_chars == 0 {
            return Err(anyhow!("pipeline.max_chunk_chars must be greater than zero"));
        }
        if pipeline.min_chunk_chars > pipeline.max_chunk_chars {
            return Err(anyhow!(
                "pipeline.min_chunk_chars ({}) exceeds pipeline.max_chunk_chars ({})",
                pipeline.min_chunk_chars,
                pipeline.max_chunk_chars
            ));
        }
        if pipeline.subtitle_line_width == 0 {
            return Err(anyhow!("pipeline.subtitle_line_width must be greater than zero"));
        }
        if pipeline.max_video_size_mb == 0 {
            return Err(anyhow!("pipeline.max_video_size_mb must be greater than zero"));
        }
        if self.media.sample_rate == 0 {
            return Err(anyhow!("media.sample_rate must be greater than zero"));
        }

        Ok(())
    }

    /// Dialect rules that apply to the configured target, if any
    pub fn active_dialect_rules(&self) -> Option<&[DialectRule]> {
        self.dialect_rules_for(&self.target_language, self.dialect.as_deref()?)
    }

    /// Dialect rules for an explicit target language and dialect tag
    pub fn dialect_rules_for(&self, target_language: &str, tag: &str) -> Option<&[DialectRule]> {
        if !dialect::applies(target_language, tag) {
            return None;
        }
        self.dialects.get(tag).map(|rules| rules.as_slice())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            dialect: None,
            services: ServicesConfig::default(),
            media: MediaConfig::default(),
            pipeline: PipelineConfig::default(),
            subtitle_style: SubtitleStyle::default(),
            dialects: dialect::builtin_tables(),
            log_level: LogLevel::default(),
        }
    }
}
