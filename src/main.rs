// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use dubsmith::app_config::{self, Config};
use dubsmith::app_controller::{Controller, VoiceSelection};
use dubsmith::file_utils::FileManager;
use dubsmith::language_utils;
use dubsmith::media::{FfmpegTool, MediaTool};
use dubsmith::providers::ollama::Ollama;
use dubsmith::segment_aligner::OverflowPolicy;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for OverflowPolicy
#[derive(Debug, Clone, ValueEnum)]
enum CliOverflowPolicy {
    Drop,
    ExtendLast,
}

impl From<CliOverflowPolicy> for OverflowPolicy {
    fn from(policy: CliOverflowPolicy) -> Self {
        match policy {
            CliOverflowPolicy::Drop => OverflowPolicy::Drop,
            CliOverflowPolicy::ExtendLast => OverflowPolicy::ExtendLast,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dub a video file or every video in a directory (default command)
    Dub(DubArgs),

    /// Print the duration of a video
    Info {
        /// Video file to inspect
        #[arg(value_name = "VIDEO")]
        video: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// Check that ffmpeg is installed and print the configured services
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// Generate shell completions for dubsmith
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct DubArgs {
    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Voice to clone: 'male', 'female' or a path to a reference WAV
    #[arg(short, long, default_value = "male")]
    voice: String,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'ar', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Dialect table applied to the translation (e.g., 'egyptian', 'msa')
    #[arg(short, long)]
    dialect: Option<String>,

    /// Do not burn subtitles into the output
    #[arg(long)]
    no_subtitles: bool,

    /// What to do with sentences left over after the last timed segment
    #[arg(long, value_enum)]
    overflow: Option<CliOverflowPolicy>,

    /// Directory for finished videos
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// dubsmith - automatic video dubbing
///
/// Transcribes the speech of a video, translates it, re-voices it with a
/// cloned voice and merges the new audio back, with optional burned-in
/// subtitles.
#[derive(Parser, Debug)]
#[command(name = "dubsmith")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(about = "Automatic video dubbing with local speech and translation models")]
#[command(long_about = "dubsmith replaces the speech of a video with a synthesized translation.

EXAMPLES:
    dubsmith talk.mp4                            # Dub using default config (en -> ar)
    dubsmith -t es -v female talk.mp4            # Spanish, female voice
    dubsmith -d egyptian talk.mp4                # Arabic with Egyptian dialect table
    dubsmith -v ./me.wav --no-subtitles talk.mp4 # Clone a custom voice, no subtitles
    dubsmith --log-level debug /videos/          # Process an entire directory
    dubsmith info talk.mp4                       # Print the video duration
    dubsmith check                               # Verify ffmpeg and services
    dubsmith completions bash > dubsmith.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created automatically.

SERVICES:
    speech recognition - Whisper ASR web service   (default http://localhost:9000)
    translation        - Ollama                    (default http://localhost:11434)
    speech synthesis   - XTTS voice cloning server (default http://localhost:8020)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    dub: DubArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for level
    fn colour_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let colour = Self::colour_for_level(record.level());
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "{}{} {:<5} {}\x1B[0m", colour, now, record.level(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is lowered once the config is read
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "dubsmith", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Info { video, config_path }) => run_info(&video, &config_path).await,
        Some(Commands::Check { config_path }) => run_check(&config_path).await,
        Some(Commands::Dub(args)) => run_dub(args).await,
        None => run_dub(cli.dub).await,
    }
}

/// Load conf.json and fold the command line overrides into it
fn load_config(options: &DubArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(dialect) = &options.dialect {
        config.dialect = Some(dialect.to_lowercase());
    }
    if options.no_subtitles {
        config.pipeline.add_subtitles = false;
    }
    if let Some(policy) = &options.overflow {
        config.pipeline.overflow_policy = policy.clone().into();
    }
    if let Some(output_dir) = &options.output_dir {
        config.pipeline.output_dir = output_dir.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_dub(options: DubArgs) -> Result<()> {
    if let Some(log_level) = &options.log_level {
        let level: app_config::LogLevel = log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let voice: VoiceSelection = options.voice.parse()?;
    info!(
        "Dubbing {} -> {}{}",
        language_utils::get_language_name(&config.source_language)?,
        language_utils::get_language_name(&config.target_language)?,
        config.dialect.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default()
    );

    let input_path = options
        .input_path
        .ok_or_else(|| anyhow!("INPUT_PATH is required"))?;
    let controller = Controller::with_config(config)?;

    if input_path.is_file() {
        controller.run(input_path, voice).await?;
    } else if input_path.is_dir() {
        let summary = controller.run_folder(input_path, voice).await?;
        if !summary.failures.is_empty() {
            return Err(anyhow!("{} file(s) failed to dub", summary.failures.len()));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}

async fn run_check(config_path: &str) -> Result<()> {
    let config = Config::load_or_create(config_path)?;
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    FfmpegTool::new(config.media.clone()).check_available().await?;
    info!("ffmpeg: {} / ffprobe: {}", config.media.ffmpeg_path, config.media.ffprobe_path);

    let services = &config.services;
    info!("speech recognition: {} (model {})", services.speech_recognition.endpoint, services.speech_recognition.model);
    info!("translation: {} (model {})", services.translation.endpoint, services.translation.model);
    match Ollama::from_config(&services.translation)?.version().await {
        Ok(version) => info!("translation service reachable, version {}", version),
        Err(e) => warn!("translation service not reachable: {}", e),
    }
    info!("speech synthesis: {}", services.synthesis.endpoint);
    info!("voices: {}", config.pipeline.voices_dir.display());
    Ok(())
}

async fn run_info(video: &Path, config_path: &str) -> Result<()> {
    let config = Config::load_or_create(config_path)?;
    log::set_max_level(config.log_level.to_level_filter());

    FileManager::validate_video_input(video, config.pipeline.max_video_size_mb)?;
    let tool = FfmpegTool::new(config.media.clone());
    let duration = tool.probe_duration(video).await?;

    let size_mb = FileManager::file_size(video) as f64 / (1024.0 * 1024.0);
    println!("{}", video.display());
    println!("  duration: {:.2}s", duration);
    println!("  size:     {:.1} MB", size_mb);
    Ok(())
}
