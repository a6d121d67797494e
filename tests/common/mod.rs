/*!
 * Common test utilities for the dubsmith test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use dubsmith::app_config::Config;
use dubsmith::app_controller::{Collaborators, Controller, DubbingJob, ProgressUpdate, VoiceSelection};
use dubsmith::audio::AudioBuffer;
use dubsmith::media::mock::MockMediaTool;
use dubsmith::providers::mock::{MockRecognizer, MockSynthesizer, MockTranslator};
use dubsmith::providers::Transcription;
use dubsmith::segment_aligner::TimedSegment;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Writes a short silent WAV
pub fn create_test_wav(path: &Path, duration_ms: u64) -> Result<()> {
    AudioBuffer::silence(duration_ms, 16000, 1).write_wav(path)?;
    Ok(())
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
"#;
    create_test_file(dir, filename, content)
}

/// Files left in a directory (missing directory counts as empty)
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

pub const ENGLISH_TRANSCRIPT: &str = "Hello everyone. Welcome to the show. Today we talk about Rust.";

pub const ARABIC_SENTENCES: [(&str, &str); 3] = [
    ("Hello everyone.", "مرحبا بالجميع."),
    ("Welcome to the show.", "أهلا بكم في البرنامج."),
    ("Today we talk about Rust.", "اليوم نتحدث عن راست."),
];

/// Twelve seconds of speech in three four-second segments
pub fn english_transcription() -> Transcription {
    Transcription {
        text: ENGLISH_TRANSCRIPT.to_string(),
        segments: vec![
            TimedSegment::new(0.0, 4.0, "Hello everyone."),
            TimedSegment::new(4.0, 8.0, "Welcome to the show."),
            TimedSegment::new(8.0, 12.0, "Today we talk about Rust."),
        ],
        language: Some("en".to_string()),
    }
}

pub fn arabic_translator() -> MockTranslator {
    MockTranslator::with_mapping(&ARABIC_SENTENCES)
}

/// A scratch/output/voices layout inside one temp dir, plus a fake input video
pub struct TestEnv {
    pub dir: TempDir,
    pub video: PathBuf,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Result<Self> {
        let dir = create_temp_dir()?;
        let voices = dir.path().join("voices");
        fs::create_dir_all(&voices)?;
        create_test_wav(&voices.join("male_voice.wav"), 300)?;
        create_test_wav(&voices.join("female_voice.wav"), 300)?;

        let video = create_test_file(dir.path(), "talk.mp4", "not really a video")?;

        let mut config = Config::default();
        config.source_language = "en".to_string();
        config.target_language = "ar".to_string();
        config.pipeline.voices_dir = voices;
        config.pipeline.scratch_dir = dir.path().join("scratch");
        config.pipeline.output_dir = dir.path().join("output");

        Ok(Self { dir, video, config })
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.config.pipeline.scratch_dir.clone()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.pipeline.output_dir.clone()
    }

    pub fn job(&self) -> DubbingJob {
        DubbingJob::from_config(&self.video, VoiceSelection::Male, &self.config)
    }

    /// Controller with the given synthesizer and media tool, the canned
    /// English transcription and the Arabic phrase table
    pub fn controller(&self, synthesizer: MockSynthesizer, media: MockMediaTool) -> Controller {
        self.controller_with(
            MockRecognizer::new(english_transcription()),
            arabic_translator(),
            synthesizer,
            media,
        )
    }

    pub fn controller_with(
        &self,
        recognizer: MockRecognizer,
        translator: MockTranslator,
        synthesizer: MockSynthesizer,
        media: MockMediaTool,
    ) -> Controller {
        Controller::with_collaborators(
            self.config.clone(),
            Collaborators {
                recognizer: Box::new(recognizer),
                translator: Box::new(translator),
                synthesizer: Box::new(synthesizer),
                media: Box::new(media),
            },
        )
    }
}

/// Collects progress updates
#[derive(Debug, Default)]
pub struct ProgressLog {
    pub updates: Vec<ProgressUpdate>,
}

impl ProgressLog {
    pub fn percents(&self) -> Vec<u8> {
        self.updates.iter().map(|u| u.percent).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.updates.iter().map(|u| u.message.clone()).collect()
    }
}
