/*!
 * # dubsmith - automatic video dubbing
 *
 * Takes a video with speech in one language and produces a copy whose audio
 * track is a synthesized voice speaking a translation, optionally with
 * burned-in subtitles of the translated text.
 *
 * ## Pipeline
 *
 * extract audio → transcribe → translate → chunk → synthesize per chunk →
 * concatenate → align captions → merge → burn subtitles
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management (conf.json)
 * - `app_controller`: Pipeline state machine, progress and scratch cleanup
 * - `text_chunker`: Sentence splitting and chunking for synthesis
 * - `segment_aligner`: Maps translated sentences onto recognizer timing
 * - `subtitle_processor`: SRT/ASS formatting and parsing
 * - `audio` / `audio_assembler`: PCM buffers and chunk concatenation
 * - `translation_service`: Sentence-wise translation with dialect tables
 * - `dialect`: Word-level dialect substitution
 * - `providers`: Speech recognition, translation and synthesis clients
 * - `media`: ffmpeg wrapper
 * - `file_utils`, `language_utils`, `errors`
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod audio;
pub mod audio_assembler;
pub mod dialect;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod media;
pub mod providers;
pub mod segment_aligner;
pub mod subtitle_processor;
pub mod text_chunker;
pub mod translation_service;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Collaborators, Controller, DubbingJob, DubbingOutcome, ProgressUpdate, VoiceSelection};
pub use errors::{AppError, DubbingError, ProviderError, SubtitleError};
pub use segment_aligner::{OverflowPolicy, SegmentAligner, TimedSegment};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
pub use text_chunker::{TextChunk, TextChunker};
pub use translation_service::TranslationService;
