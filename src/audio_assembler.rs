/*!
 * Builds the dubbed audio track from text chunks.
 *
 * Chunks are synthesized one after the other, in index order. A chunk that
 * fails (service error, a file too small to hold audio, undecodable or
 * differently formatted audio) is counted and skipped. Successful clips are
 * joined with a fixed silence gap between neighbours, never at the edges.
 * Each clip lives in its own temp file that is deleted as soon as the clip
 * has been folded in, or dropped.
 */

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::audio::AudioBuffer;
use crate::errors::DubbingError;
use crate::file_utils::FileManager;
use crate::providers::{SpeechSynthesizer, SynthesisRequest};
use crate::text_chunker::TextChunk;

/// Policy values of an assembly pass
#[derive(Debug, Clone)]
pub struct AssemblerOptions {
    /// Silence between consecutive successful chunks
    pub silence_ms: u64,
    /// Files of this size or smaller are treated as "no audio produced"
    pub min_audio_bytes: u64,
    /// Where per-chunk temp files are created
    pub scratch_dir: PathBuf,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            silence_ms: 150,
            min_audio_bytes: 1000,
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Result of an assembly pass
#[derive(Debug)]
pub struct AssembledTrack {
    /// Combined audio of every successful chunk
    pub audio: AudioBuffer,
    /// Number of chunks that produced audio
    pub succeeded: usize,
    /// One `ChunkSynthesisFailure` per skipped chunk, in chunk order
    pub failures: Vec<DubbingError>,
}

impl AssembledTrack {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Drives per-chunk synthesis and concatenation
pub struct AudioAssembler<'a> {
    synthesizer: &'a dyn SpeechSynthesizer,
    options: AssemblerOptions,
}

impl<'a> AudioAssembler<'a> {
    pub fn new(synthesizer: &'a dyn SpeechSynthesizer, options: AssemblerOptions) -> Self {
        Self { synthesizer, options }
    }

    /// Synthesize every chunk and concatenate the results.
    ///
    /// `on_progress(done, total)` is called after each chunk, successful or not.
    /// Fails with `EmptyOutput` when no chunk produced audio.
    pub async fn assemble<F>(
        &self,
        chunks: &[TextChunk],
        voice: &Path,
        language: &str,
        mut on_progress: F,
    ) -> Result<AssembledTrack, DubbingError>
    where
        F: FnMut(usize, usize),
    {
        let total = chunks.len();
        let mut combined: Option<AudioBuffer> = None;
        let mut succeeded = 0;
        let mut failures = Vec::new();

        FileManager::ensure_dir(&self.options.scratch_dir)
            .map_err(|e| DubbingError::InvalidInput(format!("{:#}", e)))?;

        for (done, chunk) in chunks.iter().enumerate() {
            debug!("Synthesizing chunk {}/{}: {} chars", done + 1, total, chunk.char_len());

            match self.synthesize_chunk(chunk, voice, language).await? {
                Ok(clip) => match combined.as_mut() {
                    None => {
                        combined = Some(clip);
                        succeeded += 1;
                    }
                    Some(track) if !track.is_compatible(&clip) => {
                        let failure = DubbingError::ChunkSynthesisFailure {
                            index: chunk.index,
                            reason: format!(
                                "audio format {} Hz/{} ch does not match the track ({} Hz/{} ch)",
                                clip.sample_rate, clip.channels, track.sample_rate, track.channels
                            ),
                        };
                        warn!("{}", failure);
                        failures.push(failure);
                    }
                    Some(track) => {
                        let gap = AudioBuffer::silence(self.options.silence_ms, track.sample_rate, track.channels);
                        track.samples.extend_from_slice(&gap.samples);
                        track.samples.extend_from_slice(&clip.samples);
                        succeeded += 1;
                    }
                },
                Err(failure) => {
                    warn!("{}", failure);
                    failures.push(failure);
                }
            }

            on_progress(done + 1, total);
        }

        let Some(audio) = combined else {
            return Err(DubbingError::EmptyOutput { attempted: total });
        };

        if failures.is_empty() {
            info!("Assembled {} chunks into {:.2}s of audio", succeeded, audio.duration_secs());
        } else {
            warn!(
                "Assembled {} of {} chunks into {:.2}s of audio, {} failed",
                succeeded,
                total,
                audio.duration_secs(),
                failures.len()
            );
        }

        Ok(AssembledTrack {
            audio,
            succeeded,
            failures,
        })
    }

    /// One chunk, one temp file. The outer error is fatal (the scratch file
    /// could not be created), the inner one is a counted chunk failure.
    async fn synthesize_chunk(
        &self,
        chunk: &TextChunk,
        voice: &Path,
        language: &str,
    ) -> Result<Result<AudioBuffer, DubbingError>, DubbingError> {
        let scratch = tempfile::Builder::new()
            .prefix(&format!("chunk_{:04}_", chunk.index))
            .suffix(".wav")
            .tempfile_in(&self.options.scratch_dir)?;

        let failure = |reason: String| DubbingError::ChunkSynthesisFailure {
            index: chunk.index,
            reason,
        };

        let request = SynthesisRequest {
            text: chunk.text.clone(),
            voice: voice.to_path_buf(),
            language: language.to_string(),
        };

        if let Err(e) = self.synthesizer.synthesize(&request, scratch.path()).await {
            return Ok(Err(failure(e.to_string())));
        }

        let size = FileManager::file_size(scratch.path());
        if size <= self.options.min_audio_bytes {
            return Ok(Err(failure(format!("no audio produced ({} bytes)", size))));
        }

        // `scratch` is dropped on return, which deletes the file
        Ok(AudioBuffer::read_wav(scratch.path()).map_err(|e| failure(e.to_string())))
    }
}
