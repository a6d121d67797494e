/*!
 * Alignment of translated sentences to source timing segments.
 *
 * The speech recognizer gives us timed segments of the source speech, the
 * translator gives us a block of target-language text. Subtitles need one
 * caption per time slot, so sentence `i` takes the timing of segment `i`.
 * The two counts rarely match:
 *
 * - more segments than sentences: the extra segments repeat the last sentence
 * - more sentences than segments: see [`OverflowPolicy`]
 * - no segments at all: the sentences share the total duration evenly
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::subtitle_processor::SubtitleEntry;
use crate::text_chunker::TextChunker;

/// Fallback span of a segment whose end time is unknown
pub const DEFAULT_SEGMENT_SECS: f64 = 2.0;

/// A transcription-produced slice of source speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSegment {
    /// Start in seconds
    pub start: f64,
    /// End in seconds
    pub end: f64,
    /// Source text spoken in this slot
    #[serde(default)]
    pub text: String,
}

impl TimedSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// What happens to sentences left over once every segment has one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Leftover sentences get no caption
    #[default]
    Drop,
    /// The last segment's span is shared between its own sentence and the leftovers
    ExtendLast,
}

/// Builds subtitle entries from translated text
#[derive(Debug, Clone, Default)]
pub struct SegmentAligner {
    policy: OverflowPolicy,
    splitter: TextChunker,
}

impl SegmentAligner {
    pub fn new(policy: OverflowPolicy) -> Self {
        Self {
            policy,
            splitter: TextChunker::default(),
        }
    }

    /// Align text to segments, or spread it over `duration` when there are none
    pub fn align(&self, translated_text: &str, segments: &[TimedSegment], duration: f64) -> Vec<SubtitleEntry> {
        if segments.is_empty() {
            return self.align_uniform(translated_text, duration);
        }

        let sentences = self.sentences(translated_text);
        let Some(last_sentence) = sentences.last() else {
            return Vec::new();
        };

        let mut ordered: Vec<&TimedSegment> = segments.iter().collect();
        ordered.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut entries: Vec<SubtitleEntry> = ordered
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                let text = sentences.get(i).unwrap_or(last_sentence);
                let start = segment.start.max(0.0);
                let end = segment.end.max(start);
                SubtitleEntry::new(i + 1, start, end, text.clone())
            })
            .collect();

        if sentences.len() > ordered.len() {
            let leftovers = &sentences[ordered.len()..];
            match self.policy {
                OverflowPolicy::Drop => {
                    debug!(
                        "{} sentence(s) have no timing segment and get no caption",
                        leftovers.len()
                    );
                }
                OverflowPolicy::ExtendLast => extend_last(&mut entries, leftovers),
            }
        }

        entries
    }

    /// Give each sentence an equal slice of `duration`, back to back from zero
    pub fn align_uniform(&self, translated_text: &str, duration: f64) -> Vec<SubtitleEntry> {
        let sentences = self.sentences(translated_text);
        if sentences.is_empty() {
            return Vec::new();
        }

        let total = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        let slice = total / sentences.len() as f64;

        sentences
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let start = slice * i as f64;
                SubtitleEntry::new(i + 1, start, start + slice, text)
            })
            .collect()
    }

    /// Sentences with internal whitespace collapsed to single spaces
    fn sentences(&self, text: &str) -> Vec<String> {
        self.splitter
            .sentences(text)
            .into_iter()
            .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect()
    }
}

fn extend_last(entries: &mut Vec<SubtitleEntry>, leftovers: &[String]) {
    let Some(last) = entries.last_mut() else {
        return;
    };

    let pieces = leftovers.len() + 1;
    let start = last.start;
    let slice = (last.end - last.start) / pieces as f64;
    last.end = start + slice;

    let mut index = last.index;
    for (offset, text) in leftovers.iter().enumerate() {
        index += 1;
        let piece_start = start + slice * (offset + 1) as f64;
        entries.push(SubtitleEntry::new(index, piece_start, piece_start + slice, text.clone()));
    }
}

/// Align with the default splitter and policy
pub fn align(translated_text: &str, segments: &[TimedSegment], duration: f64) -> Vec<SubtitleEntry> {
    SegmentAligner::default().align(translated_text, segments, duration)
}

/// Duration-based fallback with the default splitter
pub fn align_uniform(translated_text: &str, duration: f64) -> Vec<SubtitleEntry> {
    SegmentAligner::default().align_uniform(translated_text, duration)
}
