/*!
 * Text chunking for speech synthesis.
 *
 * Translated text is cut at sentence terminators, then any sentence that is
 * still longer than the length bound is cut again at clause separators, and
 * finally at word boundaries. Fragments too short to be voiced are dropped.
 * Everything here is pure: same input, same chunks.
 */

use log::debug;

/// Characters ending a sentence (Latin, Arabic and CJK)
pub const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '؟', '。'];

/// Characters separating clauses inside a sentence
pub const CLAUSE_SEPARATORS: &[char] = &[',', '،', ';', '؛'];

/// Default maximum chunk length in characters
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 200;

/// Fragments shorter than this cannot be synthesized meaningfully
pub const DEFAULT_MIN_CHUNK_CHARS: usize = 3;

/// A bounded unit of text sent to the speech synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Playback position, starting at 0
    pub index: usize,

    /// Text to synthesize
    pub text: String,
}

impl TextChunk {
    /// Length in characters (not bytes)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Splits text into synthesis-ready chunks
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chars: usize,
    min_chars: usize,
    sentence_terminators: Vec<char>,
    clause_separators: Vec<char>,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_CHARS)
    }
}

impl TextChunker {
    /// Create a chunker with the default punctuation sets
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
            min_chars: DEFAULT_MIN_CHUNK_CHARS,
            sentence_terminators: SENTENCE_TERMINATORS.to_vec(),
            clause_separators: CLAUSE_SEPARATORS.to_vec(),
        }
    }

    /// Override the minimum viable chunk length
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Override the sentence terminator set
    pub fn with_sentence_terminators(mut self, terminators: &[char]) -> Self {
        self.sentence_terminators = terminators.to_vec();
        self
    }

    /// Split text into trimmed, non-empty sentences (no length bound)
    pub fn sentences(&self, text: &str) -> Vec<String> {
        split_after(text, &self.sentence_terminators)
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Split text into chunks of at most `max_chars` characters
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let mut pieces: Vec<String> = Vec::new();

        for sentence in self.sentences(text) {
            if char_len(&sentence) <= self.max_chars {
                pieces.push(sentence);
                continue;
            }

            for clause in split_after(&sentence, &self.clause_separators) {
                let clause = clause.trim();
                if clause.is_empty() {
                    continue;
                }
                if char_len(clause) <= self.max_chars {
                    pieces.push(clause.to_string());
                } else {
                    pieces.extend(split_words(clause, self.max_chars));
                }
            }
        }

        let before = pieces.len();
        let chunks: Vec<TextChunk> = pieces
            .into_iter()
            .filter(|p| char_len(p) >= self.min_chars)
            .enumerate()
            .map(|(index, text)| TextChunk { index, text })
            .collect();

        if chunks.len() < before {
            debug!("Dropped {} fragment(s) shorter than {} chars", before - chunks.len(), self.min_chars);
        }

        chunks
    }
}

/// Split text into sentences using the default terminator set
pub fn split_sentences(text: &str) -> Vec<String> {
    TextChunker::default().sentences(text)
}

/// Convenience wrapper: chunk with the default punctuation sets
pub fn chunk(text: &str, max_chars: usize) -> Vec<TextChunk> {
    TextChunker::new(max_chars).chunk(text)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cut after every delimiter that is followed by whitespace.
/// The delimiter stays with the piece it ends.
fn split_after<'a>(text: &'a str, delimiters: &[char]) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !delimiters.contains(&ch) {
            continue;
        }
        if let Some(&(_, next)) = chars.peek() {
            if next.is_whitespace() {
                let end = idx + ch.len_utf8();
                pieces.push(&text[start..end]);
                start = end;
            }
        }
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

/// Greedy word packing for clauses with no usable punctuation.
/// A single word longer than the bound is cut into the fewest slices that
/// fit, with lengths differing by at most one so no tail is left tiny.
fn split_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = char_len(word);

        if word_len > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            let count = chars.len().div_ceil(max_chars);
            let (base, extra) = (chars.len() / count, chars.len() % count);
            let mut offset = 0;
            for i in 0..count {
                let size = base + usize::from(i < extra);
                pieces.push(chars[offset..offset + size].iter().collect());
                offset += size;
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}
