/*!
 * Sentence-wise translation of a transcript.
 *
 * Long transcripts are sent to the model one sentence at a time so every
 * request stays small, then rejoined with single spaces. An optional dialect
 * table is applied to the joined result.
 */

use log::{debug, info};

use crate::dialect::{self, DialectRule};
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::Translator;
use crate::text_chunker::TextChunker;

/// Progress is reported after this many sentences
pub const PROGRESS_INTERVAL: usize = 5;

/// Translation front end used by the pipeline
pub struct TranslationService<'a> {
    translator: &'a dyn Translator,
    dialect_rules: Vec<DialectRule>,
    splitter: TextChunker,
}

impl<'a> TranslationService<'a> {
    pub fn new(translator: &'a dyn Translator) -> Self {
        Self {
            translator,
            dialect_rules: Vec::new(),
            splitter: TextChunker::default(),
        }
    }

    /// Apply these substitutions after translating
    pub fn with_dialect_rules(mut self, rules: &[DialectRule]) -> Self {
        self.dialect_rules = rules.to_vec();
        self
    }

    /// Translate `text` sentence by sentence.
    ///
    /// `on_progress(done, total)` fires every [`PROGRESS_INTERVAL`] sentences
    /// and once at the end. Empty input returns an empty string without
    /// calling the model.
    pub async fn translate<F>(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        mut on_progress: F,
    ) -> Result<String, ProviderError>
    where
        F: FnMut(usize, usize),
    {
        let sentences = self.splitter.sentences(text);
        if sentences.is_empty() {
            debug!("Nothing to translate");
            return Ok(String::new());
        }

        let total = sentences.len();
        let mut translated = Vec::with_capacity(total);

        if language_utils::language_codes_match(source_language, target_language) {
            info!("Source and target language are both '{}', skipping translation", target_language);
            translated = sentences;
            on_progress(total, total);
        } else {
            for (i, sentence) in sentences.iter().enumerate() {
                let result = self.translator.translate(sentence, source_language, target_language).await?;
                translated.push(result.trim().to_string());

                let done = i + 1;
                if done % PROGRESS_INTERVAL == 0 || done == total {
                    on_progress(done, total);
                }
            }
        }

        let joined = translated
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if self.dialect_rules.is_empty() {
            return Ok(joined);
        }

        debug!("Applying {} dialect rules", self.dialect_rules.len());
        Ok(dialect::adapt(&joined, &self.dialect_rules))
    }
}
