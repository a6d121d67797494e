/*!
 * Dialect adaptation by fixed lexical substitution.
 *
 * A Modern Standard Arabic translation is nudged towards a regional variant
 * by replacing common words and phrases. A rule only matches whole tokens,
 * so "لا" never touches the inside of "السلام". When two sources overlap,
 * the longer one wins regardless of table order.
 */

use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Tag for Modern Standard Arabic, which needs no substitution
pub const MSA: &str = "msa";

/// One find-and-replace rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectRule {
    pub from: String,
    pub to: String,
}

impl DialectRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A substitution table compiled into one token-bounded alternation
#[derive(Debug, Clone)]
pub struct DialectAdapter {
    pattern: Option<Regex>,
    replacements: HashMap<String, String>,
}

impl DialectAdapter {
    pub fn new(rules: &[DialectRule]) -> Result<Self, regex::Error> {
        let mut replacements = HashMap::new();
        let mut sources = Vec::new();
        for rule in rules {
            let from = rule.from.trim();
            if from.is_empty() || replacements.contains_key(from) {
                continue;
            }
            replacements.insert(from.to_string(), rule.to.clone());
            sources.push(from.to_string());
        }

        if sources.is_empty() {
            return Ok(Self {
                pattern: None,
                replacements,
            });
        }

        // Leftmost-first alternation: longer sources must come first
        sources.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
        let alternation = sources.iter().map(|s| regex::escape(s)).collect::<Vec<_>>().join("|");
        let pattern = Regex::new(&format!(r"\b(?:{})\b", alternation))?;

        Ok(Self {
            pattern: Some(pattern),
            replacements,
        })
    }

    pub fn adapt(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        pattern
            .replace_all(text, |caps: &regex::Captures| {
                let found = &caps[0];
                self.replacements.get(found).cloned().unwrap_or_else(|| found.to_string())
            })
            .into_owned()
    }
}

/// Whether dialect adaptation should run for this target and tag
pub fn applies(target_language: &str, dialect: &str) -> bool {
    crate::language_utils::language_codes_match(target_language, "ar")
        && !dialect.eq_ignore_ascii_case(MSA)
}

/// Apply a rule table to the text, leaving it unchanged if the table cannot compile
pub fn adapt(text: &str, rules: &[DialectRule]) -> String {
    match DialectAdapter::new(rules) {
        Ok(adapter) => adapter.adapt(text),
        Err(e) => {
            warn!("Dialect table skipped: {}", e);
            text.to_string()
        }
    }
}

fn table(pairs: &[(&str, &str)]) -> Vec<DialectRule> {
    pairs.iter().map(|(from, to)| DialectRule::new(*from, *to)).collect()
}

/// Built-in substitution tables, used when the configuration has none
pub fn builtin_tables() -> BTreeMap<String, Vec<DialectRule>> {
    let mut tables = BTreeMap::new();

    tables.insert(
        "gulf".to_string(),
        table(&[
            ("كيف حالك", "شلونك"),
            ("ماذا", "شنو"),
            ("لماذا", "ليش"),
            ("أين", "وين"),
            ("نعم", "إي"),
            ("شكراً لك", "مشكور"),
            ("وداعاً", "يالله بالسلامة"),
        ]),
    );

    tables.insert(
        "egyptian".to_string(),
        table(&[
            ("كيف حالك", "إزيك"),
            ("ماذا", "إيه"),
            ("لماذا", "ليه"),
            ("متى", "إمتى"),
            ("نعم", "أيوه"),
            ("لا", "لأ"),
            ("جيد", "كويس"),
            ("كثير", "قوي"),
        ]),
    );

    tables.insert(
        "levantine".to_string(),
        table(&[
            ("كيف حالك", "كيفك"),
            ("ماذا", "شو"),
            ("لماذا", "ليش"),
            ("الآن", "هلأ"),
            ("نعم", "آه"),
            ("شكراً", "يسلمو"),
            ("هيا", "ياللا"),
        ]),
    );

    tables.insert(
        "north_african".to_string(),
        table(&[
            ("كيف حالك", "كيفاش راك"),
            ("ماذا", "واش"),
            ("لماذا", "علاش"),
            ("متى", "وقتاش"),
            ("كثير", "بزاف"),
            ("جيد", "مزيان"),
            ("نعم", "واه"),
        ]),
    );

    tables
}
