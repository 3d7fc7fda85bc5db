//! Text normalization for ingredient names.
//!
//! ```text
//!  "Crab BB X1kg"
//!        │ non-letters → space
//!  "Crab BB X kg"
//!        │ lowercase, collapse spaces, trim
//!  "crab bb x kg"
//!        │ drop stopword tokens {bb, x, kg}
//!  "crab"
//! ```
//!
//! Every step maps the whole batch, so output length and order always equal
//! the input's. Downstream code zips the output back to the raw strings.

use ahash::AHashSet;
use once_cell::sync::Lazy;
use regex::Regex;

static NON_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z ]").expect("valid non-letter regex"));

static MULTI_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" {2,}").expect("valid multi-space regex"));

/// Replace anything that is not an ASCII letter or space with a space, then
/// lowercase.
#[must_use]
pub fn letters_only(text: &str) -> String {
    NON_LETTER.replace_all(text, " ").to_lowercase()
}

/// Collapse runs of spaces to one and trim the ends.
#[must_use]
pub fn collapse_spaces(text: &str) -> String {
    MULTI_SPACE.replace_all(text, " ").trim().to_string()
}

/// Tokens removed from normalized text. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct StopwordSet {
    words: Vec<String>,
    lookup: AHashSet<String>,
}

impl StopwordSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Words taken verbatim, e.g. rows already prepared in the stopword table.
    #[must_use]
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for word in words {
            set.insert(word.into());
        }
        set
    }

    /// Prepare raw stopword phrases: each phrase is normalized the same way
    /// ingredient text is, split into tokens, and de-duplicated keeping the
    /// order of first occurrence.
    #[must_use]
    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for phrase in phrases {
            let cleaned = collapse_spaces(&letters_only(phrase.as_ref()));
            for token in cleaned.split(' ').filter(|t| !t.is_empty()) {
                set.insert(token.to_string());
            }
        }
        set
    }

    fn insert(&mut self, word: String) {
        if self.lookup.insert(word.clone()) {
            self.words.push(word);
        }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.lookup.contains(token)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words in insertion order.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

/// Batch text normalizer bound to one stopword set.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    stopwords: StopwordSet,
}

impl TextNormalizer {
    #[must_use]
    pub fn new(stopwords: StopwordSet) -> Self {
        Self { stopwords }
    }

    #[must_use]
    pub fn stopwords(&self) -> &StopwordSet {
        &self.stopwords
    }

    /// Normalize a batch. Empty strings pass through as empty strings.
    #[must_use]
    pub fn normalize<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        texts.iter().map(|t| self.normalize_one(t.as_ref())).collect()
    }

    #[must_use]
    pub fn normalize_one(&self, text: &str) -> String {
        let cleaned = collapse_spaces(&letters_only(text));
        let kept: Vec<&str> = cleaned
            .split(' ')
            .filter(|token| !self.stopwords.contains(token))
            .collect();
        kept.join(" ").trim().to_string()
    }
}
