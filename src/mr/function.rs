//! The word count map and reduce functions, and the tokenizer they share

use regex::Regex;

/// Characters that end a word: Unicode whitespace plus the ASCII file, group, record and unit separators
pub fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Splits a line on runs of separators, never yielding an empty word
pub fn split_words(line: &str) -> impl Iterator<Item = &str> {
    line.split(is_word_separator).filter(|word| !word.is_empty())
}

/// How a line is broken into words
#[derive(Debug, Clone, Default)]
pub enum Tokenizer {
    /// Maximal runs of non-whitespace characters, case and punctuation kept as-is
    #[default]
    Whitespace,
    /// Every non-empty match of the pattern is a word
    Pattern(Regex),
}

impl Tokenizer {
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    pub fn tokenize<'a>(&'a self, line: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self {
            Self::Whitespace => Box::new(split_words(line)),
            Self::Pattern(re) => Box::new(
                re.find_iter(line)
                    .map(|m| m.as_str())
                    .filter(|word| !word.is_empty()),
            ),
        }
    }
}

/// Word Count application
pub mod wc {
    use super::Tokenizer;
    use crate::mr::worker::KeyValue;

    /// Emits `(word, 1)` for every word occurrence in the line
    pub fn map(tokenizer: &Tokenizer, input: &str) -> Vec<KeyValue> {
        tokenizer
            .tokenize(input)
            .map(|word| KeyValue::new(word.to_string(), 1))
            .collect()
    }

    /// Values may already be partial sums from the combiner, so they are added rather than counted
    pub fn reduce(_key: &str, values: &[u64]) -> u64 {
        values.iter().sum()
    }
}
