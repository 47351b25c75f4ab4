//! The word count as a single local fold, and the mapping it produces

use std::collections::{hash_map, HashMap};

use serde::Serialize;

use crate::mr::function::{split_words, Tokenizer};

/// Mapping from word to the number of times it occurred
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WordCounts(HashMap<String, u64>);

impl WordCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` to the running total of `word`
    pub fn add(&mut self, word: &str, n: u64) {
        match self.0.get_mut(word) {
            Some(count) => *count += n,
            None => {
                self.0.insert(word.to_owned(), n);
            }
        }
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.0.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of word occurrences
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Pointwise sum with `other`
    pub fn merge(&mut self, other: WordCounts) {
        if self.0.len() < other.0.len() {
            let smaller = std::mem::replace(&mut self.0, other.0);
            self.merge(WordCounts(smaller));
            return;
        }
        for (word, n) in other.0 {
            *self.0.entry(word).or_insert(0) += n;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(word, n)| (word.as_str(), *n))
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for WordCounts {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut counts = WordCounts::new();
        for (word, n) in iter {
            *counts.0.entry(word.into()).or_insert(0) += n;
        }
        counts
    }
}

impl IntoIterator for WordCounts {
    type Item = (String, u64);
    type IntoIter = hash_map::IntoIter<String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Splits a line on runs of whitespace
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    split_words(line)
}

/// Counts whitespace-delimited words over all `lines`
pub fn count<I, S>(lines: I) -> WordCounts
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    WordCounter::default().count(lines)
}

#[derive(Debug, Clone, Default)]
pub struct WordCounter {
    tokenizer: Tokenizer,
}

impl WordCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokenizer(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    pub fn tokenize<'a>(&'a self, line: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tokenizer.tokenize(line)
    }

    pub fn count_line(&self, counts: &mut WordCounts, line: &str) {
        for word in self.tokenize(line) {
            counts.add(word, 1);
        }
    }

    pub fn count<I, S>(&self, lines: I) -> WordCounts
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = WordCounts::new();
        for line in lines {
            self.count_line(&mut counts, line.as_ref());
        }
        counts
    }
}
