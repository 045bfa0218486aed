//! Word list capability
//!
//! The engine never owns the word list. It consumes it through the
//! [`Lexicon`] trait: an existence check for submitted answers, a
//! constrained random draw for starting words and the virtual player, and a
//! prefix enumeration. [`WordList`] is an in-memory implementation backed
//! by a sorted set.

use std::collections::{BTreeSet, HashSet};

use itertools::Itertools;

use crate::constants::display::SUGGESTION_LIMIT;

/// Constraints for a random word draw
#[derive(Debug, Clone, Copy, Default)]
pub struct WordQuery<'a> {
    /// Shortest acceptable length
    pub min_length: usize,
    /// Letter the word must start with
    pub starting_letter: Option<char>,
    /// Letter the word must contain
    pub required_letter: Option<char>,
    /// Letters the word must not contain
    pub banned_letters: &'a [char],
    /// Words that must not be returned
    pub exclude: Option<&'a HashSet<String>>,
}

impl WordQuery<'_> {
    /// Whether a word satisfies every constraint of the query
    pub fn matches(&self, word: &str) -> bool {
        word.len() >= self.min_length
            && self
                .starting_letter
                .is_none_or(|letter| word.starts_with(letter))
            && self
                .required_letter
                .is_none_or(|letter| word.contains(letter))
            && !word.chars().any(|c| self.banned_letters.contains(&c))
            && self.exclude.is_none_or(|used| !used.contains(word))
    }
}

/// The word list consumed by the engine
///
/// Words are lowercase ASCII.
pub trait Lexicon: Send + Sync + 'static {
    /// Whether the word is in the list
    fn exists(&self, word: &str) -> bool;

    /// Draws a random word satisfying the query, `None` if there is none
    fn random_word(&self, query: &WordQuery<'_>, rng: &mut fastrand::Rng) -> Option<String>;

    /// Enumerates the words starting with `prefix`, in list order
    fn words_with_prefix<'a>(&'a self, prefix: &str) -> Box<dyn Iterator<Item = &'a str> + 'a>;
}

/// Returns at most [`SUGGESTION_LIMIT`] words starting with `prefix`
pub fn suggestions<L: Lexicon + ?Sized>(lexicon: &L, prefix: &str) -> Vec<String> {
    lexicon
        .words_with_prefix(&prefix.to_lowercase())
        .take(SUGGESTION_LIMIT)
        .map(str::to_owned)
        .collect_vec()
}

/// Whether a word only consists of the letters the lexicon contains
pub fn is_plain_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_lowercase())
}

/// In-memory sorted word list
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: BTreeSet<String>,
}

impl WordList {
    /// Builds a word list, lowercasing the input and dropping anything that
    /// is not a plain ASCII word
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| is_plain_word(w))
                .collect(),
        }
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Adds words to the list
    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(Self::new(words).words);
    }
}

impl Lexicon for WordList {
    fn exists(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    fn random_word(&self, query: &WordQuery<'_>, rng: &mut fastrand::Rng) -> Option<String> {
        let candidates = match query.starting_letter {
            Some(letter) => self.words_with_prefix(&letter.to_string()).collect_vec(),
            None => self.words.iter().map(String::as_str).collect_vec(),
        }
        .into_iter()
        .filter(|word| query.matches(word))
        .collect_vec();

        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.usize(..candidates.len())].to_owned())
    }

    fn words_with_prefix<'a>(&'a self, prefix: &str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        let prefix = prefix.to_owned();
        Box::new(
            self.words
                .range(prefix.clone()..)
                .take_while(move |word| word.starts_with(&prefix))
                .map(String::as_str),
        )
    }
}
