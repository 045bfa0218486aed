//! Per-game prompt state
//!
//! The prompt is everything an answer is checked against besides the
//! limits: the current word, and the chosen, banned or required letters of
//! the active rule.

use std::collections::HashSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{
    AnswerError, Rule,
    letters::{draw_banned_letters, draw_required_letter},
};
use crate::{
    constants::letters::ALPHABET,
    lexicon::{Lexicon, WordQuery},
};

/// Prompt state of a running game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Active letter rule
    rule: Rule,
    /// The last accepted word, or the starting word
    current_word: Option<String>,
    /// Letter every word starts with (chosen first letter)
    chosen_letter: Option<char>,
    /// Letters nobody may use, sorted (banned letters)
    banned_letters: Vec<char>,
    /// Letter the next word must contain (required letter)
    required_letter: Option<char>,
}

impl Prompt {
    /// A prompt continuing from `word` with no letters drawn yet
    pub fn with_word(rule: Rule, word: impl Into<String>) -> Self {
        Self {
            rule,
            current_word: Some(word.into()),
            chosen_letter: None,
            banned_letters: Vec::new(),
            required_letter: None,
        }
    }

    /// Replaces the banned letters
    #[must_use]
    pub fn banning(mut self, mut letters: Vec<char>) -> Self {
        letters.sort_unstable();
        self.banned_letters = letters;
        self
    }

    /// Replaces the required letter
    #[must_use]
    pub fn requiring(mut self, letter: char) -> Self {
        self.required_letter = Some(letter);
        self
    }

    /// Replaces the chosen first letter
    #[must_use]
    pub fn choosing(mut self, letter: char) -> Self {
        self.chosen_letter = Some(letter);
        self
    }

    /// Builds the starting state of a game
    ///
    /// The starting word is drawn from the lexicon under the rule's
    /// constraints. With the chosen first letter rule, the letter is drawn
    /// uniformly from the alphabet and no word is needed, unless `chained`
    /// (inside Mixed-Elimination the following rounds continue from a word
    /// starting with the letter). A letter with no such word is redrawn.
    ///
    /// Returns `None` if the lexicon has no suitable word.
    pub fn start<L: Lexicon + ?Sized>(
        rule: Rule,
        chained: bool,
        lexicon: &L,
        min_length: usize,
        rng: &mut fastrand::Rng,
    ) -> Option<Self> {
        let mut prompt = Self {
            rule,
            current_word: None,
            chosen_letter: None,
            banned_letters: Vec::new(),
            required_letter: None,
        };

        if rule == Rule::ChosenFirstLetter {
            let (letter, word) = draw_chosen_letter(lexicon, chained, min_length, rng)?;
            prompt.chosen_letter = Some(letter);
            prompt.current_word = word;
            return Some(prompt);
        }

        if rule == Rule::BannedLetters {
            prompt.banned_letters = draw_banned_letters(rng, None);
        }

        let word = lexicon.random_word(
            &WordQuery {
                min_length,
                banned_letters: &prompt.banned_letters,
                ..WordQuery::default()
            },
            rng,
        )?;

        if rule == Rule::RequiredLetter {
            prompt.required_letter = Some(draw_required_letter(rng, word.chars().last()));
        }
        prompt.current_word = Some(word);

        Some(prompt)
    }

    /// Active letter rule
    pub fn rule(&self) -> Rule {
        self.rule
    }

    /// The last accepted word
    pub fn current_word(&self) -> Option<&str> {
        self.current_word.as_deref()
    }

    /// The chosen first letter, if the rule has one
    pub fn chosen_letter(&self) -> Option<char> {
        self.chosen_letter
    }

    /// The banned letters, sorted
    pub fn banned_letters(&self) -> &[char] {
        &self.banned_letters
    }

    /// The letter the next word must contain
    pub fn required_letter(&self) -> Option<char> {
        self.required_letter
    }

    /// The letter the next word has to start with
    pub fn leading_letter(&self) -> Option<char> {
        match self.rule {
            Rule::ChosenFirstLetter => self.chosen_letter,
            Rule::Classic | Rule::BannedLetters | Rule::RequiredLetter => {
                self.current_word.as_deref().and_then(|word| word.chars().last())
            }
        }
    }

    /// Checks the constraint of the rule on top of the shared checks
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::BannedLetters` with the offending letters, or
    /// `AnswerError::MissingRequiredLetter`.
    pub fn check(&self, word: &str) -> Result<(), AnswerError> {
        match self.rule {
            Rule::BannedLetters => {
                let letters = word
                    .chars()
                    .filter(|c| self.banned_letters.contains(c))
                    .unique()
                    .sorted_unstable()
                    .collect_vec();
                if letters.is_empty() {
                    Ok(())
                } else {
                    Err(AnswerError::BannedLetters {
                        word: word.to_owned(),
                        letters,
                    })
                }
            }
            Rule::RequiredLetter => match self.required_letter {
                Some(letter) if !word.contains(letter) => {
                    Err(AnswerError::MissingRequiredLetter {
                        word: word.to_owned(),
                        letter,
                    })
                }
                _ => Ok(()),
            },
            Rule::Classic | Rule::ChosenFirstLetter => Ok(()),
        }
    }

    /// Runs every check on a normalized answer
    ///
    /// The checks run in order: starting letter, minimum length, reuse,
    /// word list, then the rule's own constraint.
    ///
    /// # Errors
    ///
    /// Returns the first failed check as an `AnswerError`.
    pub fn validate<L: Lexicon + ?Sized>(
        &self,
        word: &str,
        min_length: usize,
        used: &HashSet<String>,
        lexicon: &L,
    ) -> Result<(), AnswerError> {
        if let Some(letter) = self.leading_letter()
            && !word.starts_with(letter)
        {
            return Err(AnswerError::WrongStartingLetter {
                word: word.to_owned(),
                letter,
            });
        }
        if word.len() < min_length {
            return Err(AnswerError::TooShort {
                word: word.to_owned(),
                min: min_length,
            });
        }
        if used.contains(word) {
            return Err(AnswerError::AlreadyUsed {
                word: word.to_owned(),
            });
        }
        if !lexicon.exists(word) {
            return Err(AnswerError::NotInWordList {
                word: word.to_owned(),
            });
        }
        self.check(word)
    }

    /// Moves the prompt on after an accepted word
    ///
    /// The required letter is redrawn every turn, never equal to the new
    /// word's last letter.
    pub fn accept(&mut self, word: &str, rng: &mut fastrand::Rng) {
        self.current_word = Some(word.to_owned());
        if self.rule == Rule::RequiredLetter {
            self.required_letter = Some(draw_required_letter(rng, word.chars().last()));
        }
    }

    /// Switches to the rule of a new round, continuing from the current word
    pub fn switch_rule(&mut self, rule: Rule, rng: &mut fastrand::Rng) {
        let last = self.current_word.as_deref().and_then(|word| word.chars().last());

        self.rule = rule;
        self.chosen_letter = None;
        self.banned_letters.clear();
        self.required_letter = None;

        match rule {
            Rule::Classic => {}
            Rule::ChosenFirstLetter => self.chosen_letter = last,
            Rule::BannedLetters => self.banned_letters = draw_banned_letters(rng, last),
            Rule::RequiredLetter => self.required_letter = Some(draw_required_letter(rng, last)),
        }
    }

    /// Query for a word that would be accepted right now
    pub fn word_query<'a>(&'a self, min_length: usize, used: &'a HashSet<String>) -> WordQuery<'a> {
        WordQuery {
            min_length,
            starting_letter: self.leading_letter(),
            required_letter: self.required_letter,
            banned_letters: &self.banned_letters,
            exclude: Some(used),
        }
    }
}

/// Draws a chosen first letter, and a starting word with it when `chained`
fn draw_chosen_letter<L: Lexicon + ?Sized>(
    lexicon: &L,
    chained: bool,
    min_length: usize,
    rng: &mut fastrand::Rng,
) -> Option<(char, Option<String>)> {
    let mut letters = ALPHABET.chars().collect_vec();
    rng.shuffle(&mut letters);

    if !chained {
        return letters.first().map(|&letter| (letter, None));
    }

    letters.into_iter().find_map(|letter| {
        lexicon
            .random_word(
                &WordQuery {
                    min_length,
                    starting_letter: Some(letter),
                    ..WordQuery::default()
                },
                rng,
            )
            .map(|word| (letter, Some(word)))
    })
}
