//! Rule variants
//!
//! A [`Variant`] is the family of rules a game is started with. Every
//! variant shares the turn engine and differs in its limits, in how the next
//! player is picked and in the letter [`Rule`] answers must satisfy. The
//! letter rule lives in [`Prompt`], which Mixed-Elimination switches every
//! round.

use std::str::FromStr;

use heck::{ToSnakeCase, ToTitleCase};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Limits;

mod letters;
mod prompt;

pub use letters::{draw_banned_letters, draw_required_letter};
pub use prompt::Prompt;

/// The rule family a game is played with
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, enum_map::Enum,
)]
pub enum Variant {
    /// Each word starts with the last letter of the previous one
    Classic,
    /// Classic, starting at the shortest time and longest words
    Hard,
    /// Classic, with the next player picked at random
    Chaos,
    /// Every word starts with one letter fixed for the whole game
    ChosenFirstLetter,
    /// Classic, with a few letters nobody may use
    BannedLetters,
    /// Classic, with a letter every word must contain
    RequiredLetter,
    /// Classic rules, scored by word length, lowest scorers leave each round
    Elimination,
    /// Elimination with a different letter rule every round
    MixedElimination,
}

impl Variant {
    /// Every variant
    pub const ALL: [Self; 8] = [
        Self::Classic,
        Self::Hard,
        Self::Chaos,
        Self::ChosenFirstLetter,
        Self::BannedLetters,
        Self::RequiredLetter,
        Self::Elimination,
        Self::MixedElimination,
    ];

    /// Human readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::Classic => "Classic game",
            Self::Hard => "Hard mode game",
            Self::Chaos => "Chaos game",
            Self::ChosenFirstLetter => "Chosen first letter game",
            Self::BannedLetters => "Banned letters game",
            Self::RequiredLetter => "Required letter game",
            Self::Elimination => "Elimination game",
            Self::MixedElimination => "Mixed elimination game",
        }
    }

    /// Stable key used when recording games
    pub fn key(self) -> String {
        format!("{self:?}").to_snake_case()
    }

    /// Suffix of the start command selecting this variant
    pub fn command(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Hard => "hard",
            Self::Chaos => "chaos",
            Self::ChosenFirstLetter => "cfl",
            Self::BannedLetters => "bl",
            Self::RequiredLetter => "rl",
            Self::Elimination => "elim",
            Self::MixedElimination => "mixedelim",
        }
    }

    /// Whether the variant is scored and played in elimination rounds
    pub fn is_elimination(self) -> bool {
        matches!(self, Self::Elimination | Self::MixedElimination)
    }

    /// Whether the next player is picked at random
    pub fn is_chaos(self) -> bool {
        matches!(self, Self::Chaos)
    }

    /// Whether the letter rule changes every round
    pub fn is_mixed(self) -> bool {
        matches!(self, Self::MixedElimination)
    }

    /// Whether the virtual player may take part
    pub fn allows_virtual_player(self) -> bool {
        !self.is_elimination()
    }

    /// Limits a new game of this variant starts with
    pub fn limits(self) -> Limits {
        match self {
            Self::Hard => Limits::hardest(),
            Self::Elimination | Self::MixedElimination => Limits::elimination(),
            Self::Classic
            | Self::Chaos
            | Self::ChosenFirstLetter
            | Self::BannedLetters
            | Self::RequiredLetter => Limits::normal(),
        }
    }

    /// Letter rule of the first turn
    pub fn initial_rule(self, rng: &mut fastrand::Rng) -> Rule {
        match self {
            Self::Classic | Self::Hard | Self::Chaos | Self::Elimination => Rule::Classic,
            Self::ChosenFirstLetter => Rule::ChosenFirstLetter,
            Self::BannedLetters => Rule::BannedLetters,
            Self::RequiredLetter => Rule::RequiredLetter,
            Self::MixedElimination => Rule::ALL[rng.usize(..Rule::ALL.len())],
        }
    }
}

/// Error returned when parsing an unknown variant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown game variant: {0}")]
pub struct UnknownVariant(String);

impl FromStr for Variant {
    type Err = UnknownVariant;

    /// Parses a variant from its key or its start command suffix
    ///
    /// # Errors
    ///
    /// Returns `UnknownVariant` if nothing matches.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_snake_case();
        Self::ALL
            .into_iter()
            .find(|variant| variant.key() == wanted || variant.command() == wanted)
            .ok_or_else(|| UnknownVariant(s.to_owned()))
    }
}

/// The letter rule answers are checked against
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, enum_map::Enum,
)]
pub enum Rule {
    /// Start with the last letter of the current word
    Classic,
    /// Start with a fixed letter
    ChosenFirstLetter,
    /// Start with the last letter, avoid the banned letters
    BannedLetters,
    /// Start with the last letter, contain the required letter
    RequiredLetter,
}

impl Rule {
    /// Every rule
    pub const ALL: [Self; 4] = [
        Self::Classic,
        Self::ChosenFirstLetter,
        Self::BannedLetters,
        Self::RequiredLetter,
    ];

    /// Human readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::ChosenFirstLetter => "Chosen first letter",
            Self::BannedLetters => "Banned letters",
            Self::RequiredLetter => "Required letter",
        }
    }

    /// Draws the rule of the next round, never repeating `previous`
    pub fn reroll(previous: Self, rng: &mut fastrand::Rng) -> Self {
        let candidates = Self::ALL
            .into_iter()
            .filter(|&rule| rule != previous)
            .collect_vec();
        candidates[rng.usize(..candidates.len())]
    }
}

fn title(word: &str) -> String {
    word.to_title_case()
}

fn uppercase_list(letters: &[char]) -> String {
    letters.iter().map(char::to_ascii_uppercase).join(", ")
}

/// Reasons an answer is refused
///
/// The first three are never reported to the player: they cover messages
/// that were not meant as answers.
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum AnswerError {
    /// The sender is not the current player
    #[error("it is not your turn")]
    NotYourTurn,
    /// The current turn already ended or was answered
    #[error("answers are not being accepted")]
    NotAcceptingAnswers,
    /// The message is not a single word of plain letters
    #[error("not a single word")]
    NotAWord,
    /// The word starts with the wrong letter
    #[error("{} does not start with {}.", title(.word), .letter.to_ascii_uppercase())]
    WrongStartingLetter {
        /// The submitted word
        word: String,
        /// The letter it had to start with
        letter: char,
    },
    /// The word is shorter than the current minimum
    #[error("{} has less than {min} letters.", title(.word))]
    TooShort {
        /// The submitted word
        word: String,
        /// The current minimum length
        min: usize,
    },
    /// The word was already used in this game
    #[error("{} has been used.", title(.word))]
    AlreadyUsed {
        /// The submitted word
        word: String,
    },
    /// The word is not in the word list
    #[error("{} is not in my list of words.", title(.word))]
    NotInWordList {
        /// The submitted word
        word: String,
    },
    /// The word contains banned letters
    #[error("{} contains banned letters ({}).", title(.word), uppercase_list(.letters))]
    BannedLetters {
        /// The submitted word
        word: String,
        /// The offending letters, lowercase and sorted
        letters: Vec<char>,
    },
    /// The word lacks the required letter
    #[error("{} does not include {}.", title(.word), .letter.to_ascii_uppercase())]
    MissingRequiredLetter {
        /// The submitted word
        word: String,
        /// The letter it had to contain
        letter: char,
    },
}

impl AnswerError {
    /// Whether the refusal is dropped without a reply
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            Self::NotYourTurn | Self::NotAcceptingAnswers | Self::NotAWord
        )
    }
}
