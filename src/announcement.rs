//! Messages posted to the channel
//!
//! Every state change of a game is reported as an [`Announcement`]. The
//! variants serialize to JSON for transports that render their own text,
//! and implement `Display` with plain English for those that don't.

use std::fmt::Display;

use heck::ToTitleCase;
use itertools::Itertools;
use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    TruncatedVec,
    config::Escalation,
    constants::settings::ELIM_MAX_TURN_SCORE,
    elimination::Scored,
    leaderboard::Board,
    variant::{Rule, Variant},
};

fn letter(c: char) -> char {
    c.to_ascii_uppercase()
}

fn letters(list: &[char]) -> String {
    list.iter().copied().map(letter).join(", ")
}

fn plural(word: &str, count: usize) -> String {
    pluralizer::pluralize(word, isize::try_from(count).unwrap_or(isize::MAX), true)
}

/// Contents of a turn prompt
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct TurnPrompt {
    /// The player whose turn it is
    pub player: String,
    /// The player after them, when the order is known
    pub next: Option<String>,
    /// Letter the answer must start with
    pub leading_letter: Option<char>,
    /// Letters the answer must not contain
    pub banned_letters: Vec<char>,
    /// Letter the answer must contain
    pub required_letter: Option<char>,
    /// Minimum length of the answer (normal variants)
    pub min_length: Option<usize>,
    /// Ticks to answer
    pub time_limit: i64,
    /// Players still in play and players who entered (normal variants)
    pub players: Option<(usize, usize)>,
    /// Words accepted so far (normal variants)
    pub total_words: Option<usize>,
    /// Round number (elimination variants)
    pub round: Option<u32>,
    /// Standings around the current player (elimination variants)
    pub leaderboard: Option<Board>,
}

/// Contents of the end of game summary
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Name of the winner, if the game had one
    pub winner: Option<String>,
    /// Number of participants
    pub players: usize,
    /// Words accepted during the game
    pub total_words: usize,
    /// Longest word of the game and the name of who sent it
    pub longest_word: Option<(String, String)>,
    /// Seconds between the start and the end of play
    pub duration_secs: u64,
}

/// Messages posted to the whole channel
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// A new game accepts players
    Opened {
        /// The variant being played
        variant: Variant,
        /// Players needed to start
        min_players: usize,
        /// Players allowed to join
        max_players: usize,
        /// Ticks until enrollment closes
        time_left: i64,
    },
    /// A player joined
    Joined {
        /// Name of the player
        name: String,
        /// Players in the game now
        players: usize,
        /// Players allowed to join
        max_players: usize,
    },
    /// A player left, or was removed by an admin
    Left {
        /// Name of the player
        name: String,
        /// Players in the game now
        players: usize,
        /// Whether an admin removed the player
        forced: bool,
    },
    /// Enrollment was extended
    Extended {
        /// Ticks added
        seconds: i64,
        /// Ticks until enrollment closes
        time_left: i64,
    },
    /// Enrollment was shortened
    Reduced {
        /// Ticks removed
        seconds: i64,
        /// Ticks until enrollment closes
        time_left: i64,
    },
    /// Enrollment reached one of the reminder marks
    Reminder {
        /// Ticks until enrollment closes
        time_left: i64,
    },
    /// The player limit was raised
    MaxPlayersRaised {
        /// Previous limit
        from: usize,
        /// New limit
        to: usize,
    },
    /// Enrollment closed without enough players
    NotEnoughPlayers {
        /// Players needed to start
        min_players: usize,
    },
    /// Play begins
    Started {
        /// The variant being played
        variant: Variant,
        /// Letter rule of the first round (Mixed-Elimination)
        rule: Option<Rule>,
        /// The starting word
        current_word: Option<String>,
        /// The chosen first letter
        chosen_letter: Option<char>,
        /// The banned letters
        banned_letters: Vec<char>,
        /// The required letter
        required_letter: Option<char>,
        /// Turn order, omitted when it is random
        turn_order: Option<TruncatedVec<String>>,
    },
    /// A new turn begins
    Turn(TurnPrompt),
    /// A word was accepted
    Accepted {
        /// The accepted word
        word: String,
        /// Points earned (elimination variants)
        score: Option<Scored>,
        /// Limits tightened by this turn
        escalation: Escalation,
    },
    /// A player ran out of time
    TimedOut {
        /// Name of the player
        name: String,
        /// Whether the player left the game
        eliminated: bool,
    },
    /// An elimination round ended
    RoundEnded {
        /// The round that ended
        round: u32,
        /// Standings at the end of the round
        leaderboard: Board,
        /// Names of the eliminated players
        eliminated: Vec<String>,
    },
    /// An elimination round began
    RoundStarted {
        /// The new round
        round: u32,
        /// Letter rule of the round (Mixed-Elimination)
        rule: Option<Rule>,
        /// Letter every word of the round starts with
        chosen_letter: Option<char>,
        /// Letters banned for the round
        banned_letters: Vec<char>,
        /// Letter the next word must contain
        required_letter: Option<char>,
        /// Standings of the players still in the game
        leaderboard: Board,
    },
    /// The game ended
    GameOver(Summary),
    /// An admin ended the game
    ForceEnded,
    /// The game was stopped because its timer stopped
    TimerFault,
    /// The game was stopped by an internal error
    Crashed,
}

impl Announcement {
    /// Converts the announcement to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

impl Display for TurnPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Turn: {}", self.player)?;
        if let Some(next) = &self.next {
            write!(f, " (Next: {next})")?;
        }
        writeln!(f)?;

        if let Some(leading) = self.leading_letter {
            write!(f, "Your word must start with {}", letter(leading))?;
        } else {
            write!(f, "Your word may start with any letter")?;
        }
        if let Some(required) = self.required_letter {
            write!(f, ", include {}", letter(required))?;
        }
        if !self.banned_letters.is_empty() {
            write!(f, ", not include {}", letters(&self.banned_letters))?;
        }
        if let Some(min) = self.min_length {
            write!(f, " and have at least {}", plural("letter", min))?;
        }
        writeln!(f, ".")?;
        write!(f, "You have {}s to answer.", self.time_limit)?;

        if let Some((remaining, total)) = self.players {
            write!(f, "\nPlayers remaining: {remaining}/{total}")?;
        }
        if let Some(words) = self.total_words {
            write!(f, "\nTotal words: {words}")?;
        }
        if let Some(board) = &self.leaderboard {
            write!(f, "\n\nLeaderboard:\n{board}")?;
        }
        Ok(())
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.winner {
            Some(winner) => writeln!(
                f,
                "{winner} won the game out of {}!",
                plural("player", self.players)
            )?,
            None => writeln!(f, "Nobody won the game.")?,
        }
        writeln!(f, "Total words: {}", self.total_words)?;
        if let Some((word, name)) = &self.longest_word {
            writeln!(f, "Longest word: {} from {name}", word.to_title_case())?;
        }
        write!(
            f,
            "Game length: {}m {}s",
            self.duration_secs / 60,
            self.duration_secs % 60
        )
    }
}

impl Display for Announcement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opened {
                variant,
                min_players,
                max_players,
                time_left,
            } => write!(
                f,
                "A {} is starting.\n{min_players}-{max_players} players are needed.\n{time_left}s to join.",
                variant.name().to_lowercase()
            ),
            Self::Joined {
                name,
                players,
                max_players,
            } => write!(
                f,
                "{name} joined. There {} {} in the game.",
                if *players == 1 { "is" } else { "are" },
                plural("player", *players)
            )
            .and_then(|()| {
                if players >= max_players {
                    write!(f, "\nThe maximum of {max_players} players has been reached.")
                } else {
                    Ok(())
                }
            }),
            Self::Left {
                name,
                players,
                forced,
            } => write!(
                f,
                "{name} {}. {} left in the game.",
                if *forced { "was removed" } else { "fled" },
                plural("player", *players)
            ),
            Self::Extended { seconds, time_left } => write!(
                f,
                "The joining phase has been extended by {seconds}s.\n{time_left}s left to join."
            ),
            Self::Reduced { seconds, time_left } => write!(
                f,
                "The joining phase has been reduced by {seconds}s.\n{time_left}s left to join."
            ),
            Self::Reminder { time_left } => write!(f, "{time_left}s left to join."),
            Self::MaxPlayersRaised { from, to } => write!(
                f,
                "The maximum number of players was raised from {from} to {to}."
            ),
            Self::NotEnoughPlayers { min_players } => write!(
                f,
                "Not enough players to start the game. At least {} are needed.",
                plural("player", *min_players)
            ),
            Self::Started {
                variant,
                rule,
                current_word,
                chosen_letter,
                banned_letters,
                required_letter,
                turn_order,
            } => {
                write!(f, "The {} is starting!", variant.name().to_lowercase())?;
                if let Some(rule) = rule {
                    write!(f, "\nRound 1: {}", rule.name())?;
                }
                if let Some(word) = current_word {
                    write!(f, "\nThe first word is {}.", word.to_title_case())?;
                }
                if let Some(chosen) = chosen_letter {
                    write!(f, "\nEvery word must start with {}.", letter(*chosen))?;
                }
                if !banned_letters.is_empty() {
                    write!(f, "\nBanned letters: {}", letters(banned_letters))?;
                }
                if let Some(required) = required_letter {
                    write!(f, "\nRequired letter: {}", letter(*required))?;
                }
                if let Some(order) = turn_order {
                    write!(f, "\n\nTurn order:\n{}", order.items().iter().join("\n"))?;
                    let hidden = order.hidden();
                    if hidden > 0 {
                        write!(f, "\nand {hidden} more")?;
                    }
                }
                Ok(())
            }
            Self::Turn(prompt) => write!(f, "{prompt}"),
            Self::Accepted {
                word,
                score,
                escalation,
            } => {
                write!(f, "{} is accepted.", word.to_title_case())?;
                if let Some(score) = score {
                    write!(
                        f,
                        "\nYou gained {} ({} in total).",
                        plural("point", score.gained as usize),
                        score.total
                    )?;
                    if score.capped {
                        write!(
                            f,
                            " A word scores at most {}.",
                            plural("point", ELIM_MAX_TURN_SCORE as usize)
                        )?;
                    }
                }
                if let Some((before, after)) = escalation.turn_seconds {
                    write!(f, "\nTime limit decreased from {before}s to {after}s.")?;
                }
                if let Some((before, after)) = escalation.min_word_length {
                    write!(
                        f,
                        "\nMinimum letters per word increased from {before} to {after}."
                    )?;
                }
                Ok(())
            }
            Self::TimedOut { name, eliminated } => {
                write!(f, "{name} ran out of time!")?;
                if *eliminated {
                    write!(f, " They have been eliminated.")?;
                }
                Ok(())
            }
            Self::RoundEnded {
                round,
                leaderboard,
                eliminated,
            } => write!(
                f,
                "Round {round} is completed.\n\nLeaderboard:\n{leaderboard}\n\n{} eliminated.",
                if eliminated.is_empty() {
                    "Nobody was".to_owned()
                } else {
                    format!(
                        "{} {}",
                        eliminated.join(", "),
                        if eliminated.len() == 1 { "was" } else { "were" }
                    )
                }
            ),
            Self::RoundStarted {
                round,
                rule,
                chosen_letter,
                banned_letters,
                required_letter,
                leaderboard,
            } => {
                write!(f, "Round {round} is starting.")?;
                if let Some(rule) = rule {
                    write!(f, "\nRule: {}", rule.name())?;
                }
                if let Some(chosen) = chosen_letter {
                    write!(f, "\nEvery word must start with {}.", letter(*chosen))?;
                }
                if !banned_letters.is_empty() {
                    write!(f, "\nBanned letters: {}", letters(banned_letters))?;
                }
                if let Some(required) = required_letter {
                    write!(f, "\nRequired letter: {}", letter(*required))?;
                }
                write!(f, "\n\nLeaderboard:\n{leaderboard}")
            }
            Self::GameOver(summary) => write!(f, "{summary}"),
            Self::ForceEnded => write!(f, "The game has been force ended."),
            Self::TimerFault => write!(
                f,
                "The game timer stopped working, so the game has been ended."
            ),
            Self::Crashed => write!(f, "An error occurred and the game has been ended."),
        }
    }
}
