//! Elimination rounds and scoring
//!
//! In the elimination variants nobody leaves on a timeout. Every accepted
//! word scores its length up to a cap, a round lasts one turn per
//! participant still in play, and at the end of each round everybody tied
//! for the lowest score is eliminated.

use serde::{Deserialize, Serialize};

use crate::{
    constants::settings::ELIM_MAX_TURN_SCORE,
    leaderboard::Leaderboard,
    queue::TurnQueue,
    roster::{Player, PlayerId, Roster},
    variant::Rule,
};

/// Progress of the current elimination round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// Round number, starting at 1
    round: u32,
    /// Turns left before the lowest scorers are eliminated
    turns_until_elimination: usize,
    /// Letter rule of the round (Mixed-Elimination only)
    rule: Option<Rule>,
}

impl RoundState {
    /// State of the first round
    pub fn new(queue_len: usize, rule: Option<Rule>) -> Self {
        Self {
            round: 1,
            turns_until_elimination: queue_len,
            rule,
        }
    }

    /// Current round number
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Turns left in the round, including the current one
    pub fn turns_until_elimination(&self) -> usize {
        self.turns_until_elimination
    }

    /// Letter rule of the round, when it changes between rounds
    pub fn rule(&self) -> Option<Rule> {
        self.rule
    }

    /// Whether the current turn is the last of the round
    pub fn is_last_turn(&self) -> bool {
        self.turns_until_elimination <= 1
    }

    /// Counts a finished turn, returning `true` if the round is over
    pub fn complete_turn(&mut self) -> bool {
        self.turns_until_elimination = self.turns_until_elimination.saturating_sub(1);
        self.turns_until_elimination == 0
    }

    /// Starts the next round
    ///
    /// The round lasts one turn per participant left. A changing rule is
    /// re-rolled, never repeating the previous round's rule, and returned.
    pub fn next_round(&mut self, queue_len: usize, rng: &mut fastrand::Rng) -> Option<Rule> {
        self.round += 1;
        self.turns_until_elimination = queue_len;
        self.rule = self.rule.map(|previous| Rule::reroll(previous, rng));
        self.rule
    }
}

/// Points awarded for one accepted word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scored {
    /// Points earned by the word
    pub gained: u32,
    /// Cumulative score after the word
    pub total: u32,
    /// Whether the word was longer than the cap
    pub capped: bool,
}

/// Scores an accepted word, capped at [`ELIM_MAX_TURN_SCORE`]
pub fn score_answer(player: &mut Player, word: &str) -> Scored {
    let before = player.score();
    let capped = player.add_score(word, ELIM_MAX_TURN_SCORE);
    Scored {
        gained: player.score() - before,
        total: player.score(),
        capped,
    }
}

/// Leaderboard of the participants still in play
pub fn standings(roster: &Roster, queue: &TurnQueue) -> Leaderboard {
    Leaderboard::new(queue.iter().filter_map(|id| roster.get(id)))
}

/// Ends the round, removing everybody tied for the lowest score
///
/// Returns the eliminated participants. Everybody may be eliminated at once
/// when all scores are equal.
pub fn end_round(roster: &Roster, queue: &mut TurnQueue) -> Vec<PlayerId> {
    let eliminated = standings(roster, queue).lowest_scorers();
    queue.eliminate(&eliminated);
    eliminated
}
