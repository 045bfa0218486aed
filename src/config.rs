//! Instance limits and process-wide options
//!
//! [`Limits`] is the configuration snapshot owned by a single game: player
//! bounds, the enrollment countdown and the turn limits together with the
//! bounds the escalation may move them within. [`Options`] holds the knobs
//! shared by every instance the process runs.

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{settings::*, watchdog},
    roster::PlayerId,
};

/// Validation result type for duration validation
type ValidationResult = garde::Result;

/// Validates that a duration falls within the given millisecond bounds (inclusive)
///
/// # Errors
///
/// Returns a `garde::Error` if the duration is outside the specified bounds.
pub fn validate_millis<const MIN_MILLIS: u64, const MAX_MILLIS: u64>(
    val: &Duration,
    _ctx: &(),
) -> ValidationResult {
    let millis = u64::try_from(val.as_millis()).unwrap_or(u64::MAX);
    if (MIN_MILLIS..=MAX_MILLIS).contains(&millis) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{MIN_MILLIS}ms,{MAX_MILLIS}ms]",
        )))
    }
}

/// Configuration snapshot of one game instance
///
/// The current values (`turn_seconds`, `min_word_length`) move during play;
/// the escalation keeps them inside `[min_turn_seconds, turn_seconds]` and
/// `[min_word_length, max_word_length]` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Limits {
    /// Players required when enrollment closes
    #[garde(range(min = 1, max = INCREASED_MAX_PLAYERS))]
    pub min_players: usize,
    /// Players at which enrollment closes immediately
    #[garde(range(min = 1, max = INCREASED_MAX_PLAYERS))]
    pub max_players: usize,
    /// Initial enrollment countdown in ticks
    #[garde(range(min = 1, max = MAX_JOINING_PHASE_SECONDS))]
    pub joining_seconds: i64,
    /// Ceiling for extensions of the enrollment countdown
    #[garde(range(min = 1, max = MAX_JOINING_PHASE_SECONDS))]
    pub max_joining_seconds: i64,
    /// Current per-turn time limit in ticks
    #[garde(range(min = 1, max = MAX_TURN_SECONDS))]
    pub turn_seconds: i64,
    /// Floor of the per-turn time limit
    #[garde(range(min = 1, max = MAX_TURN_SECONDS))]
    pub min_turn_seconds: i64,
    /// Current minimum word length
    #[garde(range(min = 1, max = MAX_WORD_LENGTH_LIMIT))]
    pub min_word_length: usize,
    /// Ceiling of the minimum word length
    #[garde(range(min = 1, max = MAX_WORD_LENGTH_LIMIT))]
    pub max_word_length: usize,
    /// Whether accepted turns tighten the limits
    #[garde(skip)]
    pub escalates: bool,
}

impl Limits {
    /// Settings of the normal variants
    pub fn normal() -> Self {
        Self {
            min_players: NORMAL_GAME_MIN_PLAYERS,
            max_players: MAX_PLAYERS,
            joining_seconds: INITIAL_JOINING_PHASE_SECONDS,
            max_joining_seconds: MAX_JOINING_PHASE_SECONDS,
            turn_seconds: MAX_TURN_SECONDS,
            min_turn_seconds: MIN_TURN_SECONDS,
            min_word_length: MIN_WORD_LENGTH_LIMIT,
            max_word_length: MAX_WORD_LENGTH_LIMIT,
            escalates: true,
        }
    }

    /// Normal settings starting at the hardest limits available
    pub fn hardest() -> Self {
        Self {
            turn_seconds: MIN_TURN_SECONDS,
            min_word_length: MAX_WORD_LENGTH_LIMIT,
            ..Self::normal()
        }
    }

    /// Settings of the elimination variants
    ///
    /// There is no minimum length beyond a single letter, since short words
    /// only lose points, and the turn limit never changes.
    pub fn elimination() -> Self {
        Self {
            min_players: SPECIAL_GAME_MIN_PLAYERS,
            max_players: SPECIAL_GAME_MAX_PLAYERS,
            joining_seconds: SPECIAL_GAME_INITIAL_JOINING_PHASE_SECONDS,
            max_joining_seconds: MAX_JOINING_PHASE_SECONDS,
            turn_seconds: FIXED_TURN_SECONDS,
            min_turn_seconds: FIXED_TURN_SECONDS,
            min_word_length: 1,
            max_word_length: 1,
            escalates: false,
        }
    }

    /// Tightens the limits after an accepted turn
    ///
    /// Returns the `(before, after)` pairs of the values that changed.
    pub fn escalate(&mut self) -> Escalation {
        let mut escalation = Escalation::default();
        if !self.escalates {
            return escalation;
        }

        if self.turn_seconds > self.min_turn_seconds {
            let before = self.turn_seconds;
            self.turn_seconds = (self.turn_seconds - TURN_SECONDS_REDUCTION_PER_LIMIT_CHANGE)
                .max(self.min_turn_seconds);
            escalation.turn_seconds = Some((before, self.turn_seconds));
        }

        if self.min_word_length < self.max_word_length {
            let before = self.min_word_length;
            self.min_word_length = (self.min_word_length
                + WORD_LENGTH_LIMIT_INCREASE_PER_LIMIT_CHANGE)
                .min(self.max_word_length);
            escalation.min_word_length = Some((before, self.min_word_length));
        }

        escalation
    }
}

/// Limit changes applied by a single escalation step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Escalation {
    /// Time limit before and after the change
    pub turn_seconds: Option<(i64, i64)>,
    /// Minimum word length before and after the change
    pub min_word_length: Option<(usize, usize)>,
}

impl Escalation {
    /// Whether anything changed
    pub fn is_empty(&self) -> bool {
        self.turn_seconds.is_none() && self.min_word_length.is_none()
    }
}

/// Identity of the scripted stand-in participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct VirtualPlayer {
    /// Stable player id of the virtual player
    #[garde(skip)]
    pub id: PlayerId,
    /// Display name of the virtual player
    #[garde(length(chars, min = 1, max = 64))]
    pub name: String,
}

impl Default for VirtualPlayer {
    fn default() -> Self {
        Self {
            id: PlayerId::from(-1),
            name: "Virtual Player".to_owned(),
        }
    }
}

/// Process-wide options shared by every game instance
#[serde_with::serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Options {
    /// Length of one scheduling tick
    #[garde(custom(validate_millis::<10, 60_000>))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub tick: Duration,
    /// Shortest delay before the virtual player answers
    #[garde(custom(validate_millis::<0, 60_000>))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub virtual_player_min_delay: Duration,
    /// Longest delay before the virtual player answers
    #[garde(custom(validate_millis::<0, 60_000>))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub virtual_player_max_delay: Duration,
    /// Identity used for the virtual player
    #[garde(dive)]
    pub virtual_player: VirtualPlayer,
    /// Samples taken by a stale timer scan
    #[garde(range(min = 1, max = 60))]
    pub watchdog_samples: u32,
    /// Consecutive negative-countdown ticks tolerated by the loop
    #[garde(range(min = 1, max = 60))]
    pub negative_timer_ticks: u32,
    /// Seed for the per-game random number generators
    #[garde(skip)]
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            virtual_player_min_delay: Duration::from_secs(2),
            virtual_player_max_delay: Duration::from_secs(5),
            virtual_player: VirtualPlayer::default(),
            watchdog_samples: watchdog::SAMPLES,
            negative_timer_ticks: watchdog::NEGATIVE_TIMER_TICKS,
            seed: None,
        }
    }
}

impl Options {
    /// Picks a virtual player delay uniformly within the configured bounds
    pub fn virtual_player_delay(&self, rng: &mut fastrand::Rng) -> Duration {
        let low = self
            .virtual_player_min_delay
            .min(self.virtual_player_max_delay);
        let high = self
            .virtual_player_min_delay
            .max(self.virtual_player_max_delay);
        low + (high - low).mul_f64(rng.f64())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_limits_presets_validate() {
        assert!(Limits::normal().validate().is_ok());
        assert!(Limits::hardest().validate().is_ok());
        assert!(Limits::elimination().validate().is_ok());
    }

    #[test]
    fn test_escalate_tightens_until_bounds() {
        let mut limits = Limits::normal();

        let first = limits.escalate();
        assert_eq!(first.turn_seconds, Some((40, 35)));
        assert_eq!(first.min_word_length, Some((3, 4)));

        for _ in 0..20 {
            limits.escalate();
        }

        assert_eq!(limits.turn_seconds, MIN_TURN_SECONDS);
        assert_eq!(limits.min_word_length, MAX_WORD_LENGTH_LIMIT);
        assert!(limits.escalate().is_empty());
    }

    #[test]
    fn test_escalate_disabled_for_elimination() {
        let mut limits = Limits::elimination();
        assert!(limits.escalate().is_empty());
        assert_eq!(limits, Limits::elimination());
    }

    #[test]
    fn test_hardest_does_not_escalate_further() {
        let mut limits = Limits::hardest();
        assert!(limits.escalate().is_empty());
    }

    #[test]
    fn test_options_default_validates() {
        assert!(Options::default().validate().is_ok());
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: Options =
            serde_json::from_str(r#"{"tick": 250, "seed": 7}"#).unwrap();

        assert_eq!(options.tick, Duration::from_millis(250));
        assert_eq!(options.seed, Some(7));
        assert_eq!(options.watchdog_samples, watchdog::SAMPLES);
    }

    #[test]
    fn test_options_reject_tiny_tick() {
        let options = Options {
            tick: Duration::from_millis(1),
            ..Options::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_virtual_player_delay_within_bounds() {
        let options = Options::default();
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..100 {
            let delay = options.virtual_player_delay(&mut rng);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_secs(5));
        }
    }
}
