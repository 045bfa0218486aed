//! Configuration constants for the word chain engine
//!
//! This module contains the fixed game settings shared by every variant,
//! plus the limits used by the watchdog and the display helpers.

/// Player, enrollment and turn settings
pub mod settings {
    /// Minimum number of players for a normal (non-elimination) game
    pub const NORMAL_GAME_MIN_PLAYERS: usize = 2;
    /// Maximum number of players for a normal game
    pub const MAX_PLAYERS: usize = 50;
    /// Maximum number of players after a one-shot raise
    pub const INCREASED_MAX_PLAYERS: usize = 300;
    /// Minimum number of players for an elimination game
    pub const SPECIAL_GAME_MIN_PLAYERS: usize = 5;
    /// Maximum number of players for an elimination game
    pub const SPECIAL_GAME_MAX_PLAYERS: usize = 30;

    /// Ticks players have to join a normal game
    pub const INITIAL_JOINING_PHASE_SECONDS: i64 = 60;
    /// Ticks players have to join an elimination game
    pub const SPECIAL_GAME_INITIAL_JOINING_PHASE_SECONDS: i64 = 90;
    /// Ceiling of the enrollment countdown after extensions
    pub const MAX_JOINING_PHASE_SECONDS: i64 = 180;
    /// Extension granted once per non-admin player
    pub const PLAYER_EXTENSION_SECONDS: i64 = 30;
    /// Remaining ticks at which a join reminder is sent
    pub const JOINING_REMINDERS: [i64; 3] = [60, 30, 15];

    /// Shortest time limit a turn can shrink to
    pub const MIN_TURN_SECONDS: i64 = 20;
    /// Initial time limit of a normal turn
    pub const MAX_TURN_SECONDS: i64 = 40;
    /// Reduction applied at every limit change
    pub const TURN_SECONDS_REDUCTION_PER_LIMIT_CHANGE: i64 = 5;
    /// Time limit of every elimination turn
    pub const FIXED_TURN_SECONDS: i64 = 30;

    /// Initial minimum word length
    pub const MIN_WORD_LENGTH_LIMIT: usize = 3;
    /// Largest minimum word length the escalation reaches
    pub const MAX_WORD_LENGTH_LIMIT: usize = 10;
    /// Increase applied at every limit change
    pub const WORD_LENGTH_LIMIT_INCREASE_PER_LIMIT_CHANGE: usize = 1;
    /// Accepted turns between two limit changes
    pub const TURNS_BETWEEN_LIMITS_CHANGE: usize = 5;

    /// Largest score a single elimination turn can earn
    pub const ELIM_MAX_TURN_SCORE: u32 = 20;
}

/// Letter rules configuration
pub mod letters {
    /// The playable alphabet
    pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";
    /// Vowels; at most one of them is ever banned
    pub const VOWELS: &str = "aeiou";
    /// Fewest letters banned in a banned-letters round
    pub const MIN_BANNED_LETTERS: usize = 2;
    /// Most letters banned in a banned-letters round
    pub const MAX_BANNED_LETTERS: usize = 4;
}

/// Display limits
pub mod display {
    /// Names listed in the starting turn order before truncation
    pub const TURN_ORDER_LIMIT: usize = 50;
    /// Leaderboards up to this size are always shown in full
    pub const LEADERBOARD_FULL_LIMIT: usize = 10;
    /// Rows shown at each end of a windowed leaderboard
    pub const LEADERBOARD_EDGE_ROWS: usize = 5;
    /// Most words returned by a prefix suggestion
    pub const SUGGESTION_LIMIT: usize = 50;
}

/// Stale timer detection
pub mod watchdog {
    /// Number of one-tick samples taken by a scan
    pub const SAMPLES: u32 = 5;
    /// Consecutive ticks with a negative turn countdown before the loop faults
    pub const NEGATIVE_TIMER_TICKS: u32 = 5;
}
