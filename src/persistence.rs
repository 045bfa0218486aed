//! Game result storage
//!
//! Durable state is delegated to a [`Recorder`]. After a game ends the
//! engine records the game itself, then one result per participant. Every
//! write is independent, and a failed write is logged without affecting the
//! game.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{channel::ChannelId, roster::PlayerId};

/// Identifier the storage assigns to a recorded game
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct GameRecordId(i64);

/// A completed game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Channel the game ran in
    pub channel: ChannelId,
    /// Number of participants at the end of enrollment
    pub participant_count: usize,
    /// Stable key of the variant that was played
    pub variant: String,
    /// Winner, if the game had one
    pub winner: Option<PlayerId>,
    /// When play started
    pub start_time: web_time::SystemTime,
    /// When play ended
    pub end_time: web_time::SystemTime,
}

/// The result of one participant in a completed game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    /// The game this result belongs to
    pub game_id: GameRecordId,
    /// The participant
    pub player_id: PlayerId,
    /// Whether the participant was still in play at the end
    pub won: bool,
    /// Accepted words
    pub word_count: usize,
    /// Letters across accepted words
    pub letter_count: usize,
    /// Longest accepted word, if any
    pub longest_word: Option<String>,
}

/// Errors reported by a [`Recorder`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The storage could not be reached
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// The storage refused the record
    #[error("record rejected: {0}")]
    Rejected(String),
}

/// Trait for storing game results
pub trait Recorder: Send + Sync + 'static {
    /// Stores a completed game
    ///
    /// # Errors
    ///
    /// Returns an error if the game could not be stored; no player results
    /// are recorded in that case.
    fn record_completed_game(
        &self,
        record: &GameRecord,
    ) -> impl Future<Output = Result<GameRecordId, Error>> + Send;

    /// Stores the result of a single participant
    ///
    /// # Errors
    ///
    /// Returns an error if the result could not be stored.
    fn record_player_result(
        &self,
        result: &PlayerResult,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}
