//! Channel identifiers
//!
//! Every game instance belongs to exactly one communication channel. The
//! channel id is assigned by the chat transport and is a signed integer
//! (group chats are negative), so it is kept as-is and only wrapped to keep
//! it apart from player ids.

use std::{fmt::Display, num::ParseIntError, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Identifier of the channel a game runs in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct ChannelId(i64);

impl ChannelId {
    /// Wraps a transport channel id
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw transport channel id
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for ChannelId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChannelId {
    type Err = ParseIntError;

    /// Parses a channel id from its decimal representation
    ///
    /// # Errors
    ///
    /// Returns a `ParseIntError` if the string is not a valid integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}
