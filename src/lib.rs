//! # Word Chain Game Library
//!
//! This library provides the game engine for multiplayer word chain games
//! played in chat channels. It handles enrollment, turn order and timers,
//! the letter rules of every variant, elimination scoring with leaderboards,
//! a scripted virtual player, and the per-channel scheduling loops together
//! with the registry that owns them.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use derive_where::derive_where;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub mod constants;

pub mod announcement;
pub mod channel;
pub mod config;
pub mod elimination;
pub mod game;
pub mod leaderboard;
pub mod lexicon;
pub mod persistence;
pub mod queue;
pub mod registry;
pub mod roster;
pub mod runner;
pub mod session;
pub mod variant;
pub mod watchdog;

#[cfg(test)]
mod testing;

/// Alarm messages for timed events inside a game
///
/// Alarms are scheduled by the game through the closure passed to
/// [`game::Game::tick`] and delivered back after their delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// The virtual player answers the turn with the given serial
    VirtualPlayerTurn {
        /// Serial of the turn the alarm was scheduled for
        serial: u64,
    },
}

/// A truncated vector that maintains the exact count while limiting displayed items
///
/// This structure is useful for displaying a limited number of items while
/// still showing the total count. For example, showing "120 players" but only
/// listing the first 50 names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[derive_where(Default)]
pub struct TruncatedVec<T> {
    /// The exact total count of items
    exact_count: usize,
    /// The truncated list of items (up to the limit)
    items: Vec<T>,
}

impl<T: Clone> TruncatedVec<T> {
    /// Creates a new truncated vector from an iterator
    ///
    /// # Arguments
    ///
    /// * `list` - An iterator over items to include
    /// * `limit` - Maximum number of items to include in the truncated vector
    /// * `exact_count` - The exact total count of items (may be larger than limit)
    pub fn new<I: Iterator<Item = T>>(list: I, limit: usize, exact_count: usize) -> Self {
        let items = list.take(limit).collect_vec();
        Self { exact_count, items }
    }

    /// Maps a function over the items in the truncated vector
    pub fn map<F, U>(self, f: F) -> TruncatedVec<U>
    where
        F: Fn(T) -> U,
    {
        TruncatedVec {
            exact_count: self.exact_count,
            items: self.items.into_iter().map(f).collect_vec(),
        }
    }

    /// Returns the exact count of items
    pub fn exact_count(&self) -> usize {
        self.exact_count
    }

    /// Returns the truncated items
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of items left out of the list
    pub fn hidden(&self) -> usize {
        self.exact_count.saturating_sub(self.items.len())
    }
}
