//! Player roster management
//!
//! This module tracks every participant who entered a game, in the order
//! they joined, together with the per-game counters that end up in the
//! summary and in the persisted results.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stable identifier for a participant
///
/// The id is assigned by the chat transport; the engine only compares and
/// orders ids (the leaderboard breaks score ties by ascending id).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
    derive_more::FromStr,
)]
#[serde(transparent)]
pub struct PlayerId(i64);

impl PlayerId {
    /// Returns the raw transport id
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// A participant and their per-game counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Stable identity of the participant
    id: PlayerId,
    /// Display name, formatted by the transport
    name: String,
    /// Whether this is the scripted stand-in participant
    is_virtual: bool,
    /// Accepted words
    word_count: usize,
    /// Letters across all accepted words
    letter_count: usize,
    /// Longest accepted word, empty if none
    longest_word: String,
    /// Cumulative score (elimination variants only)
    score: u32,
}

impl Player {
    /// Creates a human participant
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_virtual: false,
            word_count: 0,
            letter_count: 0,
            longest_word: String::new(),
            score: 0,
        }
    }

    /// Creates the scripted stand-in participant
    pub fn new_virtual(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            is_virtual: true,
            ..Self::new(id, name)
        }
    }

    /// The participant's id
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// The participant's display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the virtual player
    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// Number of accepted words
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Number of letters across accepted words
    pub fn letter_count(&self) -> usize {
        self.letter_count
    }

    /// Longest accepted word, `None` if the player never answered
    pub fn longest_word(&self) -> Option<&str> {
        (!self.longest_word.is_empty()).then_some(self.longest_word.as_str())
    }

    /// Cumulative elimination score
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Updates the counters for an accepted word
    ///
    /// The longest word only changes for a strictly longer word, so the
    /// earlier of two equally long words is kept.
    pub fn record_word(&mut self, word: &str) {
        self.word_count += 1;
        self.letter_count += word.len();
        if word.len() > self.longest_word.len() {
            word.clone_into(&mut self.longest_word);
        }
    }

    /// Adds the score of an accepted word, capped at `cap`
    ///
    /// Returns `true` if the word was longer than the cap.
    pub fn add_score(&mut self, word: &str, cap: u32) -> bool {
        let length = u32::try_from(word.len()).unwrap_or(u32::MAX);
        self.score += length.min(cap);
        length > cap
    }
}

/// Errors that can occur when editing the roster
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The participant is already in the roster
    #[error("player already joined")]
    AlreadyJoined,
    /// The roster reached the maximum number of players
    #[error("maximum number of players reached")]
    Full,
    /// The participant is not in the roster
    #[error("player is not in the game")]
    NotJoined,
    /// A virtual player is already taking part
    #[error("virtual player already joined")]
    VirtualPlayerPresent,
}

/// Ordered collection of every participant of a game
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    /// Participants in insertion order
    players: Vec<Player>,
}

impl Roster {
    /// Adds a participant at the end of the roster
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyJoined` for a duplicate id, `Error::Full` if
    /// the roster already holds `max_players` participants, and
    /// `Error::VirtualPlayerPresent` when adding a second virtual player.
    pub fn add(&mut self, player: Player, max_players: usize) -> Result<&Player, Error> {
        if self.contains(player.id) {
            return Err(Error::AlreadyJoined);
        }
        if self.players.len() >= max_players {
            return Err(Error::Full);
        }
        if player.is_virtual && self.virtual_player().is_some() {
            return Err(Error::VirtualPlayerPresent);
        }

        self.players.push(player);
        Ok(&self.players[self.players.len() - 1])
    }

    /// Removes a participant
    ///
    /// # Errors
    ///
    /// Returns `Error::NotJoined` if the id is not in the roster.
    pub fn remove(&mut self, id: PlayerId) -> Result<Player, Error> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(Error::NotJoined)?;
        Ok(self.players.remove(index))
    }

    /// Removes the virtual player, if present
    pub fn remove_virtual(&mut self) -> Option<Player> {
        let index = self.players.iter().position(Player::is_virtual)?;
        Some(self.players.remove(index))
    }

    /// The virtual player, if present
    pub fn virtual_player(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_virtual)
    }

    /// Whether the id is in the roster
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    /// Looks up a participant
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Looks up a participant for mutation
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Display name of a participant
    pub fn name(&self, id: PlayerId) -> Option<&str> {
        self.get(id).map(Player::name)
    }

    /// Number of participants
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether nobody joined
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Participants in roster order
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Ids in roster order
    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(Player::id).collect_vec()
    }

    /// Shuffles the roster order
    pub fn shuffle(&mut self, rng: &mut fastrand::Rng) {
        rng.shuffle(&mut self.players);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn player(id: i64) -> Player {
        Player::new(PlayerId::from(id), format!("Player{id}"))
    }

    #[test]
    fn test_player_id_display_and_parse() {
        let id: PlayerId = "123".parse().unwrap();
        assert_eq!(id, PlayerId::from(123));
        assert_eq!(id.to_string(), "123");
        assert!("abc".parse::<PlayerId>().is_err());
    }

    #[test]
    fn test_player_id_serializes_transparently() {
        let serialized = serde_json::to_string(&PlayerId::from(9)).unwrap();
        assert_eq!(serialized, "9");
    }

    #[test]
    fn test_record_word_updates_counters() {
        let mut p = player(1);
        p.record_word("armut");
        p.record_word("tavuk");
        p.record_word("kalem");

        assert_eq!(p.word_count(), 3);
        assert_eq!(p.letter_count(), 15);
        assert_eq!(p.longest_word(), Some("armut"));

        p.record_word("mandalina");
        assert_eq!(p.longest_word(), Some("mandalina"));
    }

    #[test]
    fn test_longest_word_empty_initially() {
        assert_eq!(player(1).longest_word(), None);
    }

    #[test]
    fn test_add_score_caps() {
        let mut p = player(1);
        assert!(!p.add_score("apple", 20));
        assert_eq!(p.score(), 5);

        let long = "a".repeat(25);
        assert!(p.add_score(&long, 20));
        assert_eq!(p.score(), 25);

        assert!(!p.add_score(&"b".repeat(20), 20));
        assert_eq!(p.score(), 45);
    }

    #[test]
    fn test_roster_add_rejects_duplicates() {
        let mut roster = Roster::default();
        roster.add(player(1), 10).unwrap();

        assert_eq!(roster.add(player(1), 10), Err(Error::AlreadyJoined));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_roster_add_rejects_when_full() {
        let mut roster = Roster::default();
        roster.add(player(1), 2).unwrap();
        roster.add(player(2), 2).unwrap();

        assert_eq!(roster.add(player(3), 2), Err(Error::Full));
    }

    #[test]
    fn test_roster_single_virtual_player() {
        let mut roster = Roster::default();
        roster
            .add(Player::new_virtual(PlayerId::from(-1), "Bot"), 10)
            .unwrap();

        assert_eq!(
            roster.add(Player::new_virtual(PlayerId::from(-2), "Bot"), 10),
            Err(Error::VirtualPlayerPresent)
        );
        assert!(roster.virtual_player().is_some());

        let removed = roster.remove_virtual().unwrap();
        assert!(removed.is_virtual());
        assert!(roster.remove_virtual().is_none());
    }

    #[test]
    fn test_roster_remove_keeps_order() {
        let mut roster = Roster::default();
        for id in 1..=4 {
            roster.add(player(id), 10).unwrap();
        }

        let removed = roster.remove(PlayerId::from(2)).unwrap();
        assert_eq!(removed.id(), PlayerId::from(2));
        assert_eq!(
            roster.ids(),
            vec![PlayerId::from(1), PlayerId::from(3), PlayerId::from(4)]
        );
        assert_eq!(roster.remove(PlayerId::from(2)), Err(Error::NotJoined));
    }

    #[test]
    fn test_roster_shuffle_keeps_members() {
        let mut roster = Roster::default();
        for id in 1..=10 {
            roster.add(player(id), 50).unwrap();
        }

        roster.shuffle(&mut fastrand::Rng::with_seed(11));

        let mut ids = roster.ids();
        ids.sort();
        assert_eq!(ids, (1..=10).map(PlayerId::from).collect_vec());
    }

    #[test]
    fn test_roster_lookup() {
        let mut roster = Roster::default();
        roster.add(player(5), 10).unwrap();

        assert_eq!(roster.name(PlayerId::from(5)), Some("Player5"));
        assert!(roster.get(PlayerId::from(6)).is_none());
        roster.get_mut(PlayerId::from(5)).unwrap().record_word("word");
        assert_eq!(roster.get(PlayerId::from(5)).unwrap().word_count(), 1);
    }
}
