//! Elimination leaderboard
//!
//! This module orders the participants still in an elimination game by
//! their cumulative score and renders the standings, either in full or as
//! a window around one highlighted participant for the turn prompts.

use std::fmt::Display;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    constants::display::{LEADERBOARD_EDGE_ROWS, LEADERBOARD_FULL_LIMIT},
    roster::{Player, PlayerId},
};

/// Score of a single participant
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Standing {
    /// The participant
    pub id: PlayerId,
    /// Display name of the participant
    pub name: String,
    /// Cumulative score
    pub score: u32,
}

/// A rendered leaderboard line
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum Row {
    /// A participant and its standing
    Standing {
        /// Position in the leaderboard (1-indexed)
        position: usize,
        /// Display name of the participant
        name: String,
        /// Cumulative score
        score: u32,
        /// Whether this is the participant the view was rendered for
        highlighted: bool,
    },
    /// Rows left out of a windowed view
    Gap,
}

/// Rendered leaderboard lines, ready for display
#[derive(Debug, Serialize, Clone, PartialEq, Eq, Default)]
pub struct Board(Vec<Row>);

impl Board {
    /// The rendered rows
    pub fn rows(&self) -> &[Row] {
        &self.0
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines = self.0.iter().map(|row| match row {
            Row::Standing {
                position,
                name,
                score,
                highlighted,
            } => {
                let marker = if *highlighted { "> " } else { "" };
                format!("{marker}{position}. {name}: {score}")
            }
            Row::Gap => "...".to_owned(),
        });
        write!(f, "{}", lines.format("\n"))
    }
}

/// Standings sorted by score descending, then id ascending
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    /// Sorted standings
    standings: Vec<Standing>,
}

impl Leaderboard {
    /// Builds the leaderboard of the given participants
    pub fn new<'a, I: IntoIterator<Item = &'a Player>>(players: I) -> Self {
        Self {
            standings: players
                .into_iter()
                .map(|player| Standing {
                    id: player.id(),
                    name: player.name().to_owned(),
                    score: player.score(),
                })
                .sorted_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)))
                .collect_vec(),
        }
    }

    /// Sorted standings
    pub fn standings(&self) -> &[Standing] {
        &self.standings
    }

    /// Index of a participant in the standings
    pub fn position(&self, id: PlayerId) -> Option<usize> {
        self.standings.iter().position(|standing| standing.id == id)
    }

    /// The lowest score on the board
    pub fn lowest_score(&self) -> Option<u32> {
        self.standings.last().map(|standing| standing.score)
    }

    /// Everybody whose score equals the lowest score
    pub fn lowest_scorers(&self) -> Vec<PlayerId> {
        let Some(lowest) = self.lowest_score() else {
            return Vec::new();
        };
        self.standings
            .iter()
            .filter(|standing| standing.score == lowest)
            .map(|standing| standing.id)
            .collect_vec()
    }

    fn row(&self, index: usize, highlight: Option<PlayerId>) -> Row {
        let standing = &self.standings[index];
        Row::Standing {
            position: index + 1,
            name: standing.name.clone(),
            score: standing.score,
            highlighted: highlight == Some(standing.id),
        }
    }

    fn rows<I: IntoIterator<Item = usize>>(
        &self,
        indices: I,
        highlight: Option<PlayerId>,
    ) -> Vec<Row> {
        indices
            .into_iter()
            .map(|index| self.row(index, highlight))
            .collect_vec()
    }

    /// Every standing
    pub fn full(&self) -> Board {
        Board(self.rows(0..self.standings.len(), None))
    }

    /// A window of the standings around `highlight`
    ///
    /// Small boards are shown in full. Larger ones show the top and bottom
    /// five; a highlighted participant outside of both is shown on its own
    /// between two gaps, a gap being dropped when the row is adjacent to the
    /// edge it would separate it from.
    pub fn window(&self, highlight: PlayerId) -> Board {
        let count = self.standings.len();
        let highlight = Some(highlight);

        if count <= LEADERBOARD_FULL_LIMIT {
            return Board(self.rows(0..count, highlight));
        }

        let top = 0..LEADERBOARD_EDGE_ROWS;
        let bottom = count - LEADERBOARD_EDGE_ROWS..count;

        let mut rows = self.rows(top.clone(), highlight);
        match highlight.and_then(|id| self.position(id)) {
            Some(index) if !top.contains(&index) && !bottom.contains(&index) => {
                if index != top.end {
                    rows.push(Row::Gap);
                }
                rows.push(self.row(index, highlight));
                if index + 1 != bottom.start {
                    rows.push(Row::Gap);
                }
            }
            _ => rows.push(Row::Gap),
        }
        rows.extend(self.rows(bottom, highlight));

        Board(rows)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn players(scores: &[u32]) -> Vec<Player> {
        scores
            .iter()
            .enumerate()
            .map(|(i, score)| {
                let id = i64::try_from(i).unwrap() + 1;
                let mut player = Player::new(PlayerId::from(id), format!("P{id}"));
                player.add_score(&"a".repeat(*score as usize), u32::MAX);
                player
            })
            .collect()
    }

    fn positions(board: &Board) -> Vec<Option<usize>> {
        board
            .rows()
            .iter()
            .map(|row| match row {
                Row::Standing { position, .. } => Some(*position),
                Row::Gap => None,
            })
            .collect()
    }

    #[test]
    fn test_order_score_desc_then_id_asc() {
        let players = players(&[5, 9, 5, 0, 9]);
        let board = Leaderboard::new(&players);

        let ids = board
            .standings()
            .iter()
            .map(|s| s.id.get())
            .collect_vec();
        assert_eq!(ids, vec![2, 5, 1, 3, 4]);
    }

    #[test]
    fn test_resorting_is_idempotent() {
        let players = players(&[3, 3, 8, 1, 8, 0]);
        let first = Leaderboard::new(&players);
        let second = Leaderboard::new(players.iter().rev());
        assert_eq!(first, second);
    }

    #[test]
    fn test_lowest_scorers_include_ties() {
        let players = players(&[4, 2, 7, 2]);
        let board = Leaderboard::new(&players);

        assert_eq!(board.lowest_score(), Some(2));
        assert_eq!(
            board.lowest_scorers(),
            vec![PlayerId::from(2), PlayerId::from(4)]
        );
        assert!(Leaderboard::default().lowest_scorers().is_empty());
    }

    #[test]
    fn test_window_small_board_is_full() {
        let players = players(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let board = Leaderboard::new(&players);
        let window = board.window(PlayerId::from(3));

        assert_eq!(window.rows().len(), 10);
        assert!(window.rows().contains(&Row::Standing {
            position: 8,
            name: "P3".to_owned(),
            score: 3,
            highlighted: true,
        }));
    }

    #[test]
    fn test_window_highlight_in_edges() {
        let scores = (1..=20).rev().collect_vec();
        let players = players(&scores);
        let board = Leaderboard::new(&players);

        let expected = vec![
            Some(1),
            Some(2),
            Some(3),
            Some(4),
            Some(5),
            None,
            Some(16),
            Some(17),
            Some(18),
            Some(19),
            Some(20),
        ];
        assert_eq!(positions(&board.window(PlayerId::from(2))), expected);
        assert_eq!(positions(&board.window(PlayerId::from(19))), expected);
    }

    #[test]
    fn test_window_highlight_in_middle() {
        let scores = (1..=20).rev().collect_vec();
        let players = players(&scores);
        let board = Leaderboard::new(&players);

        let window = positions(&board.window(PlayerId::from(10)));
        assert_eq!(window[5..8], [None, Some(10), None]);
        assert_eq!(window.len(), 13);
    }

    #[test]
    fn test_window_gaps_suppressed_at_boundaries() {
        let scores = (1..=12).rev().collect_vec();
        let players = players(&scores);
        let board = Leaderboard::new(&players);

        // sixth place sits right after the top five
        let window = positions(&board.window(PlayerId::from(6)));
        assert_eq!(window[4..7], [Some(5), Some(6), None]);

        // seventh place sits right before the bottom five
        let window = positions(&board.window(PlayerId::from(7)));
        assert_eq!(window[5..8], [None, Some(7), Some(8)]);
    }

    #[test]
    fn test_window_eleven_players_middle_has_no_gaps() {
        let scores = (1..=11).rev().collect_vec();
        let players = players(&scores);
        let board = Leaderboard::new(&players);

        let window = positions(&board.window(PlayerId::from(6)));
        assert_eq!(window, (1..=11).map(Some).collect_vec());
    }

    #[test]
    fn test_board_display() {
        let players = players(&[4, 7]);
        let board = Leaderboard::new(&players);

        assert_eq!(board.full().to_string(), "1. P2: 7\n2. P1: 4");
        assert_eq!(board.window(PlayerId::from(1)).to_string(), "1. P2: 7\n> 2. P1: 4");
    }
}
