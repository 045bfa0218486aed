//! Turn queue
//!
//! The active subset of the roster still competing, ordered by who acts
//! next. The head of the queue is the only participant allowed to answer.

use std::collections::VecDeque;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::roster::PlayerId;

/// Ordered queue of the participants still in play
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnQueue {
    order: VecDeque<PlayerId>,
}

impl TurnQueue {
    /// Creates a queue acting in the given order
    pub fn new<I: IntoIterator<Item = PlayerId>>(ids: I) -> Self {
        Self {
            order: ids.into_iter().collect(),
        }
    }

    /// The participant whose turn it is
    pub fn head(&self) -> Option<PlayerId> {
        self.order.front().copied()
    }

    /// The participant acting after the head under FIFO order
    pub fn next(&self) -> Option<PlayerId> {
        self.order.get(1).copied()
    }

    /// Number of participants still in play
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether everybody was eliminated
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether the participant is still in play
    pub fn contains(&self, id: PlayerId) -> bool {
        self.order.contains(&id)
    }

    /// Participants in acting order
    pub fn iter(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.order.iter().copied()
    }

    /// Moves the head to the back of the queue
    pub fn rotate(&mut self) {
        self.order.rotate_left(usize::from(!self.order.is_empty()));
    }

    /// Removes the head, returning it
    pub fn remove_head(&mut self) -> Option<PlayerId> {
        self.order.pop_front()
    }

    /// Removes every listed participant, keeping the order of the rest
    pub fn eliminate(&mut self, ids: &[PlayerId]) {
        self.order.retain(|id| !ids.contains(id));
    }

    /// Moves a uniformly chosen participant to the head
    ///
    /// With `exclude_last` the participant at the back (the one who just
    /// acted, after a rotation) is never chosen, unless it is the only one.
    pub fn promote_random(&mut self, rng: &mut fastrand::Rng, exclude_last: bool) {
        let candidates = if exclude_last && self.order.len() > 1 {
            self.order.len() - 1
        } else {
            self.order.len()
        };
        if candidates == 0 {
            return;
        }

        let index = rng.usize(..candidates);
        if let Some(id) = self.order.remove(index) {
            self.order.push_front(id);
        }
    }

    /// Snapshot of the acting order
    pub fn to_vec(&self) -> Vec<PlayerId> {
        self.order.iter().copied().collect_vec()
    }
}
