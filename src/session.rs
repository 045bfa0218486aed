//! Outbound messaging
//!
//! This module defines the trait through which the engine talks to the chat
//! transport. The engine only supplies semantic content; formatting,
//! delivery and rate limiting belong to the implementation.

use crate::{announcement::Announcement, channel::ChannelId, game::Rejection, roster::PlayerId};

/// Trait for delivering game messages to a channel
///
/// Implementations might post to a chat group, write to a socket or record
/// the messages for inspection. Delivery is fire-and-forget: a failed send
/// never affects the state of the game.
pub trait Messenger: Send + Sync + 'static {
    /// Posts a message visible to the whole channel
    ///
    /// # Arguments
    ///
    /// * `channel` - The channel the game runs in
    /// * `message` - The announcement to post
    fn send_channel_message(&self, channel: ChannelId, message: &Announcement);

    /// Replies inline to an action of a single participant
    ///
    /// # Arguments
    ///
    /// * `channel` - The channel the game runs in
    /// * `player` - The participant whose action is being answered
    /// * `rejection` - Why the action was refused
    fn reply_to_message(&self, channel: ChannelId, player: PlayerId, rejection: &Rejection);
}
