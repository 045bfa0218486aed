//! Stale timer detection
//!
//! A game loop that stops ticking leaves its countdown frozen. The scan
//! samples the countdown of a registered game over several ticks and tears
//! the game down when it never moves, or when it went negative. Pending
//! enrollment transitions always win over the scan.

use std::sync::Arc;

use serde::Serialize;
use tokio::time;

use crate::{
    announcement::Announcement,
    channel::ChannelId,
    game,
    lexicon::Lexicon,
    persistence::Recorder,
    registry::Registry,
    runner::Pulse,
    session::Messenger,
};

/// Result of a stale timer scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// The countdown moved, or the game is finishing
    Healthy,
    /// Enrollment closes on the next tick; nothing was sampled
    Deferred,
    /// The channel has no game
    Missing,
    /// The countdown was stuck at this value; the game was torn down
    Stale(i64),
}

/// Samples the countdown of the game in `channel`
///
/// One sample is taken per tick, as many as the options ask for. The game
/// is stale if a sample is negative, or if every sample shows the same
/// value. A stale game is removed from the registry, its loop stopped, and
/// the players told about it.
pub async fn scan_for_stale_timer<L, M, R>(
    registry: &Registry<L, M, R>,
    channel: ChannelId,
) -> Verdict
where
    L: Lexicon + ?Sized,
    M: Messenger + ?Sized,
    R: Recorder,
{
    let Some(pulse) = registry.pulse(channel) else {
        return Verdict::Missing;
    };
    let samples = registry.options().watchdog_samples.max(1);
    let tick = registry.options().tick;

    let mut first = None;
    let mut moved = false;

    for sample in 0..samples {
        if sample > 0 {
            time::sleep(tick).await;
        }

        let snapshot = pulse.snapshot();
        if snapshot.phase.is_terminal() {
            return Verdict::Healthy;
        }
        if snapshot.transition_pending {
            log::debug!("[{channel}] transition pending, scan deferred");
            return Verdict::Deferred;
        }
        if snapshot.time_left < 0 {
            return tear_down(registry, channel, &pulse, snapshot.time_left);
        }

        match first {
            None => first = Some(snapshot.time_left),
            Some(value) => moved |= value != snapshot.time_left,
        }
    }

    match first {
        Some(value) if samples > 1 && !moved => tear_down(registry, channel, &pulse, value),
        _ => Verdict::Healthy,
    }
}

fn tear_down<L, M, R>(
    registry: &Registry<L, M, R>,
    channel: ChannelId,
    pulse: &Arc<Pulse>,
    time_left: i64,
) -> Verdict
where
    L: Lexicon + ?Sized,
    M: Messenger + ?Sized,
    R: Recorder,
{
    if registry.remove_observed(channel, pulse) {
        log::error!("[{channel}] {}", game::Error::StaleTimer(time_left));
        registry
            .messenger()
            .send_channel_message(channel, &Announcement::TimerFault);
    }
    Verdict::Stale(time_left)
}
