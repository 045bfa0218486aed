//! Process-wide game registry
//!
//! The registry maps every channel to its single active game. Starting a
//! game spawns its [`Runner`] task; the entry is released by the task itself
//! when the game ends, whatever the reason, or removed by the watchdog.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use derive_where::derive_where;
use enum_map::EnumMap;
use garde::Validate;
use itertools::Itertools;
use parking_lot::Mutex;
use tokio::{
    sync::mpsc,
    task::{AbortHandle, JoinHandle, JoinSet},
};

use crate::{
    announcement::Announcement,
    channel::ChannelId,
    config::Options,
    game::{self, Command, Game, Phase},
    lexicon::Lexicon,
    persistence::Recorder,
    roster::{Player, PlayerId},
    runner::{Event, Pulse, Runner, Snapshot},
    session::Messenger,
    variant::Variant,
    watchdog::{self, Verdict},
};

/// Registry side of a running game
#[derive(Debug)]
pub(crate) struct GameHandle {
    pub(crate) sender: mpsc::UnboundedSender<Event>,
    pub(crate) pulse: Arc<Pulse>,
    pub(crate) task: AbortHandle,
    pub(crate) generation: u64,
    pub(crate) variant: Variant,
}

/// Status line of one registered game
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Status {
    /// Channel the game runs in
    pub channel: ChannelId,
    /// Rule family of the game
    pub variant: Variant,
    /// Last observed state
    pub snapshot: Snapshot,
}

/// The channel to game mapping shared by the routing layer
#[derive_where(Clone)]
pub struct Registry<L: ?Sized, M: ?Sized, R> {
    games: Arc<Mutex<HashMap<ChannelId, GameHandle>>>,
    lexicon: Arc<L>,
    messenger: Arc<M>,
    recorder: Arc<R>,
    options: Arc<Options>,
    generation: Arc<AtomicU64>,
}

impl<L, M, R> Registry<L, M, R>
where
    L: Lexicon + ?Sized,
    M: Messenger + ?Sized,
    R: Recorder,
{
    /// Creates an empty registry
    ///
    /// # Errors
    ///
    /// Returns the validation report if `options` are out of bounds.
    pub fn new(
        lexicon: Arc<L>,
        messenger: Arc<M>,
        recorder: Arc<R>,
        options: Options,
    ) -> Result<Self, garde::Report> {
        options.validate()?;
        Ok(Self {
            games: Arc::new(Mutex::new(HashMap::new())),
            lexicon,
            messenger,
            recorder,
            options: Arc::new(options),
            generation: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Shared engine options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Where announcements are posted
    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    /// Opens a game in `channel` started by `initiator`
    ///
    /// If the channel already has a game, the start counts as a join of
    /// that game and `None` is returned. Otherwise the game loop is spawned
    /// and its handle returned; the loop releases the registry entry when
    /// it stops. A fault of the loop is logged and handed to whoever awaits
    /// the handle, after the entry is gone and the players were told.
    pub fn start(
        &self,
        channel: ChannelId,
        variant: Variant,
        initiator: Player,
    ) -> Option<JoinHandle<Result<(), game::Error>>> {
        let mut games = self.games.lock();

        if let Some(handle) = games.get(&channel) {
            let event = Event::Command {
                actor: initiator.id(),
                command: Command::Join {
                    name: initiator.name().to_owned(),
                },
            };
            if handle.sender.send(event).is_err() {
                log::debug!("[{channel}] start ignored, game is stopping");
            }
            return None;
        }

        let mut game = Game::new(channel, variant, &self.options);
        game.open(initiator, &*self.messenger);

        let (sender, inbox) = mpsc::unbounded_channel();
        let pulse = Arc::new(Pulse::default());
        let runner = Runner::new(
            game,
            Arc::clone(&self.lexicon),
            Arc::clone(&self.messenger),
            Arc::clone(&self.recorder),
            inbox,
            sender.downgrade(),
            Arc::clone(&pulse),
            self.options.tick,
        );

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let registry = self.clone();
        let task = tokio::spawn(async move {
            let result = runner.run().await;
            registry.release(channel, generation);
            result.map(drop).inspect_err(|error| {
                log::error!("[{channel}] game torn down after fault: {error}");
            })
        });

        games.insert(
            channel,
            GameHandle {
                sender,
                pulse,
                task: task.abort_handle(),
                generation,
                variant,
            },
        );
        log::info!("[{channel}] {} opened", variant.name());

        Some(task)
    }

    /// Removes the entry of a stopped loop, unless it was replaced since
    fn release(&self, channel: ChannelId, generation: u64) {
        let mut games = self.games.lock();
        if games
            .get(&channel)
            .is_some_and(|handle| handle.generation == generation)
        {
            games.remove(&channel);
            log::debug!("[{channel}] released");
        }
    }

    /// Routes a command to the game of `channel`
    ///
    /// Returns `false` if the channel has no running game.
    pub fn dispatch(&self, channel: ChannelId, actor: PlayerId, command: Command) -> bool {
        self.games
            .lock()
            .get(&channel)
            .is_some_and(|handle| handle.sender.send(Event::Command { actor, command }).is_ok())
    }

    /// Ends the game of `channel` on behalf of the admin `actor`
    ///
    /// When the loop is already gone the entry is dropped directly and the
    /// end is announced here. Returns `false` if there was no game.
    pub fn kill(&self, channel: ChannelId, actor: PlayerId) -> bool {
        let mut games = self.games.lock();
        let Some(handle) = games.get(&channel) else {
            return false;
        };

        let event = Event::Command {
            actor,
            command: Command::Kill,
        };
        if handle.sender.send(event).is_err() {
            if let Some(handle) = games.remove(&channel) {
                handle.task.abort();
            }
            drop(games);
            log::warn!("[{channel}] killed a game whose loop was gone");
            self.messenger
                .send_channel_message(channel, &Announcement::ForceEnded);
        }
        true
    }

    /// Drops the game of `channel` and stops its loop at once
    ///
    /// Nothing is announced or recorded. Returns `false` if there was no game.
    pub fn remove(&self, channel: ChannelId) -> bool {
        let removed = self.games.lock().remove(&channel);
        removed.is_some_and(|handle| {
            handle.task.abort();
            true
        })
    }

    /// Drops the game of `channel` if it is still the one behind `pulse`
    pub(crate) fn remove_observed(&self, channel: ChannelId, pulse: &Arc<Pulse>) -> bool {
        let mut games = self.games.lock();
        if !games
            .get(&channel)
            .is_some_and(|handle| Arc::ptr_eq(&handle.pulse, pulse))
        {
            return false;
        }
        games.remove(&channel).is_some_and(|handle| {
            handle.task.abort();
            true
        })
    }

    /// Whether `channel` has a game
    pub fn contains(&self, channel: ChannelId) -> bool {
        self.games.lock().contains_key(&channel)
    }

    /// Number of registered games
    pub fn len(&self) -> usize {
        self.games.lock().len()
    }

    /// Whether no game is registered
    pub fn is_empty(&self) -> bool {
        self.games.lock().is_empty()
    }

    /// Channels with a registered game
    pub fn channels(&self) -> Vec<ChannelId> {
        self.games.lock().keys().copied().sorted().collect_vec()
    }

    /// Live view of the game of `channel`
    pub fn pulse(&self, channel: ChannelId) -> Option<Arc<Pulse>> {
        self.games
            .lock()
            .get(&channel)
            .map(|handle| Arc::clone(&handle.pulse))
    }

    /// Status of every registered game, ordered by channel
    pub fn snapshot(&self) -> Vec<Status> {
        self.games
            .lock()
            .iter()
            .map(|(&channel, handle)| Status {
                channel,
                variant: handle.variant,
                snapshot: handle.pulse.snapshot(),
            })
            .sorted_by_key(|status| status.channel)
            .collect_vec()
    }

    /// Number of registered games in every phase
    pub fn phase_counts(&self) -> EnumMap<Phase, usize> {
        let mut counts = EnumMap::default();
        for handle in self.games.lock().values() {
            counts[handle.pulse.snapshot().phase] += 1;
        }
        counts
    }

    /// Runs the stale timer scan over every registered game
    ///
    /// The scans run concurrently; the verdicts are returned per channel.
    pub async fn scan_all(&self) -> Vec<(ChannelId, Verdict)> {
        let mut scans = JoinSet::new();
        for channel in self.channels() {
            let registry = self.clone();
            scans.spawn(async move {
                let verdict = watchdog::scan_for_stale_timer(&registry, channel).await;
                (channel, verdict)
            });
        }

        let mut verdicts = Vec::new();
        while let Some(joined) = scans.join_next().await {
            match joined {
                Ok(verdict) => verdicts.push(verdict),
                Err(error) => log::warn!("stale timer scan failed: {error}"),
            }
        }
        verdicts.sort_by_key(|(channel, _)| *channel);
        verdicts
    }

    #[cfg(test)]
    pub(crate) fn insert(&self, channel: ChannelId, handle: GameHandle) {
        self.games.lock().insert(channel, handle);
    }
}
