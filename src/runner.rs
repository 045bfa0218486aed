//! Per-channel scheduling loop
//!
//! Every game is owned by one [`Runner`] task. The task ticks the game once
//! per configured period, applies the commands and alarms arriving on its
//! inbox between ticks, and finalizes the game when it ends: the outcome is
//! recorded on natural ends, and a fault is announced and handed back to the
//! caller.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use enum_map::Enum;
use serde::Serialize;
use tokio::{
    sync::mpsc,
    task::JoinSet,
    time::{self, MissedTickBehavior},
};

use crate::{
    AlarmMessage,
    announcement::Announcement,
    game::{self, Command, Game, Phase, TickOutcome},
    lexicon::Lexicon,
    persistence::Recorder,
    roster::PlayerId,
    session::Messenger,
};

/// Inputs delivered to a running game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A command sent by a chat member
    Command {
        /// The sender
        actor: PlayerId,
        /// What they asked for
        command: Command,
    },
    /// A previously scheduled alarm
    Alarm(AlarmMessage),
}

/// Read-only view of a running game, shared with its observers
///
/// The loop refreshes it after every tick and every event, so a countdown
/// that stops moving here means the loop stopped ticking.
#[derive(Debug, Default)]
pub struct Pulse {
    time_left: AtomicI64,
    phase: AtomicUsize,
    players: AtomicUsize,
    in_play: AtomicUsize,
    transition_pending: AtomicBool,
}

/// A single reading of a [`Pulse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Lifecycle phase
    pub phase: Phase,
    /// Ticks left in enrollment or in the current turn
    pub time_left: i64,
    /// Roster size
    pub players: usize,
    /// Players still in the turn queue
    pub in_play: usize,
    /// Whether enrollment closes on the next tick
    pub transition_pending: bool,
}

impl Pulse {
    /// Copies the observable state of the game
    pub fn observe(&self, game: &Game) {
        self.time_left.store(game.time_left(), Ordering::Relaxed);
        self.phase.store(game.phase().into_usize(), Ordering::Relaxed);
        self.players.store(game.roster().len(), Ordering::Relaxed);
        self.in_play.store(game.queue().len(), Ordering::Relaxed);
        self.transition_pending
            .store(game.is_transition_pending(), Ordering::Relaxed);
    }

    /// Reads the last observed state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: Phase::from_usize(self.phase.load(Ordering::Relaxed)),
            time_left: self.time_left.load(Ordering::Relaxed),
            players: self.players.load(Ordering::Relaxed),
            in_play: self.in_play.load(Ordering::Relaxed),
            transition_pending: self.transition_pending.load(Ordering::Relaxed),
        }
    }

    #[cfg(test)]
    pub(crate) fn set(&self, snapshot: Snapshot) {
        self.time_left.store(snapshot.time_left, Ordering::Relaxed);
        self.phase.store(snapshot.phase.into_usize(), Ordering::Relaxed);
        self.players.store(snapshot.players, Ordering::Relaxed);
        self.in_play.store(snapshot.in_play, Ordering::Relaxed);
        self.transition_pending
            .store(snapshot.transition_pending, Ordering::Relaxed);
    }
}

/// The task owning one game
pub struct Runner<L: ?Sized, M: ?Sized, R> {
    game: Game,
    lexicon: Arc<L>,
    messenger: Arc<M>,
    recorder: Arc<R>,
    inbox: mpsc::UnboundedReceiver<Event>,
    /// Alarms are delivered through the inbox without keeping it open
    alarm_sender: mpsc::WeakUnboundedSender<Event>,
    alarms: JoinSet<()>,
    pulse: Arc<Pulse>,
    tick: Duration,
}

fn schedule_alarm(
    alarms: &mut JoinSet<()>,
    sender: &mpsc::WeakUnboundedSender<Event>,
    alarm: AlarmMessage,
    delay: Duration,
) {
    let sender = sender.clone();
    alarms.spawn(async move {
        time::sleep(delay).await;
        if let Some(sender) = sender.upgrade() {
            let _ = sender.send(Event::Alarm(alarm));
        }
    });
}

impl<L, M, R> Runner<L, M, R>
where
    L: Lexicon + ?Sized,
    M: Messenger + ?Sized,
    R: Recorder,
{
    /// Creates the loop of an opened game
    ///
    /// `alarm_sender` must feed `inbox`.
    pub fn new(
        game: Game,
        lexicon: Arc<L>,
        messenger: Arc<M>,
        recorder: Arc<R>,
        inbox: mpsc::UnboundedReceiver<Event>,
        alarm_sender: mpsc::WeakUnboundedSender<Event>,
        pulse: Arc<Pulse>,
        tick: Duration,
    ) -> Self {
        pulse.observe(&game);
        Self {
            game,
            lexicon,
            messenger,
            recorder,
            inbox,
            alarm_sender,
            alarms: JoinSet::new(),
            pulse,
            tick,
        }
    }

    /// Runs the game until it ends, is killed, or every sender is dropped
    ///
    /// # Errors
    ///
    /// Returns the fault that stopped the game. The players are told the
    /// game crashed before this returns.
    pub async fn run(mut self) -> Result<Game, game::Error> {
        let channel = self.game.channel();
        let mut interval = time::interval_at(time::Instant::now() + self.tick, self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!("[{channel}] loop started");

        let result = loop {
            tokio::select! {
                _ = interval.tick() => {
                    let alarms = &mut self.alarms;
                    let sender = &self.alarm_sender;
                    let outcome = self.game.tick(
                        &*self.lexicon,
                        &*self.messenger,
                        |alarm, delay| schedule_alarm(alarms, sender, alarm, delay),
                    );
                    self.pulse.observe(&self.game);

                    match outcome {
                        TickOutcome::Ongoing => {}
                        TickOutcome::Ended => break Ok(()),
                        TickOutcome::Faulted(error) => break Err(error),
                    }
                }
                event = self.inbox.recv() => {
                    match event {
                        Some(Event::Command { actor, command }) => {
                            self.game.handle_command(
                                actor,
                                command,
                                &*self.lexicon,
                                &*self.messenger,
                            );
                        }
                        Some(Event::Alarm(alarm)) => {
                            self.game
                                .receive_alarm(alarm, &*self.lexicon, &*self.messenger);
                        }
                        None => {
                            log::info!("[{channel}] inbox closed");
                            break Ok(());
                        }
                    }
                    self.pulse.observe(&self.game);

                    if self.game.phase() == Phase::Killed {
                        break Ok(());
                    }
                }
                Some(_) = self.alarms.join_next() => {}
            }
        };

        self.alarms.abort_all();

        match result {
            Ok(()) => {
                if self.game.phase() == Phase::Ended {
                    persist(&self.game, &self.recorder).await;
                }
                log::info!("[{channel}] loop stopped in phase {}", self.game.phase());
                Ok(self.game)
            }
            Err(error) => {
                log::error!("[{channel}] game crashed: {error}");
                self.messenger
                    .send_channel_message(channel, &Announcement::Crashed);
                Err(error)
            }
        }
    }
}

/// Records the outcome of a finished game
///
/// Failures are logged and otherwise ignored; one failing player result
/// does not keep the others from being recorded.
async fn persist<R: Recorder>(game: &Game, recorder: &Arc<R>) {
    let channel = game.channel();
    let Some(record) = game.game_record() else {
        return;
    };

    let game_id = match recorder.record_completed_game(&record).await {
        Ok(game_id) => game_id,
        Err(error) => {
            log::warn!("[{channel}] could not record game: {error}");
            return;
        }
    };

    let mut pending = JoinSet::new();
    for result in game.player_results(game_id) {
        let recorder = Arc::clone(recorder);
        pending.spawn(async move {
            let outcome = recorder.record_player_result(&result).await;
            (result.player_id, outcome)
        });
    }

    while let Some(joined) = pending.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((player, Err(error))) => {
                log::warn!("[{channel}] could not record result of {player}: {error}");
            }
            Err(error) => log::warn!("[{channel}] result task failed: {error}"),
        }
    }

    log::info!("[{channel}] recorded game {game_id}");
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        channel::ChannelId,
        config::Options,
        lexicon::WordList,
        roster::Player,
        testing::{MockMessenger, MockRecorder, init_logger, word_list},
        variant::Variant,
    };

    struct Harness {
        sender: mpsc::UnboundedSender<Event>,
        pulse: Arc<Pulse>,
        messenger: Arc<MockMessenger>,
        recorder: Arc<MockRecorder>,
        task: tokio::task::JoinHandle<Result<Game, game::Error>>,
    }

    fn spawn(variant: Variant, players: i64, lexicon: WordList, recorder: MockRecorder) -> Harness {
        init_logger();
        let options = Options {
            seed: Some(11),
            ..Options::default()
        };
        let messenger = Arc::new(MockMessenger::default());
        let recorder = Arc::new(recorder);

        let mut game = Game::new(ChannelId::new(5), variant, &options);
        game.open(Player::new(PlayerId::from(1), "P1"), &*messenger);
        for raw in 2..=players {
            game.join(Player::new(PlayerId::from(raw), format!("P{raw}")), &*messenger)
                .unwrap();
        }

        let (sender, inbox) = mpsc::unbounded_channel();
        let pulse = Arc::new(Pulse::default());
        let runner = Runner::new(
            game,
            Arc::new(lexicon),
            Arc::clone(&messenger),
            Arc::clone(&recorder),
            inbox,
            sender.downgrade(),
            Arc::clone(&pulse),
            options.tick,
        );

        Harness {
            sender,
            pulse,
            messenger,
            recorder,
            task: tokio::spawn(runner.run()),
        }
    }

    fn command(actor: i64, command: Command) -> Event {
        Event::Command {
            actor: PlayerId::from(actor),
            command,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_runs_to_the_end_and_is_recorded() {
        let harness = spawn(Variant::Classic, 3, word_list(), MockRecorder::default());

        let game = harness.task.await.unwrap().unwrap();

        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.queue().len(), 1);
        assert!(
            harness
                .messenger
                .announcements()
                .iter()
                .any(|a| matches!(a, Announcement::GameOver(_)))
        );

        let games = harness.recorder.games.lock().unwrap().clone();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].participant_count, 3);
        assert_eq!(games[0].winner, game.queue().head());

        let results = harness.recorder.results.lock().unwrap().clone();
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|r| r.won).count(), 1);
        assert_eq!(harness.pulse.snapshot().phase, Phase::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn test_player_result_failure_is_isolated() {
        let recorder = MockRecorder::default();
        recorder.fail_player.store(2, Ordering::SeqCst);
        let harness = spawn(Variant::Classic, 3, word_list(), recorder);

        harness.task.await.unwrap().unwrap();

        let results = harness.recorder.results.lock().unwrap().clone();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.player_id != PlayerId::from(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_game_record_skips_results() {
        let recorder = MockRecorder::default();
        recorder.fail_games.store(true, Ordering::SeqCst);
        let harness = spawn(Variant::Classic, 2, word_list(), recorder);

        let game = harness.task.await.unwrap().unwrap();

        assert_eq!(game.phase(), Phase::Ended);
        assert!(harness.recorder.results.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_enough_players_is_not_recorded() {
        let harness = spawn(Variant::Classic, 1, word_list(), MockRecorder::default());

        let game = harness.task.await.unwrap().unwrap();

        assert_eq!(game.phase(), Phase::Ended);
        assert!(harness.recorder.games.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_kill_stops_the_loop() {
        let harness = spawn(Variant::Classic, 2, word_list(), MockRecorder::default());

        harness.sender.send(command(1, Command::Kill)).unwrap();
        let game = harness.task.await.unwrap().unwrap();

        assert_eq!(game.phase(), Phase::Killed);
        assert!(
            harness
                .messenger
                .announcements()
                .contains(&Announcement::ForceEnded)
        );
        assert!(harness.recorder.games.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fault_announces_crash() {
        let harness = spawn(
            Variant::Classic,
            2,
            WordList::default(),
            MockRecorder::default(),
        );

        harness.sender.send(command(1, Command::ForceStart)).unwrap();
        let error = harness.task.await.unwrap().unwrap_err();

        assert_eq!(error, game::Error::NoStartingWord);
        assert!(
            harness
                .messenger
                .announcements()
                .contains(&Announcement::Crashed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_stops_the_loop() {
        let harness = spawn(Variant::Classic, 2, word_list(), MockRecorder::default());

        drop(harness.sender);
        let game = harness.task.await.unwrap().unwrap();

        assert_eq!(game.phase(), Phase::Joining);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_update_pulse() {
        let harness = spawn(Variant::Classic, 2, word_list(), MockRecorder::default());

        harness
            .sender
            .send(command(
                3,
                Command::Join {
                    name: "P3".to_owned(),
                },
            ))
            .unwrap();
        time::sleep(Duration::from_millis(10)).await;

        let snapshot = harness.pulse.snapshot();
        assert_eq!(snapshot.players, 3);
        assert_eq!(snapshot.phase, Phase::Joining);
        assert_eq!(snapshot.time_left, 60);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(harness.pulse.snapshot().time_left, 55);
    }

    #[tokio::test(start_paused = true)]
    async fn test_virtual_player_plays_through_alarms() {
        let harness = spawn(Variant::Classic, 1, word_list(), MockRecorder::default());

        harness
            .sender
            .send(command(1, Command::AddVirtualPlayer))
            .unwrap();
        harness.sender.send(command(1, Command::ForceStart)).unwrap();

        let game = harness.task.await.unwrap().unwrap();

        // the human never answers, so the virtual player eventually wins
        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.turns(), game.roster().virtual_player().unwrap().word_count());
        assert_eq!(
            game.summary().winner.as_deref(),
            Some(Options::default().virtual_player.name.as_str())
        );

        // the virtual player is not recorded
        let results = harness.recorder.results.lock().unwrap().clone();
        assert_eq!(results.len(), 1);
        assert!(!results[0].won);
    }
}
