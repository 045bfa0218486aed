//! Core game logic and state management
//!
//! This module contains the per-channel game state machine. A [`Game`]
//! starts in enrollment, runs turns once enough players joined, and ends
//! naturally, through an admin kill, or with a fault. The game itself never
//! sleeps: the owner calls [`Game::tick`] once per time unit, forwards
//! commands between ticks, and delivers the alarms the game schedules.

use std::{collections::HashSet, fmt::Debug, time::Duration};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    AlarmMessage, TruncatedVec,
    announcement::{Announcement, Summary, TurnPrompt},
    channel::ChannelId,
    config::{Escalation, Limits, Options},
    constants::{
        display::TURN_ORDER_LIMIT,
        settings::{
            INCREASED_MAX_PLAYERS, JOINING_REMINDERS, PLAYER_EXTENSION_SECONDS,
            TURNS_BETWEEN_LIMITS_CHANGE,
        },
    },
    elimination::{self, RoundState},
    lexicon::{Lexicon, is_plain_word},
    persistence::{GameRecord, GameRecordId, PlayerResult},
    queue::TurnQueue,
    roster::{self, Player, PlayerId, Roster},
    session::Messenger,
    variant::{AnswerError, Prompt, Rule, Variant},
};

/// Lifecycle phase of a game
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    enum_map::Enum,
    derive_more::Display,
)]
pub enum Phase {
    /// Players may join and leave
    Joining,
    /// Turns are being played
    Running,
    /// The game finished on its own
    Ended,
    /// An admin ended the game
    Killed,
}

impl Phase {
    /// Whether the game is over
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Killed)
    }
}

/// Unrecoverable faults of a game instance
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The word list has no word to start from
    #[error("no starting word satisfies the rules")]
    NoStartingWord,
    /// The turn countdown stayed negative
    #[error("turn countdown stayed negative for {0} ticks")]
    NegativeTimer(u32),
    /// The turn queue emptied while turns were being played
    #[error("turn queue is empty while running")]
    EmptyQueue,
    /// The countdown stopped moving
    #[error("countdown stuck at {0}")]
    StaleTimer(i64),
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The game goes on
    Ongoing,
    /// The game is over and should be finalized
    Ended,
    /// The game hit an unrecoverable fault
    Faulted(Error),
}

/// Reasons a command is refused
///
/// Refusals for which [`Rejection::is_silent`] holds are dropped; the others
/// are replied to the player who sent the command.
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The command does not apply to the current phase
    #[error("that is not possible right now")]
    WrongPhase,
    /// Only players can do this
    #[error("you are not in the game")]
    NotAPlayer,
    /// A player may extend the joining phase only once
    #[error("you have already extended the joining phase")]
    ExtensionUsed,
    /// Shortening the joining phase is reserved to admins
    #[error("only admins can reduce the joining phase")]
    ReductionNeedsAdmin,
    /// The virtual player does not play elimination games
    #[error("the virtual player cannot play elimination games")]
    VirtualPlayerNotAllowed,
    /// The roster refused the change
    #[error(transparent)]
    Roster(#[from] roster::Error),
    /// The answer was refused
    #[error(transparent)]
    Answer(#[from] AnswerError),
}

impl Rejection {
    /// Whether the refusal is dropped without a reply
    pub fn is_silent(&self) -> bool {
        match self {
            Self::WrongPhase => true,
            Self::Answer(error) => error.is_silent(),
            _ => false,
        }
    }
}

/// Commands routed to a game
///
/// The sender of the command is passed alongside it. Permission checks for
/// admin commands are the caller's job, only `Extend` behaves differently
/// for admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// The sender joins
    Join {
        /// Display name of the sender
        name: String,
    },
    /// An admin adds someone else
    ForceJoin {
        /// The player to add
        player: PlayerId,
        /// Display name of the player
        name: String,
    },
    /// The sender leaves
    Flee,
    /// An admin removes someone else
    ForceFlee {
        /// The player to remove
        player: PlayerId,
    },
    /// Extend or shorten the joining phase
    Extend {
        /// Ticks to add, negative to remove
        amount: Option<i64>,
        /// Whether the sender is an admin
        is_admin: bool,
    },
    /// Add the virtual player
    AddVirtualPlayer,
    /// Remove the virtual player
    RemoveVirtualPlayer,
    /// Close enrollment now
    ForceStart,
    /// Time the current player out now
    ForceSkip,
    /// End the game now
    Kill,
    /// Raise the player limit once
    IncreaseMaxPlayers,
    /// The sender answers
    Answer {
        /// The raw message text
        text: String,
    },
}

/// A word chain game running in one channel
#[derive(Serialize, Deserialize)]
pub struct Game {
    /// Channel the game runs in
    channel: ChannelId,
    /// Rule family of the game
    variant: Variant,
    /// Current lifecycle phase
    phase: Phase,
    /// Everybody who entered, in join order
    roster: Roster,
    /// Players still in play, in acting order
    queue: TurnQueue,
    /// Current limits
    limits: Limits,
    /// Prompt state, set when play starts
    prompt: Option<Prompt>,
    /// Every word used so far, including the starting word
    used_words: HashSet<String>,
    /// Accepted words
    turns: usize,
    /// Identifies the current turn for scheduled alarms
    serial: u64,
    /// Ticks left in the joining phase or the current turn
    time_left: i64,
    /// Whether the current player answered
    answered: bool,
    /// Whether answers are being accepted
    accepting_answers: bool,
    /// Whether enrollment closes on the next tick
    transition_pending: bool,
    /// Players who used their joining phase extension
    extended_by: HashSet<PlayerId>,
    /// Whether the player limit was raised
    max_players_raised: bool,
    /// Elimination round progress
    round: Option<RoundState>,
    /// Longest accepted word and who sent it
    longest: Option<(PlayerId, String)>,
    /// Consecutive ticks with a negative turn countdown
    negative_ticks: u32,
    /// When play started
    started_at: Option<web_time::SystemTime>,
    /// When play ended
    ended_at: Option<web_time::SystemTime>,
    /// Shared engine options
    options: Options,
    /// Source of every random choice of the game
    #[serde(skip, default = "fastrand::Rng::new")]
    rng: fastrand::Rng,
}

impl Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("channel", &self.channel)
            .field("variant", &self.variant)
            .field("phase", &self.phase)
            .field("time_left", &self.time_left)
            .finish_non_exhaustive()
    }
}

// Accessors
impl Game {
    /// Channel the game runs in
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Rule family of the game
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Ticks left in the joining phase or the current turn
    pub fn time_left(&self) -> i64 {
        self.time_left
    }

    /// Whether enrollment closes on the next tick
    pub fn is_transition_pending(&self) -> bool {
        self.transition_pending
    }

    /// Everybody who entered
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Players still in play
    pub fn queue(&self) -> &TurnQueue {
        &self.queue
    }

    /// Current limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Prompt state, once play started
    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    /// Every word used so far
    pub fn used_words(&self) -> &HashSet<String> {
        &self.used_words
    }

    /// Accepted words
    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Elimination round progress
    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    fn name_of(&self, id: PlayerId) -> String {
        self.roster.name(id).unwrap_or_default().to_owned()
    }

    fn announce<M: Messenger + ?Sized>(&self, messenger: &M, announcement: &Announcement) {
        messenger.send_channel_message(self.channel, announcement);
    }

    fn winner(&self) -> Option<PlayerId> {
        if self.queue.len() == 1 {
            self.queue.head()
        } else {
            None
        }
    }
}

impl Game {
    /// Creates a game in the joining phase
    ///
    /// # Arguments
    ///
    /// * `channel` - The channel the game runs in
    /// * `variant` - The rule family to play
    /// * `options` - Engine options; the seed makes every random choice
    ///   reproducible
    pub fn new(channel: ChannelId, variant: Variant, options: &Options) -> Self {
        let limits = variant.limits();
        Self {
            channel,
            variant,
            phase: Phase::Joining,
            roster: Roster::default(),
            queue: TurnQueue::default(),
            limits,
            prompt: None,
            used_words: HashSet::new(),
            turns: 0,
            serial: 0,
            time_left: limits.joining_seconds,
            answered: false,
            accepting_answers: false,
            transition_pending: false,
            extended_by: HashSet::new(),
            max_players_raised: false,
            round: None,
            longest: None,
            negative_ticks: 0,
            started_at: None,
            ended_at: None,
            options: options.clone(),
            rng: options
                .seed
                .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed),
        }
    }

    /// Announces the game and joins the player who started it
    pub fn open<M: Messenger + ?Sized>(&mut self, initiator: Player, messenger: &M) {
        self.announce(
            messenger,
            &Announcement::Opened {
                variant: self.variant,
                min_players: self.limits.min_players,
                max_players: self.limits.max_players,
                time_left: self.time_left,
            },
        );
        if let Err(rejection) = self.join(initiator, messenger) {
            log::debug!("[{}] initiator could not join: {rejection}", self.channel);
        }
    }

    /// Applies a command sent by `actor`
    ///
    /// Refusals are replied to the sender unless they are silent.
    pub fn handle_command<L: Lexicon + ?Sized, M: Messenger + ?Sized>(
        &mut self,
        actor: PlayerId,
        command: Command,
        lexicon: &L,
        messenger: &M,
    ) {
        let result = match command {
            Command::Join { name } => self.join(Player::new(actor, name), messenger),
            Command::ForceJoin { player, name } => self.join(Player::new(player, name), messenger),
            Command::Flee => self.flee(actor, false, messenger),
            Command::ForceFlee { player } => self.flee(player, true, messenger),
            Command::Extend { amount, is_admin } => {
                self.extend(actor, is_admin, amount, messenger)
            }
            Command::AddVirtualPlayer => self.add_virtual_player(messenger),
            Command::RemoveVirtualPlayer => self.remove_virtual_player(messenger),
            Command::ForceStart => self.force_start(),
            Command::ForceSkip => self.force_skip(),
            Command::Kill => self.kill(messenger),
            Command::IncreaseMaxPlayers => self.increase_max_players(messenger),
            Command::Answer { text } => self.submit_answer(actor, &text, lexicon, messenger),
        };

        if let Err(rejection) = result {
            if rejection.is_silent() {
                log::debug!("[{}] ignored command from {actor}: {rejection}", self.channel);
            } else {
                messenger.reply_to_message(self.channel, actor, &rejection);
            }
        }
    }

    fn accepts_enrollment(&self) -> bool {
        self.phase == Phase::Joining && !self.transition_pending && self.time_left > 0
    }

    /// Adds a player during enrollment
    ///
    /// Filling the game closes enrollment on the next tick.
    ///
    /// # Errors
    ///
    /// Returns `Rejection::WrongPhase` outside of enrollment, or the roster
    /// error for duplicates and full games.
    pub fn join<M: Messenger + ?Sized>(
        &mut self,
        player: Player,
        messenger: &M,
    ) -> Result<(), Rejection> {
        if !self.accepts_enrollment() {
            return Err(Rejection::WrongPhase);
        }

        let max_players = self.limits.max_players;
        let name = self.roster.add(player, max_players)?.name().to_owned();
        let players = self.roster.len();

        self.announce(
            messenger,
            &Announcement::Joined {
                name,
                players,
                max_players,
            },
        );

        if players >= max_players {
            self.transition_pending = true;
        }
        Ok(())
    }

    /// Removes a player during enrollment
    ///
    /// # Errors
    ///
    /// Returns `Rejection::WrongPhase` outside of enrollment, or
    /// `roster::Error::NotJoined`.
    pub fn flee<M: Messenger + ?Sized>(
        &mut self,
        player: PlayerId,
        forced: bool,
        messenger: &M,
    ) -> Result<(), Rejection> {
        if !self.accepts_enrollment() {
            return Err(Rejection::WrongPhase);
        }

        let removed = self.roster.remove(player)?;
        self.announce(
            messenger,
            &Announcement::Left {
                name: removed.name().to_owned(),
                players: self.roster.len(),
                forced,
            },
        );
        Ok(())
    }

    /// Extends or shortens the joining phase
    ///
    /// Players get a single fixed extension each. Admins may pass any
    /// amount, missing meaning the fixed extension; a reduction that uses
    /// up the remaining time closes enrollment on the next tick. Extensions
    /// never push the countdown past the ceiling.
    ///
    /// # Errors
    ///
    /// Returns `Rejection::NotAPlayer` for a non-admin outside the roster,
    /// `Rejection::ReductionNeedsAdmin` for a non-admin reduction and
    /// `Rejection::ExtensionUsed` for a second extension.
    pub fn extend<M: Messenger + ?Sized>(
        &mut self,
        actor: PlayerId,
        is_admin: bool,
        amount: Option<i64>,
        messenger: &M,
    ) -> Result<(), Rejection> {
        if !self.accepts_enrollment() {
            return Err(Rejection::WrongPhase);
        }

        let amount = if is_admin {
            amount.unwrap_or(PLAYER_EXTENSION_SECONDS)
        } else {
            if !self.roster.contains(actor) {
                return Err(Rejection::NotAPlayer);
            }
            if amount.is_some_and(i64::is_negative) {
                return Err(Rejection::ReductionNeedsAdmin);
            }
            if !self.extended_by.insert(actor) {
                return Err(Rejection::ExtensionUsed);
            }
            PLAYER_EXTENSION_SECONDS
        };

        let announcement = if amount >= 0 {
            let seconds = amount
                .min(self.limits.max_joining_seconds - self.time_left)
                .max(0);
            self.time_left += seconds;
            Announcement::Extended {
                seconds,
                time_left: self.time_left,
            }
        } else if amount.saturating_neg() >= self.time_left {
            let seconds = self.time_left;
            self.time_left = 0;
            self.transition_pending = true;
            Announcement::Reduced {
                seconds,
                time_left: 0,
            }
        } else {
            self.time_left += amount;
            Announcement::Reduced {
                seconds: -amount,
                time_left: self.time_left,
            }
        };

        self.announce(messenger, &announcement);
        Ok(())
    }

    /// Adds the virtual player during enrollment
    ///
    /// # Errors
    ///
    /// Returns `Rejection::VirtualPlayerNotAllowed` in elimination games,
    /// or the join refusal.
    pub fn add_virtual_player<M: Messenger + ?Sized>(
        &mut self,
        messenger: &M,
    ) -> Result<(), Rejection> {
        if !self.accepts_enrollment() {
            return Err(Rejection::WrongPhase);
        }
        if !self.variant.allows_virtual_player() {
            return Err(Rejection::VirtualPlayerNotAllowed);
        }

        let identity = &self.options.virtual_player;
        let player = Player::new_virtual(identity.id, identity.name.clone());
        self.join(player, messenger)
    }

    /// Removes the virtual player during enrollment
    ///
    /// # Errors
    ///
    /// Returns `roster::Error::NotJoined` if no virtual player joined.
    pub fn remove_virtual_player<M: Messenger + ?Sized>(
        &mut self,
        messenger: &M,
    ) -> Result<(), Rejection> {
        if !self.accepts_enrollment() {
            return Err(Rejection::WrongPhase);
        }

        let removed = self
            .roster
            .remove_virtual()
            .ok_or(roster::Error::NotJoined)?;
        self.announce(
            messenger,
            &Announcement::Left {
                name: removed.name().to_owned(),
                players: self.roster.len(),
                forced: true,
            },
        );
        Ok(())
    }

    /// Closes enrollment on the next tick
    ///
    /// # Errors
    ///
    /// Returns `Rejection::WrongPhase` outside of enrollment.
    pub fn force_start(&mut self) -> Result<(), Rejection> {
        if self.phase != Phase::Joining {
            return Err(Rejection::WrongPhase);
        }
        self.transition_pending = true;
        Ok(())
    }

    /// Times the current player out on the next tick
    ///
    /// # Errors
    ///
    /// Returns `Rejection::WrongPhase` unless a turn is waiting for an answer.
    pub fn force_skip(&mut self) -> Result<(), Rejection> {
        if self.phase != Phase::Running || self.answered {
            return Err(Rejection::WrongPhase);
        }
        self.time_left = 0;
        Ok(())
    }

    /// Ends the game at once
    ///
    /// # Errors
    ///
    /// Returns `Rejection::WrongPhase` if the game is already over.
    pub fn kill<M: Messenger + ?Sized>(&mut self, messenger: &M) -> Result<(), Rejection> {
        if self.phase.is_terminal() {
            return Err(Rejection::WrongPhase);
        }
        self.phase = Phase::Killed;
        self.accepting_answers = false;
        self.announce(messenger, &Announcement::ForceEnded);
        log::info!("[{}] game killed", self.channel);
        Ok(())
    }

    /// Raises the player limit, once per game
    ///
    /// # Errors
    ///
    /// Returns `Rejection::WrongPhase` outside of enrollment or once applied.
    pub fn increase_max_players<M: Messenger + ?Sized>(
        &mut self,
        messenger: &M,
    ) -> Result<(), Rejection> {
        if !self.accepts_enrollment() || self.max_players_raised {
            return Err(Rejection::WrongPhase);
        }

        let from = self.limits.max_players;
        self.limits.max_players = INCREASED_MAX_PLAYERS;
        self.max_players_raised = true;
        self.announce(
            messenger,
            &Announcement::MaxPlayersRaised {
                from,
                to: INCREASED_MAX_PLAYERS,
            },
        );
        Ok(())
    }

    /// Submits an answer for the current turn
    ///
    /// The text is lowercased first. Anything that is not a single plain
    /// word, and answers from anybody but the current player, are dropped
    /// silently.
    ///
    /// # Errors
    ///
    /// Returns `Rejection::Answer` with the failed check.
    pub fn submit_answer<L: Lexicon + ?Sized, M: Messenger + ?Sized>(
        &mut self,
        player: PlayerId,
        text: &str,
        lexicon: &L,
        messenger: &M,
    ) -> Result<(), Rejection> {
        if self.phase != Phase::Running {
            return Err(Rejection::WrongPhase);
        }

        let word = text.trim().to_lowercase();
        if !is_plain_word(&word) {
            return Err(AnswerError::NotAWord.into());
        }
        if self.queue.head() != Some(player) {
            return Err(AnswerError::NotYourTurn.into());
        }
        if self.answered || !self.accepting_answers {
            return Err(AnswerError::NotAcceptingAnswers.into());
        }

        let Some(prompt) = &self.prompt else {
            return Err(Rejection::WrongPhase);
        };
        prompt.validate(&word, self.limits.min_word_length, &self.used_words, lexicon)?;

        self.accept(player, word, messenger);
        Ok(())
    }

    fn accept<M: Messenger + ?Sized>(&mut self, player: PlayerId, word: String, messenger: &M) {
        self.answered = true;
        self.accepting_answers = false;
        self.turns += 1;

        let score = self.roster.get_mut(player).and_then(|participant| {
            participant.record_word(&word);
            self.variant
                .is_elimination()
                .then(|| elimination::score_answer(participant, &word))
        });

        if self
            .longest
            .as_ref()
            .is_none_or(|(_, longest)| word.len() > longest.len())
        {
            self.longest = Some((player, word.clone()));
        }

        if let Some(prompt) = &mut self.prompt {
            prompt.accept(&word, &mut self.rng);
        }

        let escalation = if self.turns % TURNS_BETWEEN_LIMITS_CHANGE == 0 {
            self.limits.escalate()
        } else {
            Escalation::default()
        };

        self.used_words.insert(word.clone());
        self.announce(
            messenger,
            &Announcement::Accepted {
                word,
                score,
                escalation,
            },
        );
    }

    /// Delivers a scheduled alarm
    ///
    /// A virtual player alarm answers for the virtual player if it is still
    /// its turn. When no word satisfies the rules, the turn is timed out on
    /// the next tick instead.
    pub fn receive_alarm<L: Lexicon + ?Sized, M: Messenger + ?Sized>(
        &mut self,
        alarm: AlarmMessage,
        lexicon: &L,
        messenger: &M,
    ) {
        match alarm {
            AlarmMessage::VirtualPlayerTurn { serial } => {
                if self.phase != Phase::Running || serial != self.serial || self.answered {
                    return;
                }
                let Some(head) = self.queue.head() else {
                    return;
                };
                if !self.roster.get(head).is_some_and(Player::is_virtual) {
                    return;
                }
                let Some(prompt) = &self.prompt else {
                    return;
                };

                let query = prompt.word_query(self.limits.min_word_length, &self.used_words);
                match lexicon.random_word(&query, &mut self.rng) {
                    Some(word) => {
                        if let Err(rejection) =
                            self.submit_answer(head, &word, lexicon, messenger)
                        {
                            log::warn!(
                                "[{}] virtual player answer {word} refused: {rejection}",
                                self.channel
                            );
                        }
                    }
                    None => {
                        log::debug!("[{}] virtual player has no word", self.channel);
                        self.time_left = 0;
                    }
                }
            }
        }
    }

    /// Advances the game by one time unit
    ///
    /// # Arguments
    ///
    /// * `lexicon` - Word list used to pick the starting word
    /// * `messenger` - Where announcements are posted
    /// * `schedule_message` - Function to schedule delayed alarms
    pub fn tick<L, M, S>(&mut self, lexicon: &L, messenger: &M, schedule_message: S) -> TickOutcome
    where
        L: Lexicon + ?Sized,
        M: Messenger + ?Sized,
        S: FnMut(AlarmMessage, Duration),
    {
        match self.phase {
            Phase::Joining => self.tick_joining(lexicon, messenger, schedule_message),
            Phase::Running => self.tick_running(messenger, schedule_message),
            Phase::Ended | Phase::Killed => TickOutcome::Ended,
        }
    }

    fn tick_joining<L, M, S>(
        &mut self,
        lexicon: &L,
        messenger: &M,
        schedule_message: S,
    ) -> TickOutcome
    where
        L: Lexicon + ?Sized,
        M: Messenger + ?Sized,
        S: FnMut(AlarmMessage, Duration),
    {
        if !self.transition_pending {
            self.time_left -= 1;
            if JOINING_REMINDERS.contains(&self.time_left) {
                self.announce(
                    messenger,
                    &Announcement::Reminder {
                        time_left: self.time_left,
                    },
                );
            }
            if self.time_left > 0 {
                return TickOutcome::Ongoing;
            }
        }

        self.transition_pending = false;
        self.time_left = 0;

        if self.roster.len() < self.limits.min_players {
            self.phase = Phase::Ended;
            self.announce(
                messenger,
                &Announcement::NotEnoughPlayers {
                    min_players: self.limits.min_players,
                },
            );
            log::info!(
                "[{}] not enough players ({}/{})",
                self.channel,
                self.roster.len(),
                self.limits.min_players
            );
            return TickOutcome::Ended;
        }

        self.start(lexicon, messenger, schedule_message)
    }

    fn start<L, M, S>(&mut self, lexicon: &L, messenger: &M, schedule_message: S) -> TickOutcome
    where
        L: Lexicon + ?Sized,
        M: Messenger + ?Sized,
        S: FnMut(AlarmMessage, Duration),
    {
        let rule = self.variant.initial_rule(&mut self.rng);
        let Some(prompt) = Prompt::start(
            rule,
            self.variant.is_mixed(),
            lexicon,
            self.limits.min_word_length,
            &mut self.rng,
        ) else {
            return TickOutcome::Faulted(Error::NoStartingWord);
        };

        if let Some(word) = prompt.current_word() {
            self.used_words.insert(word.to_owned());
        }

        self.roster.shuffle(&mut self.rng);
        self.queue = TurnQueue::new(self.roster.ids());
        self.phase = Phase::Running;
        self.started_at = Some(web_time::SystemTime::now());

        let mixed_rule = self.variant.is_mixed().then_some(rule);
        if self.variant.is_elimination() {
            self.round = Some(RoundState::new(self.queue.len(), mixed_rule));
        }

        let turn_order = (!self.variant.is_chaos()).then(|| {
            TruncatedVec::new(
                self.queue.iter().map(|id| self.name_of(id)),
                TURN_ORDER_LIMIT,
                self.queue.len(),
            )
        });
        self.announce(
            messenger,
            &Announcement::Started {
                variant: self.variant,
                rule: mixed_rule,
                current_word: prompt.current_word().map(str::to_owned),
                chosen_letter: prompt.chosen_letter(),
                banned_letters: prompt.banned_letters().to_vec(),
                required_letter: prompt.required_letter(),
                turn_order,
            },
        );
        self.prompt = Some(prompt);

        log::info!(
            "[{}] {} started with {} players",
            self.channel,
            self.variant.name(),
            self.queue.len()
        );

        if self.variant.is_chaos() {
            self.queue.promote_random(&mut self.rng, false);
        }
        self.begin_turn(messenger, schedule_message);
        TickOutcome::Ongoing
    }

    fn tick_running<M, S>(&mut self, messenger: &M, schedule_message: S) -> TickOutcome
    where
        M: Messenger + ?Sized,
        S: FnMut(AlarmMessage, Duration),
    {
        if self.queue.is_empty() {
            return TickOutcome::Faulted(Error::EmptyQueue);
        }

        if self.answered {
            self.negative_ticks = 0;
            return self.advance(messenger, schedule_message);
        }

        if self.time_left < 0 {
            self.negative_ticks += 1;
            if self.negative_ticks >= self.options.negative_timer_ticks {
                return TickOutcome::Faulted(Error::NegativeTimer(self.negative_ticks));
            }
            return TickOutcome::Ongoing;
        }
        self.negative_ticks = 0;

        self.time_left -= 1;
        if self.time_left > 0 {
            return TickOutcome::Ongoing;
        }
        self.time_out(messenger, schedule_message)
    }

    fn advance<M, S>(&mut self, messenger: &M, schedule_message: S) -> TickOutcome
    where
        M: Messenger + ?Sized,
        S: FnMut(AlarmMessage, Duration),
    {
        self.answered = false;
        self.queue.rotate();

        match self.round.as_mut().map(RoundState::complete_turn) {
            Some(true) => return self.finish_round(messenger, schedule_message),
            Some(false) => {}
            None => {
                if self.variant.is_chaos() {
                    self.queue.promote_random(&mut self.rng, true);
                }
            }
        }

        self.begin_turn(messenger, schedule_message);
        TickOutcome::Ongoing
    }

    fn time_out<M, S>(&mut self, messenger: &M, schedule_message: S) -> TickOutcome
    where
        M: Messenger + ?Sized,
        S: FnMut(AlarmMessage, Duration),
    {
        let Some(head) = self.queue.head() else {
            return TickOutcome::Faulted(Error::EmptyQueue);
        };
        self.accepting_answers = false;
        let eliminated = self.round.is_none();

        self.announce(
            messenger,
            &Announcement::TimedOut {
                name: self.name_of(head),
                eliminated,
            },
        );

        if eliminated {
            self.queue.remove_head();
            if self.queue.len() <= 1 {
                return self.finish(messenger);
            }
            if self.variant.is_chaos() {
                self.queue.promote_random(&mut self.rng, false);
            }
        } else {
            self.queue.rotate();
            if self.round.as_mut().is_some_and(RoundState::complete_turn) {
                return self.finish_round(messenger, schedule_message);
            }
        }

        self.begin_turn(messenger, schedule_message);
        TickOutcome::Ongoing
    }

    fn finish_round<M, S>(&mut self, messenger: &M, schedule_message: S) -> TickOutcome
    where
        M: Messenger + ?Sized,
        S: FnMut(AlarmMessage, Duration),
    {
        let round = self.round.map_or(1, |state| state.round());
        let leaderboard = elimination::standings(&self.roster, &self.queue).full();
        let eliminated = elimination::end_round(&self.roster, &mut self.queue);

        self.announce(
            messenger,
            &Announcement::RoundEnded {
                round,
                leaderboard,
                eliminated: eliminated.iter().map(|&id| self.name_of(id)).collect_vec(),
            },
        );

        if self.queue.len() <= 1 {
            return self.finish(messenger);
        }

        let remaining = self.queue.len();
        let rule: Option<Rule> = self
            .round
            .as_mut()
            .and_then(|state| state.next_round(remaining, &mut self.rng));
        if let (Some(rule), Some(prompt)) = (rule, self.prompt.as_mut()) {
            prompt.switch_rule(rule, &mut self.rng);
        }

        let prompt = self.prompt.as_ref();
        self.announce(
            messenger,
            &Announcement::RoundStarted {
                round: round + 1,
                rule,
                chosen_letter: prompt.and_then(Prompt::chosen_letter),
                banned_letters: prompt.map(|p| p.banned_letters().to_vec()).unwrap_or_default(),
                required_letter: prompt.and_then(Prompt::required_letter),
                leaderboard: elimination::standings(&self.roster, &self.queue).full(),
            },
        );
        self.begin_turn(messenger, schedule_message);
        TickOutcome::Ongoing
    }

    fn begin_turn<M, S>(&mut self, messenger: &M, mut schedule_message: S)
    where
        M: Messenger + ?Sized,
        S: FnMut(AlarmMessage, Duration),
    {
        let Some(head) = self.queue.head() else {
            return;
        };

        self.serial += 1;
        self.time_left = self.limits.turn_seconds;
        self.answered = false;
        self.accepting_answers = true;

        self.announce(messenger, &Announcement::Turn(self.turn_prompt(head)));

        if self.roster.get(head).is_some_and(Player::is_virtual) {
            let delay = self.options.virtual_player_delay(&mut self.rng);
            schedule_message(
                AlarmMessage::VirtualPlayerTurn {
                    serial: self.serial,
                },
                delay,
            );
        }
    }

    fn turn_prompt(&self, head: PlayerId) -> TurnPrompt {
        let prompt = self.prompt.as_ref();
        let elimination = self.round.is_some();
        let hide_next =
            self.variant.is_chaos() || self.round.is_some_and(|state| state.is_last_turn());

        TurnPrompt {
            player: self.name_of(head),
            next: if hide_next {
                None
            } else {
                self.queue.next().map(|id| self.name_of(id))
            },
            leading_letter: prompt.and_then(Prompt::leading_letter),
            banned_letters: prompt
                .map(|prompt| prompt.banned_letters().to_vec())
                .unwrap_or_default(),
            required_letter: prompt.and_then(Prompt::required_letter),
            min_length: (!elimination).then_some(self.limits.min_word_length),
            time_limit: self.limits.turn_seconds,
            players: (!elimination).then(|| (self.queue.len(), self.roster.len())),
            total_words: (!elimination).then_some(self.turns),
            round: self.round.map(|state| state.round()),
            leaderboard: elimination
                .then(|| elimination::standings(&self.roster, &self.queue).window(head)),
        }
    }

    fn finish<M: Messenger + ?Sized>(&mut self, messenger: &M) -> TickOutcome {
        self.phase = Phase::Ended;
        self.accepting_answers = false;
        self.ended_at = Some(web_time::SystemTime::now());

        let summary = self.summary();
        log::info!(
            "[{}] game over after {} words, winner: {:?}",
            self.channel,
            self.turns,
            self.winner()
        );
        self.announce(messenger, &Announcement::GameOver(summary));
        TickOutcome::Ended
    }

    /// Summary of the game so far
    pub fn summary(&self) -> Summary {
        let duration = match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => end.duration_since(start).unwrap_or_default(),
            _ => Duration::ZERO,
        };

        Summary {
            winner: self.winner().map(|id| self.name_of(id)),
            players: self.roster.len(),
            total_words: self.turns,
            longest_word: self
                .longest
                .as_ref()
                .map(|(id, word)| (word.clone(), self.name_of(*id))),
            duration_secs: duration.as_secs(),
        }
    }

    /// The record of a game that was played to its end
    ///
    /// Returns `None` for games that never started or were killed.
    pub fn game_record(&self) -> Option<GameRecord> {
        if self.phase != Phase::Ended {
            return None;
        }
        let (Some(start_time), Some(end_time)) = (self.started_at, self.ended_at) else {
            return None;
        };

        Some(GameRecord {
            channel: self.channel,
            participant_count: self.roster.len(),
            variant: self.variant.key(),
            winner: self.winner(),
            start_time,
            end_time,
        })
    }

    /// Results of every human participant
    pub fn player_results(&self, game_id: GameRecordId) -> Vec<PlayerResult> {
        self.roster
            .iter()
            .filter(|player| !player.is_virtual())
            .map(|player| PlayerResult {
                game_id,
                player_id: player.id(),
                won: self.queue.contains(player.id()),
                word_count: player.word_count(),
                letter_count: player.letter_count(),
                longest_word: player.longest_word().map(str::to_owned),
            })
            .collect_vec()
    }
}
