//! Recording collaborators shared by the unit tests

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicI64, Ordering},
};

use crate::{
    announcement::Announcement,
    channel::ChannelId,
    game::Rejection,
    lexicon::WordList,
    persistence::{self, GameRecord, GameRecordId, PlayerResult, Recorder},
    roster::PlayerId,
    session::Messenger,
};

#[derive(Debug, Clone, Default)]
pub struct MockMessenger {
    pub announcements: Arc<Mutex<Vec<(ChannelId, Announcement)>>>,
    pub replies: Arc<Mutex<Vec<(ChannelId, PlayerId, Rejection)>>>,
}

impl MockMessenger {
    pub fn announcements(&self) -> Vec<Announcement> {
        self.announcements
            .lock()
            .unwrap()
            .iter()
            .map(|(_, announcement)| announcement.clone())
            .collect()
    }

    pub fn replies(&self) -> Vec<Rejection> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, rejection)| rejection.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.announcements.lock().unwrap().clear();
        self.replies.lock().unwrap().clear();
    }
}

impl Messenger for MockMessenger {
    fn send_channel_message(&self, channel: ChannelId, message: &Announcement) {
        self.announcements
            .lock()
            .unwrap()
            .push((channel, message.clone()));
    }

    fn reply_to_message(&self, channel: ChannelId, player: PlayerId, rejection: &Rejection) {
        self.replies
            .lock()
            .unwrap()
            .push((channel, player, rejection.clone()));
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockRecorder {
    pub games: Arc<Mutex<Vec<GameRecord>>>,
    pub results: Arc<Mutex<Vec<PlayerResult>>>,
    pub fail_games: Arc<AtomicBool>,
    pub fail_player: Arc<AtomicI64>,
}

impl Recorder for MockRecorder {
    async fn record_completed_game(
        &self,
        record: &GameRecord,
    ) -> Result<GameRecordId, persistence::Error> {
        if self.fail_games.load(Ordering::SeqCst) {
            return Err(persistence::Error::Unavailable("offline".to_owned()));
        }
        let mut games = self.games.lock().unwrap();
        games.push(record.clone());
        Ok(GameRecordId::from(i64::try_from(games.len()).unwrap()))
    }

    async fn record_player_result(&self, result: &PlayerResult) -> Result<(), persistence::Error> {
        if result.player_id.get() == self.fail_player.load(Ordering::SeqCst) {
            return Err(persistence::Error::Rejected("duplicate".to_owned()));
        }
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }
}

pub fn word_list() -> WordList {
    WordList::new([
        "elma",
        "armut",
        "ananas",
        "tavuk",
        "kale",
        "kalem",
        "ekmek",
        "erik",
        "karpuz",
        "zeytin",
        "nane",
        "tost",
        "kiraz",
        "masa",
        "sandalye",
        "aaaaaaaaaaaaaaaaaaaaaaaaa",
    ])
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
