//! Persistence seam and an in-memory realtime implementation.
//!
//! [`MemoryStore`] keeps everything behind one `Arc<Mutex<..>>`; clones share
//! state, so two sessions holding clones behave like two clients of the same
//! realtime database. Every successful write notifies subscribers through an
//! `mpsc` channel.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::study_engine::{
    config::EconomyConfig,
    duel::{filter_duels_for_identity, refresh_status},
    error::{StudyError, StudyResult},
    models::{Deck, Duel, Party, Profile, Role, DEFAULT_STARTING_CREDITS},
};

pub trait PersistenceStore {
    /// The user's profile; a default one is created and stored on first read.
    fn read_profile(&self, user_id: &str) -> StudyResult<Profile>;
    fn write_profile(&self, user_id: &str, profile: &Profile) -> StudyResult<()>;
    /// The user's decks, newest first.
    fn read_decks(&self, user_id: &str) -> StudyResult<Vec<Deck>>;
    /// Insert, or replace the deck with the same ID.
    fn write_deck(&self, user_id: &str, deck: &Deck) -> StudyResult<()>;
    fn delete_deck(&self, user_id: &str, deck_id: &str) -> StudyResult<()>;
    /// Duels where `identity` is a party, newest first.
    fn read_duels_for_identity(&self, identity: &str) -> StudyResult<Vec<Duel>>;
    fn write_duel(&self, duel: &Duel) -> StudyResult<()>;
    /// Overwrite one party's sub-record only; the other party is left as stored.
    fn update_party_score(&self, duel_id: &str, role: Role, party: &Party) -> StudyResult<()>;
}

/// Change notification pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ProfileChanged { user_id: String },
    DecksChanged { user_id: String },
    DuelChanged { duel_id: String },
}

#[derive(Default)]
struct StoreState {
    profiles: HashMap<String, Profile>,
    /// Per user, oldest first.
    decks: HashMap<String, Vec<Deck>>,
    duels: Vec<Duel>,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl StoreState {
    fn notify(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
    starting_credits: u32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new(DEFAULT_STARTING_CREDITS)
    }
}

impl MemoryStore {
    pub fn new(starting_credits: u32) -> Self {
        MemoryStore {
            state: Arc::new(Mutex::new(StoreState::default())),
            starting_credits,
        }
    }

    /// New profiles start with `config.starting_credits`.
    pub fn from_config(config: &EconomyConfig) -> Self {
        MemoryStore::new(config.starting_credits)
    }

    /// Receive every change made after this call, through any clone.
    pub fn subscribe(&self) -> StudyResult<Receiver<StoreEvent>> {
        let (tx, rx) = channel();
        self.lock()?.subscribers.push(tx);
        Ok(rx)
    }

    fn lock(&self) -> StudyResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| StudyError::persistence("store lock poisoned"))
    }
}

impl PersistenceStore for MemoryStore {
    fn read_profile(&self, user_id: &str) -> StudyResult<Profile> {
        let mut state = self.lock()?;
        if let Some(profile) = state.profiles.get(user_id) {
            let mut profile = profile.clone();
            profile.normalize();
            return Ok(profile);
        }
        let profile = Profile::with_credits(self.starting_credits);
        state.profiles.insert(user_id.to_string(), profile.clone());
        debug!(user_id, "default profile created");
        state.notify(StoreEvent::ProfileChanged { user_id: user_id.to_string() });
        Ok(profile)
    }

    fn write_profile(&self, user_id: &str, profile: &Profile) -> StudyResult<()> {
        let mut state = self.lock()?;
        state.profiles.insert(user_id.to_string(), profile.clone());
        debug!(user_id, level = profile.level, credits = profile.credits, "profile written");
        state.notify(StoreEvent::ProfileChanged { user_id: user_id.to_string() });
        Ok(())
    }

    fn read_decks(&self, user_id: &str) -> StudyResult<Vec<Deck>> {
        let state = self.lock()?;
        Ok(state
            .decks
            .get(user_id)
            .map(|decks| decks.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    fn write_deck(&self, user_id: &str, deck: &Deck) -> StudyResult<()> {
        let mut state = self.lock()?;
        let decks = state.decks.entry(user_id.to_string()).or_default();
        match decks.iter_mut().find(|d| d.id == deck.id) {
            Some(existing) => *existing = deck.clone(),
            None => decks.push(deck.clone()),
        }
        debug!(user_id, deck_id = %deck.id, score = ?deck.score, "deck written");
        state.notify(StoreEvent::DecksChanged { user_id: user_id.to_string() });
        Ok(())
    }

    fn delete_deck(&self, user_id: &str, deck_id: &str) -> StudyResult<()> {
        let mut state = self.lock()?;
        let decks = state.decks.entry(user_id.to_string()).or_default();
        let before = decks.len();
        decks.retain(|d| d.id != deck_id);
        if decks.len() == before {
            return Err(StudyError::NotFound { kind: "deck", id: deck_id.to_string() });
        }
        debug!(user_id, deck_id, "deck deleted");
        state.notify(StoreEvent::DecksChanged { user_id: user_id.to_string() });
        Ok(())
    }

    fn read_duels_for_identity(&self, identity: &str) -> StudyResult<Vec<Duel>> {
        let state = self.lock()?;
        Ok(filter_duels_for_identity(&state.duels, identity))
    }

    fn write_duel(&self, duel: &Duel) -> StudyResult<()> {
        let mut state = self.lock()?;
        match state.duels.iter_mut().find(|d| d.id == duel.id) {
            Some(existing) => *existing = duel.clone(),
            None => state.duels.push(duel.clone()),
        }
        debug!(duel_id = %duel.id, "duel written");
        state.notify(StoreEvent::DuelChanged { duel_id: duel.id.clone() });
        Ok(())
    }

    fn update_party_score(&self, duel_id: &str, role: Role, party: &Party) -> StudyResult<()> {
        let mut state = self.lock()?;
        let duel = state
            .duels
            .iter_mut()
            .find(|d| d.id == duel_id)
            .ok_or_else(|| StudyError::NotFound { kind: "duel", id: duel_id.to_string() })?;
        *duel.party_mut(role) = party.clone();
        refresh_status(duel);
        debug!(duel_id, %role, score = ?party.score, "duel party written");
        state.notify(StoreEvent::DuelChanged { duel_id: duel_id.to_string() });
        Ok(())
    }
}
