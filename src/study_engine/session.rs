//! Per-user application state and the workflows the UI drives.
//!
//! [`StudySession`] owns everything that would otherwise be page-level
//! globals: the signed-in user, their profile, deck history, duels and the
//! quiz in progress. Collaborators (store, generators) are passed into each
//! workflow call, so the whole flow runs in tests without UI or network.
//!
//! Every paid workflow follows the same order: reserve credits, do the paid
//! work, durably write its record, then commit the hold. Any failure before
//! the record is written releases the hold, which restores the balance.

use std::collections::BTreeSet;

use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};

use crate::study_engine::{
    achievements::{check_and_unlock, AchievementKey},
    analytics,
    config::EconomyConfig,
    deck,
    duel,
    error::{StudyError, StudyResult},
    generator::{check_generated, QuestionGenerator},
    ledger::{reserve, PaidAction},
    models::{normalize_identity, Course, Deck, Duel, DuelStanding, Profile, ScoreSummary, UserIdentity},
    quiz::{ActiveQuiz, QuizMode, TimerEvent},
    report::{PerformanceReport, ReportGenerator, ReportRequest},
    store::{PersistenceStore, StoreEvent},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub identity: UserIdentity,
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginSummary {
    pub profile: Profile,
    pub decks: usize,
    pub duels: usize,
    pub unlocked: BTreeSet<AchievementKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckCreated {
    pub deck_id: String,
    pub unlocked: BTreeSet<AchievementKey>,
}

/// Everything that happened when a quiz was submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub mode: QuizMode,
    pub summary: ScoreSummary,
    pub xp_earned: u32,
    pub leveled_up: bool,
    pub level: u32,
    pub unlocked: BTreeSet<AchievementKey>,
}

pub struct StudySession {
    config: EconomyConfig,
    rng: StdRng,
    account: Option<Account>,
    decks: Vec<Deck>,
    duels: Vec<Duel>,
    active: Option<ActiveQuiz>,
}

fn as_generation_error(e: StudyError) -> StudyError {
    match e {
        StudyError::Generation(_) => e,
        other => StudyError::generation(other.to_string()),
    }
}

impl StudySession {
    pub fn new(config: EconomyConfig) -> Self {
        Self::build(config, StdRng::from_entropy())
    }

    /// Deterministic IDs and shuffles, for tests and replays.
    pub fn with_seed(config: EconomyConfig, seed: u64) -> Self {
        Self::build(config, StdRng::seed_from_u64(seed))
    }

    fn build(config: EconomyConfig, rng: StdRng) -> Self {
        StudySession {
            config,
            rng,
            account: None,
            decks: Vec::new(),
            duels: Vec::new(),
            active: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.account.as_ref().map(|a| &a.profile)
    }

    /// Decks, newest first.
    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn deck(&self, deck_id: &str) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == deck_id)
    }

    /// Duels the user is part of, newest first.
    pub fn duels(&self) -> &[Duel] {
        &self.duels
    }

    pub fn active_quiz(&self) -> Option<&ActiveQuiz> {
        self.active.as_ref()
    }

    pub fn duel_standing(&self, duel_id: &str) -> Option<DuelStanding> {
        let account = self.account.as_ref()?;
        let duel = self.duels.iter().find(|d| d.id == duel_id)?;
        duel::standing_for(duel, &account.identity.duel_identity())
    }

    // -----------------------------------------------------------------------
    // Sign-in
    // -----------------------------------------------------------------------

    /// Load the user's state and catch up on achievements they qualify for.
    pub fn login<S: PersistenceStore + ?Sized>(
        &mut self,
        store: &S,
        identity: UserIdentity,
    ) -> StudyResult<LoginSummary> {
        let mut profile = store.read_profile(&identity.uid)?;
        profile.normalize();
        let decks = store.read_decks(&identity.uid)?;
        let duels = store.read_duels_for_identity(&identity.duel_identity())?;

        let unlocked = check_and_unlock(&mut profile, &decks);
        if !unlocked.is_empty() {
            store.write_profile(&identity.uid, &profile)?;
        }

        info!(
            uid = %identity.uid,
            level = profile.level,
            credits = profile.credits,
            decks = decks.len(),
            duels = duels.len(),
            "signed in"
        );

        let summary = LoginSummary {
            profile: profile.clone(),
            decks: decks.len(),
            duels: duels.len(),
            unlocked,
        };
        self.account = Some(Account { identity, profile });
        self.decks = decks;
        self.duels = duels;
        self.active = None;
        Ok(summary)
    }

    pub fn logout(&mut self) {
        if let Some(account) = self.account.take() {
            info!(uid = %account.identity.uid, "signed out");
        }
        self.decks.clear();
        self.duels.clear();
        self.active = None;
    }

    /// Reload whatever a realtime change notification says is stale.
    pub fn apply_event<S: PersistenceStore + ?Sized>(
        &mut self,
        store: &S,
        event: &StoreEvent,
    ) -> StudyResult<()> {
        let Some(account) = self.account.as_mut() else {
            return Ok(());
        };
        match event {
            StoreEvent::ProfileChanged { user_id } if *user_id == account.identity.uid => {
                let mut profile = store.read_profile(user_id)?;
                profile.normalize();
                account.profile = profile;
            }
            StoreEvent::DecksChanged { user_id } if *user_id == account.identity.uid => {
                self.decks = store.read_decks(user_id)?;
            }
            StoreEvent::DuelChanged { .. } => {
                self.duels = store.read_duels_for_identity(&account.identity.duel_identity())?;
            }
            _ => {}
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Decks
    // -----------------------------------------------------------------------

    /// Pay for, generate and store a new deck, then start playing it.
    pub fn create_deck<S, G>(
        &mut self,
        store: &S,
        generator: &G,
        name: &str,
        course: Course,
    ) -> StudyResult<DeckCreated>
    where
        S: PersistenceStore + ?Sized,
        G: QuestionGenerator + ?Sized,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(StudyError::validation("deck name is empty"));
        }
        let account = self.account.as_mut().ok_or(StudyError::NotSignedIn)?;
        let uid = account.identity.uid.clone();

        let hold = reserve(&mut account.profile, PaidAction::DeckCreation, &self.config)?;

        let built = generator
            .generate(name, course)
            .map_err(as_generation_error)
            .and_then(|qs| check_generated(qs, self.config.questions_per_deck))
            .and_then(|qs| deck::create_deck(&mut self.rng, name, course, qs));
        let new_deck = match built {
            Ok(d) => d,
            Err(e) => {
                warn!(uid = %uid, %course, error = %e, "deck generation failed");
                hold.release(&mut account.profile);
                return Err(e);
            }
        };

        if let Err(e) = store.write_deck(&uid, &new_deck) {
            warn!(uid = %uid, error = %e, "deck write failed");
            hold.release(&mut account.profile);
            return Err(e);
        }
        hold.commit();

        info!(uid = %uid, deck_id = %new_deck.id, %course, credits = account.profile.credits, "deck created");

        let deck_id = new_deck.id.clone();
        self.decks.insert(0, new_deck.clone());
        let unlocked = check_and_unlock(&mut account.profile, &self.decks);
        self.active = Some(ActiveQuiz::new(new_deck, QuizMode::Fresh, self.config.quiz_duration_secs));

        store.write_profile(&uid, &account.profile)?;
        Ok(DeckCreated { deck_id, unlocked })
    }

    /// Start the first play of a pending deck.
    pub fn start_deck(&mut self, deck_id: &str) -> StudyResult<&ActiveQuiz> {
        let deck = self.find_deck(deck_id)?;
        if deck.is_completed() {
            return Err(StudyError::validation(format!(
                "deck {deck_id} was already scored; redo it instead"
            )));
        }
        let quiz = ActiveQuiz::new(deck.clone(), QuizMode::Fresh, self.config.quiz_duration_secs);
        Ok(&*self.active.insert(quiz))
    }

    /// Replay a stored deck with reshuffled options.
    pub fn redo_deck(&mut self, deck_id: &str) -> StudyResult<&ActiveQuiz> {
        let idx = self
            .decks
            .iter()
            .position(|d| d.id == deck_id)
            .ok_or_else(|| StudyError::NotFound { kind: "deck", id: deck_id.to_string() })?;
        let copy = deck::start_redo(&self.decks[idx], &mut self.rng);
        let quiz = ActiveQuiz::new(copy, QuizMode::Redo, self.config.quiz_duration_secs);
        Ok(&*self.active.insert(quiz))
    }

    pub fn delete_deck<S: PersistenceStore + ?Sized>(
        &mut self,
        store: &S,
        deck_id: &str,
    ) -> StudyResult<()> {
        let account = self.account.as_ref().ok_or(StudyError::NotSignedIn)?;
        store.delete_deck(&account.identity.uid, deck_id)?;
        self.decks.retain(|d| d.id != deck_id);
        if matches!(&self.active, Some(q) if q.deck.id == deck_id) {
            self.active = None;
        }
        info!(uid = %account.identity.uid, deck_id, "deck deleted");
        Ok(())
    }

    fn find_deck(&self, deck_id: &str) -> StudyResult<&Deck> {
        self.deck(deck_id)
            .ok_or_else(|| StudyError::NotFound { kind: "deck", id: deck_id.to_string() })
    }

    // -----------------------------------------------------------------------
    // Playing
    // -----------------------------------------------------------------------

    pub fn select_answer(&mut self, index: usize, option: &str) -> StudyResult<()> {
        self.active
            .as_mut()
            .ok_or(StudyError::NoActiveQuiz)?
            .select(index, option)
    }

    pub fn clear_answer(&mut self, index: usize) -> StudyResult<()> {
        self.active.as_mut().ok_or(StudyError::NoActiveQuiz)?.clear(index)
    }

    /// One second of quiz time.
    pub fn tick(&mut self) -> StudyResult<TimerEvent> {
        Ok(self.active.as_mut().ok_or(StudyError::NoActiveQuiz)?.tick())
    }

    /// Grade the quiz in progress, award xp, check achievements and persist.
    ///
    /// Personal and redo decks are scored with the wrong-answer penalty and
    /// stored in deck history (a redo overwrites the original and is tagged
    /// `Redone`). Duel play-throughs are scored on correct answers only and
    /// written to the player's side of the duel.
    ///
    /// Local state changes only after the deck or duel write succeeds; on any
    /// error the quiz stays active and can be submitted again.
    pub fn submit_answers<S: PersistenceStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> StudyResult<Submission> {
        let account = self.account.as_mut().ok_or(StudyError::NotSignedIn)?;
        let quiz = self.active.as_ref().ok_or(StudyError::NoActiveQuiz)?;
        let uid = account.identity.uid.clone();
        let mode = quiz.mode.clone();

        // Grade a copy; the quiz stays active until the result is stored, so
        // a failed write can be retried.
        let mut played = quiz.deck.clone();
        let summary = deck::score_deck(&mut played, quiz.sheet.answers(), mode.scoring())?;
        let total = played.questions.len() as u32;

        match &mode {
            QuizMode::Fresh | QuizMode::Redo => {
                deck::finish_play(&mut played, &summary);
                store.write_deck(&uid, &played)?;
                match self.decks.iter_mut().find(|d| d.id == played.id) {
                    Some(stored) => *stored = played.clone(),
                    None => self.decks.insert(0, played.clone()),
                }
            }
            QuizMode::Duel { duel_id, role } => {
                let mut updated = self
                    .duels
                    .iter()
                    .find(|d| d.id == *duel_id)
                    .cloned()
                    .ok_or_else(|| StudyError::NotFound { kind: "duel", id: duel_id.clone() })?;
                duel::record_party_score(&mut updated, *role, summary.score)?;
                store.update_party_score(duel_id, *role, updated.party(*role))?;
                if let Some(local) = self.duels.iter_mut().find(|d| d.id == *duel_id) {
                    *local = updated;
                }
                info!(uid = %uid, duel_id = %duel_id, %role, score = summary.score, "duel score recorded");
            }
        }
        self.active = None;

        let rules = self.config.xp_rules();
        let xp_earned = rules.earned(summary.correct, total);
        let leveled_up = rules.award(&mut account.profile, summary.correct, total);
        if leveled_up {
            info!(uid = %uid, level = account.profile.level, "level up");
        }
        let unlocked = check_and_unlock(&mut account.profile, &self.decks);
        for key in &unlocked {
            info!(uid = %uid, achievement = ?key, "achievement unlocked");
        }
        store.write_profile(&uid, &account.profile)?;

        info!(
            uid = %uid,
            deck_id = %played.id,
            score = summary.score,
            correct = summary.correct,
            wrong = summary.wrong,
            xp_earned,
            "answers submitted"
        );

        Ok(Submission {
            mode,
            summary,
            xp_earned,
            leveled_up,
            level: account.profile.level,
            unlocked,
        })
    }

    // -----------------------------------------------------------------------
    // Duels
    // -----------------------------------------------------------------------

    /// Pay for and generate a shared quiz, and challenge `opponent` with it.
    pub fn create_duel<S, G>(
        &mut self,
        store: &S,
        generator: &G,
        opponent: &str,
        course: Course,
    ) -> StudyResult<String>
    where
        S: PersistenceStore + ?Sized,
        G: QuestionGenerator + ?Sized,
    {
        let account = self.account.as_mut().ok_or(StudyError::NotSignedIn)?;
        let uid = account.identity.uid.clone();
        let challenger = account.identity.duel_identity();
        let opponent = normalize_identity(opponent);
        if opponent.is_empty() {
            return Err(StudyError::validation("opponent identity is empty"));
        }
        if opponent == challenger {
            return Err(StudyError::validation("you cannot challenge yourself"));
        }

        let hold = reserve(&mut account.profile, PaidAction::DuelCreation, &self.config)?;

        let label = format!("Duel {course}");
        let built = generator
            .generate(&label, course)
            .map_err(as_generation_error)
            .and_then(|qs| check_generated(qs, self.config.questions_per_deck))
            .and_then(|qs| duel::create_duel(&mut self.rng, &challenger, &opponent, course, qs));
        let new_duel = match built {
            Ok(d) => d,
            Err(e) => {
                warn!(uid = %uid, %course, error = %e, "duel generation failed");
                hold.release(&mut account.profile);
                return Err(e);
            }
        };

        if let Err(e) = store.write_duel(&new_duel) {
            warn!(uid = %uid, error = %e, "duel write failed");
            hold.release(&mut account.profile);
            return Err(e);
        }
        hold.commit();

        info!(
            uid = %uid,
            duel_id = %new_duel.id,
            opponent = %opponent,
            %course,
            credits = account.profile.credits,
            "duel created"
        );

        let duel_id = new_duel.id.clone();
        self.duels.insert(0, new_duel);
        store.write_profile(&uid, &account.profile)?;
        Ok(duel_id)
    }

    /// Start the signed-in user's turn in a duel.
    pub fn play_duel(&mut self, duel_id: &str) -> StudyResult<&ActiveQuiz> {
        let account = self.account.as_ref().ok_or(StudyError::NotSignedIn)?;
        let duel = self
            .duels
            .iter()
            .find(|d| d.id == duel_id)
            .ok_or_else(|| StudyError::NotFound { kind: "duel", id: duel_id.to_string() })?;
        let role = duel::role_of(duel, &account.identity.duel_identity())
            .ok_or_else(|| StudyError::validation(format!("you are not part of duel {duel_id}")))?;
        let deck = duel::play_deck(duel, role)?;
        let mode = QuizMode::Duel { duel_id: duel_id.to_string(), role };
        let quiz = ActiveQuiz::new(deck, mode, self.config.quiz_duration_secs);
        Ok(&*self.active.insert(quiz))
    }

    pub fn refresh_duels<S: PersistenceStore + ?Sized>(&mut self, store: &S) -> StudyResult<&[Duel]> {
        let account = self.account.as_ref().ok_or(StudyError::NotSignedIn)?;
        self.duels = store.read_duels_for_identity(&account.identity.duel_identity())?;
        Ok(&self.duels)
    }

    // -----------------------------------------------------------------------
    // Performance report
    // -----------------------------------------------------------------------

    /// Pay for an AI analysis of completed decks.
    pub fn request_report<S, R>(&mut self, store: &S, reporter: &R) -> StudyResult<PerformanceReport>
    where
        S: PersistenceStore + ?Sized,
        R: ReportGenerator + ?Sized,
    {
        let account = self.account.as_mut().ok_or(StudyError::NotSignedIn)?;
        let uid = account.identity.uid.clone();
        let snapshot = analytics::snapshot(&self.decks).ok_or_else(|| {
            StudyError::validation("complete at least one deck before requesting a report")
        })?;

        let hold = reserve(&mut account.profile, PaidAction::PerformanceReport, &self.config)?;
        let request = ReportRequest::new(snapshot, &self.decks);
        let report = match reporter
            .generate_report(&request)
            .map_err(as_generation_error)
            .and_then(PerformanceReport::check)
        {
            Ok(r) => r,
            Err(e) => {
                warn!(uid = %uid, error = %e, "report generation failed");
                hold.release(&mut account.profile);
                return Err(e);
            }
        };
        hold.commit();

        info!(uid = %uid, credits = account.profile.credits, "performance report generated");
        store.write_profile(&uid, &account.profile)?;
        Ok(report)
    }
}
