//! # quiz_arena
//!
//! Gamification and duel engine for an exam-prep flashcard app.
//!
//! Users spend credits to generate ten-question multiple-choice decks for an
//! exam course (SERPRO, PRF, ENEM, OAB, Medicina), play them against a
//! countdown, earn XP and levels, unlock achievements, and challenge other
//! users to duels over a shared question set.
//!
//! ## How it works
//!
//! 1. Create a [`StudySession`] with an [`EconomyConfig`] and sign in against
//!    a [`PersistenceStore`] (the bundled [`MemoryStore`] is a shared,
//!    realtime in-memory backend).
//! 2. Paid workflows (`create_deck`, `create_duel`, `request_report`) reserve
//!    credits with a [`CreditHold`], call the external generator, durably
//!    write the result and only then commit. Any failure before the write
//!    releases the hold, so the balance is never lost to a failed generation.
//! 3. `select_answer` / `tick` drive the quiz in progress; `submit_answers`
//!    grades it, awards XP (with level-ups), checks achievements and persists.
//!
//! ## Key features
//!
//! - **Deterministic**: [`StudySession::with_seed`] fixes record IDs and redo
//!   shuffles, useful for tests and replays.
//! - **Two scoring formulas**: personal decks subtract wrong answers (floored
//!   at zero); duel play-throughs count correct answers only.
//! - **Derived duel state**: who is awaiting whom, and win/loss/draw, are
//!   computed from both parties at read time.
//!
//! ## Quick start
//!
//! ```rust
//! use quiz_arena::{
//!     Course, EconomyConfig, MemoryStore, Question, StudyResult, StudySession, UserIdentity,
//! };
//!
//! // Any `Fn(&str, Course) -> StudyResult<Vec<Question>>` is a question generator.
//! let generator = |_label: &str, _course: Course| -> StudyResult<Vec<Question>> {
//!     Ok((0..10)
//!         .map(|i| Question::new(format!("Question {i}?"), ["a", "b", "c", "d"], "a"))
//!         .collect())
//! };
//!
//! let store = MemoryStore::default();
//! let mut session = StudySession::with_seed(EconomyConfig::default(), 7);
//! session.login(&store, UserIdentity::new("u1", "ana@example.com"))?;
//!
//! session.create_deck(&store, &generator, "Constitutional law", Course::Oab)?;
//! for i in 0..10 {
//!     session.select_answer(i, "a")?;
//! }
//! let result = session.submit_answers(&store)?;
//!
//! assert_eq!(result.summary.score, 10);
//! assert_eq!(result.xp_earned, 200);
//! assert_eq!(result.level, 2);
//! assert_eq!(session.profile().map(|p| p.credits), Some(5));
//! # Ok::<(), quiz_arena::StudyError>(())
//! ```

pub mod study_engine;

// Convenience re-exports so callers can use `quiz_arena::StudySession`
// directly without reaching into `study_engine::`.
pub use study_engine::{
    AchievementKey, ActiveQuiz, Course, CreditHold, Deck, DeckCreated, DeckStatus, Duel,
    DuelOutcome, DuelStanding, DuelStatus, EconomyConfig, LoginSummary, MemoryStore, PaidAction,
    Party, PerformanceReport, PersistenceStore, PlayStatus, Profile, Question, QuestionGenerator,
    QuizMode, ReportGenerator, ReportRequest, Role, ScoreSummary, StoreEvent, StudyError,
    StudyResult, StudySession, Submission, TimerEvent, UserIdentity,
};
