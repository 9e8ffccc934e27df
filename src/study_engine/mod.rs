//! Core study engine: credits, progression, achievements, decks and duels.
//!
//! ## Module overview
//!
//! | Module         | Purpose |
//! |----------------|---------|
//! | `models`       | Shared types: profile, course, question, deck, duel, identity |
//! | `error`        | `StudyError` and the `StudyResult` alias |
//! | `config`       | Economy and quiz tunables, loadable from JSON |
//! | `ledger`       | Credit spend/refund and the `CreditHold` reservation token |
//! | `progression`  | XP award, level-up loop, progress bar |
//! | `achievements` | Declarative catalog and idempotent unlock check |
//! | `helpers`      | Record IDs, Fisher-Yates shuffle, clock formatting |
//! | `deck`         | Question validation, deck creation, scoring, redo |
//! | `duel`         | Duel creation, party scoring, derived status and outcome |
//! | `quiz`         | Countdown timer, answer sheet, the quiz in progress |
//! | `generator`    | Question-generator seam and payload checks |
//! | `analytics`    | Averages per course and score evolution |
//! | `report`       | AI performance report request and result contract |
//! | `store`        | Persistence seam and the in-memory realtime store |
//! | `presenter`    | JSON view models for profile, deck, duel and achievement cards |
//! | `session`      | `StudySession`: per-user state and every user workflow |

pub mod achievements;
pub mod analytics;
pub mod config;
pub mod deck;
pub mod duel;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod ledger;
pub mod models;
pub mod presenter;
pub mod progression;
pub mod quiz;
pub mod report;
pub mod session;
pub mod store;

pub use achievements::{check_and_unlock, AchievementKey, CATALOG};
pub use config::EconomyConfig;
pub use error::{StudyError, StudyResult};
pub use generator::{parse_generated_questions, QuestionGenerator};
pub use ledger::{CreditHold, PaidAction};
pub use models::{
    Course, Deck, DeckStatus, Duel, DuelOutcome, DuelStanding, DuelStatus, Party,
    PlayStatus, Profile, Question, Role, ScoreSummary, ScoringMode, UserIdentity,
};
pub use progression::{award_xp, xp_progress, xp_threshold, XpProgress, XpRules};
pub use quiz::{ActiveQuiz, QuizMode, TimerEvent};
pub use report::{PerformanceReport, ReportGenerator, ReportRequest};
pub use session::{DeckCreated, LoginSummary, StudySession, Submission};
pub use store::{MemoryStore, PersistenceStore, StoreEvent};
