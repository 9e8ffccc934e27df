use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::study_engine::achievements::AchievementKey;

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

/// Exam category a deck or duel is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Course {
    #[serde(rename = "SERPRO")]
    Serpro,
    #[serde(rename = "PRF")]
    Prf,
    #[serde(rename = "ENEM")]
    Enem,
    #[serde(rename = "OAB")]
    Oab,
    #[serde(rename = "Medicina")]
    Medicina,
}

impl Course {
    pub const ALL: [Course; 5] = [
        Course::Serpro,
        Course::Prf,
        Course::Enem,
        Course::Oab,
        Course::Medicina,
    ];

    /// Parse the stored course label (`"SERPRO"`, `"Medicina"`, ...).
    pub fn from_label(s: &str) -> Option<Course> {
        match s {
            "SERPRO"   => Some(Course::Serpro),
            "PRF"      => Some(Course::Prf),
            "ENEM"     => Some(Course::Enem),
            "OAB"      => Some(Course::Oab),
            "Medicina" => Some(Course::Medicina),
            _ => None,
        }
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Course::Serpro   => "SERPRO",
            Course::Prf      => "PRF",
            Course::Enem     => "ENEM",
            Course::Oab      => "OAB",
            Course::Medicina => "Medicina",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

pub const DEFAULT_STARTING_CREDITS: u32 = 15;

/// Per-user progression state.
///
/// `xp` is the progress toward the next level and is kept strictly below
/// `xp_threshold(level)` by the progression engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub level: u32,
    pub xp: f64,
    #[serde(default = "default_credits")]
    pub credits: u32,
    #[serde(default)]
    pub achievements: BTreeSet<AchievementKey>,
}

fn default_credits() -> u32 {
    DEFAULT_STARTING_CREDITS
}

impl Default for Profile {
    fn default() -> Self {
        Profile::with_credits(DEFAULT_STARTING_CREDITS)
    }
}

impl Profile {
    pub fn with_credits(credits: u32) -> Self {
        Profile {
            level: 1,
            xp: 0.0,
            credits,
            achievements: BTreeSet::new(),
        }
    }

    /// Repair values that could only come from a hand-edited or legacy record:
    /// level 0 becomes 1, negative or non-finite xp becomes 0.
    pub fn normalize(&mut self) {
        if self.level == 0 {
            self.level = 1;
        }
        if !self.xp.is_finite() || self.xp < 0.0 {
            self.xp = 0.0;
        }
    }

    pub fn has_achievement(&self, key: AchievementKey) -> bool {
        self.achievements.contains(&key)
    }
}

// ---------------------------------------------------------------------------
// Questions and decks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    #[serde(rename = "answer")]
    pub correct_answer: String,
    #[serde(default)]
    pub user_answer: Option<String>,
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Question {
            text: text.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_answer: correct_answer.into(),
            user_answer: None,
        }
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckStatus {
    Redone,
}

/// One generated quiz and, once played, its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub name: String,
    pub course: Course,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeckStatus>,
    /// Set on the in-memory copy produced by a redo; never persisted.
    #[serde(skip)]
    pub is_redo: bool,
}

impl Deck {
    pub fn is_pending(&self) -> bool {
        self.score.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.score.is_some()
    }

    /// Highest score a play-through of this deck can reach.
    pub fn max_score(&self) -> u32 {
        self.questions.len() as u32
    }

    pub fn is_perfect(&self) -> bool {
        self.max_score() > 0 && self.score == Some(self.max_score())
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Which score formula a play-through is graded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMode {
    /// Personal deck or redo: wrong answers cancel correct ones.
    Penalized,
    /// Duel play-through: only correct answers count.
    CorrectOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: u32,
    pub correct: u32,
    pub wrong: u32,
}

// ---------------------------------------------------------------------------
// Duels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Challenger,
    Opponent,
}

impl Role {
    pub fn other(self) -> Role {
        match self {
            Role::Challenger => Role::Opponent,
            Role::Opponent   => Role::Challenger,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Challenger => write!(f, "challenger"),
            Role::Opponent   => write!(f, "opponent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub identity: String,
    pub score: Option<u32>,
    #[serde(default)]
    pub play_status: PlayStatus,
}

impl Party {
    pub fn pending(identity: impl Into<String>) -> Self {
        Party {
            identity: identity.into(),
            score: None,
            play_status: PlayStatus::Pending,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.play_status == PlayStatus::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelStatus {
    #[default]
    Active,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Duel {
    pub id: String,
    pub course: Course,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<Question>,
    pub challenger: Party,
    pub opponent: Party,
    #[serde(default)]
    pub status: DuelStatus,
}

impl Duel {
    pub fn party(&self, role: Role) -> &Party {
        match role {
            Role::Challenger => &self.challenger,
            Role::Opponent   => &self.opponent,
        }
    }

    pub fn party_mut(&mut self, role: Role) -> &mut Party {
        match role {
            Role::Challenger => &mut self.challenger,
            Role::Opponent   => &mut self.opponent,
        }
    }
}

/// Result of a resolved duel from one party's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelOutcome {
    Win,
    Loss,
    Draw,
}

/// Display state of a duel for one viewer, derived from both parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelStanding {
    AwaitingYou,
    AwaitingOpponent,
    Resolved(DuelOutcome),
}

// ---------------------------------------------------------------------------
// Session identity
// ---------------------------------------------------------------------------

/// Authenticated user as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    pub email: String,
}

impl UserIdentity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        UserIdentity {
            uid: uid.into(),
            email: email.into(),
        }
    }

    /// The identity string duels are addressed to.
    pub fn duel_identity(&self) -> String {
        normalize_identity(&self.email)
    }
}

/// Identities are compared trimmed and case-insensitively.
pub fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}
