//! Achievement catalog and unlock evaluation.
//!
//! Each catalog entry pairs a key with a [`Criterion`], a pure, monotonic
//! condition over the profile and its deck history. Evaluation walks the whole
//! catalog uniformly; keys already present on the profile are skipped and
//! never revoked.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::study_engine::models::{Course, Deck, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AchievementKey {
    FirstDeck,
    FirstComplete,
    PerfectScore,
    Level5,
    Level10,
    Level20,
    DeckCollector,
    Marathoner,
    Polymath,
    PerfectScorePro,
    SerproMaster,
    PrfMaster,
    EnemMaster,
    OabMaster,
    MedMaster,
}

impl fmt::Display for AchievementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = definition(*self).map(|d| d.name).unwrap_or("?");
        write!(f, "{}", name)
    }
}

/// Condition that unlocks an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    DecksCreated(usize),
    DecksCompleted(usize),
    PerfectDecks(usize),
    LevelAtLeast(u32),
    CourseCompleted(Course, usize),
    EveryCourseCreated,
}

impl Criterion {
    pub fn is_met(&self, profile: &Profile, decks: &[Deck]) -> bool {
        match *self {
            Criterion::DecksCreated(n)   => decks.len() >= n,
            Criterion::DecksCompleted(n) => decks.iter().filter(|d| d.is_completed()).count() >= n,
            Criterion::PerfectDecks(n)   => decks.iter().filter(|d| d.is_perfect()).count() >= n,
            Criterion::LevelAtLeast(n)   => profile.level >= n,
            Criterion::CourseCompleted(course, n) => {
                decks
                    .iter()
                    .filter(|d| d.course == course && d.is_completed())
                    .count()
                    >= n
            }
            Criterion::EveryCourseCreated => {
                Course::ALL.iter().all(|c| decks.iter().any(|d| d.course == *c))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    pub key: AchievementKey,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub criterion: Criterion,
}

pub const CATALOG: &[AchievementDef] = &[
    AchievementDef { key: AchievementKey::FirstDeck,       name: "Beginner",             description: "Create your first study deck.",          icon: "🚀", criterion: Criterion::DecksCreated(1) },
    AchievementDef { key: AchievementKey::FirstComplete,   name: "First Steps",          description: "Complete a deck for the first time.",    icon: "✅", criterion: Criterion::DecksCompleted(1) },
    AchievementDef { key: AchievementKey::PerfectScore,    name: "Perfectionist",        description: "Answer every question of a deck right.", icon: "🎯", criterion: Criterion::PerfectDecks(1) },
    AchievementDef { key: AchievementKey::Level5,          name: "Dedicated Student",    description: "Reach level 5.",                         icon: "📚", criterion: Criterion::LevelAtLeast(5) },
    AchievementDef { key: AchievementKey::Level10,         name: "Master of Knowledge",  description: "Reach level 10.",                        icon: "🎓", criterion: Criterion::LevelAtLeast(10) },
    AchievementDef { key: AchievementKey::Level20,         name: "Veteran",              description: "Reach level 20.",                        icon: "🏆", criterion: Criterion::LevelAtLeast(20) },
    AchievementDef { key: AchievementKey::DeckCollector,   name: "Collector",            description: "Create 10 decks.",                       icon: "📦", criterion: Criterion::DecksCreated(10) },
    AchievementDef { key: AchievementKey::Marathoner,      name: "Marathoner",           description: "Complete 25 decks.",                     icon: "🏃", criterion: Criterion::DecksCompleted(25) },
    AchievementDef { key: AchievementKey::Polymath,        name: "Polymath",             description: "Create a deck for every course.",        icon: "🧠", criterion: Criterion::EveryCourseCreated },
    AchievementDef { key: AchievementKey::PerfectScorePro, name: "Brain Teaser",         description: "Get a perfect score on 5 decks.",        icon: "🤯", criterion: Criterion::PerfectDecks(5) },
    AchievementDef { key: AchievementKey::SerproMaster,    name: "SERPRO Specialist",    description: "Complete 5 SERPRO decks.",               icon: "💻", criterion: Criterion::CourseCompleted(Course::Serpro, 5) },
    AchievementDef { key: AchievementKey::PrfMaster,       name: "PRF Specialist",       description: "Complete 5 PRF decks.",                  icon: "🚓", criterion: Criterion::CourseCompleted(Course::Prf, 5) },
    AchievementDef { key: AchievementKey::EnemMaster,      name: "ENEM Specialist",      description: "Complete 5 ENEM decks.",                 icon: "✍️", criterion: Criterion::CourseCompleted(Course::Enem, 5) },
    AchievementDef { key: AchievementKey::OabMaster,       name: "OAB Specialist",       description: "Complete 5 OAB decks.",                  icon: "⚖️", criterion: Criterion::CourseCompleted(Course::Oab, 5) },
    AchievementDef { key: AchievementKey::MedMaster,       name: "Medicine Specialist",  description: "Complete 5 Medicine decks.",             icon: "🩺", criterion: Criterion::CourseCompleted(Course::Medicina, 5) },
];

pub fn definition(key: AchievementKey) -> Option<&'static AchievementDef> {
    CATALOG.iter().find(|def| def.key == key)
}

/// Unlock every catalog entry whose criterion now holds and that the profile
/// does not have yet. Returns only the keys added by this call; an empty set
/// means the profile does not need to be written.
pub fn check_and_unlock(profile: &mut Profile, decks: &[Deck]) -> BTreeSet<AchievementKey> {
    let mut unlocked = BTreeSet::new();
    for def in CATALOG {
        if profile.has_achievement(def.key) {
            continue;
        }
        if def.criterion.is_met(profile, decks) {
            profile.achievements.insert(def.key);
            unlocked.insert(def.key);
        }
    }
    unlocked
}
