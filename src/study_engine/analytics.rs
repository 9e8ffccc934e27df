//! Performance statistics over completed decks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::study_engine::models::{Course, Deck};

/// Number of most recent completed decks shown in the evolution series.
pub const EVOLUTION_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourseAverage {
    pub decks: usize,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPoint {
    pub created_at: DateTime<Utc>,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub completed: usize,
    pub average_score: f64,
    pub by_course: BTreeMap<Course, CourseAverage>,
    /// Oldest first.
    pub evolution: Vec<EvolutionPoint>,
}

/// Summarize `decks` (newest first, as the store returns them). `None` when
/// nothing has been completed yet.
pub fn snapshot(decks: &[Deck]) -> Option<PerformanceSnapshot> {
    let completed: Vec<(&Deck, u32)> = decks
        .iter()
        .filter_map(|d| d.score.map(|s| (d, s)))
        .collect();
    if completed.is_empty() {
        return None;
    }

    let total: u32 = completed.iter().map(|(_, s)| s).sum();
    let average_score = total as f64 / completed.len() as f64;

    let mut sums: BTreeMap<Course, (usize, u32)> = BTreeMap::new();
    for (deck, score) in &completed {
        let entry = sums.entry(deck.course).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += score;
    }
    let by_course = sums
        .into_iter()
        .map(|(course, (n, sum))| {
            (course, CourseAverage { decks: n, average: sum as f64 / n as f64 })
        })
        .collect();

    let mut recent: Vec<&(&Deck, u32)> = completed.iter().collect();
    recent.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));
    let mut evolution: Vec<EvolutionPoint> = recent
        .into_iter()
        .take(EVOLUTION_WINDOW)
        .map(|(d, s)| EvolutionPoint { created_at: d.created_at, score: *s })
        .collect();
    evolution.reverse();

    Some(PerformanceSnapshot {
        completed: completed.len(),
        average_score,
        by_course,
        evolution,
    })
}
