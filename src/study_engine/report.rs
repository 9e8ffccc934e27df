//! AI performance report.
//!
//! The report is produced by an opaque external service that may run several
//! round trips (including web search) before answering. Whatever happens
//! inside, this crate only sees one result: a report or a
//! [`StudyError::Generation`].

use serde::{Deserialize, Serialize};

use crate::study_engine::{
    analytics::PerformanceSnapshot,
    error::{StudyError, StudyResult},
    models::{Course, Deck},
};

/// Most recent completed decks sent along with the snapshot.
pub const RECENT_DECKS_IN_REPORT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSummary {
    pub name: String,
    pub course: Course,
    pub score: u32,
    pub max_score: u32,
    /// Questions answered wrong, for topic extraction.
    pub missed_questions: Vec<String>,
}

impl DeckSummary {
    fn from_deck(deck: &Deck) -> Option<Self> {
        let score = deck.score?;
        let missed_questions = deck
            .questions
            .iter()
            .filter(|q| matches!(&q.user_answer, Some(a) if *a != q.correct_answer))
            .map(|q| q.text.clone())
            .collect();
        Some(DeckSummary {
            name: deck.name.clone(),
            course: deck.course,
            score,
            max_score: deck.max_score(),
            missed_questions,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub snapshot: PerformanceSnapshot,
    pub recent: Vec<DeckSummary>,
}

impl ReportRequest {
    /// Build from the decks newest first; only completed decks are included.
    pub fn new(snapshot: PerformanceSnapshot, decks: &[Deck]) -> Self {
        let recent = decks
            .iter()
            .filter_map(DeckSummary::from_deck)
            .take(RECENT_DECKS_IN_REPORT)
            .collect();
        ReportRequest { snapshot, recent }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNote {
    pub topic: String,
    pub course: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySuggestion {
    pub topic: String,
    pub suggestion: String,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub motivational_summary: String,
    pub strengths: Vec<TopicNote>,
    pub weaknesses: Vec<TopicNote>,
    pub study_suggestions: Vec<StudySuggestion>,
}

impl PerformanceReport {
    /// A report without strengths or summary is treated as a failed generation.
    pub fn check(self) -> StudyResult<Self> {
        if self.strengths.is_empty() {
            return Err(StudyError::generation("report has no strengths section"));
        }
        if self.motivational_summary.trim().is_empty() {
            return Err(StudyError::generation("report has no summary"));
        }
        Ok(self)
    }
}

pub trait ReportGenerator {
    fn generate_report(&self, request: &ReportRequest) -> StudyResult<PerformanceReport>;
}
