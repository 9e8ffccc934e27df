//! Question-set generator contract.
//!
//! The generator itself (prompting a language model, talking to its API) lives
//! outside this crate. This module defines the seam, the JSON payload shape a
//! generator hands back, and the checks that turn an unusable result into a
//! [`StudyError::Generation`] instead of a degenerate deck.

use serde::Deserialize;

use crate::study_engine::{
    deck::{validate_questions, OPTIONS_PER_QUESTION},
    error::{StudyError, StudyResult},
    models::{Course, Question},
};

/// Produces the questions for a new deck or duel.
pub trait QuestionGenerator {
    /// `deck_label` is the user's deck name (or a duel label); the result must
    /// be a complete, ordered question set.
    fn generate(&self, deck_label: &str, course: Course) -> StudyResult<Vec<Question>>;
}

impl<F> QuestionGenerator for F
where
    F: Fn(&str, Course) -> StudyResult<Vec<Question>>,
{
    fn generate(&self, deck_label: &str, course: Course) -> StudyResult<Vec<Question>> {
        self(deck_label, course)
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedPayload {
    #[serde(default)]
    questions: Vec<Question>,
}

/// Parse `{"questions":[{"question": ..., "options": [...], "answer": ...}]}`.
pub fn parse_generated_questions(json: &str, expected: usize) -> StudyResult<Vec<Question>> {
    let payload: GeneratedPayload = serde_json::from_str(json)
        .map_err(|e| StudyError::generation(format!("unreadable payload: {e}")))?;
    check_generated(payload.questions, expected)
}

/// Reject empty, short, long or malformed question sets as generation
/// failures. Any `userAnswer` the generator filled in is dropped.
pub fn check_generated(questions: Vec<Question>, expected: usize) -> StudyResult<Vec<Question>> {
    if questions.is_empty() {
        return Err(StudyError::generation("no questions were returned"));
    }
    if questions.len() != expected {
        return Err(StudyError::generation(format!(
            "expected {expected} questions, got {}",
            questions.len()
        )));
    }
    validate_questions(&questions, OPTIONS_PER_QUESTION).map_err(|e| match e {
        StudyError::Validation(msg) => StudyError::generation(msg),
        other => other,
    })?;
    Ok(questions
        .into_iter()
        .map(|q| Question { user_answer: None, ..q })
        .collect())
}
