//! In-progress quiz: the deck being played, the answer sheet, and the
//! countdown.
//!
//! The countdown is driven by the caller (one `tick()` per elapsed second).
//! When it reaches zero the sheet freezes and further selections are
//! rejected, but nothing is submitted automatically: the caller still has to
//! submit the answers.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::study_engine::{
    error::{StudyError, StudyResult},
    helpers::clock_str,
    models::{Deck, Role, ScoringMode},
};

pub const QUIZ_DURATION_SECS: u32 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEvent {
    Running(u32),
    Expired,
    /// Tick after expiry; nothing changes.
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizTimer {
    remaining: u32,
    expired: bool,
}

impl QuizTimer {
    pub fn new(duration_secs: u32) -> Self {
        QuizTimer {
            remaining: duration_secs,
            expired: duration_secs == 0,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Advance one second. Reports `Expired` exactly once.
    pub fn tick(&mut self) -> TimerEvent {
        if self.expired {
            return TimerEvent::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            TimerEvent::Expired
        } else {
            TimerEvent::Running(self.remaining)
        }
    }

    pub fn display(&self) -> String {
        clock_str(self.remaining)
    }
}

impl Default for QuizTimer {
    fn default() -> Self {
        QuizTimer::new(QUIZ_DURATION_SECS)
    }
}

/// Selected option per question, in question order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSheet {
    answers: Vec<Option<String>>,
    frozen: bool,
}

impl AnswerSheet {
    pub fn new(question_count: usize) -> Self {
        AnswerSheet {
            answers: vec![None; question_count],
            frozen: false,
        }
    }

    pub fn answers(&self) -> &[Option<String>] {
        &self.answers
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    fn set(&mut self, index: usize, answer: Option<String>) -> StudyResult<()> {
        if self.frozen {
            return Err(StudyError::validation("time is up; answers can no longer change"));
        }
        let slot = self.answers.get_mut(index).ok_or_else(|| {
            StudyError::validation(format!("question {index} does not exist"))
        })?;
        *slot = answer;
        Ok(())
    }
}

/// What a play-through is for, which decides how it is scored and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizMode {
    /// First play of a freshly generated deck.
    Fresh,
    /// Reshuffled replay of a stored deck; overwrites its score.
    Redo,
    /// One party's turn in a duel.
    Duel { duel_id: String, role: Role },
}

impl QuizMode {
    pub fn scoring(&self) -> ScoringMode {
        match self {
            QuizMode::Fresh | QuizMode::Redo => ScoringMode::Penalized,
            QuizMode::Duel { .. }            => ScoringMode::CorrectOnly,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveQuiz {
    pub deck: Deck,
    pub mode: QuizMode,
    pub sheet: AnswerSheet,
    pub timer: QuizTimer,
}

impl ActiveQuiz {
    pub fn new(deck: Deck, mode: QuizMode, duration_secs: u32) -> Self {
        let sheet = AnswerSheet::new(deck.questions.len());
        ActiveQuiz {
            deck,
            mode,
            sheet,
            timer: QuizTimer::new(duration_secs),
        }
    }

    /// Pick `option` for question `index`. The option must belong to it.
    pub fn select(&mut self, index: usize, option: &str) -> StudyResult<()> {
        let question = self.deck.questions.get(index).ok_or_else(|| {
            StudyError::validation(format!("question {index} does not exist"))
        })?;
        if !question.has_option(option) {
            return Err(StudyError::validation(format!(
                "\"{option}\" is not an option of question {index}"
            )));
        }
        self.sheet.set(index, Some(option.to_string()))
    }

    pub fn clear(&mut self, index: usize) -> StudyResult<()> {
        self.sheet.set(index, None)
    }

    /// Advance the countdown; freezes the sheet on expiry.
    pub fn tick(&mut self) -> TimerEvent {
        let event = self.timer.tick();
        if event == TimerEvent::Expired {
            self.sheet.freeze();
            debug!(deck_id = %self.deck.id, "quiz time expired; answers frozen");
        }
        event
    }

    /// Submission is always allowed; after expiry it is the only thing left to do.
    pub fn must_submit(&self) -> bool {
        self.timer.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study_engine::models::{Course, Question};

    fn quiz(duration: u32) -> ActiveQuiz {
        let deck = Deck {
            id: "DK-00000001".into(),
            name: "Traffic law".into(),
            course: Course::Prf,
            questions: vec![Question::new("Speed limit?", ["60", "80", "100", "110"], "80"); 3],
            created_at: chrono::Utc::now(),
            score: None,
            status: None,
            is_redo: false,
        };
        ActiveQuiz::new(deck, QuizMode::Fresh, duration)
    }

    #[test]
    fn timer_counts_down_and_expires_once() {
        let mut t = QuizTimer::new(3);
        assert_eq!(t.tick(), TimerEvent::Running(2));
        assert_eq!(t.tick(), TimerEvent::Running(1));
        assert_eq!(t.tick(), TimerEvent::Expired);
        assert_eq!(t.tick(), TimerEvent::Idle);
        assert!(t.is_expired());
        assert_eq!(t.remaining(), 0);
    }

    #[test]
    fn default_timer_is_fifteen_minutes() {
        let t = QuizTimer::default();
        assert_eq!(t.display(), "15:00");
    }

    #[test]
    fn selection_must_be_an_option() {
        let mut q = quiz(10);
        assert!(q.select(0, "80").is_ok());
        assert!(q.select(0, "90").is_err());
        assert!(q.select(7, "80").is_err());
        assert_eq!(q.sheet.answered(), 1);
    }

    #[test]
    fn expiry_freezes_answers_but_does_not_submit() {
        let mut q = quiz(2);
        q.select(1, "60").unwrap();
        assert_eq!(q.tick(), TimerEvent::Running(1));
        assert_eq!(q.tick(), TimerEvent::Expired);
        assert!(q.must_submit());
        assert!(q.sheet.is_frozen());
        assert!(q.select(2, "80").is_err());
        assert!(q.clear(1).is_err());
        assert_eq!(q.sheet.answers()[1].as_deref(), Some("60"));
        assert!(q.deck.is_pending());
    }

    #[test]
    fn duel_mode_scores_without_penalty() {
        let mode = QuizMode::Duel { duel_id: "DU-1".into(), role: Role::Opponent };
        assert_eq!(mode.scoring(), ScoringMode::CorrectOnly);
        assert_eq!(QuizMode::Redo.scoring(), ScoringMode::Penalized);
    }
}
