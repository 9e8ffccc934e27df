use rand::Rng;
use tracing::debug;

use crate::study_engine::{
    error::{StudyError, StudyResult},
    helpers::{make_record_id, shuffle},
    models::{Course, Deck, DeckStatus, Question, ScoreSummary, ScoringMode},
};

pub const OPTIONS_PER_QUESTION: usize = 4;

/// Check one question: non-empty text, `options_per_question` distinct
/// non-empty options, and a correct answer that is exactly one of them.
pub fn validate_question(q: &Question, options_per_question: usize) -> StudyResult<()> {
    if q.text.trim().is_empty() {
        return Err(StudyError::validation("question text is empty"));
    }
    if q.options.len() != options_per_question {
        return Err(StudyError::validation(format!(
            "expected {options_per_question} options, got {} for \"{}\"",
            q.options.len(),
            q.text
        )));
    }
    for (i, opt) in q.options.iter().enumerate() {
        if opt.trim().is_empty() {
            return Err(StudyError::validation(format!("empty option in \"{}\"", q.text)));
        }
        if q.options[..i].contains(opt) {
            return Err(StudyError::validation(format!(
                "duplicate option \"{opt}\" in \"{}\"",
                q.text
            )));
        }
    }
    if !q.has_option(&q.correct_answer) {
        return Err(StudyError::validation(format!(
            "correct answer \"{}\" is not one of the options of \"{}\"",
            q.correct_answer, q.text
        )));
    }
    Ok(())
}

pub fn validate_questions(questions: &[Question], options_per_question: usize) -> StudyResult<()> {
    if questions.is_empty() {
        return Err(StudyError::validation("a deck needs at least one question"));
    }
    questions
        .iter()
        .try_for_each(|q| validate_question(q, options_per_question))
}

/// Build a new pending deck from generated questions. The credit spend has
/// already been authorized by the caller.
pub fn create_deck<R: Rng>(
    rng: &mut R,
    name: &str,
    course: Course,
    questions: Vec<Question>,
) -> StudyResult<Deck> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StudyError::validation("deck name is empty"));
    }
    validate_questions(&questions, OPTIONS_PER_QUESTION)?;

    let questions = questions
        .into_iter()
        .map(|q| Question { user_answer: None, ..q })
        .collect();

    Ok(Deck {
        id: make_record_id("DK", rng),
        name: name.to_string(),
        course,
        questions,
        created_at: chrono::Utc::now(),
        score: None,
        status: None,
        is_redo: false,
    })
}

/// Fresh play-through of an existing deck: deep copy, each question's options
/// shuffled independently, answers and score cleared, flagged as a redo.
///
/// The copy keeps the original ID so completing it overwrites the stored deck.
pub fn start_redo<R: Rng>(deck: &Deck, rng: &mut R) -> Deck {
    let mut copy = deck.clone();
    for q in &mut copy.questions {
        shuffle(&mut q.options, rng);
        q.user_answer = None;
    }
    copy.score = None;
    copy.is_redo = true;
    debug!(deck_id = %copy.id, "redo started");
    copy
}

/// Grade `submitted` against the deck and record each answer on its question.
///
/// `correct` counts exact matches, `wrong` counts given answers that do not
/// match; unanswered questions count toward neither. The score formula
/// depends on the mode and the difference is intentional: personal decks
/// subtract wrong answers (never below zero), duel play-throughs do not.
pub fn score_deck(
    deck: &mut Deck,
    submitted: &[Option<String>],
    mode: ScoringMode,
) -> StudyResult<ScoreSummary> {
    if submitted.len() != deck.questions.len() {
        return Err(StudyError::validation(format!(
            "{} answers submitted for {} questions",
            submitted.len(),
            deck.questions.len()
        )));
    }

    let mut correct = 0u32;
    let mut wrong = 0u32;
    for (q, answer) in deck.questions.iter_mut().zip(submitted) {
        q.user_answer = answer.clone();
        match answer {
            Some(a) if *a == q.correct_answer => correct += 1,
            Some(_) => wrong += 1,
            None => {}
        }
    }

    let score = match mode {
        ScoringMode::Penalized   => correct.saturating_sub(wrong),
        ScoringMode::CorrectOnly => correct,
    };
    Ok(ScoreSummary { score, correct, wrong })
}

/// Store the graded score on the deck. A redo copy is tagged `Redone` and
/// loses its in-memory redo flag, ready to overwrite the stored deck.
pub fn finish_play(deck: &mut Deck, summary: &ScoreSummary) {
    deck.score = Some(summary.score);
    if deck.is_redo {
        deck.status = Some(DeckStatus::Redone);
        deck.is_redo = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    format!("Question {i}"),
                    [format!("A{i}"), format!("B{i}"), format!("C{i}"), format!("D{i}")],
                    format!("C{i}"),
                )
            })
            .collect()
    }

    fn pattern(deck: &Deck, correct: usize, wrong: usize) -> Vec<Option<String>> {
        deck.questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                if i < correct {
                    Some(q.correct_answer.clone())
                } else if i < correct + wrong {
                    q.options.iter().find(|o| **o != q.correct_answer).cloned()
                } else {
                    None
                }
            })
            .collect()
    }

    fn new_deck() -> Deck {
        let mut rng = StdRng::seed_from_u64(1);
        create_deck(&mut rng, "Networks", Course::Serpro, questions(10)).unwrap()
    }

    #[test]
    fn created_deck_is_pending() {
        let deck = new_deck();
        assert!(deck.is_pending());
        assert!(deck.id.starts_with("DK-"));
        assert_eq!(deck.questions.len(), 10);
        assert!(deck.status.is_none());
    }

    #[test]
    fn answer_outside_options_is_rejected() {
        let mut qs = questions(10);
        qs[3].correct_answer = "Z".into();
        let mut rng = StdRng::seed_from_u64(1);
        let err = create_deck(&mut rng, "x", Course::Oab, qs).unwrap_err();
        assert!(matches!(err, StudyError::Validation(_)));
    }

    #[test]
    fn duplicate_options_are_rejected() {
        let mut qs = questions(2);
        qs[0].options[1] = qs[0].options[0].clone();
        assert!(validate_questions(&qs, OPTIONS_PER_QUESTION).is_err());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(create_deck(&mut rng, "   ", Course::Oab, questions(10)).is_err());
    }

    #[test]
    fn personal_score_subtracts_wrong_answers() {
        let mut deck = new_deck();
        let answers = pattern(&deck, 6, 2);
        let s = score_deck(&mut deck, &answers, ScoringMode::Penalized).unwrap();
        assert_eq!(s, ScoreSummary { score: 4, correct: 6, wrong: 2 });
    }

    #[test]
    fn duel_score_counts_only_correct_answers() {
        let mut deck = new_deck();
        let answers = pattern(&deck, 6, 2);
        let s = score_deck(&mut deck, &answers, ScoringMode::CorrectOnly).unwrap();
        assert_eq!(s, ScoreSummary { score: 6, correct: 6, wrong: 2 });
    }

    #[test]
    fn personal_score_never_goes_negative() {
        let mut deck = new_deck();
        let answers = pattern(&deck, 1, 9);
        let s = score_deck(&mut deck, &answers, ScoringMode::Penalized).unwrap();
        assert_eq!(s.score, 0);
    }

    #[test]
    fn scoring_records_user_answers() {
        let mut deck = new_deck();
        let answers = pattern(&deck, 2, 1);
        score_deck(&mut deck, &answers, ScoringMode::Penalized).unwrap();
        assert_eq!(deck.questions[0].user_answer, answers[0]);
        assert_eq!(deck.questions[9].user_answer, None);
    }

    #[test]
    fn answer_count_mismatch_is_rejected() {
        let mut deck = new_deck();
        let err = score_deck(&mut deck, &[None, None], ScoringMode::Penalized).unwrap_err();
        assert!(matches!(err, StudyError::Validation(_)));
    }

    #[test]
    fn redo_keeps_correct_answer_per_question() {
        let mut original = new_deck();
        let answers = pattern(&original, 10, 0);
        let s = score_deck(&mut original, &answers, ScoringMode::Penalized).unwrap();
        finish_play(&mut original, &s);

        let mut rng = StdRng::seed_from_u64(2024);
        let redo = start_redo(&original, &mut rng);
        assert!(redo.is_redo);
        assert!(redo.is_pending());
        assert_eq!(redo.id, original.id);

        let mut any_moved = false;
        for (before, after) in original.questions.iter().zip(&redo.questions) {
            assert_eq!(before.text, after.text);
            assert_eq!(before.correct_answer, after.correct_answer);
            assert!(after.has_option(&after.correct_answer));
            assert!(after.user_answer.is_none());
            let mut a = before.options.clone();
            let mut b = after.options.clone();
            if a != b {
                any_moved = true;
            }
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
        assert!(any_moved, "ten 4-option shuffles should move at least one option");
        // Original untouched.
        assert_eq!(original.score, Some(10));
    }

    #[test]
    fn finished_redo_is_tagged_redone() {
        let deck = new_deck();
        let mut rng = StdRng::seed_from_u64(5);
        let mut redo = start_redo(&deck, &mut rng);
        let answers = pattern(&redo, 7, 0);
        let s = score_deck(&mut redo, &answers, ScoringMode::Penalized).unwrap();
        finish_play(&mut redo, &s);
        assert_eq!(redo.score, Some(7));
        assert_eq!(redo.status, Some(DeckStatus::Redone));
        assert!(!redo.is_redo);
    }
}
