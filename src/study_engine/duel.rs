//! Two-party duel state machine.
//!
//! Each party moves `Pending -> Completed` on its own when its score is
//! recorded; neither transition waits on the other. What a viewer sees
//! (`AwaitingYou`, `AwaitingOpponent`, `Resolved`) is derived from both
//! parties at read time, so the stored `status` field is only a cache of
//! that derivation and never the source of truth.

use std::cmp::Ordering;

use rand::Rng;
use tracing::debug;

use crate::study_engine::{
    deck::{validate_questions, OPTIONS_PER_QUESTION},
    error::{StudyError, StudyResult},
    helpers::make_record_id,
    models::{
        normalize_identity, Course, Deck, Duel, DuelOutcome, DuelStanding, DuelStatus, Party,
        PlayStatus, Question, Role,
    },
};

/// Build a new duel with both parties pending and an immutable shared
/// question set. The challenger's credits were already reserved.
pub fn create_duel<R: Rng>(
    rng: &mut R,
    challenger: &str,
    opponent: &str,
    course: Course,
    questions: Vec<Question>,
) -> StudyResult<Duel> {
    let challenger = normalize_identity(challenger);
    let opponent = normalize_identity(opponent);
    if challenger.is_empty() || opponent.is_empty() {
        return Err(StudyError::validation("both duel parties need an identity"));
    }
    if challenger == opponent {
        return Err(StudyError::validation("you cannot challenge yourself"));
    }
    validate_questions(&questions, OPTIONS_PER_QUESTION)?;

    let questions = questions
        .into_iter()
        .map(|mut q| {
            q.user_answer = None;
            q
        })
        .collect();

    Ok(Duel {
        id: make_record_id("DU", rng),
        course,
        created_at: chrono::Utc::now(),
        questions,
        challenger: Party::pending(challenger),
        opponent: Party::pending(opponent),
        status: DuelStatus::Active,
    })
}

/// Which side of the duel `identity` plays, if any.
pub fn role_of(duel: &Duel, identity: &str) -> Option<Role> {
    let identity = normalize_identity(identity);
    if normalize_identity(&duel.challenger.identity) == identity {
        Some(Role::Challenger)
    } else if normalize_identity(&duel.opponent.identity) == identity {
        Some(Role::Opponent)
    } else {
        None
    }
}

/// Set `role`'s score and mark it completed. The other party is untouched.
///
/// A party can only be scored once; replaying a completed side is rejected.
pub fn record_party_score(duel: &mut Duel, role: Role, score: u32) -> StudyResult<()> {
    let max = duel.questions.len() as u32;
    if score > max {
        return Err(StudyError::validation(format!(
            "score {score} exceeds the {max} questions of duel {}",
            duel.id
        )));
    }
    if duel.party(role).is_completed() {
        return Err(StudyError::validation(format!(
            "{role} already played duel {}",
            duel.id
        )));
    }
    let party = duel.party_mut(role);
    party.score = Some(score);
    party.play_status = PlayStatus::Completed;
    refresh_status(duel);
    debug!(duel_id = %duel.id, %role, score, "duel party scored");
    Ok(())
}

/// True once both parties have completed.
pub fn is_resolved(duel: &Duel) -> bool {
    duel.challenger.is_completed() && duel.opponent.is_completed()
}

/// Bring the cached `status` in line with the parties.
pub fn refresh_status(duel: &mut Duel) {
    duel.status = if is_resolved(duel) {
        DuelStatus::Finished
    } else {
        DuelStatus::Active
    };
}

/// Outcome for `role` once both scores are in. Higher score wins.
pub fn outcome_for(duel: &Duel, role: Role) -> Option<DuelOutcome> {
    if !is_resolved(duel) {
        return None;
    }
    let mine = duel.party(role).score.unwrap_or(0);
    let theirs = duel.party(role.other()).score.unwrap_or(0);
    Some(match mine.cmp(&theirs) {
        Ordering::Greater => DuelOutcome::Win,
        Ordering::Less    => DuelOutcome::Loss,
        Ordering::Equal   => DuelOutcome::Draw,
    })
}

/// Display state of `duel` for `identity`; `None` if they are not a party.
pub fn standing_for(duel: &Duel, identity: &str) -> Option<DuelStanding> {
    let role = role_of(duel, identity)?;
    if !duel.party(role).is_completed() {
        return Some(DuelStanding::AwaitingYou);
    }
    match outcome_for(duel, role) {
        Some(outcome) => Some(DuelStanding::Resolved(outcome)),
        None          => Some(DuelStanding::AwaitingOpponent),
    }
}

/// Duels where `identity` is either party, newest first, with the cached
/// status refreshed.
pub fn filter_duels_for_identity(all: &[Duel], identity: &str) -> Vec<Duel> {
    let mut mine: Vec<Duel> = all
        .iter()
        .filter(|d| role_of(d, identity).is_some())
        .cloned()
        .map(|mut d| {
            refresh_status(&mut d);
            d
        })
        .collect();
    mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    mine
}

/// Playable deck over the duel's shared questions, for `role`'s turn.
///
/// The deck carries the duel's ID; it is scored with
/// [`ScoringMode::CorrectOnly`](crate::study_engine::models::ScoringMode) and
/// never stored as personal history.
pub fn play_deck(duel: &Duel, role: Role) -> StudyResult<Deck> {
    if duel.party(role).is_completed() {
        return Err(StudyError::validation(format!(
            "{role} already played duel {}",
            duel.id
        )));
    }
    let mut questions = duel.questions.clone();
    for q in &mut questions {
        q.user_answer = None;
    }
    Ok(Deck {
        id: duel.id.clone(),
        name: format!("Duel {}", duel.course),
        course: duel.course,
        questions,
        created_at: duel.created_at,
        score: None,
        status: None,
        is_redo: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn questions() -> Vec<Question> {
        (0..10)
            .map(|i| Question::new(format!("Q{i}"), ["w", "x", "y", "z"], "y"))
            .collect()
    }

    fn duel(challenger: &str, opponent: &str) -> Duel {
        let seed = challenger.len() as u64 * 31 + opponent.len() as u64;
        seeded_duel(challenger, opponent, seed)
    }

    fn seeded_duel(challenger: &str, opponent: &str, seed: u64) -> Duel {
        let mut rng = StdRng::seed_from_u64(seed);
        create_duel(&mut rng, challenger, opponent, Course::Prf, questions()).unwrap()
    }

    #[test]
    fn new_duel_has_both_parties_pending() {
        let d = duel("ana@example.com", "bia@example.com");
        assert!(d.id.starts_with("DU-"));
        assert_eq!(d.status, DuelStatus::Active);
        for role in [Role::Challenger, Role::Opponent] {
            assert_eq!(d.party(role).score, None);
            assert_eq!(d.party(role).play_status, PlayStatus::Pending);
        }
    }

    #[test]
    fn self_challenge_is_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = create_duel(&mut rng, "Ana@Example.com", " ana@example.com", Course::Enem, questions())
            .unwrap_err();
        assert!(matches!(err, StudyError::Validation(_)));
    }

    #[test]
    fn recording_one_party_leaves_the_other_pending() {
        let mut d = duel("ana@example.com", "bia@example.com");
        record_party_score(&mut d, Role::Opponent, 4).unwrap();
        assert!(d.opponent.is_completed());
        assert!(!d.challenger.is_completed());
        assert_eq!(d.status, DuelStatus::Active);
        assert_eq!(standing_for(&d, "bia@example.com"), Some(DuelStanding::AwaitingOpponent));
        assert_eq!(standing_for(&d, "ana@example.com"), Some(DuelStanding::AwaitingYou));
    }

    #[test]
    fn higher_score_wins() {
        let mut d = duel("ana@example.com", "bia@example.com");
        record_party_score(&mut d, Role::Challenger, 7).unwrap();
        record_party_score(&mut d, Role::Opponent, 5).unwrap();
        assert_eq!(d.status, DuelStatus::Finished);
        assert_eq!(outcome_for(&d, Role::Challenger), Some(DuelOutcome::Win));
        assert_eq!(outcome_for(&d, Role::Opponent), Some(DuelOutcome::Loss));
        assert_eq!(
            standing_for(&d, "bia@example.com"),
            Some(DuelStanding::Resolved(DuelOutcome::Loss))
        );
    }

    #[test]
    fn equal_scores_draw() {
        let mut d = duel("ana@example.com", "bia@example.com");
        record_party_score(&mut d, Role::Challenger, 6).unwrap();
        record_party_score(&mut d, Role::Opponent, 6).unwrap();
        assert_eq!(outcome_for(&d, Role::Challenger), Some(DuelOutcome::Draw));
        assert_eq!(outcome_for(&d, Role::Opponent), Some(DuelOutcome::Draw));
    }

    #[test]
    fn party_cannot_play_twice() {
        let mut d = duel("ana@example.com", "bia@example.com");
        record_party_score(&mut d, Role::Challenger, 3).unwrap();
        assert!(record_party_score(&mut d, Role::Challenger, 9).is_err());
        assert_eq!(d.challenger.score, Some(3));
        assert!(play_deck(&d, Role::Challenger).is_err());
        assert!(play_deck(&d, Role::Opponent).is_ok());
    }

    #[test]
    fn score_above_question_count_is_rejected() {
        let mut d = duel("ana@example.com", "bia@example.com");
        assert!(record_party_score(&mut d, Role::Opponent, 11).is_err());
        assert!(!d.opponent.is_completed());
    }

    #[test]
    fn filter_keeps_own_duels_newest_first() {
        let now = Utc::now();
        let mut old = seeded_duel("ana@example.com", "bia@example.com", 1);
        old.created_at = now - Duration::hours(2);
        let mut newer = seeded_duel("carl@example.com", "ana@example.com", 2);
        newer.created_at = now - Duration::hours(1);
        let mut other = seeded_duel("carl@example.com", "bia@example.com", 3);
        other.created_at = now;

        let all = vec![old.clone(), other, newer.clone()];
        let mine = filter_duels_for_identity(&all, "ANA@example.com");
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].created_at, newer.created_at);
        assert_eq!(mine[1].created_at, old.created_at);
    }

    #[test]
    fn filter_refreshes_stale_status() {
        let mut d = duel("ana@example.com", "bia@example.com");
        d.challenger.score = Some(2);
        d.challenger.play_status = PlayStatus::Completed;
        d.opponent.score = Some(8);
        d.opponent.play_status = PlayStatus::Completed;
        d.status = DuelStatus::Active;
        let mine = filter_duels_for_identity(&[d], "ana@example.com");
        assert_eq!(mine[0].status, DuelStatus::Finished);
    }

    #[test]
    fn outsider_has_no_standing() {
        let d = duel("ana@example.com", "bia@example.com");
        assert_eq!(standing_for(&d, "eve@example.com"), None);
    }
}
