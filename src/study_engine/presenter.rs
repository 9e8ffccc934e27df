use serde_json::{json, Value};

use crate::study_engine::{
    achievements::CATALOG,
    duel::{role_of, standing_for},
    models::{Deck, DeckStatus, Duel, DuelOutcome, DuelStanding, Profile},
    progression::xp_progress,
};

/// Score at or above which a result is shown as a pass.
pub const PASS_MARK: u32 = 6;

fn score_text(score: Option<u32>, max: u32) -> String {
    match score {
        Some(s) => format!("{s} / {max}"),
        None    => "Pending".to_string(),
    }
}

fn score_tone(score: Option<u32>) -> &'static str {
    match score {
        Some(s) if s >= PASS_MARK => "pass",
        Some(_)                   => "fail",
        None                      => "neutral",
    }
}

fn standing_key(standing: DuelStanding) -> &'static str {
    match standing {
        DuelStanding::AwaitingYou                    => "awaiting_you",
        DuelStanding::AwaitingOpponent               => "awaiting_opponent",
        DuelStanding::Resolved(DuelOutcome::Win)     => "win",
        DuelStanding::Resolved(DuelOutcome::Loss)    => "loss",
        DuelStanding::Resolved(DuelOutcome::Draw)    => "draw",
    }
}

/// Profile header: level, whole xp, credits and the xp bar.
pub fn profile_header(profile: &Profile, email: &str) -> Value {
    let progress = xp_progress(profile);
    json!({
        "email":    email,
        "level":    profile.level,
        "xp":       profile.xp.floor() as u64,
        "xpNext":   progress.xp_next,
        "progress": progress.percent,
        "credits":  profile.credits,
    })
}

/// One history entry in the deck list.
pub fn deck_card(deck: &Deck) -> Value {
    json!({
        "id":        deck.id,
        "name":      deck.name,
        "course":    deck.course.to_string(),
        "createdAt": deck.created_at.to_rfc3339(),
        "scoreText": score_text(deck.score, deck.max_score()),
        "tone":      score_tone(deck.score),
        "redone":    deck.status == Some(DeckStatus::Redone),
    })
}

/// Duel card from `viewer`'s side. `None` if the viewer is not a party.
pub fn duel_card(duel: &Duel, viewer: &str) -> Option<Value> {
    let role = role_of(duel, viewer)?;
    let standing = standing_for(duel, viewer)?;
    let me = duel.party(role);
    let enemy = duel.party(role.other());
    Some(json!({
        "id":         duel.id,
        "course":     duel.course.to_string(),
        "versus":     enemy.identity,
        "myScore":    me.score,
        "enemyScore": enemy.score,
        "standing":   standing_key(standing),
        "canPlay":    standing == DuelStanding::AwaitingYou,
    }))
}

/// Full achievement grid with unlocked flags.
pub fn achievement_grid(profile: &Profile) -> Value {
    let cards: Vec<Value> = CATALOG
        .iter()
        .map(|def| {
            json!({
                "key":         def.key,
                "name":        def.name,
                "description": def.description,
                "icon":        def.icon,
                "unlocked":    profile.has_achievement(def.key),
            })
        })
        .collect();
    Value::Array(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study_engine::achievements::AchievementKey;
    use crate::study_engine::models::{Course, DuelStatus, Party, PlayStatus};

    #[test]
    fn header_reports_xp_bar() {
        let mut p = Profile::default();
        p.xp = 25.7;
        let v = profile_header(&p, "ana@example.com");
        assert_eq!(v["xp"], 25);
        assert_eq!(v["xpNext"], 100);
        assert_eq!(v["credits"], 15);
    }

    #[test]
    fn deck_card_marks_redone_and_pending() {
        let mut deck = Deck {
            id: "DK-1".into(),
            name: "Clinics".into(),
            course: Course::Medicina,
            questions: Vec::new(),
            created_at: chrono::Utc::now(),
            score: None,
            status: None,
            is_redo: false,
        };
        assert_eq!(deck_card(&deck)["scoreText"], "Pending");
        assert_eq!(deck_card(&deck)["redone"], false);
        deck.score = Some(7);
        deck.status = Some(DeckStatus::Redone);
        let v = deck_card(&deck);
        assert_eq!(v["tone"], "pass");
        assert_eq!(v["redone"], true);
        assert_eq!(v["course"], "Medicina");
    }

    #[test]
    fn duel_card_is_from_viewer_side() {
        let duel = Duel {
            id: "DU-1".into(),
            course: Course::Enem,
            created_at: chrono::Utc::now(),
            questions: Vec::new(),
            challenger: Party { identity: "ana@example.com".into(), score: Some(7), play_status: PlayStatus::Completed },
            opponent: Party { identity: "bia@example.com".into(), score: Some(5), play_status: PlayStatus::Completed },
            status: DuelStatus::Finished,
        };
        let v = duel_card(&duel, "bia@example.com").unwrap();
        assert_eq!(v["myScore"], 5);
        assert_eq!(v["enemyScore"], 7);
        assert_eq!(v["standing"], "loss");
        assert_eq!(v["canPlay"], false);
        assert!(duel_card(&duel, "eve@example.com").is_none());
    }

    #[test]
    fn pending_side_reads_awaiting_you() {
        let duel = Duel {
            id: "DU-2".into(),
            course: Course::Prf,
            created_at: chrono::Utc::now(),
            questions: Vec::new(),
            challenger: Party { identity: "ana@example.com".into(), score: Some(4), play_status: PlayStatus::Completed },
            opponent: Party::pending("bia@example.com"),
            status: DuelStatus::Active,
        };
        let bia = duel_card(&duel, "bia@example.com").unwrap();
        assert_eq!(bia["standing"], "awaiting_you");
        assert_eq!(bia["canPlay"], true);
        let ana = duel_card(&duel, "ana@example.com").unwrap();
        assert_eq!(ana["standing"], "awaiting_opponent");
    }

    #[test]
    fn grid_lists_whole_catalog() {
        let mut p = Profile::default();
        p.achievements.insert(AchievementKey::FirstDeck);
        let grid = achievement_grid(&p);
        let cards = grid.as_array().unwrap();
        assert_eq!(cards.len(), CATALOG.len());
        assert_eq!(cards[0]["key"], "firstDeck");
        assert_eq!(cards[0]["unlocked"], true);
        assert_eq!(cards[1]["unlocked"], false);
    }
}
