//! End-to-end walkthrough of the study engine.
//!
//! Run with: `cargo run --example demo`
//! (`RUST_LOG=debug` shows ledger and store internals as well.)
//!
//! Two users share one in-memory store, the way two browser tabs share the
//! realtime backend:
//!
//! 1. **Ana** creates a deck, plays it, then redoes it for a perfect score.
//! 2. A failing generator shows the credit refund.
//! 3. Ana challenges **Bia** to a duel; both play and the result is derived.
//! 4. Ana buys a performance report.

use quiz_arena::study_engine::presenter::{achievement_grid, deck_card, duel_card, profile_header};
use quiz_arena::{
    Course, EconomyConfig, MemoryStore, PerformanceReport, Question, ReportGenerator,
    ReportRequest, StudyError, StudyResult, StudySession, UserIdentity,
};
use quiz_arena::study_engine::report::{StudySuggestion, TopicNote};
use tracing_subscriber::EnvFilter;

/// Canned stand-in for the language-model generator.
fn canned_questions(label: &str, course: Course) -> StudyResult<Vec<Question>> {
    Ok((1..=10)
        .map(|i| {
            Question::new(
                format!("[{course}] {label}: question {i}"),
                ["Option A", "Option B", "Option C", "Option D"],
                "Option B",
            )
        })
        .collect())
}

fn offline_generator(_label: &str, _course: Course) -> StudyResult<Vec<Question>> {
    Err(StudyError::generation("generator is offline"))
}

struct CannedReport;

impl ReportGenerator for CannedReport {
    fn generate_report(&self, request: &ReportRequest) -> StudyResult<PerformanceReport> {
        let course = request
            .recent
            .first()
            .map(|d| d.course.to_string())
            .unwrap_or_default();
        Ok(PerformanceReport {
            motivational_summary: format!(
                "{} decks done with an average of {:.1}. Keep it up!",
                request.snapshot.completed, request.snapshot.average_score
            ),
            strengths: vec![TopicNote { topic: "Constitutional principles".into(), course: course.clone() }],
            weaknesses: vec![TopicNote { topic: "Administrative acts".into(), course }],
            study_suggestions: vec![StudySuggestion {
                topic: "Administrative acts".into(),
                suggestion: "Summarize the five elements of an administrative act.".into(),
                link: None,
            }],
        })
    }
}

fn answer_all(session: &mut StudySession, pick: &str, first_n: usize) -> StudyResult<()> {
    for i in 0..first_n {
        session.select_answer(i, pick)?;
    }
    Ok(())
}

fn banner(title: &str) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  {title}");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = EconomyConfig { starting_credits: 60, ..EconomyConfig::default() };
    let store = MemoryStore::from_config(&config);
    let ana_id = UserIdentity::new("uid-ana", "ana@example.com");
    let bia_id = UserIdentity::new("uid-bia", "bia@example.com");

    let mut ana = StudySession::with_seed(config.clone(), 42);
    let mut bia = StudySession::with_seed(config, 7);
    ana.login(&store, ana_id.clone())?;
    bia.login(&store, bia_id)?;

    banner("1. Personal deck and redo");
    let created = ana.create_deck(&store, &canned_questions, "Constitutional law", Course::Oab)?;
    if let Some(quiz) = ana.active_quiz() {
        println!("  Playing {} ({} questions, {} on the clock)",
            quiz.deck.name, quiz.deck.questions.len(), quiz.timer.display());
    }
    answer_all(&mut ana, "Option B", 6)?;
    for i in 6..9 {
        ana.select_answer(i, "Option A")?;
    }
    let first = ana.submit_answers(&store)?;
    println!("  First play: {} correct, {} wrong -> score {}",
        first.summary.correct, first.summary.wrong, first.summary.score);

    ana.redo_deck(&created.deck_id)?;
    answer_all(&mut ana, "Option B", 10)?;
    let redo = ana.submit_answers(&store)?;
    println!("  Redo: score {} (+{} xp, level {})", redo.summary.score, redo.xp_earned, redo.level);
    for deck in ana.decks() {
        println!("  {}", deck_card(deck));
    }

    banner("2. Generator failure refunds credits");
    let before = ana.profile().map(|p| p.credits).unwrap_or(0);
    match ana.create_deck(&store, &offline_generator, "Tax law", Course::Oab) {
        Err(e) => println!("  Failed as expected: {e}"),
        Ok(_)  => println!("  Unexpected success"),
    }
    let after = ana.profile().map(|p| p.credits).unwrap_or(0);
    println!("  Credits before {before}, after {after}");

    banner("3. Duel");
    let duel_id = ana.create_duel(&store, &canned_questions, "Bia@Example.com", Course::Enem)?;
    ana.play_duel(&duel_id)?;
    answer_all(&mut ana, "Option B", 7)?;
    ana.submit_answers(&store)?;

    bia.refresh_duels(&store)?;
    bia.play_duel(&duel_id)?;
    answer_all(&mut bia, "Option B", 5)?;
    bia.submit_answers(&store)?;

    ana.refresh_duels(&store)?;
    for duel in ana.duels() {
        if let Some(card) = duel_card(duel, &ana_id.duel_identity()) {
            println!("  {card}");
        }
    }

    banner("4. Performance report");
    let report = ana.request_report(&store, &CannedReport)?;
    println!("  {}", report.motivational_summary);
    for s in &report.study_suggestions {
        println!("  - {}: {}", s.topic, s.suggestion);
    }

    banner("Profile");
    if let Some(profile) = ana.profile() {
        println!("  {}", profile_header(profile, &ana_id.email));
        let grid = achievement_grid(profile);
        let unlocked: Vec<&str> = grid
            .as_array()
            .map(|cards| {
                cards
                    .iter()
                    .filter(|c| c["unlocked"] == true)
                    .filter_map(|c| c["name"].as_str())
                    .collect()
            })
            .unwrap_or_default();
        println!("  Achievements: {}", unlocked.join(", "));
    }
    Ok(())
}
