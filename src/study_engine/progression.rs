//! XP and level arithmetic.
//!
//! A profile's `xp` is progress toward the next level. Awarding xp adds to it
//! and then consumes whole level thresholds until the remainder is below the
//! threshold of the current level.

use serde::{Deserialize, Serialize};

use crate::study_engine::models::Profile;

pub const PER_CORRECT: u32 = 15;
pub const PERFECT_BONUS: u32 = 50;

/// XP needed to leave `level`: `floor(100 * level^1.5)`.
///
/// Level 0 is treated as level 1 so the threshold is never zero.
pub fn xp_threshold(level: u32) -> f64 {
    let level = level.max(1) as f64;
    (100.0 * level.powf(1.5)).floor()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpRules {
    pub per_correct: u32,
    pub perfect_bonus: u32,
}

impl Default for XpRules {
    fn default() -> Self {
        XpRules {
            per_correct: PER_CORRECT,
            perfect_bonus: PERFECT_BONUS,
        }
    }
}

impl XpRules {
    /// XP earned for one graded play-through.
    pub fn earned(&self, correct: u32, total: u32) -> u32 {
        let mut earned = correct.saturating_mul(self.per_correct);
        if total > 0 && correct == total {
            earned = earned.saturating_add(self.perfect_bonus);
        }
        earned
    }

    /// Add earned xp to `profile` and level it up. Returns true if at least
    /// one level was gained.
    pub fn award(&self, profile: &mut Profile, correct: u32, total: u32) -> bool {
        profile.normalize();
        profile.xp += self.earned(correct, total) as f64;
        apply_level_ups(profile)
    }
}

/// Award xp with the default rules (15 per correct answer, 50 for a perfect run).
pub fn award_xp(profile: &mut Profile, correct: u32, total: u32) -> bool {
    XpRules::default().award(profile, correct, total)
}

fn apply_level_ups(profile: &mut Profile) -> bool {
    let mut leveled_up = false;
    let mut threshold = xp_threshold(profile.level);
    while profile.xp >= threshold {
        profile.xp -= threshold;
        profile.level += 1;
        threshold = xp_threshold(profile.level);
        leveled_up = true;
    }
    leveled_up
}

/// XP bar state for the profile header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XpProgress {
    pub xp_next: u64,
    pub percent: f64,
}

pub fn xp_progress(profile: &Profile) -> XpProgress {
    let threshold = xp_threshold(profile.level);
    XpProgress {
        xp_next: threshold as u64,
        percent: (profile.xp / threshold * 100.0).clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_follows_power_curve() {
        assert_eq!(xp_threshold(1), 100.0);
        assert_eq!(xp_threshold(2), 282.0);
        assert_eq!(xp_threshold(4), 800.0);
        assert_eq!(xp_threshold(0), xp_threshold(1));
    }

    #[test]
    fn perfect_run_awards_two_hundred() {
        let mut p = Profile::default();
        let before = p.xp;
        let leveled = award_xp(&mut p, 10, 10);
        // 200 xp: 100 consumed by level 1, 100 left toward level 2 (282).
        assert!(leveled);
        assert_eq!(p.level, 2);
        assert_eq!(p.xp - before, 100.0);
        assert_eq!(XpRules::default().earned(10, 10), 200);
    }

    #[test]
    fn oversized_rules_saturate_instead_of_overflowing() {
        let rules = XpRules { per_correct: u32::MAX / 2, perfect_bonus: u32::MAX };
        assert_eq!(rules.earned(10, 10), u32::MAX);
        assert_eq!(rules.earned(3, 10), u32::MAX);
    }

    #[test]
    fn empty_quiz_awards_nothing() {
        let mut p = Profile::default();
        assert!(!award_xp(&mut p, 0, 0));
        assert_eq!(p.xp, 0.0);
        assert_eq!(p.level, 1);
    }

    #[test]
    fn large_award_consumes_several_levels() {
        let mut p = Profile::default();
        p.xp = 0.0;
        let rules = XpRules { per_correct: 1000, perfect_bonus: 0 };
        assert!(rules.award(&mut p, 1, 2));
        // 1000 - 100 - 282 - 519 = 99 < 800
        assert_eq!(p.level, 4);
        assert_eq!(p.xp, 99.0);
    }

    #[test]
    fn xp_stays_below_threshold_for_any_input() {
        for level in 1..30u32 {
            for correct in 0..=10u32 {
                let mut p = Profile::default();
                p.level = level;
                p.xp = xp_threshold(level) - 1.0;
                award_xp(&mut p, correct, 10);
                assert!(
                    p.xp < xp_threshold(p.level),
                    "xp {} left over at level {} (start level {level}, correct {correct})",
                    p.xp, p.level
                );
            }
        }
    }

    #[test]
    fn corrupt_level_zero_is_repaired_before_awarding() {
        let mut p = Profile::default();
        p.level = 0;
        award_xp(&mut p, 1, 10);
        assert_eq!(p.level, 1);
        assert_eq!(p.xp, 15.0);
    }

    #[test]
    fn progress_reports_percentage_of_next_level() {
        let mut p = Profile::default();
        p.xp = 50.0;
        let progress = xp_progress(&p);
        assert_eq!(progress.xp_next, 100);
        assert!((progress.percent - 50.0).abs() < f64::EPSILON);
    }
}
