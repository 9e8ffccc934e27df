use serde::{Deserialize, Serialize};

use crate::study_engine::{
    error::{StudyError, StudyResult},
    models::DEFAULT_STARTING_CREDITS,
    progression::{XpRules, PERFECT_BONUS, PER_CORRECT},
};

/// Economy and quiz settings. Every field falls back to its default when
/// missing from the JSON source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub starting_credits: u32,
    pub deck_cost: u32,
    pub duel_cost: u32,
    pub report_cost: u32,
    pub xp_per_correct: u32,
    pub perfect_bonus: u32,
    pub questions_per_deck: usize,
    pub quiz_duration_secs: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        EconomyConfig {
            starting_credits: DEFAULT_STARTING_CREDITS,
            deck_cost: 10,
            duel_cost: 20,
            report_cost: 5,
            xp_per_correct: PER_CORRECT,
            perfect_bonus: PERFECT_BONUS,
            questions_per_deck: 10,
            quiz_duration_secs: 900,
        }
    }
}

impl EconomyConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(src: &str) -> StudyResult<Self> {
        let config: EconomyConfig = serde_json::from_str(src)
            .map_err(|e| StudyError::validation(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StudyResult<()> {
        if self.questions_per_deck == 0 {
            return Err(StudyError::validation("questions_per_deck must be at least 1"));
        }
        if self.quiz_duration_secs == 0 {
            return Err(StudyError::validation("quiz_duration_secs must be positive"));
        }
        Ok(())
    }

    pub fn xp_rules(&self) -> XpRules {
        XpRules {
            per_correct: self.xp_per_correct,
            perfect_bonus: self.perfect_bonus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = EconomyConfig::from_json(r#"{ "deck_cost": 12 }"#).unwrap();
        assert_eq!(config.deck_cost, 12);
        assert_eq!(config.duel_cost, 20);
        assert_eq!(config.starting_credits, 15);
        assert_eq!(config.quiz_duration_secs, 900);
    }

    #[test]
    fn zero_question_count_is_rejected() {
        let err = EconomyConfig::from_json(r#"{ "questions_per_deck": 0 }"#).unwrap_err();
        assert!(matches!(err, StudyError::Validation(_)));
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        let err = EconomyConfig::from_json("{ deck_cost: ").unwrap_err();
        assert!(matches!(err, StudyError::Validation(_)));
    }
}
