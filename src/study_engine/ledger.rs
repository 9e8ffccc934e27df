//! Credit balance guard.
//!
//! Paid actions debit before the work starts and give the credits back if the
//! work fails. [`try_spend`] / [`refund`] are the raw operations; workflows use
//! [`reserve`], which hands out a [`CreditHold`] that must be settled exactly
//! once, either by [`CreditHold::commit`] or by [`CreditHold::release`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::study_engine::{
    config::EconomyConfig,
    error::{StudyError, StudyResult},
    models::Profile,
};

/// Debit `amount` if the balance covers it. On failure nothing changes.
pub fn try_spend(profile: &mut Profile, amount: u32) -> bool {
    if profile.credits < amount {
        return false;
    }
    profile.credits -= amount;
    true
}

/// Give back `amount` credits. Pairing refunds with debits is the caller's job;
/// use [`reserve`] to have that pairing enforced.
pub fn refund(profile: &mut Profile, amount: u32) {
    profile.credits = profile.credits.saturating_add(amount);
}

/// Credit-gated actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaidAction {
    DeckCreation,
    DuelCreation,
    PerformanceReport,
}

impl PaidAction {
    pub fn cost(self, config: &EconomyConfig) -> u32 {
        match self {
            PaidAction::DeckCreation      => config.deck_cost,
            PaidAction::DuelCreation      => config.duel_cost,
            PaidAction::PerformanceReport => config.report_cost,
        }
    }
}

impl fmt::Display for PaidAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaidAction::DeckCreation      => write!(f, "deck creation"),
            PaidAction::DuelCreation      => write!(f, "duel creation"),
            PaidAction::PerformanceReport => write!(f, "performance report"),
        }
    }
}

/// Proof that credits were debited for one action.
///
/// Not `Clone`: `commit` and `release` both consume it, so one debit can be
/// refunded at most once.
#[must_use = "a credit hold must be committed or released"]
#[derive(Debug)]
pub struct CreditHold {
    action: PaidAction,
    amount: u32,
    settled: bool,
}

impl CreditHold {
    pub fn action(&self) -> PaidAction {
        self.action
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// The paid work succeeded; the debit stands.
    pub fn commit(mut self) {
        self.settled = true;
        debug!(action = %self.action, amount = self.amount, "credit hold committed");
    }

    /// The paid work failed; refund the debit.
    pub fn release(mut self, profile: &mut Profile) {
        self.settled = true;
        refund(profile, self.amount);
        warn!(
            action = %self.action,
            amount = self.amount,
            balance = profile.credits,
            "credits refunded after failed action"
        );
    }
}

impl Drop for CreditHold {
    fn drop(&mut self) {
        if !self.settled {
            warn!(
                action = %self.action,
                amount = self.amount,
                "credit hold dropped without commit or release"
            );
        }
    }
}

/// Debit the cost of `action` and return the hold that settles it.
pub fn reserve(
    profile: &mut Profile,
    action: PaidAction,
    config: &EconomyConfig,
) -> StudyResult<CreditHold> {
    let amount = action.cost(config);
    if !try_spend(profile, amount) {
        return Err(StudyError::InsufficientCredits {
            required: amount,
            available: profile.credits,
        });
    }
    debug!(action = %action, amount, balance = profile.credits, "credits reserved");
    Ok(CreditHold { action, amount, settled: false })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(credits: u32) -> Profile {
        Profile::with_credits(credits)
    }

    #[test]
    fn spend_fails_without_mutation_when_short() {
        let mut p = profile(5);
        assert!(!try_spend(&mut p, 10));
        assert_eq!(p.credits, 5);
    }

    #[test]
    fn spend_then_refund_restores_balance() {
        let mut p = profile(15);
        assert!(try_spend(&mut p, 10));
        assert_eq!(p.credits, 5);
        refund(&mut p, 10);
        assert_eq!(p.credits, 15);
    }

    #[test]
    fn spend_of_exact_balance_reaches_zero() {
        let mut p = profile(10);
        assert!(try_spend(&mut p, 10));
        assert_eq!(p.credits, 0);
    }

    #[test]
    fn reserve_reports_shortfall() {
        let config = EconomyConfig::default();
        let mut p = profile(19);
        let err = reserve(&mut p, PaidAction::DuelCreation, &config).unwrap_err();
        assert_eq!(err, StudyError::InsufficientCredits { required: 20, available: 19 });
        assert_eq!(p.credits, 19);
    }

    #[test]
    fn released_hold_refunds_once() {
        let config = EconomyConfig::default();
        let mut p = profile(15);
        let hold = reserve(&mut p, PaidAction::DeckCreation, &config).unwrap();
        assert_eq!(hold.amount(), 10);
        assert_eq!(p.credits, 5);
        hold.release(&mut p);
        assert_eq!(p.credits, 15);
    }

    #[test]
    fn committed_hold_keeps_debit() {
        let config = EconomyConfig::default();
        let mut p = profile(15);
        let hold = reserve(&mut p, PaidAction::PerformanceReport, &config).unwrap();
        hold.commit();
        assert_eq!(p.credits, 10);
    }
}
