//! Credit tiering and rate adjustment
//!
//! A credit score maps onto one of four tiers. Each tier shifts the product's
//! base annual rate by a whole number of percentage points:
//!
//! | Score       | Tier      | Adjustment |
//! |-------------|-----------|------------|
//! | 800 - 850   | Excellent | -2.00      |
//! | 700 - 799   | Good      | -1.00      |
//! | 600 - 699   | Fair      |  0.00      |
//! | 300 - 599   | Poor      | +2.00      |
//!
//! Each tier's lower bound is inclusive. Tiers are derived on demand and never
//! stored.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LendingError, LendingResult};

/// Lowest valid credit score
pub const MIN_CREDIT_SCORE: i32 = 300;
/// Highest valid credit score
pub const MAX_CREDIT_SCORE: i32 = 850;

/// A credit score known to lie within [300, 850]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct CreditScore(i32);

impl CreditScore {
    /// Validates and wraps a raw score
    pub fn new(score: i32) -> LendingResult<Self> {
        if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&score) {
            return Err(LendingError::invalid(
                "credit_score",
                format!("{score} is outside [{MIN_CREDIT_SCORE}, {MAX_CREDIT_SCORE}]"),
            ));
        }
        Ok(Self(score))
    }

    /// Returns the raw score
    pub fn value(&self) -> i32 {
        self.0
    }

    /// Returns the tier this score falls into
    pub fn tier(&self) -> CreditTier {
        CreditTier::from_score(*self)
    }
}

impl TryFrom<i32> for CreditScore {
    type Error = LendingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CreditScore> for i32 {
    fn from(score: CreditScore) -> i32 {
        score.0
    }
}

impl fmt::Display for CreditScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credit tier bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreditTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl CreditTier {
    /// Selects the tier for a score
    pub fn from_score(score: CreditScore) -> Self {
        match score.value() {
            s if s >= 800 => CreditTier::Excellent,
            s if s >= 700 => CreditTier::Good,
            s if s >= 600 => CreditTier::Fair,
            _ => CreditTier::Poor,
        }
    }

    /// Percentage points added to the base rate
    pub fn adjustment_points(&self) -> Decimal {
        match self {
            CreditTier::Excellent => dec!(-2),
            CreditTier::Good => dec!(-1),
            CreditTier::Fair => dec!(0),
            CreditTier::Poor => dec!(2),
        }
    }
}

/// Adjusts a base annual rate (in percent) for the applicant's credit score
///
/// The result is clamped to [0, 100] so a discounted low base rate never
/// turns negative.
///
/// # Errors
///
/// `InvalidInput` when the score is outside [300, 850] or the base rate is
/// outside [0, 100].
pub fn adjust_rate(base_rate_percent: Decimal, credit_score: i32) -> LendingResult<Decimal> {
    let score = CreditScore::new(credit_score)?;
    if base_rate_percent < Decimal::ZERO || base_rate_percent > dec!(100) {
        return Err(LendingError::invalid(
            "base_rate_percent",
            format!("{base_rate_percent} is outside [0, 100]"),
        ));
    }

    let tier = score.tier();
    let adjusted = (base_rate_percent + tier.adjustment_points()).clamp(Decimal::ZERO, dec!(100));
    tracing::debug!(
        score = %score,
        tier = ?tier,
        base = %base_rate_percent,
        adjusted = %adjusted,
        "Adjusted rate for credit tier"
    );
    Ok(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excellent_score_takes_two_points_off() {
        assert_eq!(adjust_rate(dec!(5.99), 820).unwrap(), dec!(3.99));
    }

    #[test]
    fn test_poor_score_adds_two_points() {
        assert_eq!(adjust_rate(dec!(5.99), 550).unwrap(), dec!(7.99));
    }

    #[test]
    fn test_tier_lower_bounds_are_inclusive() {
        assert_eq!(CreditScore::new(800).unwrap().tier(), CreditTier::Excellent);
        assert_eq!(CreditScore::new(799).unwrap().tier(), CreditTier::Good);
        assert_eq!(CreditScore::new(700).unwrap().tier(), CreditTier::Good);
        assert_eq!(CreditScore::new(699).unwrap().tier(), CreditTier::Fair);
        assert_eq!(CreditScore::new(600).unwrap().tier(), CreditTier::Fair);
        assert_eq!(CreditScore::new(599).unwrap().tier(), CreditTier::Poor);
    }

    #[test]
    fn test_out_of_range_scores_rejected() {
        assert!(matches!(adjust_rate(dec!(5), 299), Err(LendingError::InvalidInput { .. })));
        assert!(matches!(adjust_rate(dec!(5), 851), Err(LendingError::InvalidInput { .. })));
    }

    #[test]
    fn test_discount_never_goes_negative() {
        assert_eq!(adjust_rate(dec!(1.5), 810).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_credit_score_deserialize_validates() {
        let ok: CreditScore = serde_json::from_str("720").unwrap();
        assert_eq!(ok.value(), 720);
        assert!(serde_json::from_str::<CreditScore>("900").is_err());
    }
}
