//! Lending Domain - Rate and Amortization Engine
//!
//! This crate holds the pure financial computations behind loan offers and
//! repayment tracking:
//!
//! - **Credit tiering**: a credit score selects a tier, the tier adjusts the
//!   product's base rate by a fixed number of percentage points
//! - **Amortization**: the level monthly payment for a fixed-rate loan and the
//!   full period-by-period schedule splitting each payment into interest and
//!   principal
//! - **Offer comparison**: quotes for every catalog product, with eligibility
//!   flagged rather than filtered
//! - **Repayment tracking**: an eagerly generated schedule whose entries only
//!   ever change through an explicit "mark paid" transition
//!
//! All figures are `rust_decimal::Decimal`. Rounding to the currency's minor
//! unit happens only when a value is prepared for display.
//!
//! # Example
//!
//! ```rust
//! use domain_lending::{adjust_rate, monthly_payment};
//! use rust_decimal_macros::dec;
//!
//! let rate = adjust_rate(dec!(5.99), 820).unwrap();
//! assert_eq!(rate, dec!(3.99));
//!
//! let payment = monthly_payment(dec!(10000), dec!(6), 36).unwrap();
//! assert_eq!(payment.round_dp(2), dec!(304.22));
//! ```

pub mod rate;
pub mod amortization;
pub mod offers;
pub mod repayment;
pub mod error;

pub use rate::{adjust_rate, CreditScore, CreditTier, MIN_CREDIT_SCORE, MAX_CREDIT_SCORE};
pub use amortization::{
    build_schedule, monthly_payment, round_for_display, MAX_TERM_MONTHS,
    LoanParameters, PaymentStatus, RepaymentScheduleEntry,
};
pub use offers::{
    compare_offers, LoanOffer, OfferCatalog, OfferCatalogSource, OfferQuote, StaticOfferCatalog,
};
pub use repayment::RepaymentPlan;
pub use error::{LendingError, LendingResult};
