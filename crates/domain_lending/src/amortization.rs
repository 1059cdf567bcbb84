//! Fixed-rate amortization
//!
//! The level monthly payment follows the standard annuity formula
//!
//! ```text
//! payment = P * r / (1 - (1 + r)^-n)
//! ```
//!
//! with `r` the monthly rate (`annual% / 100 / 12`) and `n` the number of
//! months. A zero rate degenerates to `P / n`. The discount factor
//! `(1 + r)^-n` only shrinks as `n` grows, so long terms at high rates stay
//! inside `Decimal` range.
//!
//! The schedule is accumulated at full `Decimal` precision. Any residual left
//! after the last period is folded into that period's principal so the balance
//! closes at exactly zero.

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{LoanId, Rate};

use crate::error::{LendingError, LendingResult};

/// Longest term the engine will amortize (50 years)
pub const MAX_TERM_MONTHS: u32 = 600;

/// Immutable input to the amortization engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawLoanParameters")]
pub struct LoanParameters {
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
}

impl LoanParameters {
    /// Validates and creates loan parameters
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `principal <= 0`, the rate is outside [0, 100] or
    /// the term is outside [1, [`MAX_TERM_MONTHS`]].
    pub fn new(principal: Decimal, annual_rate_percent: Decimal, term_months: u32) -> LendingResult<Self> {
        if principal <= Decimal::ZERO {
            return Err(LendingError::invalid("principal", "must be greater than zero"));
        }
        if annual_rate_percent < Decimal::ZERO || annual_rate_percent > dec!(100) {
            return Err(LendingError::invalid(
                "annual_rate_percent",
                format!("{annual_rate_percent} is outside [0, 100]"),
            ));
        }
        check_term(term_months)?;
        Ok(Self {
            principal,
            annual_rate_percent,
            term_months,
        })
    }

    pub fn principal(&self) -> Decimal {
        self.principal
    }

    pub fn annual_rate_percent(&self) -> Decimal {
        self.annual_rate_percent
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    /// The periodic rate used both for the payment and inside the schedule
    pub fn monthly_rate(&self) -> Decimal {
        Rate::from_percentage(self.annual_rate_percent).monthly().as_decimal()
    }

    /// Level monthly payment for these parameters
    pub fn monthly_payment(&self) -> LendingResult<Decimal> {
        level_payment(self.principal, self.monthly_rate(), self.term_months)
    }

    /// Computes the payment and builds the full schedule from it
    pub fn schedule(&self, loan_id: LoanId, start_date: NaiveDate) -> LendingResult<Vec<RepaymentScheduleEntry>> {
        let payment = self.monthly_payment()?;
        build_schedule(loan_id, self, payment, start_date)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLoanParameters {
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
}

impl TryFrom<RawLoanParameters> for LoanParameters {
    type Error = LendingError;

    fn try_from(raw: RawLoanParameters) -> LendingResult<Self> {
        Self::new(raw.principal, raw.annual_rate_percent, raw.term_months)
    }
}

/// Payment status of a schedule entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// One period of a repayment schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepaymentScheduleEntry {
    pub loan_id: LoanId,
    /// 1-based period number
    pub payment_number: u32,
    pub due_date: NaiveDate,
    /// Total due this period
    pub amount: Decimal,
    pub principal_portion: Decimal,
    pub interest_portion: Decimal,
    /// Balance left after this period's principal is applied
    pub remaining_balance: Decimal,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

impl RepaymentScheduleEntry {
    /// Returns true once the entry has been marked paid
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    /// Returns a copy with every amount rounded to cents for display
    pub fn rounded(&self) -> Self {
        Self {
            amount: round_for_display(self.amount),
            principal_portion: round_for_display(self.principal_portion),
            interest_portion: round_for_display(self.interest_portion),
            remaining_balance: round_for_display(self.remaining_balance),
            ..self.clone()
        }
    }

    pub(crate) fn mark_paid(&mut self, paid_at: DateTime<Utc>) -> LendingResult<()> {
        if self.is_paid() {
            return Err(LendingError::AlreadyPaid(self.payment_number));
        }
        self.status = PaymentStatus::Paid;
        self.paid_at = Some(paid_at);
        Ok(())
    }
}

/// Rounds a currency amount to two decimal places, half away from zero
pub fn round_for_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn check_term(term_months: u32) -> LendingResult<()> {
    if term_months == 0 {
        return Err(LendingError::invalid("term_months", "must be greater than zero"));
    }
    if term_months > MAX_TERM_MONTHS {
        return Err(LendingError::invalid(
            "term_months",
            format!("{term_months} exceeds the maximum of {MAX_TERM_MONTHS}"),
        ));
    }
    Ok(())
}

/// Level monthly payment for a fixed-rate loan
///
/// # Errors
///
/// `InvalidInput` if `principal <= 0`, the term is outside
/// [1, [`MAX_TERM_MONTHS`]], the rate is outside [0, 100], or the payment
/// does not fit in a `Decimal`.
pub fn monthly_payment(principal: Decimal, annual_rate_percent: Decimal, term_months: u32) -> LendingResult<Decimal> {
    LoanParameters::new(principal, annual_rate_percent, term_months)?.monthly_payment()
}

fn level_payment(principal: Decimal, monthly_rate: Decimal, term_months: u32) -> LendingResult<Decimal> {
    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(term_months));
    }

    let discount = Decimal::ONE
        .checked_div(Decimal::ONE + monthly_rate)
        .ok_or_else(|| out_of_range("annual_rate_percent"))?;
    // Stays above zero for every term up to MAX_TERM_MONTHS at rates up to 100%
    let mut factor = Decimal::ONE;
    for _ in 0..term_months {
        factor = factor.checked_mul(discount).ok_or_else(|| out_of_range("term_months"))?;
    }

    let payment = principal
        .checked_mul(monthly_rate)
        .and_then(|interest| interest.checked_div(Decimal::ONE - factor))
        .ok_or_else(|| out_of_range("principal"))?;
    tracing::debug!(%principal, %monthly_rate, term_months, %payment, "Computed level payment");
    Ok(payment)
}

pub(crate) fn out_of_range(field: &'static str) -> LendingError {
    LendingError::invalid(field, "result exceeds the representable range")
}

/// Builds the full repayment schedule for a loan
///
/// `payment` is normally [`LoanParameters::monthly_payment`]; the periodic
/// rate applied inside the loop is always `params.monthly_rate()`, the same
/// rate the payment is derived from.
///
/// Period `i` falls due `i` months after `start_date` (clamped to month end).
/// The final period absorbs any residual so `remaining_balance` ends at zero.
///
/// # Errors
///
/// `InvalidInput` if the payment is not positive, does not cover the first
/// period's interest, a due date overflows the calendar, or the schedule's
/// total does not fit in a `Decimal`.
pub fn build_schedule(
    loan_id: LoanId,
    params: &LoanParameters,
    payment: Decimal,
    start_date: NaiveDate,
) -> LendingResult<Vec<RepaymentScheduleEntry>> {
    let monthly_rate = params.monthly_rate();
    if payment <= Decimal::ZERO {
        return Err(LendingError::invalid("payment", "must be greater than zero"));
    }
    let first_interest = params
        .principal()
        .checked_mul(monthly_rate)
        .ok_or_else(|| out_of_range("principal"))?;
    if payment <= first_interest {
        return Err(LendingError::invalid("payment", "does not cover the first period's interest"));
    }

    let term = params.term_months();
    let mut entries = Vec::new();
    let mut balance = params.principal();
    // Keeps later sums over the schedule, such as amount paid, in range
    let mut total_due = Decimal::ZERO;

    for period in 1..=term {
        let due_date = start_date
            .checked_add_months(Months::new(period))
            .ok_or_else(|| LendingError::invalid("start_date", "due date overflows the calendar"))?;

        let interest = balance
            .checked_mul(monthly_rate)
            .ok_or_else(|| out_of_range("principal"))?;
        let mut principal_portion = payment - interest;
        let mut amount = payment;

        if period == term || principal_portion >= balance {
            principal_portion = balance;
            amount = principal_portion
                .checked_add(interest)
                .ok_or_else(|| out_of_range("principal"))?;
        }
        balance -= principal_portion;
        total_due = total_due.checked_add(amount).ok_or_else(|| out_of_range("principal"))?;

        entries.push(RepaymentScheduleEntry {
            loan_id,
            payment_number: period,
            due_date,
            amount,
            principal_portion,
            interest_portion: interest,
            remaining_balance: balance,
            status: PaymentStatus::Pending,
            paid_at: None,
        });
    }

    tracing::debug!(loan_id = %loan_id, entries = entries.len(), "Built repayment schedule");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_reference_payment() {
        let payment = monthly_payment(dec!(10000), dec!(6), 36).unwrap();
        assert_eq!(round_for_display(payment), dec!(304.22));
    }

    #[test]
    fn test_zero_rate_divides_evenly() {
        let payment = monthly_payment(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(payment, dec!(100));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(monthly_payment(Decimal::ZERO, dec!(5), 12).is_err());
        assert!(monthly_payment(dec!(-1), dec!(5), 12).is_err());
        assert!(monthly_payment(dec!(1000), dec!(-0.5), 12).is_err());
        assert!(monthly_payment(dec!(1000), dec!(100.01), 12).is_err());
        assert!(monthly_payment(dec!(1000), dec!(5), 0).is_err());
    }

    #[test]
    fn test_term_bound() {
        assert!(LoanParameters::new(dec!(1000), dec!(5), MAX_TERM_MONTHS).is_ok());
        let result = LoanParameters::new(dec!(1000), Decimal::ZERO, MAX_TERM_MONTHS + 1);
        assert!(matches!(result, Err(LendingError::InvalidInput { ref field, .. }) if field == "term_months"));
        assert!(LoanParameters::new(dec!(1000), Decimal::ZERO, u32::MAX).is_err());

        let json = r#"{"principal":"1000","annualRatePercent":"0","termMonths":4294967295}"#;
        assert!(serde_json::from_str::<LoanParameters>(json).is_err());
        let json = r#"{"principal":"1000","annualRatePercent":"6","termMonths":36}"#;
        assert_eq!(
            serde_json::from_str::<LoanParameters>(json).unwrap(),
            LoanParameters::new(dec!(1000), dec!(6), 36).unwrap()
        );
    }

    #[test]
    fn test_long_term_at_maximum_rate() {
        let payment = monthly_payment(dec!(10000), dec!(100), MAX_TERM_MONTHS).unwrap();
        let interest_only = dec!(10000) * dec!(100) / dec!(1200);
        assert!(payment > interest_only);
        assert_eq!(round_for_display(payment), round_for_display(interest_only));

        let params = LoanParameters::new(dec!(10000), dec!(100), MAX_TERM_MONTHS).unwrap();
        let schedule = params.schedule(LoanId::new(), start()).unwrap();
        assert_eq!(schedule.len(), MAX_TERM_MONTHS as usize);
        assert_eq!(schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_huge_principal_fails_instead_of_overflowing() {
        let params = LoanParameters::new(Decimal::MAX, dec!(12), 1).unwrap();
        assert!(matches!(params.monthly_payment(), Err(LendingError::InvalidInput { .. })));

        // The payment fits but the schedule's total repayment does not
        let params = LoanParameters::new(Decimal::MAX, dec!(12), 12).unwrap();
        assert!(params.monthly_payment().is_ok());
        let schedule = params.schedule(LoanId::new(), start());
        assert!(matches!(schedule, Err(LendingError::InvalidInput { .. })));
    }

    #[test]
    fn test_reference_schedule_first_and_last_period() {
        let params = LoanParameters::new(dec!(10000), dec!(6), 36).unwrap();
        let schedule = params.schedule(LoanId::new(), start()).unwrap();

        assert_eq!(schedule.len(), 36);
        let first = schedule[0].rounded();
        assert_eq!(first.interest_portion, dec!(50.00));
        assert_eq!(first.principal_portion, dec!(254.22));
        assert_eq!(first.due_date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());

        let last = schedule.last().unwrap();
        assert_eq!(last.remaining_balance, Decimal::ZERO);
        assert_eq!(round_for_display(last.remaining_balance), dec!(0.00));
    }

    #[test]
    fn test_due_dates_clamp_to_month_end() {
        let params = LoanParameters::new(dec!(1000), dec!(5), 3).unwrap();
        let schedule = params
            .schedule(LoanId::new(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
            .unwrap();
        assert_eq!(schedule[0].due_date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(schedule[1].due_date, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn test_payment_below_interest_rejected() {
        let params = LoanParameters::new(dec!(10000), dec!(12), 12).unwrap();
        let result = build_schedule(LoanId::new(), &params, dec!(100), start());
        assert!(matches!(result, Err(LendingError::InvalidInput { .. })));
    }

    #[test]
    fn test_overpayment_closes_early_without_going_negative() {
        let params = LoanParameters::new(dec!(1000), Decimal::ZERO, 4).unwrap();
        let schedule = build_schedule(LoanId::new(), &params, dec!(400), start()).unwrap();
        assert_eq!(schedule.len(), 4);
        assert!(schedule.iter().all(|e| e.remaining_balance >= Decimal::ZERO));
        assert_eq!(schedule[2].remaining_balance, Decimal::ZERO);
        assert_eq!(schedule[2].amount, dec!(200));
        assert_eq!(schedule[3].amount, Decimal::ZERO);
    }

    #[test]
    fn test_mark_paid_twice_fails() {
        let params = LoanParameters::new(dec!(1000), dec!(5), 2).unwrap();
        let mut schedule = params.schedule(LoanId::new(), start()).unwrap();
        schedule[0].mark_paid(Utc::now()).unwrap();
        assert!(schedule[0].is_paid());
        assert_eq!(schedule[0].mark_paid(Utc::now()), Err(LendingError::AlreadyPaid(1)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn one_cent() -> Decimal {
        dec!(0.01)
    }

    proptest! {
        #[test]
        fn schedule_closes_at_zero_and_repays_principal(
            principal_cents in 1i64..100_000_000i64,
            rate_bp in 0i64..=10_000i64,
            term in 1u32..=360u32
        ) {
            let principal = Decimal::new(principal_cents, 2);
            let rate = Decimal::new(rate_bp, 2);
            let params = LoanParameters::new(principal, rate, term).unwrap();
            let schedule = params.schedule(LoanId::new(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap();

            prop_assert_eq!(schedule.len(), term as usize);
            let last = schedule.last().unwrap();
            prop_assert!(last.remaining_balance.abs() <= one_cent());

            let repaid: Decimal = schedule.iter().map(|e| e.principal_portion).sum();
            prop_assert!((repaid - principal).abs() <= one_cent());

            for pair in schedule.windows(2) {
                prop_assert!(pair[1].remaining_balance <= pair[0].remaining_balance);
            }
            for entry in &schedule[..schedule.len() - 1] {
                prop_assert!((entry.amount - entry.principal_portion - entry.interest_portion).abs() <= one_cent());
            }
        }

        #[test]
        fn payment_is_positive(
            principal_cents in 1i64..100_000_000i64,
            rate_bp in 0i64..=10_000i64,
            term in 1u32..=MAX_TERM_MONTHS
        ) {
            let principal = Decimal::new(principal_cents, 2);
            let payment = monthly_payment(principal, Decimal::new(rate_bp, 2), term).unwrap();
            prop_assert!(payment > Decimal::ZERO);
        }

        #[test]
        fn payment_at_maximum_rate_is_positive(principal_cents in 1i64..100_000_000i64, term in 1u32..=MAX_TERM_MONTHS) {
            let principal = Decimal::new(principal_cents, 2);
            let payment = monthly_payment(principal, dec!(100), term).unwrap();
            prop_assert!(payment > Decimal::ZERO);
        }

        #[test]
        fn zero_rate_payment_is_exact_quotient(principal_cents in 1i64..100_000_000i64, term in 1u32..=360u32) {
            let principal = Decimal::new(principal_cents, 2);
            let payment = monthly_payment(principal, Decimal::ZERO, term).unwrap();
            prop_assert_eq!(payment, principal / Decimal::from(term));
        }
    }
}
