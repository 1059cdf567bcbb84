//! Repayment tracking
//!
//! A `RepaymentPlan` owns a loan's full schedule. Entries are generated once,
//! when the plan is created, and afterwards only change through
//! [`RepaymentPlan::mark_paid`]. Marking a payment paid is a local state
//! transition; settlement with a payment gateway is the caller's concern.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, LoanId, Money};

use crate::amortization::{LoanParameters, RepaymentScheduleEntry};
use crate::error::{LendingError, LendingResult};

/// A loan's repayment schedule and its payment progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentPlan {
    loan_id: LoanId,
    params: LoanParameters,
    currency: Currency,
    monthly_payment: Decimal,
    entries: Vec<RepaymentScheduleEntry>,
}

impl RepaymentPlan {
    /// Computes the payment and generates every schedule entry
    pub fn new(
        loan_id: LoanId,
        params: LoanParameters,
        start_date: NaiveDate,
        currency: Currency,
    ) -> LendingResult<Self> {
        let monthly_payment = params.monthly_payment()?;
        let entries = crate::amortization::build_schedule(loan_id, &params, monthly_payment, start_date)?;
        tracing::info!(loan_id = %loan_id, term = params.term_months(), "Created repayment plan");
        Ok(Self {
            loan_id,
            params,
            currency,
            monthly_payment,
            entries,
        })
    }

    pub fn loan_id(&self) -> LoanId {
        self.loan_id
    }

    pub fn params(&self) -> &LoanParameters {
        &self.params
    }

    pub fn entries(&self) -> &[RepaymentScheduleEntry] {
        &self.entries
    }

    /// The level payment, rounded for display
    pub fn monthly_payment(&self) -> Money {
        Money::new(self.monthly_payment, self.currency).round_to_currency()
    }

    /// Marks one entry paid
    ///
    /// # Errors
    ///
    /// `PaymentNotFound` for an unknown payment number, `AlreadyPaid` if the
    /// entry was paid before.
    pub fn mark_paid(&mut self, payment_number: u32, paid_at: DateTime<Utc>) -> LendingResult<&RepaymentScheduleEntry> {
        let loan_id = self.loan_id;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.payment_number == payment_number)
            .ok_or(LendingError::PaymentNotFound(payment_number))?;
        entry.mark_paid(paid_at)?;
        tracing::info!(loan_id = %loan_id, payment_number, "Marked payment paid");
        Ok(entry)
    }

    /// Earliest pending entry
    pub fn next_due(&self) -> Option<&RepaymentScheduleEntry> {
        self.entries.iter().find(|e| !e.is_paid())
    }

    /// Pending entries whose due date is before `as_of`
    pub fn overdue(&self, as_of: NaiveDate) -> Vec<&RepaymentScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| !e.is_paid() && e.due_date < as_of)
            .collect()
    }

    /// Sum of amounts already paid
    pub fn total_paid(&self) -> Money {
        let paid: Decimal = self
            .entries
            .iter()
            .filter(|e| e.is_paid())
            .map(|e| e.amount)
            .sum();
        Money::new(paid, self.currency).round_to_currency()
    }

    /// Principal not yet covered by a paid entry
    pub fn outstanding_balance(&self) -> Money {
        let repaid: Decimal = self
            .entries
            .iter()
            .filter(|e| e.is_paid())
            .map(|e| e.principal_portion)
            .sum();
        Money::new(self.params.principal() - repaid, self.currency).round_to_currency()
    }

    /// True once every entry is paid
    pub fn is_settled(&self) -> bool {
        self.entries.iter().all(|e| e.is_paid())
    }
}
