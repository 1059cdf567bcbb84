//! The submitted application
//!
//! An `Application` is created exactly once, at submission, by copying the
//! draft's sections. Its status belongs to the external review process; this
//! crate only reads it (for example to gate repayment tracking).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use core_kernel::{ApplicationId, Currency, LoanId, UserId};
use domain_lending::{LoanParameters, RepaymentPlan};

use crate::documents::{DocumentRecord, DocumentType};
use crate::draft::WizardDraft;
use crate::error::ApplicationError;
use crate::sections::{FinancialInfo, LoanDetails, PersonalInfo};

/// Review status, set by the external reviewer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    /// Approved or rejected
    pub fn is_decided(&self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }
}

/// A consolidated loan application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub user_id: UserId,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub personal_info: PersonalInfo,
    pub financial_info: FinancialInfo,
    pub loan_details: LoanDetails,
    pub documents: BTreeMap<DocumentType, DocumentRecord>,
}

impl Application {
    /// Copies the draft's sections into a pending application
    pub fn from_draft(draft: &WizardDraft, user_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            status: ApplicationStatus::Pending,
            created_at,
            personal_info: draft.personal_info.clone(),
            financial_info: draft.financial_info.clone(),
            loan_details: draft.loan_details.clone(),
            documents: draft.documents.clone(),
        }
    }

    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        self.status = status;
        self
    }

    /// The requested amount, term and rate as engine input
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a figure does not parse, `Lending` if the engine
    /// rejects its range.
    pub fn loan_parameters(&self) -> Result<LoanParameters, ApplicationError> {
        let details = &self.loan_details;
        let amount = details
            .amount()
            .ok_or_else(|| ApplicationError::invalid("loan amount is not a number"))?;
        let term = details
            .term_months()
            .ok_or_else(|| ApplicationError::invalid("loan term is not a whole number of months"))?;
        let rate = details
            .interest_rate()
            .ok_or_else(|| ApplicationError::invalid("interest rate is not a number"))?;
        Ok(LoanParameters::new(amount, rate, term)?)
    }

    /// Builds the repayment plan for an approved application
    ///
    /// # Errors
    ///
    /// `NotApproved` unless the reviewer approved the application.
    pub fn repayment_plan(
        &self,
        loan_id: LoanId,
        start_date: NaiveDate,
        currency: Currency,
    ) -> Result<RepaymentPlan, ApplicationError> {
        if self.status != ApplicationStatus::Approved {
            return Err(ApplicationError::NotApproved(self.status));
        }
        let params = self.loan_parameters()?;
        Ok(RepaymentPlan::new(loan_id, params, start_date, currency)?)
    }
}

/// An application as stored by the submission collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedApplication {
    pub id: ApplicationId,
    #[serde(flatten)]
    pub application: Application,
}
