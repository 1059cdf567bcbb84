//! Shared fixtures for the application integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use std::sync::Arc;

use core_kernel::{SessionKey, UserId};
use domain_application::adapters::{InMemoryApplicationStore, InMemoryDocumentStorage, InMemoryDraftStore};
use domain_application::{
    ApplicationWizard, DocumentFile, DocumentPolicy, DocumentType, DraftStore, FinancialInfo,
    LoanDetails, PersonalInfo, StepInput, WizardPorts, WizardStep,
};

/// Fixed "today" for age checks
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

pub fn session() -> SessionKey {
    SessionKey::new("session-1").unwrap()
}

pub fn user() -> UserId {
    UserId::new("user-42").unwrap()
}

pub fn personal_info() -> PersonalInfo {
    PersonalInfo {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane.doe@example.com".to_string(),
        phone: "(555) 123-4567".to_string(),
        date_of_birth: "1990-04-01".to_string(),
        address: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip_code: "62701".to_string(),
    }
}

pub fn financial_info() -> FinancialInfo {
    FinancialInfo {
        employment_status: "employed".to_string(),
        employer_name: "Acme".to_string(),
        monthly_income: "6500".to_string(),
        other_income: "0".to_string(),
        monthly_expenses: "1800".to_string(),
        rent_mortgage: "1400".to_string(),
        other_loans: "0".to_string(),
        credit_score: "820".to_string(),
    }
}

pub fn loan_details() -> LoanDetails {
    LoanDetails {
        loan_amount: "10000".to_string(),
        loan_purpose: "Car".to_string(),
        loan_term: "36".to_string(),
        interest_rate: "5.99".to_string(),
    }
}

pub fn pdf(name: &str) -> DocumentFile {
    DocumentFile::new(name, "application/pdf", b"%PDF-1.7 test".to_vec())
}

/// In-memory collaborators kept by concrete type so tests can steer them
pub struct Harness {
    pub drafts: Arc<InMemoryDraftStore>,
    pub documents: Arc<InMemoryDocumentStorage>,
    pub applications: Arc<InMemoryApplicationStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_drafts(Arc::new(InMemoryDraftStore::new()))
    }

    pub fn with_drafts(drafts: Arc<InMemoryDraftStore>) -> Self {
        Self {
            drafts,
            documents: Arc::new(InMemoryDocumentStorage::new()),
            applications: Arc::new(InMemoryApplicationStore::new()),
        }
    }

    pub fn ports(&self) -> WizardPorts {
        WizardPorts {
            drafts: self.drafts.clone(),
            documents: self.documents.clone(),
            applications: self.applications.clone(),
        }
    }

    /// Simulates a process start for the shared session
    pub async fn wizard(&self) -> ApplicationWizard {
        ApplicationWizard::resume(self.ports(), session(), user(), DocumentPolicy::default())
            .await
            .unwrap()
    }
}

/// Completes the three data-entry steps
pub async fn fill_sections(wizard: &mut ApplicationWizard) {
    wizard.advance_as_of(StepInput::Personal(personal_info()), today()).await.unwrap();
    wizard.advance_as_of(StepInput::Financial(financial_info()), today()).await.unwrap();
    wizard.advance_as_of(StepInput::LoanDetails(loan_details()), today()).await.unwrap();
    assert_eq!(wizard.current_step(), WizardStep::Documents);
}

/// Uploads every required document
pub async fn upload_all(wizard: &mut ApplicationWizard) {
    for doc_type in DocumentType::ALL {
        wizard.upload_document(doc_type, Some(pdf(doc_type.key()))).await.unwrap();
    }
}

/// Drives a fresh wizard to Review
pub async fn wizard_at_review(harness: &Harness) -> ApplicationWizard {
    let mut wizard = harness.wizard().await;
    fill_sections(&mut wizard).await;
    upload_all(&mut wizard).await;
    wizard.advance_as_of(StepInput::Documents, today()).await.unwrap();
    assert_eq!(wizard.current_step(), WizardStep::Review);
    wizard
}

/// Stored draft as seen by a new process
pub async fn stored_step(drafts: &dyn DraftStore) -> Option<WizardStep> {
    drafts
        .load_draft(&session())
        .await
        .unwrap()
        .map(|d| d.current_step)
}
