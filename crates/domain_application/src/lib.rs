//! Loan Application Domain
//!
//! This crate drives the five-step loan application wizard:
//!
//! 1. **Personal** - name, contact details, date of birth, address
//! 2. **Financial** - employment, income, expenses, credit score
//! 3. **Loan details** - amount, purpose, term, requested rate
//! 4. **Documents** - identity, income, address and bank statement uploads
//! 5. **Review** - estimate and final submission
//!
//! Each step's input is validated as a whole before it is merged into the
//! draft, and the draft is persisted through a [`DraftStore`] after every
//! committed transition so a restarted process resumes at the same step with
//! the same data. Submission hands a consolidated [`Application`] to the
//! [`ApplicationPort`] and clears the draft only after the port confirms.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_application::{ApplicationWizard, WizardPorts, StepInput, DocumentPolicy};
//! use domain_application::adapters::{InMemoryDraftStore, InMemoryDocumentStorage, InMemoryApplicationStore};
//!
//! let ports = WizardPorts {
//!     drafts: Arc::new(InMemoryDraftStore::new()),
//!     documents: Arc::new(InMemoryDocumentStorage::new()),
//!     applications: Arc::new(InMemoryApplicationStore::new()),
//! };
//! let mut wizard = ApplicationWizard::resume(ports, session, user, DocumentPolicy::default()).await?;
//! wizard.advance(StepInput::Personal(personal_info)).await?;
//! ```

pub mod sections;
pub mod validation;
pub mod documents;
pub mod draft;
pub mod application;
pub mod ports;
pub mod adapters;
pub mod wizard;
pub mod config;
pub mod telemetry;
pub mod error;

pub use sections::{Field, Section, PersonalInfo, FinancialInfo, LoanDetails};
pub use validation::{validate_field, validator_for, FieldValidator, SectionData, ValidationErrors};
pub use documents::{
    DocumentChecklist, DocumentFile, DocumentPolicy, DocumentRecord, DocumentSlot,
    DocumentState, DocumentType, SlotStatus, UploadEvent,
};
pub use draft::{WizardDraft, WizardStep};
pub use application::{Application, ApplicationStatus, SubmittedApplication};
pub use ports::{ApplicationPort, DocumentStorage, DraftStore, UploadMetadata, UploadStream};
pub use wizard::{
    ApplicationWizard, LoanEstimate, PendingUpload, StepInput, SubmissionReceipt, WizardPorts, WizardState,
};
pub use config::ApplicationConfig;
pub use error::{ApplicationError, ErrorKind, Operation};
