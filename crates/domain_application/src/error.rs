//! Application domain errors
//!
//! Every failure maps onto one of four kinds (see [`ErrorKind`]). Only
//! collaborator failures are worth retrying, and only the caller decides to
//! retry; the wizard never retries on its own.

use std::fmt;
use thiserror::Error;

use core_kernel::{ApplicationId, PortError};
use domain_lending::LendingError;

use crate::application::ApplicationStatus;
use crate::documents::DocumentType;
use crate::validation::ValidationErrors;

/// The external operation a collaborator failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadDraft,
    SaveDraft,
    ClearDraft,
    UploadDocument,
    SubmitApplication,
    ListApplications,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::LoadDraft => "load_draft",
            Operation::SaveDraft => "save_draft",
            Operation::ClearDraft => "clear_draft",
            Operation::UploadDocument => "upload_document",
            Operation::SubmitApplication => "submit_application",
            Operation::ListApplications => "list_applications",
        };
        f.write_str(name)
    }
}

/// Coarse classification of application errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A caller-supplied value is out of domain; re-prompt
    InvalidInput,
    /// A step's fields or the document checklist failed validation
    ValidationFailed,
    /// A draft store, upload or submission collaborator failed
    CollaboratorFailure,
    /// The caller drove the wizard out of sequence
    StateViolation,
}

/// Errors that can occur in the application domain
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A value could not be interpreted
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One or more fields of the current step are invalid
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    /// Required documents are absent, still uploading, or in error
    #[error("Documents incomplete: missing {missing:?}, uploading {uploading:?}, failed {failed:?}")]
    DocumentsIncomplete {
        missing: Vec<DocumentType>,
        uploading: Vec<DocumentType>,
        failed: Vec<DocumentType>,
    },

    /// The file failed type or size checks; no upload was attempted
    #[error("Upload of {doc_type} rejected: {reason}")]
    UploadRejected {
        doc_type: DocumentType,
        reason: String,
    },

    /// An upload for this document type is already running
    #[error("Upload already in progress for {0}")]
    UploadInProgress(DocumentType),

    /// An external collaborator failed
    #[error("{operation} failed: {source}")]
    Collaborator {
        operation: Operation,
        #[source]
        source: PortError,
    },

    /// The application went in but the draft could neither be cleared nor
    /// replaced by a submitted marker, so it may resume at Review
    #[error("Application {application_id} submitted but {op} failed: {source}", op = Operation::ClearDraft)]
    DraftRetained {
        application_id: ApplicationId,
        #[source]
        source: PortError,
    },

    /// Repayment tracking requires an approved application
    #[error("Application is {0:?}, not approved")]
    NotApproved(ApplicationStatus),

    /// The wizard was driven out of sequence
    #[error("State violation: {0}")]
    StateViolation(String),

    /// The lending engine rejected the loan figures
    #[error(transparent)]
    Lending(#[from] LendingError),
}

impl From<ValidationErrors> for ApplicationError {
    fn from(errors: ValidationErrors) -> Self {
        ApplicationError::ValidationFailed(errors)
    }
}

impl ApplicationError {
    /// Creates an InvalidInput error
    pub fn invalid(message: impl Into<String>) -> Self {
        ApplicationError::InvalidInput(message.into())
    }

    /// Creates a StateViolation error
    pub fn state_violation(message: impl Into<String>) -> Self {
        ApplicationError::StateViolation(message.into())
    }

    /// Wraps a port failure with the operation that produced it
    pub fn collaborator(operation: Operation, source: PortError) -> Self {
        ApplicationError::Collaborator { operation, source }
    }

    /// Classifies the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::InvalidInput(_)
            | ApplicationError::UploadRejected { .. }
            | ApplicationError::Lending(_) => ErrorKind::InvalidInput,
            ApplicationError::ValidationFailed(_) | ApplicationError::DocumentsIncomplete { .. } => {
                ErrorKind::ValidationFailed
            }
            ApplicationError::Collaborator { .. } | ApplicationError::DraftRetained { .. } => {
                ErrorKind::CollaboratorFailure
            }
            ApplicationError::UploadInProgress(_)
            | ApplicationError::NotApproved(_)
            | ApplicationError::StateViolation(_) => ErrorKind::StateViolation,
        }
    }

    /// The collaborator operation that failed, if any
    pub fn operation(&self) -> Option<Operation> {
        match self {
            ApplicationError::Collaborator { operation, .. } => Some(*operation),
            ApplicationError::DraftRetained { .. } => Some(Operation::ClearDraft),
            _ => None,
        }
    }

    /// Returns the field errors when this is a validation failure
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ApplicationError::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}
