//! Wizard steps and the resumable draft

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use core_kernel::ApplicationId;

use crate::documents::{DocumentRecord, DocumentType};
use crate::error::ApplicationError;
use crate::sections::{FinancialInfo, LoanDetails, PersonalInfo, Section};

/// The five wizard steps, numbered 1 to 5
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WizardStep {
    #[default]
    Personal = 1,
    Financial = 2,
    LoanDetails = 3,
    Documents = 4,
    Review = 5,
}

impl WizardStep {
    pub const FIRST: WizardStep = WizardStep::Personal;
    pub const LAST: WizardStep = WizardStep::Review;

    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// The following step, `None` at Review
    pub fn next(&self) -> Option<WizardStep> {
        WizardStep::try_from(self.number() + 1).ok()
    }

    /// The preceding step, `None` at Personal
    pub fn prev(&self) -> Option<WizardStep> {
        self.number()
            .checked_sub(1)
            .and_then(|n| WizardStep::try_from(n).ok())
    }

    /// The data-entry section edited at this step, if any
    pub fn section(&self) -> Option<Section> {
        match self {
            WizardStep::Personal => Some(Section::PersonalInfo),
            WizardStep::Financial => Some(Section::FinancialInfo),
            WizardStep::LoanDetails => Some(Section::LoanDetails),
            WizardStep::Documents | WizardStep::Review => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Personal => "Personal Information",
            WizardStep::Financial => "Financial Information",
            WizardStep::LoanDetails => "Loan Details",
            WizardStep::Documents => "Document Upload",
            WizardStep::Review => "Review & Submit",
        }
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = ApplicationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(WizardStep::Personal),
            2 => Ok(WizardStep::Financial),
            3 => Ok(WizardStep::LoanDetails),
            4 => Ok(WizardStep::Documents),
            5 => Ok(WizardStep::Review),
            other => Err(ApplicationError::invalid(format!(
                "wizard step must be between 1 and 5, got {}",
                other
            ))),
        }
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.title())
    }
}

/// Everything entered so far, plus the step to resume at
///
/// Persisted after every committed transition. The stored draft never holds
/// section data that has not passed validation. A draft with
/// `submitted_as` set is a marker left behind when the store could not be
/// cleared after submission; it carries no section data and is never
/// resumed for editing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WizardDraft {
    pub current_step: WizardStep,
    pub personal_info: PersonalInfo,
    pub financial_info: FinancialInfo,
    pub loan_details: LoanDetails,
    pub documents: BTreeMap<DocumentType, DocumentRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_as: Option<ApplicationId>,
}

impl WizardDraft {
    /// A fresh draft at step 1 with empty sections
    pub fn new() -> Self {
        Self::default()
    }

    /// Marker recording that this session's application went in
    pub fn submitted(application_id: ApplicationId) -> Self {
        Self {
            current_step: WizardStep::LAST,
            submitted_as: Some(application_id),
            ..Self::default()
        }
    }

    pub fn with_step(mut self, step: WizardStep) -> Self {
        self.current_step = step;
        self
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted_as.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_step_navigation() {
        assert_eq!(WizardStep::Personal.next(), Some(WizardStep::Financial));
        assert_eq!(WizardStep::Review.next(), None);
        assert_eq!(WizardStep::Personal.prev(), None);
        assert_eq!(WizardStep::Review.prev(), Some(WizardStep::Documents));
        assert_eq!(WizardStep::Documents.section(), None);
    }

    #[test]
    fn test_step_serializes_as_number() {
        assert_eq!(serde_json::to_string(&WizardStep::LoanDetails).unwrap(), "3");
        let step: WizardStep = serde_json::from_str("5").unwrap();
        assert_eq!(step, WizardStep::Review);
        assert!(serde_json::from_str::<WizardStep>("6").is_err());
        assert!(serde_json::from_str::<WizardStep>("0").is_err());
    }

    #[test]
    fn test_draft_json_shape() {
        let mut draft = WizardDraft::new().with_step(WizardStep::Documents);
        draft.personal_info.email = "jane@example.com".to_string();
        draft.documents.insert(
            DocumentType::IdProof,
            DocumentRecord {
                name: "id.png".to_string(),
                mime_type: "image/png".to_string(),
                size_bytes: 3,
                uploaded_at: Utc::now(),
                storage_locator: "documents/u/idProof/1".to_string(),
            },
        );

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["currentStep"], 4);
        assert!(json.get("submittedAs").is_none());
        assert_eq!(json["personalInfo"]["email"], "jane@example.com");
        assert_eq!(json["documents"]["idProof"]["mimeType"], "image/png");

        let back: WizardDraft = serde_json::from_value(json).unwrap();
        assert_eq!(back, draft);
    }

    #[test]
    fn test_submitted_marker_keeps_no_section_data() {
        let id = ApplicationId::new_v7();
        let marker = WizardDraft::submitted(id);
        assert!(marker.is_submitted());
        assert_eq!(marker.personal_info, PersonalInfo::default());
        assert!(marker.documents.is_empty());

        let json = serde_json::to_value(&marker).unwrap();
        assert_eq!(json["submittedAs"], serde_json::to_value(id).unwrap());
        let back: WizardDraft = serde_json::from_value(json).unwrap();
        assert_eq!(back.submitted_as, Some(id));
    }

    #[test]
    fn test_empty_object_is_fresh_draft() {
        let draft: WizardDraft = serde_json::from_str("{}").unwrap();
        assert_eq!(draft, WizardDraft::new());
    }
}
