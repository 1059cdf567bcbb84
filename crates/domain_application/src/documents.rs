//! Document checklist
//!
//! Every required document type has its own slot with an independent
//! lifecycle:
//!
//! ```text
//! Absent ──► Validating ──► Uploading(0..=100) ──► Present
//!               │                 │
//!               └──────► Error ◄──┘
//! ```
//!
//! Type and size checks run before any upload is attempted and fully decide
//! whether one happens. A completed upload replaces the slot's record; a
//! failed one leaves the previous record in place and only marks the error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use core_kernel::PortError;

use crate::error::ApplicationError;

/// Default upload size cap: 5 MiB
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 5 * 1024 * 1024;

const IMAGES_OR_PDF: &[&str] = &["image/jpeg", "image/png", "application/pdf"];
const PDF_ONLY: &[&str] = &["application/pdf"];

/// Required supporting documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    IdProof,
    IncomeProof,
    AddressProof,
    BankStatements,
}

impl DocumentType {
    /// Every required type, in checklist order
    pub const ALL: [DocumentType; 4] = [
        DocumentType::IdProof,
        DocumentType::IncomeProof,
        DocumentType::AddressProof,
        DocumentType::BankStatements,
    ];

    /// MIME types accepted for this document
    pub fn allowed_mime_types(&self) -> &'static [&'static str] {
        match self {
            DocumentType::BankStatements => PDF_ONLY,
            _ => IMAGES_OR_PDF,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            DocumentType::IdProof => "idProof",
            DocumentType::IncomeProof => "incomeProof",
            DocumentType::AddressProof => "addressProof",
            DocumentType::BankStatements => "bankStatements",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::IdProof => "ID Proof",
            DocumentType::IncomeProof => "Income Proof",
            DocumentType::AddressProof => "Address Proof",
            DocumentType::BankStatements => "Bank Statements",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A stored document
///
/// Never edited in place; a re-upload replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    /// Where the storage collaborator put the bytes
    pub storage_locator: String,
}

/// A file picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Pre-upload checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentPolicy {
    pub max_bytes: u64,
}

impl Default for DocumentPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl DocumentPolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Checks presence, size and type, in that order
    ///
    /// Returns the message to show against the slot when the file is refused.
    pub fn check(&self, doc_type: DocumentType, file: Option<&DocumentFile>) -> Result<(), String> {
        let file = match file {
            Some(file) if !file.bytes.is_empty() => file,
            _ => return Err("File is required".to_string()),
        };
        if file.size_bytes() > self.max_bytes {
            return Err(format!("File size should be less than {}", format_size(self.max_bytes)));
        }
        let allowed = doc_type.allowed_mime_types();
        if !allowed.contains(&file.mime_type.as_str()) {
            return Err(format!("Only {} files are allowed", allowed.join(", ")));
        }
        Ok(())
    }
}

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// One step of an upload as reported by the storage collaborator
#[derive(Debug)]
pub enum UploadEvent {
    /// Percent complete, 0 to 100
    Progress(u8),
    Completed(DocumentRecord),
    Failed(PortError),
}

/// What is happening in a slot right now
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SlotStatus {
    #[default]
    Idle,
    Validating,
    Uploading {
        progress: u8,
    },
    Failed {
        message: String,
    },
}

/// Observable state of one document type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Absent,
    Validating,
    Uploading(u8),
    Present,
    Error,
}

/// The last good record for a type plus the state of the current attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSlot {
    pub record: Option<DocumentRecord>,
    pub status: SlotStatus,
}

impl DocumentSlot {
    pub fn state(&self) -> DocumentState {
        match (&self.status, &self.record) {
            (SlotStatus::Failed { .. }, _) => DocumentState::Error,
            (SlotStatus::Validating, _) => DocumentState::Validating,
            (SlotStatus::Uploading { progress }, _) => DocumentState::Uploading(*progress),
            (SlotStatus::Idle, Some(_)) => DocumentState::Present,
            (SlotStatus::Idle, None) => DocumentState::Absent,
        }
    }

    /// True while validation or an upload is running
    pub fn is_busy(&self) -> bool {
        matches!(self.status, SlotStatus::Validating | SlotStatus::Uploading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            SlotStatus::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Per-type upload tracking for the required documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChecklist {
    slots: BTreeMap<DocumentType, DocumentSlot>,
}

impl Default for DocumentChecklist {
    fn default() -> Self {
        Self {
            slots: DocumentType::ALL
                .into_iter()
                .map(|t| (t, DocumentSlot::default()))
                .collect(),
        }
    }
}

impl DocumentChecklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the checklist from persisted records; every slot starts idle
    pub fn from_records(records: &BTreeMap<DocumentType, DocumentRecord>) -> Self {
        let mut checklist = Self::new();
        for (doc_type, record) in records {
            checklist.slot_mut(*doc_type).record = Some(record.clone());
        }
        checklist
    }

    fn slot_mut(&mut self, doc_type: DocumentType) -> &mut DocumentSlot {
        self.slots.entry(doc_type).or_default()
    }

    pub fn slot(&self, doc_type: DocumentType) -> Option<&DocumentSlot> {
        self.slots.get(&doc_type)
    }

    pub fn state(&self, doc_type: DocumentType) -> DocumentState {
        self.slot(doc_type)
            .map(DocumentSlot::state)
            .unwrap_or(DocumentState::Absent)
    }

    pub fn record(&self, doc_type: DocumentType) -> Option<&DocumentRecord> {
        self.slot(doc_type).and_then(|s| s.record.as_ref())
    }

    /// Present records, by type
    pub fn records(&self) -> BTreeMap<DocumentType, DocumentRecord> {
        self.slots
            .iter()
            .filter_map(|(t, s)| s.record.clone().map(|r| (*t, r)))
            .collect()
    }

    /// Claims the slot for a new attempt
    ///
    /// # Errors
    ///
    /// `UploadInProgress` if the slot is already validating or uploading.
    pub fn begin_validation(&mut self, doc_type: DocumentType) -> Result<(), ApplicationError> {
        let slot = self.slot_mut(doc_type);
        if slot.is_busy() {
            return Err(ApplicationError::UploadInProgress(doc_type));
        }
        slot.status = SlotStatus::Validating;
        Ok(())
    }

    /// Ends a validating attempt without uploading
    pub fn reject(&mut self, doc_type: DocumentType, message: impl Into<String>) {
        self.slot_mut(doc_type).status = SlotStatus::Failed {
            message: message.into(),
        };
    }

    /// Moves a validated slot to uploading at 0%
    pub fn begin_upload(&mut self, doc_type: DocumentType) -> Result<(), ApplicationError> {
        let slot = self.slot_mut(doc_type);
        if slot.status != SlotStatus::Validating {
            return Err(ApplicationError::state_violation(format!(
                "{} must pass validation before uploading",
                doc_type
            )));
        }
        slot.status = SlotStatus::Uploading { progress: 0 };
        Ok(())
    }

    /// Records upload progress; never moves backwards and caps at 100
    pub fn record_progress(&mut self, doc_type: DocumentType, progress: u8) {
        if let SlotStatus::Uploading { progress: current } = &mut self.slot_mut(doc_type).status {
            *current = (*current).max(progress.min(100));
        }
    }

    /// Stores the uploaded record, replacing any earlier one
    pub fn complete(&mut self, doc_type: DocumentType, record: DocumentRecord) {
        let slot = self.slot_mut(doc_type);
        slot.record = Some(record);
        slot.status = SlotStatus::Idle;
    }

    /// Marks the attempt failed; an earlier record is kept
    pub fn fail(&mut self, doc_type: DocumentType, message: impl Into<String>) {
        self.reject(doc_type, message);
    }

    /// Dismisses an error so the slot shows its record again
    pub fn clear_error(&mut self, doc_type: DocumentType) {
        let slot = self.slot_mut(doc_type);
        if matches!(slot.status, SlotStatus::Failed { .. }) {
            slot.status = SlotStatus::Idle;
        }
    }

    /// Checks that every type is present and none is uploading or in error
    ///
    /// # Errors
    ///
    /// `DocumentsIncomplete` listing the offending types in checklist order.
    pub fn readiness(&self) -> Result<(), ApplicationError> {
        let mut missing = Vec::new();
        let mut uploading = Vec::new();
        let mut failed = Vec::new();

        for doc_type in DocumentType::ALL {
            let slot = self.slot(doc_type);
            if slot.and_then(|s| s.record.as_ref()).is_none() {
                missing.push(doc_type);
            }
            match slot.map(|s| &s.status) {
                Some(SlotStatus::Validating | SlotStatus::Uploading { .. }) => uploading.push(doc_type),
                Some(SlotStatus::Failed { .. }) => failed.push(doc_type),
                _ => {}
            }
        }

        if missing.is_empty() && uploading.is_empty() && failed.is_empty() {
            Ok(())
        } else {
            Err(ApplicationError::DocumentsIncomplete {
                missing,
                uploading,
                failed,
            })
        }
    }
}
