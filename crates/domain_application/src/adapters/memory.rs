//! In-memory adapters
//!
//! Used by the test suites and by embedders that do not need durability.
//! Each adapter can be switched into an outage mode in which its operations
//! fail with a transport error.

use async_trait::async_trait;
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use core_kernel::{ApplicationId, DomainPort, PortError, SessionKey, UserId};

use crate::application::{Application, ApplicationStatus, SubmittedApplication};
use crate::documents::{DocumentRecord, DocumentType, UploadEvent};
use crate::draft::WizardDraft;
use crate::ports::{ApplicationPort, DocumentStorage, DraftStore, UploadMetadata, UploadStream};

fn outage(what: &str) -> PortError {
    PortError::transport(format!("{} unavailable", what))
}

/// Draft store backed by a map
#[derive(Debug, Default)]
pub struct InMemoryDraftStore {
    drafts: RwLock<HashMap<SessionKey, WizardDraft>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    fail_clears: AtomicBool,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a session's draft
    pub async fn with_draft(session: SessionKey, draft: WizardDraft) -> Self {
        let store = Self::new();
        store.drafts.write().await.insert(session, draft);
        store
    }

    /// Fails every operation while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail_loads.store(unavailable, Ordering::SeqCst);
        self.fail_saves.store(unavailable, Ordering::SeqCst);
        self.fail_clears.store(unavailable, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_clears(&self, fail: bool) {
        self.fail_clears.store(fail, Ordering::SeqCst);
    }

    /// What is currently stored for a session
    pub async fn stored(&self, session: &SessionKey) -> Option<WizardDraft> {
        self.drafts.read().await.get(session).cloned()
    }
}

impl DomainPort for InMemoryDraftStore {}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn load_draft(&self, session: &SessionKey) -> Result<Option<WizardDraft>, PortError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(outage("draft store"));
        }
        Ok(self.drafts.read().await.get(session).cloned())
    }

    async fn save_draft(&self, session: &SessionKey, draft: &WizardDraft) -> Result<(), PortError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(outage("draft store"));
        }
        self.drafts.write().await.insert(session.clone(), draft.clone());
        Ok(())
    }

    async fn clear_draft(&self, session: &SessionKey) -> Result<(), PortError> {
        if self.fail_clears.load(Ordering::SeqCst) {
            return Err(outage("draft store"));
        }
        self.drafts.write().await.remove(session);
        Ok(())
    }
}

/// Object storage held in memory
///
/// Uploads report progress in quarters before completing. Individual
/// document types can be denied or stalled to exercise failure paths.
#[derive(Debug)]
pub struct InMemoryDocumentStorage {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    progress_steps: Vec<u8>,
    max_bytes: Option<u64>,
    denied: std::sync::RwLock<HashSet<DocumentType>>,
    stalled: std::sync::RwLock<HashSet<DocumentType>>,
    unavailable: AtomicBool,
}

impl Default for InMemoryDocumentStorage {
    fn default() -> Self {
        Self {
            objects: Arc::default(),
            progress_steps: vec![25, 50, 75, 100],
            max_bytes: None,
            denied: Default::default(),
            stalled: Default::default(),
            unavailable: AtomicBool::new(false),
        }
    }
}

impl InMemoryDocumentStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the progress percentages reported before completion
    pub fn with_progress_steps(mut self, steps: Vec<u8>) -> Self {
        self.progress_steps = steps;
        self
    }

    /// Backend-side size limit, independent of the wizard's policy
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Refuses uploads of a type with `PermissionDenied`
    pub fn deny(&self, doc_type: DocumentType) {
        if let Ok(mut denied) = self.denied.write() {
            denied.insert(doc_type);
        }
    }

    /// Uploads of a type report 0% and then never finish
    pub fn stall(&self, doc_type: DocumentType) {
        if let Ok(mut stalled) = self.stalled.write() {
            stalled.insert(doc_type);
        }
    }

    /// Uploads fail with a transport error after the first progress report
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Bytes stored under a locator
    pub async fn object(&self, locator: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(locator).cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    fn is_denied(&self, doc_type: DocumentType) -> bool {
        self.denied.read().map(|d| d.contains(&doc_type)).unwrap_or(false)
    }

    fn is_stalled(&self, doc_type: DocumentType) -> bool {
        self.stalled.read().map(|s| s.contains(&doc_type)).unwrap_or(false)
    }
}

impl DomainPort for InMemoryDocumentStorage {}

impl DocumentStorage for InMemoryDocumentStorage {
    fn upload_document(
        &self,
        owner: &UserId,
        doc_type: DocumentType,
        bytes: Vec<u8>,
        metadata: UploadMetadata,
    ) -> UploadStream {
        if self.is_denied(doc_type) {
            let error = PortError::permission_denied(format!("{} may not upload {}", owner, doc_type));
            return stream::once(async move { UploadEvent::Failed(error) }).boxed();
        }

        let actual = bytes.len() as u64;
        if let Some(limit) = self.max_bytes.filter(|limit| actual > *limit) {
            let error = PortError::SizeExceeded { limit, actual };
            return stream::once(async move { UploadEvent::Failed(error) }).boxed();
        }

        if self.is_stalled(doc_type) {
            return stream::iter([UploadEvent::Progress(0)])
                .chain(stream::pending())
                .boxed();
        }

        if self.unavailable.load(Ordering::SeqCst) {
            let first = self.progress_steps.first().copied().unwrap_or(0);
            return stream::iter([
                UploadEvent::Progress(first),
                UploadEvent::Failed(outage("document storage")),
            ])
            .boxed();
        }

        let objects = Arc::clone(&self.objects);
        let owner = owner.clone();
        let progress = stream::iter(self.progress_steps.clone()).map(UploadEvent::Progress);
        let finish = stream::once(async move {
            let uploaded_at = Utc::now();
            let locator = format!(
                "documents/{}/{}/{}",
                owner,
                doc_type,
                uploaded_at.timestamp_millis()
            );
            objects.write().await.insert(locator.clone(), bytes);
            tracing::debug!(owner = %owner, doc_type = %doc_type, locator = %locator, "Stored document");
            UploadEvent::Completed(DocumentRecord {
                name: metadata.file_name,
                mime_type: metadata.mime_type,
                size_bytes: actual,
                uploaded_at,
                storage_locator: locator,
            })
        });
        progress.chain(finish).boxed()
    }
}

/// Application store held in memory
#[derive(Debug, Default)]
pub struct InMemoryApplicationStore {
    applications: RwLock<Vec<SubmittedApplication>>,
    rejection: RwLock<Option<String>>,
    unavailable: AtomicBool,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails submissions and lookups with a transport error while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Refuses submissions with `ValidationRejected`; `None` accepts again
    pub async fn reject_submissions(&self, message: Option<String>) {
        *self.rejection.write().await = message;
    }

    /// Plays the external reviewer
    pub async fn set_status(&self, id: ApplicationId, status: ApplicationStatus) -> Result<(), PortError> {
        let mut applications = self.applications.write().await;
        let stored = applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| PortError::not_found("Application", id))?;
        stored.application.status = status;
        Ok(())
    }

    pub async fn get(&self, id: ApplicationId) -> Option<SubmittedApplication> {
        self.applications.read().await.iter().find(|a| a.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.applications.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.applications.read().await.is_empty()
    }
}

impl DomainPort for InMemoryApplicationStore {}

#[async_trait]
impl ApplicationPort for InMemoryApplicationStore {
    async fn submit_application(&self, application: &Application) -> Result<ApplicationId, PortError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(outage("application store"));
        }
        if let Some(message) = self.rejection.read().await.clone() {
            return Err(PortError::rejected(message));
        }
        let id = ApplicationId::new_v7();
        self.applications.write().await.push(SubmittedApplication {
            id,
            application: application.clone(),
        });
        Ok(id)
    }

    async fn applications_for_user(&self, user_id: &UserId) -> Result<Vec<SubmittedApplication>, PortError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(outage("application store"));
        }
        let mut found: Vec<_> = self
            .applications
            .read()
            .await
            .iter()
            .filter(|a| &a.application.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.application.created_at.cmp(&a.application.created_at));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(len: usize) -> UploadMetadata {
        UploadMetadata {
            file_name: "id.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: len as u64,
        }
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[tokio::test]
    async fn test_draft_store_round_trip() {
        let store = InMemoryDraftStore::new();
        let session = SessionKey::new("s1").unwrap();
        assert!(store.load_draft(&session).await.unwrap().is_none());

        let draft = WizardDraft::new();
        store.save_draft(&session, &draft).await.unwrap();
        assert_eq!(store.load_draft(&session).await.unwrap(), Some(draft));

        store.clear_draft(&session).await.unwrap();
        assert!(store.stored(&session).await.is_none());
        // Clearing twice is fine
        store.clear_draft(&session).await.unwrap();
    }

    #[tokio::test]
    async fn test_draft_store_outage() {
        let store = InMemoryDraftStore::new();
        let session = SessionKey::new("s1").unwrap();
        store.set_unavailable(true);
        let err = store.load_draft(&session).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_upload_reports_progress_then_completes() {
        let storage = InMemoryDocumentStorage::new();
        let events: Vec<_> = storage
            .upload_document(&user(), DocumentType::IdProof, vec![1, 2, 3], metadata(3))
            .collect()
            .await;

        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], UploadEvent::Progress(25)));
        let record: &DocumentRecord = match &events[4] {
            UploadEvent::Completed(record) => record,
            other => panic!("unexpected {:?}", other),
        };
        assert!(record.storage_locator.starts_with("documents/user-1/idProof/"));
        assert_eq!(storage.object(&record.storage_locator).await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_upload_is_lazy() {
        let storage = InMemoryDocumentStorage::new();
        let stream = storage.upload_document(&user(), DocumentType::IdProof, vec![1], metadata(1));
        drop(stream);
        assert_eq!(storage.object_count().await, 0);
    }

    #[tokio::test]
    async fn test_upload_failures() {
        let storage = InMemoryDocumentStorage::new().with_max_bytes(2);
        storage.deny(DocumentType::BankStatements);

        let mut denied = storage.upload_document(&user(), DocumentType::BankStatements, vec![1], metadata(1));
        assert!(matches!(
            denied.next().await,
            Some(UploadEvent::Failed(PortError::PermissionDenied { .. }))
        ));

        let mut too_big = storage.upload_document(&user(), DocumentType::IdProof, vec![1, 2, 3], metadata(3));
        assert!(matches!(
            too_big.next().await,
            Some(UploadEvent::Failed(PortError::SizeExceeded { limit: 2, actual: 3 }))
        ));
    }

    #[tokio::test]
    async fn test_application_store_lists_by_user() {
        let store = InMemoryApplicationStore::new();
        let draft = WizardDraft::new();
        let mine = Application::from_draft(&draft, user(), Utc::now());
        let theirs = Application::from_draft(&draft, UserId::new("user-2").unwrap(), Utc::now());

        let id = store.submit_application(&mine).await.unwrap();
        store.submit_application(&theirs).await.unwrap();

        let listed = store.applications_for_user(&user()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);

        store.set_status(id, ApplicationStatus::Approved).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().application.status, ApplicationStatus::Approved);
    }

    #[tokio::test]
    async fn test_application_store_rejection() {
        let store = InMemoryApplicationStore::new();
        store.reject_submissions(Some("duplicate".to_string())).await;
        let app = Application::from_draft(&WizardDraft::new(), user(), Utc::now());
        let err = store.submit_application(&app).await.unwrap_err();
        assert!(matches!(err, PortError::ValidationRejected { .. }));
        assert!(store.is_empty().await);
    }
}
