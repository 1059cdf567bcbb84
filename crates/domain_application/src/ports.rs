//! Application Domain Ports
//!
//! The wizard talks to three collaborators, each behind a trait so the
//! backing implementation (browser storage, object store, remote document
//! database, in-memory test double) can be swapped at startup:
//!
//! - [`DraftStore`] keeps the resumable draft per session
//! - [`DocumentStorage`] receives uploaded files
//! - [`ApplicationPort`] accepts finished applications
//!
//! ```rust,ignore
//! let ports = WizardPorts {
//!     drafts: Arc::new(JsonFileDraftStore::new(config.draft_dir.clone())),
//!     documents: Arc::new(InMemoryDocumentStorage::new()),
//!     applications: Arc::new(InMemoryApplicationStore::new()),
//! };
//! ```

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use core_kernel::{ApplicationId, DomainPort, PortError, SessionKey, UserId};

use crate::application::{Application, SubmittedApplication};
use crate::documents::{DocumentType, UploadEvent};
use crate::draft::WizardDraft;

/// Descriptive data sent alongside an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Lazy, finite, single-use sequence of upload events
///
/// Nothing is sent until the stream is polled. The stream ends after a
/// `Completed` or `Failed` event; a stream that ends without either is
/// treated as a transport failure by the consumer.
pub type UploadStream = BoxStream<'static, UploadEvent>;

/// Durable, session-scoped storage for the wizard draft
#[async_trait]
pub trait DraftStore: DomainPort {
    /// Returns the stored draft, `None` when the session has none
    async fn load_draft(&self, session: &SessionKey) -> Result<Option<WizardDraft>, PortError>;

    /// Replaces the stored draft
    async fn save_draft(&self, session: &SessionKey, draft: &WizardDraft) -> Result<(), PortError>;

    /// Removes the stored draft; clearing an absent draft succeeds
    async fn clear_draft(&self, session: &SessionKey) -> Result<(), PortError>;
}

/// Object storage for supporting documents
pub trait DocumentStorage: DomainPort {
    /// Starts an upload
    ///
    /// Failures (`PermissionDenied`, `SizeExceeded`, `UnsupportedType`,
    /// `Transport`) arrive as a terminal [`UploadEvent::Failed`].
    fn upload_document(
        &self,
        owner: &UserId,
        doc_type: DocumentType,
        bytes: Vec<u8>,
        metadata: UploadMetadata,
    ) -> UploadStream;
}

/// Application submission and lookup
#[async_trait]
pub trait ApplicationPort: DomainPort {
    /// Stores a new application and returns its identifier
    ///
    /// Fails with `Transport` when unreachable and `ValidationRejected` when
    /// the backend refuses the record.
    async fn submit_application(&self, application: &Application) -> Result<ApplicationId, PortError>;

    /// A user's submitted applications, newest first
    async fn applications_for_user(&self, user_id: &UserId) -> Result<Vec<SubmittedApplication>, PortError>;
}
