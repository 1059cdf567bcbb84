//! File-backed draft store
//!
//! One JSON document per session under a directory. Writes go to a
//! temporary sibling first and are renamed into place, so a reader sees
//! either the previous draft or the new one, never a torn file.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use core_kernel::{DomainPort, PortError, SessionKey};

use crate::draft::WizardDraft;
use crate::ports::DraftStore;

/// Draft store writing `<dir>/<session>.json`
#[derive(Debug, Clone)]
pub struct JsonFileDraftStore {
    dir: PathBuf,
}

impl JsonFileDraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a session's draft file
    pub fn path_for(&self, session: &SessionKey) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(session.as_str())))
    }
}

/// Keeps ASCII alphanumerics, `-` and `_`; escapes every other byte as `~xx`
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("~{:02x}", byte));
        }
    }
    stem
}

fn io_error(action: &str, path: &Path, error: std::io::Error) -> PortError {
    PortError::transport_with_source(format!("failed to {} {}", action, path.display()), error)
}

impl DomainPort for JsonFileDraftStore {}

#[async_trait]
impl DraftStore for JsonFileDraftStore {
    async fn load_draft(&self, session: &SessionKey) -> Result<Option<WizardDraft>, PortError> {
        let path = self.path_for(session);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("read", &path, e)),
        };
        let draft = serde_json::from_str(&contents).map_err(|e| PortError::Internal {
            message: format!("corrupt draft at {}", path.display()),
            source: Some(Box::new(e)),
        })?;
        tracing::debug!(path = %path.display(), "Loaded draft");
        Ok(Some(draft))
    }

    async fn save_draft(&self, session: &SessionKey, draft: &WizardDraft) -> Result<(), PortError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error("create", &self.dir, e))?;

        let path = self.path_for(session);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(draft).map_err(|e| PortError::Internal {
            message: "failed to serialize draft".to_string(),
            source: Some(Box::new(e)),
        })?;

        fs::write(&tmp, json).await.map_err(|e| io_error("write", &tmp, e))?;
        fs::rename(&tmp, &path).await.map_err(|e| io_error("replace", &path, e))?;
        tracing::debug!(path = %path.display(), step = draft.current_step.number(), "Saved draft");
        Ok(())
    }

    async fn clear_draft(&self, session: &SessionKey) -> Result<(), PortError> {
        let path = self.path_for(session);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::WizardStep;

    #[test]
    fn test_file_stem_escapes_separators() {
        assert_eq!(file_stem("abc-123_X"), "abc-123_X");
        assert_eq!(file_stem("../etc/passwd"), "~2e~2e~2fetc~2fpasswd");
        assert_ne!(file_stem("a/b"), file_stem("a_b"));
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileDraftStore::new(dir.path().join("drafts"));
        let session = SessionKey::new("browser-session").unwrap();

        assert!(store.load_draft(&session).await.unwrap().is_none());

        let mut draft = WizardDraft::new().with_step(WizardStep::Financial);
        draft.personal_info.first_name = "Jane".to_string();
        store.save_draft(&session, &draft).await.unwrap();

        // A second store over the same directory sees the draft
        let reopened = JsonFileDraftStore::new(dir.path().join("drafts"));
        assert_eq!(reopened.load_draft(&session).await.unwrap(), Some(draft));
        assert!(!store.path_for(&session).with_extension("json.tmp").exists());

        store.clear_draft(&session).await.unwrap();
        assert!(store.load_draft(&session).await.unwrap().is_none());
        store.clear_draft(&session).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_draft_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileDraftStore::new(dir.path());
        let session = SessionKey::new("s").unwrap();
        std::fs::write(store.path_for(&session), "{not json").unwrap();

        let err = store.load_draft(&session).await.unwrap_err();
        assert!(matches!(err, PortError::Internal { .. }));
        assert!(!err.is_transient());
    }
}
