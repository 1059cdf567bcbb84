//! Adapters for the application ports
//!
//! - **memory**: in-process doubles for every port, with switches for
//!   simulating outages and rejected uploads
//! - **file**: a JSON-file draft store that survives process restarts
//!
//! ```rust,ignore
//! use domain_application::adapters::JsonFileDraftStore;
//! use domain_application::DraftStore;
//! use std::sync::Arc;
//!
//! let drafts: Arc<dyn DraftStore> = Arc::new(JsonFileDraftStore::new(&config.draft_dir));
//! ```

pub mod memory;
pub mod file;

pub use memory::{InMemoryApplicationStore, InMemoryDocumentStorage, InMemoryDraftStore};
pub use file::JsonFileDraftStore;
