//! Page storage
//!
//! Fetched pages are persisted as raw bytes under a fixed directory layout,
//! one file per entity. Presence of a file is what makes a later run skip the
//! matching fetch.

mod page_store;

pub use page_store::{EntityKind, PageStore, StorageError};
