//! Filesystem store for raw fetched pages

use crate::site::LeadingBoard;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading or writing the page store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("page not cached: {path}")]
    NotCached { path: PathBuf },
}

/// The kinds of pages the store holds, each with its own directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A race result or card page.
    Race,
    /// A horse's career results page.
    HorseResult,
    /// A horse's pedigree page.
    HorsePedigree,
    /// A leading board snapshot.
    Leading(LeadingBoard),
}

impl EntityKind {
    /// Directory for this kind, relative to the store root.
    pub fn dir(&self) -> &'static str {
        match self {
            EntityKind::Race => "html/race",
            EntityKind::HorseResult => "html/horse/result",
            EntityKind::HorsePedigree => "html/horse/ped",
            EntityKind::Leading(_) => "html/leading",
        }
    }

    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Race => "race",
            EntityKind::HorseResult => "horse result",
            EntityKind::HorsePedigree => "horse pedigree",
            EntityKind::Leading(_) => "leading board",
        }
    }
}

/// Raw-page store rooted at a single directory.
///
/// Pages are written as `{root}/{kind dir}/{id}.bin` and never interpreted on
/// the way in or out. Race and horse pages are written once and kept; leading
/// boards are overwritten on every refresh.
pub struct PageStore {
    root: PathBuf,
}

impl PageStore {
    /// Opens a store, creating the root and every kind directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        for dir in [
            EntityKind::Race.dir(),
            EntityKind::HorseResult.dir(),
            EntityKind::HorsePedigree.dir(),
            EntityKind::Leading(LeadingBoard::Jockey).dir(),
        ] {
            let path = root.join(dir);
            fs::create_dir_all(&path).map_err(|source| StorageError::Io { path, source })?;
        }
        Ok(Self { root })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a page of the given kind and id lives on disk.
    pub fn path_for(&self, kind: EntityKind, id: &str) -> PathBuf {
        self.root.join(kind.dir()).join(format!("{}.bin", id))
    }

    /// Whether the page is already on disk.
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.path_for(kind, id).exists()
    }

    /// Writes a page, replacing any previous copy.
    pub fn write(&self, kind: EntityKind, id: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(kind, id);
        fs::write(&path, bytes).map_err(|source| StorageError::Io { path, source })
    }

    /// Reads a cached page back.
    pub fn read(&self, kind: EntityKind, id: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(kind, id);
        if !path.exists() {
            return Err(StorageError::NotCached { path });
        }
        fs::read(&path).map_err(|source| StorageError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> (tempfile::TempDir, PageStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PageStore::open(dir.path().join("data")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_kind_directories() {
        let (_dir, store) = create_test_store();
        assert!(store.root().join("html/race").is_dir());
        assert!(store.root().join("html/horse/result").is_dir());
        assert!(store.root().join("html/horse/ped").is_dir());
        assert!(store.root().join("html/leading").is_dir());
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let (_dir, store) = create_test_store();
        store
            .write(EntityKind::Race, "202412050611", b"<html>race</html>")
            .unwrap();
        assert!(store.contains(EntityKind::Race, "202412050611"));
        let bytes = store.read(EntityKind::Race, "202412050611").unwrap();
        assert_eq!(bytes, b"<html>race</html>");
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let (_dir, store) = create_test_store();
        store.write(EntityKind::HorseResult, "2019104308", b"result").unwrap();
        assert!(store.contains(EntityKind::HorseResult, "2019104308"));
        assert!(!store.contains(EntityKind::HorsePedigree, "2019104308"));
    }

    #[test]
    fn test_read_missing_page_is_not_cached() {
        let (_dir, store) = create_test_store();
        let err = store.read(EntityKind::Race, "000000000000").unwrap_err();
        assert!(matches!(err, StorageError::NotCached { .. }));
    }

    #[test]
    fn test_write_overwrites_existing_page() {
        let (_dir, store) = create_test_store();
        let kind = EntityKind::Leading(LeadingBoard::Jockey);
        store.write(kind, "jockey", b"old").unwrap();
        store.write(kind, "jockey", b"new").unwrap();
        assert_eq!(store.read(kind, "jockey").unwrap(), b"new");
    }

    #[test]
    fn test_paths_follow_layout() {
        let (_dir, store) = create_test_store();
        let path = store.path_for(EntityKind::HorsePedigree, "2019104308");
        assert!(path.ends_with("html/horse/ped/2019104308.bin"));
    }
}
