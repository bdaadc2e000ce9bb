//! Temporary stores.

use bashistdb_store::{Store, StoreConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A store in a temporary directory, removed on drop.
pub struct TestStore {
    /// The store.
    pub store: Store,
    dir: TempDir,
}

impl TestStore {
    /// Creates a fresh store.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::open(StoreConfig::new(dir.path().join("history.sqlite3")))
            .expect("Failed to open store");
        Self { store, dir }
    }

    /// Path of the database file.
    pub fn path(&self) -> PathBuf {
        self.store.config().path.clone()
    }

    /// The temporary directory holding the store.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Opens a second handle on the same file.
    pub fn reopen(&self) -> Store {
        Store::open(StoreConfig::new(self.path())).expect("Failed to reopen store")
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs `f` with a fresh temporary store.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let test = TestStore::new();
    f(&test.store)
}
