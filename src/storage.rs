use std::path::PathBuf;

use thiserror::Error;

use crate::models::store::Store;

pub mod json;
pub mod lock;
pub mod migrations;
pub mod sqlite;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to load store from '{path}': {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from '{path}': {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to save store to '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize store to JSON: {source}")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create backup at '{path}': {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to cleanup old backups in '{dir}': {source}")]
    CleanupFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock '{path}': {source}")]
    LockFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error in '{path}': {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid record in '{path}': {reason}")]
    InvalidRecord { path: PathBuf, reason: String },

    #[error("Store version field is not a number: {0}")]
    InvalidVersion(String),

    #[error(
        "Store file was created by a newer version of taskdeck (version {0}). Please upgrade taskdeck to open this file."
    )]
    FutureVersion(u32),

    #[error(
        "Store file has unsupported version {0}. This version of taskdeck cannot read this file."
    )]
    UnsupportedVersion(u32),
}

pub trait Storage {
    fn load(&self) -> Result<Store, StorageError>;
    fn save(&self, store: &Store) -> Result<(), StorageError>;
}

/// The backend picked at startup
pub enum AnyStorage {
    Json(json::JsonFileStorage),
    Sqlite(sqlite::SqliteStorage),
}

impl Storage for AnyStorage {
    fn load(&self) -> Result<Store, StorageError> {
        match self {
            AnyStorage::Json(storage) => storage.load(),
            AnyStorage::Sqlite(storage) => storage.load(),
        }
    }

    fn save(&self, store: &Store) -> Result<(), StorageError> {
        match self {
            AnyStorage::Json(storage) => storage.save(store),
            AnyStorage::Sqlite(storage) => storage.save(store),
        }
    }
}

/// In-memory storage for service tests
#[cfg(test)]
pub mod memory {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[derive(Default)]
    pub struct MemoryStorage {
        pub saved: RefCell<Option<Store>>,
        pub save_count: Cell<usize>,
    }

    impl Storage for MemoryStorage {
        fn load(&self) -> Result<Store, StorageError> {
            Ok(self.saved.borrow().clone().unwrap_or_default())
        }

        fn save(&self, store: &Store) -> Result<(), StorageError> {
            self.saved.replace(Some(store.clone()));
            self.save_count.set(self.save_count.get() + 1);
            Ok(())
        }
    }
}
