use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::storage::{AnyStorage, json::JsonFileStorage, sqlite::SqliteStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    /// A single JSON document with rolling backups
    #[default]
    Json,
    /// An embedded SQLite database
    Sqlite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
}

impl Config {
    /// Falls back to the platform data directory when no directory is given
    pub fn resolve(data_dir: Option<PathBuf>, backend: Backend) -> Self {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("taskdeck")
        });
        Self { data_dir, backend }
    }

    pub fn store_path(&self) -> PathBuf {
        match self.backend {
            Backend::Json => self.data_dir.join("store.json"),
            Backend::Sqlite => self.data_dir.join("store.db"),
        }
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join("taskdeck.lock")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn open_storage(&self) -> AnyStorage {
        match self.backend {
            Backend::Json => AnyStorage::Json(JsonFileStorage::new(self.store_path())),
            Backend::Sqlite => AnyStorage::Sqlite(SqliteStorage::new(self.store_path())),
        }
    }
}
