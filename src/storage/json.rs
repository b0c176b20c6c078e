use std::{
    fs::{self, OpenOptions, rename, write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use jiff::Timestamp;
use serde_json::to_string_pretty;
use uuid::Uuid;

use crate::{
    models::store::{CURRENT_VERSION, Store},
    storage::{
        Storage, StorageError,
        migrations::{apply_migrations, detect_version},
    },
};

/// Number of rolling backups kept next to the store file
const MAX_BACKUPS: usize = 5;

pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn create_backup_dir(&self) -> Result<(), StorageError> {
        let backups_dir = self.get_backup_dir();
        fs::create_dir(&backups_dir).map_err(|e| StorageError::BackupFailed {
            path: backups_dir,
            source: e,
        })?;
        Ok(())
    }

    fn create_backup(&self) -> Result<u64, StorageError> {
        let file_exists = fs::exists(&self.path).map_err(|e| StorageError::BackupFailed {
            path: self.path.clone(),
            source: e,
        })?;
        if !file_exists {
            return Ok(0);
        }

        let backup_path = self.get_backup_path();
        match fs::copy(&self.path, &backup_path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.create_backup_dir()?;
                self.create_backup()
            }
            Err(e) => Err(StorageError::BackupFailed {
                path: backup_path,
                source: e,
            }),
            Ok(bytes) => {
                log::debug!("Backed up store to {}", backup_path.display());
                Ok(bytes)
            }
        }
    }

    fn cleanup_old_backups(&self) -> Result<(), StorageError> {
        let backup_dir = self.get_backup_dir();
        let backup_dir_exists =
            fs::exists(&backup_dir).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        if !backup_dir_exists {
            return Ok(());
        }

        let mut file_entries = fs::read_dir(&backup_dir)
            .map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?
            .flatten()
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect::<Vec<_>>();

        // Backup names end in a fixed-width UTC stamp, so lexical order is age order
        file_entries.sort();

        let number_of_files_to_delete = file_entries.len().saturating_sub(MAX_BACKUPS);

        for file_path in &file_entries[0..number_of_files_to_delete] {
            fs::remove_file(file_path).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        }

        Ok(())
    }

    fn get_backup_dir(&self) -> PathBuf {
        let parent_store_path = self.path.parent().unwrap_or(Path::new("."));
        parent_store_path.join("backups")
    }

    fn get_backup_path(&self) -> PathBuf {
        let backups_dir = self.get_backup_dir();

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());

        backups_dir.join(backup_file_name(&file_name, Timestamp::now()))
    }
}

/// `store.json-20260310T100000.120000000Z`. Nanoseconds are always padded to
/// nine digits.
fn backup_file_name(file_name: &str, timestamp: Timestamp) -> String {
    format!(
        "{}-{}{:09}Z",
        file_name,
        timestamp.strftime("%Y%m%dT%H%M%S."),
        timestamp.subsec_nanosecond()
    )
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Store, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No store at {}, starting empty", self.path.display());
                return Ok(Store::default());
            }
            Err(e) => {
                return Err(StorageError::LoadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let mut data: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| StorageError::ParseFailed {
                path: self.path.clone(),
                source: e,
            })?;

        let file_version = detect_version(&content)?;

        if file_version > CURRENT_VERSION {
            return Err(StorageError::FutureVersion(file_version));
        }

        if file_version < CURRENT_VERSION {
            data = apply_migrations(data, file_version, CURRENT_VERSION)?;
        }

        if let Some(obj) = data.as_object_mut() {
            obj.insert("version".to_string(), serde_json::json!(CURRENT_VERSION));
        }

        let store: Store = serde_json::from_value(data).map_err(|e| StorageError::ParseFailed {
            path: self.path.clone(),
            source: e,
        })?;

        log::debug!(
            "Loaded {} user(s) from {}",
            store.users.len(),
            self.path.display()
        );
        Ok(store)
    }

    fn save(&self, store: &Store) -> Result<(), StorageError> {
        let json =
            to_string_pretty(store).map_err(|e| StorageError::SerializeFailed { source: e })?;

        let unique_temp = format!("{}.tmp.{}", self.path.display(), Uuid::new_v4());
        let temp_path = PathBuf::from(&unique_temp);
        write(&temp_path, json).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        let lock_file_path = self.path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_file_path)
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path.clone(),
                source: e,
            })?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path,
                source: e,
            })?;

        self.create_backup()?;
        self.cleanup_old_backups()?;

        rename(&temp_path, &self.path).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        lock_file.unlock().map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        log::debug!("Saved store to {}", self.path.display());
        Ok(())
    }
}
