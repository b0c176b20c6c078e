use std::{fs, path::PathBuf};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
    /// Normalized username of the logged in user
    pub username: String,
    pub started_at: Timestamp,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to read session from '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse session in '{path}': {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize session: {source}")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write session to '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The single session of this installation, kept in a JSON file
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SessionError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SessionError::ParseFailed {
                path: self.path.clone(),
                source: e,
            })
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| SessionError::SerializeFailed { source: e })?;
        fs::write(&self.path, json).map_err(|e| SessionError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Removes the session. Returns false if nobody was logged in.
    pub fn clear(&self) -> Result<bool, SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SessionError::WriteFailed {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        assert_eq!(file.load().unwrap(), None);

        let session = Session {
            username: "alice".to_string(),
            started_at: Timestamp::now(),
        };
        file.save(&session).unwrap();

        assert_eq!(file.load().unwrap(), Some(session));
        assert!(file.clear().unwrap());
        assert!(!file.clear().unwrap());
        assert_eq!(file.load().unwrap(), None);
    }

    #[test]
    fn test_corrupt_session_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let result = SessionFile::new(path).load();

        assert!(matches!(result, Err(SessionError::ParseFailed { .. })));
    }
}
