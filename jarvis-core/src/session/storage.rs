//! Session storage backends
//!
//! One abstraction over the places a session set can live. The store
//! always persists the full state; backends decide how to write it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::store::Session;

/// The durable shape of the session store: the full session set plus
/// the last-active selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StoredState {
    pub sessions: Vec<Session>,
    pub last_active: Option<String>,
}

/// Storage backend for the session store.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Load the persisted state, or an empty default when nothing was
    /// stored yet.
    async fn load(&self) -> crate::Result<StoredState>;

    /// Persist the full state. Last write wins.
    async fn persist(&self, state: &StoredState) -> crate::Result<()>;
}

/// Ephemeral in-memory storage. State dies with the process.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<StoredState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn load(&self) -> crate::Result<StoredState> {
        Ok(self.state.lock().await.clone())
    }

    async fn persist(&self, state: &StoredState) -> crate::Result<()> {
        *self.state.lock().await = state.clone();
        Ok(())
    }
}

/// Durable local storage: `sessions.json` holds the serialized session
/// array, `last-active` holds the last selected session id.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn sessions_path(&self) -> PathBuf {
        self.dir.join("sessions.json")
    }

    fn last_active_path(&self) -> PathBuf {
        self.dir.join("last-active")
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn load(&self) -> crate::Result<StoredState> {
        let sessions_path = self.sessions_path();
        let sessions: Vec<Session> = if sessions_path.exists() {
            let content = std::fs::read_to_string(&sessions_path)?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };

        let last_active_path = self.last_active_path();
        let last_active = if last_active_path.exists() {
            let raw = std::fs::read_to_string(&last_active_path)?;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        } else {
            None
        };

        Ok(StoredState {
            sessions,
            last_active,
        })
    }

    async fn persist(&self, state: &StoredState) -> crate::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(&state.sessions)?;
        std::fs::write(self.sessions_path(), content)?;

        match &state.last_active {
            Some(id) => std::fs::write(self.last_active_path(), id)?,
            None => {
                let path = self.last_active_path();
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::Turn;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        let mut state = StoredState::default();
        state.sessions.push(Session::new("a", "Conversation 1"));
        state.last_active = Some("a".to_string());

        storage.persist(&state).await.unwrap();
        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_file_storage_empty_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        let loaded = storage.load().await.unwrap();
        assert!(loaded.sessions.is_empty());
        assert!(loaded.last_active.is_none());
    }

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        let mut session = Session::new("1700000000000", "Conversation 1");
        session.push_turn(Turn::user("Hello", "gpt-4"));
        session.push_turn(Turn::assistant("Hi!", "gpt-4"));
        let state = StoredState {
            sessions: vec![session, Session::new("x", "Conversation 2")],
            last_active: Some("x".to_string()),
        };

        storage.persist(&state).await.unwrap();
        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_file_storage_clears_last_active() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        let state = StoredState {
            sessions: vec![Session::new("a", "Conversation 1")],
            last_active: Some("a".to_string()),
        };
        storage.persist(&state).await.unwrap();

        let cleared = StoredState {
            sessions: state.sessions.clone(),
            last_active: None,
        };
        storage.persist(&cleared).await.unwrap();

        let loaded = storage.load().await.unwrap();
        assert!(loaded.last_active.is_none());
    }
}
