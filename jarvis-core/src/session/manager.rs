//! Session store: bookkeeping for multiple sessions and one selection

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::storage::{SessionStorage, StoredState};
use super::store::{Session, Turn};

/// Tracks zero or more sessions and at most one "current" selection.
///
/// Every mutation re-persists the entire session set through the storage
/// handle, so a reload reproduces the same ordered state.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    sessions: Vec<Session>,
    current: Option<String>,
}

impl SessionStore {
    /// Create an empty store backed by the given storage
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            sessions: Vec::new(),
            current: None,
        }
    }

    /// Populate the store from storage. The last-active id becomes the
    /// current selection only when it still names a stored session.
    pub async fn load(&mut self) -> crate::Result<()> {
        let state = self.storage.load().await?;
        self.sessions = state.sessions;
        self.current = state
            .last_active
            .filter(|id| self.sessions.iter().any(|s| &s.id == id));
        debug!(
            sessions = self.sessions.len(),
            current = ?self.current,
            "session store loaded"
        );
        Ok(())
    }

    /// All sessions in creation order
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Id of the current session, if any
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The current session, if any
    pub fn current(&self) -> Option<&Session> {
        let id = self.current.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    /// The visible turn list: the current session's turns, or empty
    pub fn visible_turns(&self) -> &[Turn] {
        self.current().map(|s| s.turns.as_slice()).unwrap_or(&[])
    }

    /// Create a new session and make it current. Returns the new id.
    pub async fn create(&mut self) -> crate::Result<String> {
        let name = format!("Conversation {}", self.sessions.len() + 1);
        let session = Session::new(Uuid::new_v4().to_string(), name);
        let id = session.id.clone();
        self.sessions.push(session);
        self.current = Some(id.clone());
        self.persist().await?;
        Ok(id)
    }

    /// Make an existing session current
    pub async fn switch(&mut self, id: &str) -> crate::Result<()> {
        if !self.sessions.iter().any(|s| s.id == id) {
            return Err(crate::Error::NotFound(format!("session {}", id)));
        }
        self.current = Some(id.to_string());
        self.persist().await?;
        Ok(())
    }

    /// Delete a session by id. Deleting the current session clears the
    /// selection (and thereby the visible turn list).
    pub async fn delete(&mut self, id: &str) -> crate::Result<bool> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        let removed = self.sessions.len() != before;
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    /// Append a turn to the current session, creating one implicitly
    /// when nothing is selected. Returns the session id appended to.
    pub async fn append_turn(&mut self, turn: Turn) -> crate::Result<String> {
        let id = match self.current.clone() {
            Some(id) if self.sessions.iter().any(|s| s.id == id) => id,
            _ => self.create_in_memory(),
        };
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| crate::Error::Session(format!("session {} disappeared", id)))?;
        session.push_turn(turn);
        self.persist().await?;
        Ok(id)
    }

    // Allocate a session without touching storage; append_turn persists
    // the whole set right after.
    fn create_in_memory(&mut self) -> String {
        let name = format!("Conversation {}", self.sessions.len() + 1);
        let session = Session::new(Uuid::new_v4().to_string(), name);
        let id = session.id.clone();
        self.sessions.push(session);
        self.current = Some(id.clone());
        id
    }

    async fn persist(&self) -> crate::Result<()> {
        let state = StoredState {
            sessions: self.sessions.clone(),
            last_active: self.current.clone(),
        };
        self.storage.persist(&state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::storage::{FileStorage, MemoryStorage};
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn memory_store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_create_becomes_current() {
        let mut store = memory_store();
        let id = store.create().await.unwrap();

        assert_eq!(store.current_id(), Some(id.as_str()));
        assert_eq!(store.sessions()[0].name, "Conversation 1");
        assert!(store.visible_turns().is_empty());
    }

    #[tokio::test]
    async fn test_create_never_reuses_ids() {
        let mut store = memory_store();
        let mut ids = HashSet::new();
        for _ in 0..20 {
            assert!(ids.insert(store.create().await.unwrap()));
        }
    }

    #[tokio::test]
    async fn test_switch_changes_visible_turns() {
        let mut store = memory_store();
        let first = store.create().await.unwrap();
        store.append_turn(Turn::user("hello", "gpt-4")).await.unwrap();
        let second = store.create().await.unwrap();
        assert!(store.visible_turns().is_empty());

        store.switch(&first).await.unwrap();
        assert_eq!(store.visible_turns().len(), 1);

        store.switch(&second).await.unwrap();
        assert!(store.visible_turns().is_empty());
    }

    #[tokio::test]
    async fn test_switch_unknown_session_fails() {
        let mut store = memory_store();
        assert!(store.switch("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_current_clears_selection() {
        let mut store = memory_store();
        let id = store.create().await.unwrap();
        store.append_turn(Turn::user("hi", "gpt-4")).await.unwrap();

        assert!(store.delete(&id).await.unwrap());
        assert!(store.current_id().is_none());
        assert!(store.visible_turns().is_empty());
    }

    #[tokio::test]
    async fn test_delete_other_keeps_selection() {
        let mut store = memory_store();
        let first = store.create().await.unwrap();
        let second = store.create().await.unwrap();

        store.delete(&first).await.unwrap();
        assert_eq!(store.current_id(), Some(second.as_str()));
    }

    #[tokio::test]
    async fn test_append_turn_creates_session_implicitly() {
        let mut store = memory_store();
        let id = store.append_turn(Turn::user("hello", "gpt-4")).await.unwrap();

        assert_eq!(store.current_id(), Some(id.as_str()));
        assert_eq!(store.visible_turns().len(), 1);
        assert_eq!(store.sessions()[0].name, "Conversation 1");
    }

    #[tokio::test]
    async fn test_reload_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(FileStorage::new(temp_dir.path()));

        let mut store = SessionStore::new(storage.clone());
        let id = store.create().await.unwrap();
        store.append_turn(Turn::user("hello", "gpt-4")).await.unwrap();
        store
            .append_turn(Turn::assistant("hi!", "gpt-4"))
            .await
            .unwrap();

        let mut reloaded = SessionStore::new(storage);
        reloaded.load().await.unwrap();

        assert_eq!(reloaded.sessions(), store.sessions());
        assert_eq!(reloaded.current_id(), Some(id.as_str()));
        assert_eq!(reloaded.visible_turns().len(), 2);
    }

    #[tokio::test]
    async fn test_load_ignores_stale_last_active() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .persist(&StoredState {
                sessions: vec![Session::new("a", "Conversation 1")],
                last_active: Some("gone".to_string()),
            })
            .await
            .unwrap();

        let mut store = SessionStore::new(storage);
        store.load().await.unwrap();
        assert!(store.current_id().is_none());
    }
}
