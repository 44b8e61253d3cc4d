//! HTTP client for the jarvis API, plus the remote session storage
//! backend built on top of it.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::Mutex;

use jarvis_core::session::{Session, SessionStorage, StoredState, Turn};
use jarvis_core::Error as CoreError;
use jarvis_providers::ChatMessage;

pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// A session row as returned by the persistence API
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSession {
    pub id: String,
    #[serde(rename = "userId")]
    #[allow(dead_code)]
    pub user_id: String,
    pub name: String,
}

/// A message row as returned by the persistence API
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteMessage {
    #[allow(dead_code)]
    pub id: String,
    #[serde(rename = "sessionId")]
    #[allow(dead_code)]
    pub session_id: String,
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    response: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.unwrap_or_else(|| "http://localhost:3000/api".to_string()),
        }
    }

    /// Send one conversation turn through the chat endpoint
    pub async fn chat(
        &self,
        message: &str,
        model_family: &str,
        model: &str,
        session_id: Option<&str>,
        history: &[ChatMessage],
    ) -> Result<String> {
        let url = format!("{}/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "message": message,
                "modelFamily": model_family,
                "model": model,
                "sessionId": session_id,
                "history": history,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status));
            anyhow::bail!(error);
        }

        Ok(response.json::<ChatResponseBody>().await?.response)
    }

    pub async fn create_session(&self, user_id: &str, name: &str) -> Result<RemoteSession> {
        let url = format!("{}/sessions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "userId": user_id, "name": name }))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<RemoteSession>> {
        let url = format!("{}/sessions", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("userId", user_id)])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn create_message(
        &self,
        session_id: &str,
        role: &str,
        content: &str,
    ) -> Result<RemoteMessage> {
        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "sessionId": session_id,
                "content": content,
                "role": role,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn list_messages(&self, session_id: &str) -> Result<Vec<RemoteMessage>> {
        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("sessionId", session_id)])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[derive(Debug)]
struct RemoteView {
    server_id: String,
    persisted_turns: usize,
}

/// Durable remote session storage backed by the persistence API.
///
/// `load` adopts the server's UUIDs as session ids; sessions created
/// locally mid-run keep their client ids and are mapped to the UUID the
/// server hands back on first persist. The wire API has no delete, so a
/// locally deleted session only disappears from the client view.
pub struct ApiStorage {
    api: ApiClient,
    user_id: String,
    view: Mutex<HashMap<String, RemoteView>>,
}

impl ApiStorage {
    pub fn new(api: ApiClient, user_id: impl Into<String>) -> Self {
        Self {
            api,
            user_id: user_id.into(),
            view: Mutex::new(HashMap::new()),
        }
    }
}

fn storage_err(e: anyhow::Error) -> CoreError {
    CoreError::Storage(e.to_string())
}

#[async_trait]
impl SessionStorage for ApiStorage {
    async fn load(&self) -> jarvis_core::Result<StoredState> {
        let remote_sessions = self
            .api
            .list_sessions(&self.user_id)
            .await
            .map_err(storage_err)?;

        let mut sessions = Vec::new();
        let mut view = HashMap::new();
        for remote in remote_sessions {
            let messages = self
                .api
                .list_messages(&remote.id)
                .await
                .map_err(storage_err)?;
            // The messages table carries no model column, so restored
            // turns lose their model tag.
            let turns: Vec<Turn> = messages
                .into_iter()
                .map(|m| Turn {
                    role: m.role,
                    content: m.content,
                    model: String::new(),
                })
                .collect();

            view.insert(
                remote.id.clone(),
                RemoteView {
                    server_id: remote.id.clone(),
                    persisted_turns: turns.len(),
                },
            );
            sessions.push(Session {
                id: remote.id,
                name: remote.name,
                turns,
            });
        }

        *self.view.lock().await = view;
        Ok(StoredState {
            sessions,
            last_active: None,
        })
    }

    async fn persist(&self, state: &StoredState) -> jarvis_core::Result<()> {
        let mut view = self.view.lock().await;

        for session in &state.sessions {
            if !view.contains_key(&session.id) {
                let created = self
                    .api
                    .create_session(&self.user_id, &session.name)
                    .await
                    .map_err(storage_err)?;
                view.insert(
                    session.id.clone(),
                    RemoteView {
                        server_id: created.id,
                        persisted_turns: 0,
                    },
                );
            }

            let entry = view
                .get_mut(&session.id)
                .ok_or_else(|| CoreError::Internal("remote view entry vanished".to_string()))?;
            for turn in session.turns.iter().skip(entry.persisted_turns) {
                self.api
                    .create_message(&entry.server_id, &turn.role, &turn.content)
                    .await
                    .map_err(storage_err)?;
                entry.persisted_turns += 1;
            }
        }

        Ok(())
    }
}
