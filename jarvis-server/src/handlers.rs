//! HTTP handlers for the chat and persistence endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use jarvis_providers::ChatMessage;

use crate::db;
use crate::state::AppState;

/// Body of `POST /api/chat`
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "modelFamily")]
    pub model_family: String,
    pub model: String,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Forward one conversation turn to the selected provider family.
/// Any upstream failure is a 500 carrying the underlying message.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let result = state
        .gateway
        .chat(
            &payload.model_family,
            &payload.model,
            payload.history,
            &payload.message,
        )
        .await;

    match result {
        Ok(response) => Json(ChatResponse {
            response,
            session_id: payload.session_id,
        })
        .into_response(),
        Err(e) => {
            error!("Error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// `POST /api/sessions`: insert a session with a generated UUID
pub async fn create_session_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Response {
    let (user_id, name) = match (
        payload.user_id.filter(|s| !s.is_empty()),
        payload.name.filter(|s| !s.is_empty()),
    ) {
        (Some(user_id), Some(name)) => (user_id, name),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing required fields" })),
            )
                .into_response()
        }
    };

    match db::insert_session(&state.pool, &user_id, &name).await {
        Ok(row) => (StatusCode::CREATED, Json(row)).into_response(),
        Err(e) => {
            error!("Error creating session: {}", e);
            internal_error(e)
        }
    }
}

/// `GET /api/sessions?userId=`: all sessions for a user
pub async fn list_sessions_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionsQuery>,
) -> Response {
    let user_id = match query.user_id.filter(|s| !s.is_empty()) {
        Some(user_id) => user_id,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid or missing userId" })),
            )
                .into_response()
        }
    };

    match db::list_sessions(&state.pool, &user_id).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            error!("Error fetching sessions: {}", e);
            internal_error(e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    pub content: Option<String>,
    pub role: Option<String>,
    /// Opaque structured blob, stored in message_metadata when present
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// `POST /api/messages`: insert a message for a session.
///
/// All of sessionId/content/role are required; an unknown sessionId is
/// rejected by the database's foreign key constraint, not checked here.
pub async fn create_message_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateMessageRequest>,
) -> Response {
    let (session_id, content, role) = match (
        payload.session_id.filter(|s| !s.is_empty()),
        payload.content.filter(|s| !s.is_empty()),
        payload.role.filter(|s| !s.is_empty()),
    ) {
        (Some(session_id), Some(content), Some(role)) => (session_id, content, role),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing required fields" })),
            )
                .into_response()
        }
    };

    let row = match db::insert_message(&state.pool, &session_id, &role, &content).await {
        Ok(row) => row,
        Err(e) => {
            error!("Error creating message: {}", e);
            return internal_error(e);
        }
    };

    if let Some(metadata) = &payload.metadata {
        if let Err(e) = db::insert_message_metadata(&state.pool, &row.id, metadata).await {
            error!("Error storing message metadata: {}", e);
            return internal_error(e);
        }
    }

    (StatusCode::CREATED, Json(row)).into_response()
}

/// `GET /api/messages?sessionId=`: all messages for a session
pub async fn list_messages_handler(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Response {
    let session_id = match query.session_id.filter(|s| !s.is_empty()) {
        Some(session_id) => session_id,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid or missing sessionId" })),
            )
                .into_response()
        }
    };

    match db::list_messages(&state.pool, &session_id).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            error!("Error fetching messages: {}", e);
            internal_error(e)
        }
    }
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Internal Server Error",
            "details": e.to_string(),
        })),
    )
        .into_response()
}
