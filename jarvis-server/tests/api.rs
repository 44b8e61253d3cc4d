//! Integration tests for the HTTP API

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

use jarvis_providers::{AnthropicClient, OpenAiClient, ProviderGateway};
use jarvis_server::{db, router, AppState};

async fn test_state(api_base: Option<String>) -> AppState {
    let pool = db::connect("sqlite::memory:").await.unwrap();
    let gateway = ProviderGateway::new(
        OpenAiClient::new("sk-test".to_string(), api_base.clone(), "gpt-4".to_string()),
        AnthropicClient::new(
            "sk-ant-test".to_string(),
            api_base,
            "claude-3-opus-20240229".to_string(),
        ),
    );
    AppState::new(pool, Arc::new(gateway))
}

async fn test_app(api_base: Option<String>) -> Router {
    router(test_state(api_base).await)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_chat_empty_choice_yields_placeholder() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::Json(json!({
            "model": "gpt-4",
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .with_status(200)
        .with_body(json!({"choices": [{"message": {"content": ""}}]}).to_string())
        .create_async()
        .await;

    let app = test_app(Some(server.url())).await;
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/chat",
            json!({
                "message": "Hello",
                "modelFamily": "OpenAI Models",
                "model": "gpt-4",
                "sessionId": "1700000000000",
                "history": []
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["response"], "No response generated.");
    assert_eq!(body["sessionId"], "1700000000000");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_forwards_history_before_new_turn() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::Json(json!({
            "model": "gpt-4",
            "messages": [
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello!"},
                {"role": "user", "content": "And now?"}
            ]
        })))
        .with_status(200)
        .with_body(json!({"choices": [{"message": {"content": "Now this."}}]}).to_string())
        .create_async()
        .await;

    let app = test_app(Some(server.url())).await;
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/chat",
            json!({
                "message": "And now?",
                "modelFamily": "OpenAI Models",
                "model": "gpt-4",
                "history": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello!"}
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["response"], "Now this.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_unsupported_family_is_500() {
    let app = test_app(None).await;
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/chat",
            json!({
                "message": "Hello",
                "modelFamily": "Google Models",
                "model": "gemini",
                "history": []
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Unsupported model family"));
}

#[tokio::test]
async fn test_chat_provider_failure_is_500_with_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body("bad key")
        .create_async()
        .await;

    let app = test_app(Some(server.url())).await;
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/chat",
            json!({
                "message": "Hello",
                "modelFamily": "OpenAI Models",
                "model": "gpt-4",
                "history": []
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("bad key"));
}

#[tokio::test]
async fn test_create_then_list_sessions() {
    let app = test_app(None).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/sessions",
            json!({"userId": "u1", "name": "X"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["userId"], "u1");
    assert_eq!(created["name"], "X");
    assert!(created["id"].as_str().is_some());

    let response = app
        .oneshot(get_request("/api/sessions?userId=u1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    let rows = listed.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "X");
    assert_eq!(rows[0]["id"], created["id"]);
}

#[tokio::test]
async fn test_sessions_require_user_id() {
    let app = test_app(None).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/sessions",
            json!({"name": "X"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(get_request("/api/sessions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_messages_missing_field_is_400_and_no_insert() {
    let state = test_state(None).await;
    let app = router(state.clone());

    let session = db::insert_session(&state.pool, "u1", "X").await.unwrap();

    for body in [
        json!({"content": "hi", "role": "user"}),
        json!({"sessionId": session.id, "role": "user"}),
        json!({"sessionId": session.id, "content": "hi"}),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/messages", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let rows = db::list_messages(&state.pool, &session.id).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_message_round_trip() {
    let state = test_state(None).await;
    let app = router(state.clone());

    let session = db::insert_session(&state.pool, "u1", "X").await.unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/messages",
            json!({"sessionId": session.id, "content": "Hello", "role": "user"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["sessionId"], session.id.as_str());

    let response = app
        .oneshot(get_request(&format!(
            "/api/messages?sessionId={}",
            session.id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    let rows = listed.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["content"], "Hello");
    assert_eq!(rows[0]["role"], "user");
}

#[tokio::test]
async fn test_message_unknown_session_is_500_with_details() {
    let app = test_app(None).await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/messages",
            json!({"sessionId": "missing", "content": "hi", "role": "user"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Internal Server Error");
    assert!(body["details"].as_str().is_some());
}

#[tokio::test]
async fn test_message_metadata_is_stored() {
    let state = test_state(None).await;
    let app = router(state.clone());

    let session = db::insert_session(&state.pool, "u1", "X").await.unwrap();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/messages",
            json!({
                "sessionId": session.id,
                "content": "Hello",
                "role": "user",
                "metadata": {"client": "tui"}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;

    let count = db::count_message_metadata(&state.pool, created["id"].as_str().unwrap())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_unsupported_verbs_are_405() {
    for uri in ["/api/sessions", "/api/messages"] {
        let app = test_app(None).await;
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
