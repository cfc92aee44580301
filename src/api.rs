// src/api.rs
//! HTTP trigger surface.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::chat::ChatNotifier;
use crate::error::FeedError;
use crate::ingest::Scheduler;
use crate::notify::{token_fingerprint, DynNotifier, PushMessage};

pub const TEST_PUSH_TITLE: &str = "Test Push";
pub const TEST_PUSH_BODY: &str = "You got this from Askarg backend 🚀";

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
    pub notifier: DynNotifier,
    pub chat: ChatNotifier,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ping", get(|| async { Json(json!({ "message": "pong" })) }))
        .route("/health", get(|| async { "ok" }))
        .route("/fetch-and-upload", get(fetch_and_upload).post(fetch_and_upload))
        .route("/delete-old", get(delete_old))
        .route("/test-notification", post(test_notification))
        .route("/send-chat-notification", post(send_chat_notification))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        match self {
            FeedError::Busy => (StatusCode::CONFLICT, Json(json!({ "status": "busy" }))).into_response(),
            FeedError::RoomNotFound(_) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "Room not found" }))).into_response()
            }
            FeedError::Store(e) => {
                error!(target: "api", error = %format!("{e:#}"), "store failure");
                (StatusCode::BAD_GATEWAY, Json(json!({ "error": "store unavailable" }))).into_response()
            }
            other => {
                error!(target: "api", error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": other.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "success", "message": "Askarg backend is live" }))
}

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    #[serde(default)]
    token: Option<String>,
}

/// Token from a JSON string body, a `{"token": ...}` body, or `?token=`.
/// Unreadable bodies count as no token.
fn token_from(body: &[u8], query: TokenQuery) -> Option<String> {
    let from_body = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Object(mut m) => match m.remove("token") {
                Some(Value::String(s)) => Some(s),
                _ => None,
            },
            _ => None,
        });
    from_body
        .or(query.token)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

async fn fetch_and_upload(
    State(state): State<AppState>,
    Query(q): Query<TokenQuery>,
    body: Bytes,
) -> Result<Json<Value>, FeedError> {
    let token = token_from(&body, q);
    let report = state.scheduler.trigger(token.as_deref()).await?;
    Ok(Json(json!({
        "status": "success",
        "notified": report.cycle.notified(),
        "collections": report.cycle.collections(),
    })))
}

async fn delete_old(State(state): State<AppState>) -> Result<Json<Value>, FeedError> {
    let run = state.scheduler.trigger_sweep().await?;
    Ok(Json(json!({
        "status": "Old content and messages deleted",
        "deleted": run.total_deleted(),
    })))
}

async fn test_notification(
    State(state): State<AppState>,
    Query(q): Query<TokenQuery>,
    body: Bytes,
) -> Response {
    let Some(token) = token_from(&body, q) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "token required" }))).into_response();
    };
    let msg = PushMessage::new(token, TEST_PUSH_TITLE, TEST_PUSH_BODY);
    let delivered = match state.notifier.deliver(&msg).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                target: "api",
                token = %token_fingerprint(&msg.token),
                error = %format!("{e:#}"),
                "test notification failed"
            );
            false
        }
    };
    Json(json!({ "message": "Test notification sent", "delivered": delivered })).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatNotificationReq {
    room_id: String,
    #[serde(default)]
    sender: String,
    #[serde(default)]
    text: String,
}

async fn send_chat_notification(
    State(state): State<AppState>,
    Json(req): Json<ChatNotificationReq>,
) -> Result<Json<Value>, FeedError> {
    let out = state
        .chat
        .notify_room(&req.room_id, &req.sender, &req.text)
        .await?;
    Ok(Json(json!({
        "status": "Notification sent",
        "recipients": out.delivered,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(token: Option<&str>) -> TokenQuery {
        TokenQuery {
            token: token.map(str::to_string),
        }
    }

    #[test]
    fn token_sources() {
        assert_eq!(token_from(br#""abc""#, q(None)).as_deref(), Some("abc"));
        assert_eq!(token_from(br#"{"token":" t1 "}"#, q(None)).as_deref(), Some("t1"));
        assert_eq!(token_from(b"", q(Some("qt"))).as_deref(), Some("qt"));
        // body wins over query
        assert_eq!(token_from(br#""b""#, q(Some("qt"))).as_deref(), Some("b"));
    }

    #[test]
    fn blank_or_garbage_is_no_token() {
        assert_eq!(token_from(br#""   ""#, q(None)), None);
        assert_eq!(token_from(b"{not json", q(None)), None);
        assert_eq!(token_from(br#"{"token":42}"#, q(None)), None);
        assert_eq!(token_from(b"null", q(Some(""))), None);
    }
}
