//! Event chat channel

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::domain::Session;
use crate::infrastructure::AppState;
use crate::services::ServiceError;
use crate::services::chat_service::{self, NewMessage};

#[derive(Debug, Default, Deserialize)]
pub struct ChatQuery {
    /// Only messages posted after this instant
    pub since: Option<String>,
}

pub async fn list_messages(
    State(state): State<AppState>,
    session: Session,
    Path(event_id): Path<i32>,
    Query(query): Query<ChatQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let messages =
        chat_service::list_messages(state.db(), &session, event_id, query.since).await?;
    Ok(Json(json!({ "messages": messages })))
}

pub async fn post_message(
    State(state): State<AppState>,
    session: Session,
    Path(event_id): Path<i32>,
    Json(payload): Json<NewMessage>,
) -> Result<impl IntoResponse, ServiceError> {
    let line =
        chat_service::post_message(state.db(), &session, event_id, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(line)))
}
