//! Reminder feed for the push dispatcher

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use crate::domain::Session;
use crate::infrastructure::AppState;
use crate::services::ServiceError;
use crate::services::notification_service;

pub async fn due(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ServiceError> {
    let notifications =
        notification_service::due_notifications(state.db(), &session, Utc::now()).await?;
    Ok(Json(json!({
        "notifications": notifications,
        "total": notifications.len()
    })))
}

pub async fn mark_sent(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    notification_service::mark_sent(state.db(), &session, id, Utc::now()).await?;
    Ok(Json(json!({ "message": "Marked as sent" })))
}
