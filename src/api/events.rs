//! Event catalog endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::domain::{EventCategory, EventFilter, Session};
use crate::infrastructure::AppState;
use crate::services::ServiceError;
use crate::services::event_service::{self, NewEvent};
use crate::utils::time::timestamp;

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    pub category: Option<EventCategory>,
    pub organiser: Option<String>,
    /// Include events that already ended
    #[serde(default)]
    pub include_past: bool,
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(
        ("category" = Option<String>, Query, description = "Category code"),
        ("include_past" = Option<bool>, Query, description = "Include finished events")
    ),
    responses(
        (status = 200, description = "Events ordered by start time")
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    _session: Session,
    Query(query): Query<EventQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = EventFilter {
        category: query.category,
        ending_after: (!query.include_past).then(|| timestamp(Utc::now())),
        organiser: query.organiser,
    };
    let events = event_service::list_events(state.event_repo.as_ref(), filter).await?;
    Ok(Json(json!({
        "events": events,
        "total": events.len()
    })))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = i32, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event with capacity, clashes and eligibility"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let view = event_service::event_view(
        state.db(),
        state.event_repo.as_ref(),
        &session,
        id,
        Utc::now(),
    )
    .await?;
    Ok(Json(view))
}

pub async fn create_event(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<NewEvent>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = event_service::create_event(state.db(), &session, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
