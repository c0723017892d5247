//! Registration endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use crate::domain::Session;
use crate::infrastructure::AppState;
use crate::services::ServiceError;
use crate::services::registration_service::{self, RegistrationRequest};

#[utoipa::path(
    post,
    path = "/api/events/{id}/registration",
    params(("id" = i32, Path, description = "Event id")),
    responses(
        (status = 201, description = "Registered; quests and reminders initialised"),
        (status = 409, description = "Already registered"),
        (status = 413, description = "Payment proof too large"),
        (status = 422, description = "Closed, full, restricted or missing payment proof")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Path(event_id): Path<i32>,
    payload: Option<Json<RegistrationRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let receipt = registration_service::register(
        state.db(),
        &state.rules,
        &session,
        event_id,
        request,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    Path(event_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    registration_service::cancel_registration(state.db(), &session, event_id, Utc::now()).await?;
    Ok(Json(json!({ "message": "Registration cancelled" })))
}

pub async fn my_registrations(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ServiceError> {
    let registrations = registration_service::my_registrations(state.db(), &session).await?;
    Ok(Json(json!({
        "registrations": registrations,
        "total": registrations.len()
    })))
}

pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Path(registration_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let registration =
        registration_service::verify_registration(state.db(), &session, registration_id, Utc::now())
            .await?;
    Ok(Json(json!({ "registration": registration })))
}
