//! QR issuing and scanning for check-in and networking

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
use crate::services::attendance_service::{self, AttendanceScan};
use crate::services::network_service::{self, PeerScan};

pub async fn attendance_qr(
    State(state): State<AppState>,
    session: Session,
    Path(event_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let qr = attendance_service::issue_attendance_qr(
        state.db(),
        &state.qr,
        &state.rules,
        &session,
        event_id,
        Utc::now(),
    )
    .await?;
    Ok(Json(qr))
}

#[utoipa::path(
    post,
    path = "/api/attendance/scan",
    responses(
        (status = 200, description = "Checked in; attendance and early-bird quests evaluated"),
        (status = 409, description = "Attendance already recorded"),
        (status = 422, description = "Invalid, expired or foreign QR, or outside the geofence")
    )
)]
pub async fn scan_attendance(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<AttendanceScan>,
) -> Result<impl IntoResponse, ServiceError> {
    let receipt = attendance_service::scan_attendance(
        state.db(),
        &state.qr,
        &state.rules,
        &session,
        payload,
        Utc::now(),
    )
    .await?;
    Ok(Json(receipt))
}

pub async fn network_qr(
    State(state): State<AppState>,
    session: Session,
    Path(event_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let qr = network_service::issue_network_qr(
        state.db(),
        &state.qr,
        &state.rules,
        &session,
        event_id,
        Utc::now(),
    )
    .await?;
    Ok(Json(qr))
}

pub async fn scan_peer(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<PeerScan>,
) -> Result<impl IntoResponse, ServiceError> {
    let receipt = network_service::scan_peer(
        state.db(),
        &state.qr,
        &state.rules,
        &session,
        payload,
        Utc::now(),
    )
    .await?;
    Ok(Json(receipt))
}

pub async fn connections(
    State(state): State<AppState>,
    session: Session,
    Path(event_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let connections = network_service::list_connections(state.db(), &session, event_id).await?;
    Ok(Json(json!({
        "connections": connections,
        "total": connections.len()
    })))
}
