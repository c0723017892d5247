//! Profile settings of the signed-in user

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;

use crate::domain::Session;
use crate::infrastructure::AppState;
use crate::services::ServiceError;
use crate::services::account_service;

#[derive(Debug, Deserialize)]
pub struct PushTokenRequest {
    /// `null` unregisters the device
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileImageRequest {
    pub url: String,
}

pub async fn set_push_token(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<PushTokenRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user =
        account_service::set_push_token(state.db(), &session, payload.token, Utc::now()).await?;
    Ok(Json(user))
}

pub async fn set_profile_image(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<ProfileImageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user =
        account_service::set_profile_image(state.db(), &session, payload.url, Utc::now()).await?;
    Ok(Json(user))
}

pub async fn complete_onboarding(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        account_service::complete_onboarding(state.db(), &session, Utc::now()).await?,
    ))
}
