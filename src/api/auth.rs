//! Identity endpoints

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::domain::Session;
use crate::infrastructure::AppState;
use crate::services::ServiceError;
use crate::services::account_service::{self, LoginRequest, SignupRequest};

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirm {
    pub token: String,
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    responses(
        (status = 201, description = "Account created, email verification pending"),
        (status = 400, description = "Invalid sign-up details"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = account_service::signup(state.db(), payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    responses(
        (status = 200, description = "Session token issued"),
        (status = 401, description = "Invalid credentials or unverified email")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    tracing::info!("Login attempt");
    Ok(Json(account_service::login(state.db(), payload).await?))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = account_service::verify_email(state.db(), &payload.token, Utc::now()).await?;
    Ok(Json(json!({ "message": "Email verified", "user": user })))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let token =
        account_service::request_password_reset(state.db(), &payload.email, Utc::now()).await?;
    let mut body = json!({
        "message": "If the address has an account, a reset link is on its way"
    });
    if let Some(token) = token {
        body["reset_token"] = json!(token);
    }
    Ok(Json(body))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetConfirm>,
) -> Result<impl IntoResponse, ServiceError> {
    account_service::reset_password(
        state.db(),
        &payload.token,
        &payload.new_password,
        Utc::now(),
    )
    .await?;
    Ok(Json(json!({ "message": "Password updated" })))
}

pub async fn me(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(account_service::profile(state.db(), &session).await?))
}
