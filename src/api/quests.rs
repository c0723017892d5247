//! Quest board, Q&A, feedback, reward claims and badges

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
use crate::services::feedback_service::{self, FeedbackForm};
use crate::services::quiz_service::{self, AnswerSubmission};
use crate::services::{badge_service, quest_service, reward_service};

pub async fn quest_board(
    State(state): State<AppState>,
    session: Session,
    Path(event_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let quests = quest_service::quest_board(state.db(), &session, event_id).await?;
    Ok(Json(json!({ "event_id": event_id, "quests": quests })))
}

pub async fn answer(
    State(state): State<AppState>,
    session: Session,
    Path(quest_id): Path<i32>,
    Json(payload): Json<AnswerSubmission>,
) -> Result<impl IntoResponse, ServiceError> {
    let result =
        quiz_service::submit_answer(state.db(), &session, quest_id, payload, Utc::now()).await?;
    Ok(Json(result))
}

pub async fn feedback(
    State(state): State<AppState>,
    session: Session,
    Path(event_id): Path<i32>,
    Json(payload): Json<FeedbackForm>,
) -> Result<impl IntoResponse, ServiceError> {
    let receipt =
        feedback_service::submit_feedback(state.db(), &session, event_id, payload, Utc::now())
            .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(
    post,
    path = "/api/quest-progress/{id}/claim",
    params(("id" = i32, Path, description = "Quest progress entry id")),
    responses(
        (status = 200, description = "Reward credited to the user and the faculty leaderboard"),
        (status = 409, description = "Reward already claimed"),
        (status = 422, description = "Quest not completed")
    )
)]
pub async fn claim(
    State(state): State<AppState>,
    session: Session,
    Path(entry_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        reward_service::claim(state.db(), &session, entry_id, Utc::now()).await?,
    ))
}

pub async fn my_badges(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ServiceError> {
    let badges = badge_service::my_badges(state.db(), &session).await?;
    let unlocked = badges.iter().filter(|b| b.is_unlocked).count();
    Ok(Json(json!({
        "badges": badges,
        "unlocked": unlocked
    })))
}
