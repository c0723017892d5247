use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::domain::{Faculty, Session};
use crate::infrastructure::AppState;
use crate::services::ServiceError;
use crate::services::leaderboard_service;

#[utoipa::path(
    get,
    path = "/api/leaderboard",
    responses(
        (status = 200, description = "Standings of the caller's faculty")
    )
)]
pub async fn my_faculty(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ServiceError> {
    let standings = leaderboard_service::standings(
        state.leaderboard_repo.as_ref(),
        session.faculty,
        session.user_id,
    )
    .await?;
    Ok(Json(standings))
}

pub async fn for_faculty(
    State(state): State<AppState>,
    session: Session,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let faculty = code.parse::<Faculty>()?;
    let standings =
        leaderboard_service::standings(state.leaderboard_repo.as_ref(), faculty, session.user_id)
            .await?;
    Ok(Json(standings))
}
