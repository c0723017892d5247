//! Reward Service - settling completed quests
//!
//! A claim flips `claimed` with a compare-and-set and credits the user and
//! the faculty leaderboard in the same transaction. Only the first of any
//! number of concurrent claims can win the flip.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Serialize;

use super::ServiceError;
use crate::domain::Session;
use crate::models::leaderboard_entry::{self, Entity as LeaderboardEntry};
use crate::models::quest::Entity as Quest;
use crate::models::quest_progress_entry::{self, Entity as QuestProgressEntry};
use crate::models::user::{self, Entity as User};
use crate::utils::time::timestamp;

#[derive(Debug, Clone, Serialize)]
pub struct ClaimReceipt {
    pub entry_id: i32,
    pub quest_id: i32,
    pub diamonds_awarded: i64,
    pub points_awarded: i64,
    pub total_diamonds: i64,
    pub total_points: i64,
    pub faculty: String,
    pub faculty_points: i64,
}

/// Add points to the user's row on their faculty leaderboard, creating it
/// on first claim.
pub async fn credit_leaderboard<C: ConnectionTrait>(
    conn: &C,
    faculty: &str,
    user_id: i32,
    points: i64,
    now: DateTime<Utc>,
) -> Result<i64, ServiceError> {
    let now_str = timestamp(now);
    let existing = LeaderboardEntry::find()
        .filter(leaderboard_entry::Column::Faculty.eq(faculty))
        .filter(leaderboard_entry::Column::UserId.eq(user_id))
        .one(conn)
        .await?;

    let saved = match existing {
        Some(entry) => {
            let total = entry.points + points;
            let mut active: leaderboard_entry::ActiveModel = entry.into();
            active.points = Set(total);
            active.updated_at = Set(now_str);
            active.update(conn).await?
        }
        None => {
            leaderboard_entry::ActiveModel {
                faculty: Set(faculty.to_string()),
                user_id: Set(user_id),
                points: Set(points),
                updated_at: Set(now_str),
                ..Default::default()
            }
            .insert(conn)
            .await?
        }
    };
    Ok(saved.points)
}

/// Claim the reward of a completed quest entry
pub async fn claim(
    db: &DatabaseConnection,
    session: &Session,
    entry_id: i32,
    now: DateTime<Utc>,
) -> Result<ClaimReceipt, ServiceError> {
    let entry = QuestProgressEntry::find_by_id(entry_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound("Quest progress"))?;
    if entry.user_id != session.user_id {
        return Err(ServiceError::Forbidden);
    }
    if entry.claimed {
        return Err(ServiceError::AlreadyClaimed);
    }
    if !entry.is_completed {
        return Err(ServiceError::NotCompleted);
    }

    let quest = Quest::find_by_id(entry.quest_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound("Quest"))?;
    let diamonds = i64::from(quest.diamond_reward);
    let points = i64::from(quest.points_reward);
    let now_str = timestamp(now);

    let txn = db.begin().await?;

    let flipped = QuestProgressEntry::update_many()
        .col_expr(quest_progress_entry::Column::Claimed, Expr::value(true))
        .col_expr(
            quest_progress_entry::Column::ClaimedAt,
            Expr::value(Some(now_str.clone())),
        )
        .col_expr(quest_progress_entry::Column::UpdatedAt, Expr::value(now_str.clone()))
        .filter(quest_progress_entry::Column::Id.eq(entry.id))
        .filter(quest_progress_entry::Column::IsCompleted.eq(true))
        .filter(quest_progress_entry::Column::Claimed.eq(false))
        .exec(&txn)
        .await?;
    if flipped.rows_affected == 0 {
        tracing::warn!("Duplicate claim of entry {} by user {}", entry.id, session.user_id);
        return Err(ServiceError::AlreadyClaimed);
    }

    User::update_many()
        .col_expr(
            user::Column::Diamonds,
            Expr::col(user::Column::Diamonds).add(diamonds),
        )
        .col_expr(user::Column::Points, Expr::col(user::Column::Points).add(points))
        .col_expr(user::Column::UpdatedAt, Expr::value(now_str))
        .filter(user::Column::Id.eq(session.user_id))
        .exec(&txn)
        .await?;

    let user = User::find_by_id(session.user_id)
        .one(&txn)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;

    // The stored faculty, not the token's, decides which board is credited
    let faculty_points =
        credit_leaderboard(&txn, &user.faculty, user.id, points, now).await?;

    txn.commit().await?;

    tracing::info!(
        "💎 User {} claimed quest {}: +{} diamonds, +{} points",
        user.id,
        quest.id,
        diamonds,
        points
    );

    Ok(ClaimReceipt {
        entry_id: entry.id,
        quest_id: quest.id,
        diamonds_awarded: diamonds,
        points_awarded: points,
        total_diamonds: user.diamonds,
        total_points: user.points,
        faculty: user.faculty,
        faculty_points,
    })
}
