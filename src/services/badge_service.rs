//! Badge Service - category-scoped unlock counters

use chrono::{DateTime, Utc};
use sea_orm::*;
use serde::Serialize;
use std::collections::HashMap;

use super::ServiceError;
use super::quest_service::claim_token;
use crate::domain::{QuestType, Session};
use crate::models::badge::{self, Entity as Badge};
use crate::models::badge_progress::{self, Entity as BadgeProgress};
use crate::models::badge_progress_entry::{self, Entity as BadgeProgressEntry};
use crate::utils::time::timestamp;

/// Counter change caused by a quest completion
#[derive(Debug, Clone, Serialize)]
pub struct BadgeUpdate {
    pub badge_id: i32,
    pub name: String,
    pub progress: i32,
    pub threshold: i32,
    pub newly_unlocked: bool,
}

/// Badge template with the caller's progress
#[derive(Debug, Clone, Serialize)]
pub struct BadgeView {
    pub badge_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub badge_type: String,
    pub image_url: Option<String>,
    pub progress: i32,
    pub threshold: i32,
    pub is_unlocked: bool,
    pub unlocked_at: Option<String>,
}

async fn ensure_parent<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    now: DateTime<Utc>,
) -> Result<badge_progress::Model, ServiceError> {
    if let Some(parent) = BadgeProgress::find()
        .filter(badge_progress::Column::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(parent);
    }

    let parent = badge_progress::ActiveModel {
        user_id: Set(user_id),
        created_at: Set(timestamp(now)),
        ..Default::default()
    };
    Ok(parent.insert(conn).await?)
}

/// Count one completed quest towards every badge of the same category.
///
/// Keyed by (badge, user, quest): a second call for the same completion
/// leaves the counters untouched.
pub async fn record_completion<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    quest_type: QuestType,
    quest_id: i32,
    now: DateTime<Utc>,
) -> Result<Vec<BadgeUpdate>, ServiceError> {
    let badges = Badge::find()
        .filter(badge::Column::BadgeType.eq(quest_type.code()))
        .all(conn)
        .await?;
    if badges.is_empty() {
        return Ok(Vec::new());
    }

    let parent = ensure_parent(conn, user_id, now).await?;
    let now_str = timestamp(now);
    let mut updates = Vec::new();

    for badge in badges {
        let existing = BadgeProgressEntry::find()
            .filter(badge_progress_entry::Column::BadgeProgressId.eq(parent.id))
            .filter(badge_progress_entry::Column::BadgeId.eq(badge.id))
            .one(conn)
            .await?;

        if existing.as_ref().is_some_and(|e| e.is_unlocked) {
            continue;
        }

        let token = format!("badge:b{}:u{}:q{}", badge.id, user_id, quest_id);
        if !claim_token(conn, &token, user_id, now).await? {
            continue;
        }

        let progress = existing.as_ref().map(|e| e.progress).unwrap_or(0) + 1;
        let unlocked = progress >= badge.threshold;

        let mut active: badge_progress_entry::ActiveModel = match existing {
            Some(entry) => entry.into(),
            None => badge_progress_entry::ActiveModel {
                badge_progress_id: Set(parent.id),
                badge_id: Set(badge.id),
                ..Default::default()
            },
        };
        active.progress = Set(progress);
        active.is_unlocked = Set(unlocked);
        active.unlocked_at = Set(unlocked.then(|| now_str.clone()));
        active.updated_at = Set(now_str.clone());
        active.save(conn).await?;

        if unlocked {
            tracing::info!("🏅 User {} unlocked badge '{}'", user_id, badge.name);
        }

        updates.push(BadgeUpdate {
            badge_id: badge.id,
            name: badge.name,
            progress,
            threshold: badge.threshold,
            newly_unlocked: unlocked,
        });
    }

    Ok(updates)
}

/// Every badge template with the caller's progress, locked ones included
pub async fn my_badges(
    db: &DatabaseConnection,
    session: &Session,
) -> Result<Vec<BadgeView>, ServiceError> {
    let badges = Badge::find()
        .order_by_asc(badge::Column::Id)
        .all(db)
        .await?;

    let parent = BadgeProgress::find()
        .filter(badge_progress::Column::UserId.eq(session.user_id))
        .one(db)
        .await?;

    let entries: HashMap<i32, badge_progress_entry::Model> = match parent {
        Some(parent) => BadgeProgressEntry::find()
            .filter(badge_progress_entry::Column::BadgeProgressId.eq(parent.id))
            .all(db)
            .await?
            .into_iter()
            .map(|e| (e.badge_id, e))
            .collect(),
        None => HashMap::new(),
    };

    Ok(badges
        .into_iter()
        .map(|badge| {
            let entry = entries.get(&badge.id);
            BadgeView {
                badge_id: badge.id,
                name: badge.name,
                description: badge.description,
                badge_type: badge.badge_type,
                image_url: badge.image_url,
                progress: entry.map(|e| e.progress).unwrap_or(0),
                threshold: badge.threshold,
                is_unlocked: entry.is_some_and(|e| e.is_unlocked),
                unlocked_at: entry.and_then(|e| e.unlocked_at.clone()),
            }
        })
        .collect())
}
