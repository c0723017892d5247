//! Quest Service - per-registration quest progress
//!
//! Every entry moves through
//! `not started -> in progress -> completed -> claimed`, or ends in
//! `failed` (early-bird only). Progress is only ever written through
//! [`apply_progress`], which runs inside the caller's transaction, is keyed
//! by a completion token so a replayed event changes nothing, and keeps
//! `progress <= threshold` with `is_completed <=> progress == threshold`.

use chrono::{DateTime, Utc};
use sea_orm::*;
use serde::Serialize;
use std::collections::HashMap;

use super::ServiceError;
use super::badge_service::{self, BadgeUpdate};
use super::registration_service;
use crate::domain::{QuestType, Session};
use crate::models::applied_completion;
use crate::models::quest::{self, Entity as Quest};
use crate::models::quest_progress_entry::{self, Entity as QuestProgressEntry};
use crate::models::registration::{self, Entity as Registration};
use crate::utils::time::timestamp;

/// Behavior shared by every quest variant
pub trait QuestRule {
    /// Threshold stored on a fresh entry when the template is cloned
    fn start(&self, quest: &quest::Model) -> i32;
    /// Progress after one qualifying event
    fn progress(&self, current: i32, threshold: i32) -> i32;
    /// Completion predicate
    fn complete(&self, progress: i32, threshold: i32) -> bool;
}

impl QuestRule for QuestType {
    fn start(&self, quest: &quest::Model) -> i32 {
        self.completion_threshold(quest.target_count)
    }

    fn progress(&self, current: i32, threshold: i32) -> i32 {
        match self {
            // One credit per new connection
            QuestType::Networking => (current + 1).min(threshold),
            // Single qualifying event finishes the quest
            QuestType::Attendance
            | QuestType::EarlyBird
            | QuestType::QuestionAnswer
            | QuestType::Feedback => threshold,
        }
    }

    fn complete(&self, progress: i32, threshold: i32) -> bool {
        progress == threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestState {
    NotStarted,
    InProgress,
    Completed,
    Claimed,
    Failed,
}

impl QuestState {
    pub fn of(entry: &quest_progress_entry::Model) -> Self {
        if entry.claimed {
            QuestState::Claimed
        } else if entry.is_completed {
            QuestState::Completed
        } else if entry.is_failed {
            QuestState::Failed
        } else if entry.progress > 0 {
            QuestState::InProgress
        } else {
            QuestState::NotStarted
        }
    }
}

/// Result of applying one completion event to one entry
#[derive(Debug, Clone, Serialize)]
pub struct ProgressOutcome {
    pub entry_id: i32,
    pub quest_id: i32,
    pub quest_type: QuestType,
    pub progress: i32,
    pub threshold: i32,
    pub state: QuestState,
    /// False when the token was already applied or the entry was settled
    pub applied: bool,
    pub newly_completed: bool,
    pub badges: Vec<BadgeUpdate>,
}

impl ProgressOutcome {
    fn unchanged(entry: &quest_progress_entry::Model, quest_type: QuestType) -> Self {
        Self {
            entry_id: entry.id,
            quest_id: entry.quest_id,
            quest_type,
            progress: entry.progress,
            threshold: entry.threshold,
            state: QuestState::of(entry),
            applied: false,
            newly_completed: false,
            badges: Vec::new(),
        }
    }
}

/// Quest template joined with the caller's progress
#[derive(Debug, Clone, Serialize)]
pub struct QuestCard {
    pub quest_id: i32,
    pub quest_type: QuestType,
    pub title: String,
    pub description: Option<String>,
    pub question: Option<String>,
    pub diamond_reward: i32,
    pub points_reward: i32,
    pub entry_id: Option<i32>,
    pub progress: i32,
    pub threshold: i32,
    pub state: QuestState,
}

pub fn quest_type_of(quest: &quest::Model) -> Result<QuestType, ServiceError> {
    quest.quest_type.parse::<QuestType>().map_err(ServiceError::from)
}

pub async fn quests_of_type<C: ConnectionTrait>(
    conn: &C,
    event_id: i32,
    quest_type: QuestType,
) -> Result<Vec<quest::Model>, ServiceError> {
    let quests = Quest::find()
        .filter(quest::Column::EventId.eq(event_id))
        .filter(quest::Column::QuestType.eq(quest_type.code()))
        .order_by_asc(quest::Column::Id)
        .all(conn)
        .await?;
    Ok(quests)
}

pub async fn find_entry<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    quest_id: i32,
) -> Result<Option<quest_progress_entry::Model>, ServiceError> {
    let entry = QuestProgressEntry::find()
        .filter(quest_progress_entry::Column::UserId.eq(user_id))
        .filter(quest_progress_entry::Column::QuestId.eq(quest_id))
        .one(conn)
        .await?;
    Ok(entry)
}

/// Record a completion token. Returns false if it was already recorded.
pub async fn claim_token<C: ConnectionTrait>(
    conn: &C,
    token: &str,
    user_id: i32,
    now: DateTime<Utc>,
) -> Result<bool, ServiceError> {
    if applied_completion::Entity::find_by_id(token.to_owned())
        .one(conn)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    let row = applied_completion::ActiveModel {
        token: Set(token.to_owned()),
        user_id: Set(user_id),
        created_at: Set(timestamp(now)),
    };
    applied_completion::Entity::insert(row)
        .exec_without_returning(conn)
        .await?;
    Ok(true)
}

/// Apply one qualifying event to the user's entry for `quest`.
///
/// Must run inside the caller's transaction so the token, the entry and any
/// badge increments land together.
pub async fn apply_progress<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    quest: &quest::Model,
    token: &str,
    now: DateTime<Utc>,
) -> Result<ProgressOutcome, ServiceError> {
    let quest_type = quest_type_of(quest)?;

    let entry = match find_entry(conn, user_id, quest.id).await? {
        Some(entry) => entry,
        None => {
            // Repair registrations whose progress was never initialised
            registration_service::ensure_quest_progress(conn, user_id, quest.event_id, now)
                .await?;
            find_entry(conn, user_id, quest.id)
                .await?
                .ok_or(ServiceError::NotFound("Quest progress"))?
        }
    };

    if entry.is_completed || entry.is_failed {
        return Ok(ProgressOutcome::unchanged(&entry, quest_type));
    }

    let token = format!("{}:q{}", token, quest.id);
    if !claim_token(conn, &token, user_id, now).await? {
        tracing::debug!("Completion token {} already applied", token);
        return Ok(ProgressOutcome::unchanged(&entry, quest_type));
    }

    let progress = quest_type.progress(entry.progress, entry.threshold);
    let completed = quest_type.complete(progress, entry.threshold);
    let now_str = timestamp(now);

    let mut active: quest_progress_entry::ActiveModel = entry.into();
    active.progress = Set(progress);
    active.is_completed = Set(completed);
    if completed {
        active.completed_at = Set(Some(now_str.clone()));
    }
    active.updated_at = Set(now_str);
    let updated = active.update(conn).await?;

    let badges = if completed {
        tracing::info!(
            "Quest {} ({}) completed by user {}",
            quest.id,
            quest_type,
            user_id
        );
        badge_service::record_completion(conn, user_id, quest_type, quest.id, now).await?
    } else {
        Vec::new()
    };

    Ok(ProgressOutcome {
        entry_id: updated.id,
        quest_id: updated.quest_id,
        quest_type,
        progress: updated.progress,
        threshold: updated.threshold,
        state: QuestState::of(&updated),
        applied: true,
        newly_completed: completed,
        badges,
    })
}

/// Close an entry that can no longer be completed
pub async fn mark_failed<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    quest: &quest::Model,
    now: DateTime<Utc>,
) -> Result<Option<quest_progress_entry::Model>, ServiceError> {
    let Some(entry) = find_entry(conn, user_id, quest.id).await? else {
        return Ok(None);
    };
    if entry.is_completed || entry.is_failed {
        return Ok(Some(entry));
    }

    let mut active: quest_progress_entry::ActiveModel = entry.into();
    active.is_failed = Set(true);
    active.updated_at = Set(timestamp(now));
    Ok(Some(active.update(conn).await?))
}

/// All quests of an event with the caller's progress on each
pub async fn quest_board(
    db: &DatabaseConnection,
    session: &Session,
    event_id: i32,
) -> Result<Vec<QuestCard>, ServiceError> {
    let registered = Registration::find()
        .filter(registration::Column::UserId.eq(session.user_id))
        .filter(registration::Column::EventId.eq(event_id))
        .one(db)
        .await?;
    if registered.is_none() {
        return Err(ServiceError::NotRegistered);
    }

    let quests = Quest::find()
        .filter(quest::Column::EventId.eq(event_id))
        .order_by_asc(quest::Column::Id)
        .all(db)
        .await?;
    let quest_ids: Vec<i32> = quests.iter().map(|q| q.id).collect();

    let entries: HashMap<i32, quest_progress_entry::Model> = if quest_ids.is_empty() {
        HashMap::new()
    } else {
        QuestProgressEntry::find()
            .filter(quest_progress_entry::Column::UserId.eq(session.user_id))
            .filter(quest_progress_entry::Column::QuestId.is_in(quest_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|e| (e.quest_id, e))
            .collect()
    };

    quests
        .into_iter()
        .map(|quest| {
            let quest_type = quest_type_of(&quest)?;
            let entry = entries.get(&quest.id);
            Ok(QuestCard {
                quest_id: quest.id,
                quest_type,
                title: quest.title.clone(),
                description: quest.description.clone(),
                question: quest.question.clone(),
                diamond_reward: quest.diamond_reward,
                points_reward: quest.points_reward,
                entry_id: entry.map(|e| e.id),
                progress: entry.map(|e| e.progress).unwrap_or(0),
                threshold: entry
                    .map(|e| e.threshold)
                    .unwrap_or_else(|| quest_type.start(&quest)),
                state: entry.map(QuestState::of).unwrap_or(QuestState::NotStarted),
            })
        })
        .collect()
}
