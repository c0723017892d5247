//! Feedback Service - post-event survey

use chrono::{DateTime, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};

use super::ServiceError;
use super::quest_service::{self, ProgressOutcome};
use super::registration_service::find_registration;
use crate::domain::{QuestType, Session};
use crate::models::feedback::{self, Entity as Feedback};
use crate::utils::time::timestamp;

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackForm {
    /// 1 (poor) to 5 (excellent)
    pub rating: i32,
    pub liked: String,
    pub improvement: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackReceipt {
    pub feedback_id: i32,
    pub quests: Vec<ProgressOutcome>,
}

impl FeedbackForm {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ServiceError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        if self.liked.trim().is_empty() || self.improvement.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Please answer both questions".to_string(),
            ));
        }
        Ok(())
    }
}

/// Submit feedback once per event; completes the feedback quest
pub async fn submit_feedback(
    db: &DatabaseConnection,
    session: &Session,
    event_id: i32,
    form: FeedbackForm,
    now: DateTime<Utc>,
) -> Result<FeedbackReceipt, ServiceError> {
    form.validate()?;
    find_registration(db, session.user_id, event_id)
        .await?
        .ok_or(ServiceError::NotRegistered)?;

    let txn = db.begin().await?;

    let existing = Feedback::find()
        .filter(feedback::Column::UserId.eq(session.user_id))
        .filter(feedback::Column::EventId.eq(event_id))
        .count(&txn)
        .await?;
    if existing > 0 {
        return Err(ServiceError::AlreadySubmitted);
    }

    let saved = feedback::ActiveModel {
        user_id: Set(session.user_id),
        event_id: Set(event_id),
        rating: Set(form.rating),
        liked: Set(form.liked.trim().to_string()),
        improvement: Set(form.improvement.trim().to_string()),
        created_at: Set(timestamp(now)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let token = format!("feedback:u{}:e{}", session.user_id, event_id);
    let mut quests = Vec::new();
    for quest in quest_service::quests_of_type(&txn, event_id, QuestType::Feedback).await? {
        quests.push(quest_service::apply_progress(&txn, session.user_id, &quest, &token, now).await?);
    }

    txn.commit().await?;

    tracing::info!(
        "User {} left {}-star feedback for event {}",
        session.user_id,
        saved.rating,
        event_id
    );

    Ok(FeedbackReceipt {
        feedback_id: saved.id,
        quests,
    })
}
