//! Quiz Service - Q&A quest answers

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use sea_orm::*;
use serde::{Deserialize, Serialize};

use super::ServiceError;
use super::quest_service::{self, ProgressOutcome, quest_type_of};
use super::registration_service::find_registration;
use crate::domain::{QuestType, Session};
use crate::models::quest::Entity as Quest;

const WRONG_ANSWER_MESSAGES: &[&str] = &[
    "Not quite! Give it another go.",
    "Close, but no diamonds yet.",
    "That's not it. Were you listening to the speaker?",
    "Nope! Try again.",
    "Almost there, think it over once more.",
];

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSubmission {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerResult {
    Correct { outcome: ProgressOutcome },
    Incorrect { message: String },
}

/// Trimmed, case-insensitive comparison
pub fn answer_matches(expected: &str, given: &str) -> bool {
    expected.trim().to_lowercase() == given.trim().to_lowercase()
}

fn wrong_answer_message() -> String {
    WRONG_ANSWER_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Incorrect answer")
        .to_string()
}

/// Answer a Q&A quest. A wrong answer changes nothing and can be retried.
pub async fn submit_answer(
    db: &DatabaseConnection,
    session: &Session,
    quest_id: i32,
    submission: AnswerSubmission,
    now: DateTime<Utc>,
) -> Result<AnswerResult, ServiceError> {
    let quest = Quest::find_by_id(quest_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound("Quest"))?;
    if quest_type_of(&quest)? != QuestType::QuestionAnswer {
        return Err(ServiceError::Validation(
            "This quest does not take answers".to_string(),
        ));
    }
    find_registration(db, session.user_id, quest.event_id)
        .await?
        .ok_or(ServiceError::NotRegistered)?;

    let entry = quest_service::find_entry(db, session.user_id, quest.id).await?;
    if entry.is_some_and(|e| e.is_completed) {
        return Err(ServiceError::AlreadySubmitted);
    }

    let expected = quest.correct_answer.as_deref().ok_or_else(|| {
        ServiceError::InvalidState("This question has no answer configured".to_string())
    })?;
    if !answer_matches(expected, &submission.answer) {
        tracing::debug!("User {} answered quest {} incorrectly", session.user_id, quest.id);
        return Ok(AnswerResult::Incorrect {
            message: wrong_answer_message(),
        });
    }

    let txn = db.begin().await?;
    let token = format!("qna:u{}", session.user_id);
    let outcome = quest_service::apply_progress(&txn, session.user_id, &quest, &token, now).await?;
    txn.commit().await?;

    Ok(AnswerResult::Correct { outcome })
}
