//! Chat Service - per-event message channel for registered attendees

use chrono::{DateTime, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};

use super::ServiceError;
use super::registration_service::find_registration;
use crate::domain::Session;
use crate::models::chat_message::{self, Entity as ChatMessage};
use crate::models::user::Entity as User;
use crate::utils::time::timestamp;

const MAX_MESSAGE_LEN: usize = 1000;
const PAGE_SIZE: u64 = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatLine {
    pub id: i32,
    pub user_id: i32,
    pub display_name: String,
    pub body: String,
    pub created_at: String,
}

async fn require_registration(
    db: &DatabaseConnection,
    session: &Session,
    event_id: i32,
) -> Result<(), ServiceError> {
    // Organisers can read and post on any event channel
    if session.role.can_manage_events() {
        return Ok(());
    }
    find_registration(db, session.user_id, event_id)
        .await?
        .map(|_| ())
        .ok_or(ServiceError::NotRegistered)
}

pub async fn post_message(
    db: &DatabaseConnection,
    session: &Session,
    event_id: i32,
    message: NewMessage,
    now: DateTime<Utc>,
) -> Result<ChatLine, ServiceError> {
    let body = message.body.trim();
    if body.is_empty() {
        return Err(ServiceError::Validation("Message is empty".to_string()));
    }
    if body.chars().count() > MAX_MESSAGE_LEN {
        return Err(ServiceError::Validation(format!(
            "Messages are limited to {} characters",
            MAX_MESSAGE_LEN
        )));
    }
    require_registration(db, session, event_id).await?;

    let author = User::find_by_id(session.user_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;

    let saved = chat_message::ActiveModel {
        event_id: Set(event_id),
        user_id: Set(session.user_id),
        body: Set(body.to_string()),
        created_at: Set(timestamp(now)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(ChatLine {
        id: saved.id,
        user_id: saved.user_id,
        display_name: author.display_name,
        body: saved.body,
        created_at: saved.created_at,
    })
}

/// Messages in posting order, optionally only those after `since`
pub async fn list_messages(
    db: &DatabaseConnection,
    session: &Session,
    event_id: i32,
    since: Option<String>,
) -> Result<Vec<ChatLine>, ServiceError> {
    require_registration(db, session, event_id).await?;

    let mut query = ChatMessage::find().filter(chat_message::Column::EventId.eq(event_id));
    if let Some(since) = since {
        query = query.filter(chat_message::Column::CreatedAt.gt(since));
    }

    let rows = query
        .order_by_asc(chat_message::Column::CreatedAt)
        .order_by_asc(chat_message::Column::Id)
        .find_also_related(User)
        .limit(PAGE_SIZE)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(m, user)| ChatLine {
            id: m.id,
            user_id: m.user_id,
            display_name: user
                .map(|u| u.display_name)
                .unwrap_or_else(|| "Unknown".to_string()),
            body: m.body,
            created_at: m.created_at,
        })
        .collect())
}
