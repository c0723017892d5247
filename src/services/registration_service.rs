//! Registration Service - eligibility checks and the registration transaction

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::ServiceError;
use super::event_service::check_eligibility;
use super::notification_service;
use super::quest_service::{QuestRule, quest_type_of};
use crate::domain::{Event, Faculty, Session};
use crate::infrastructure::config::CampusRules;
use crate::models::event::{self, Entity as EventEntity};
use crate::models::network_connection::{self, Entity as NetworkConnection};
use crate::models::quest::{self, Entity as Quest};
use crate::models::quest_progress::{self, Entity as QuestProgress};
use crate::models::quest_progress_entry::{self, Entity as QuestProgressEntry};
use crate::models::registration::{self, Entity as Registration};
use crate::models::scheduled_notification::{self, Entity as ScheduledNotification};
use crate::models::user::Entity as User;
use crate::utils::time::timestamp;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegistrationRequest {
    /// Base64 image, with or without a `data:image/...;base64,` prefix
    pub payment_proof: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReceipt {
    pub registration_id: i32,
    pub event_id: i32,
    /// Paid events stay unverified until an organiser checks the proof
    pub is_verified: bool,
    pub quests_initialised: usize,
    pub reminders_scheduled: usize,
    pub remaining_capacity: i32,
}

/// A registration with its event
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationView {
    pub registration_id: i32,
    pub is_verified: bool,
    pub attended: bool,
    pub attendance_scanned_at: Option<String>,
    pub registered_at: String,
    pub event: Event,
}

/// Strip an optional data-URL prefix, decode, and enforce the size cap.
/// Returns the bare base64 text to store.
pub fn validate_payment_proof(raw: &str, max_bytes: usize) -> Result<String, ServiceError> {
    let encoded = match raw.split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => raw,
    }
    .trim();

    if encoded.is_empty() {
        return Err(ServiceError::PaymentProofRequired);
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| ServiceError::Validation("Payment proof is not a valid image".to_string()))?;
    if bytes.len() > max_bytes {
        return Err(ServiceError::PaymentProofTooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }
    Ok(encoded.to_string())
}

pub(crate) async fn load_event<C: ConnectionTrait>(
    conn: &C,
    event_id: i32,
) -> Result<Event, ServiceError> {
    let model = EventEntity::find_by_id(event_id)
        .one(conn)
        .await?
        .ok_or(ServiceError::NotFound("Event"))?;
    Ok(Event::try_from(model)?)
}

pub(crate) async fn find_registration<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    event_id: i32,
) -> Result<Option<registration::Model>, ServiceError> {
    let found = Registration::find()
        .filter(registration::Column::UserId.eq(user_id))
        .filter(registration::Column::EventId.eq(event_id))
        .one(conn)
        .await?;
    Ok(found)
}

/// Register the session user for an event.
///
/// All checks run before any write. The writes (registration row,
/// participant count, quest progress, reminders) share one transaction, and
/// the count only moves while it is below capacity.
pub async fn register(
    db: &DatabaseConnection,
    rules: &CampusRules,
    session: &Session,
    event_id: i32,
    request: RegistrationRequest,
    now: DateTime<Utc>,
) -> Result<RegistrationReceipt, ServiceError> {
    let event = load_event(db, event_id).await?;
    let user = User::find_by_id(session.user_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;
    let faculty = user.faculty.parse::<Faculty>()?;

    let already = find_registration(db, session.user_id, event_id)
        .await?
        .is_some();
    if let Err(e) = check_eligibility(&event, faculty, user.year_of_study, now, already) {
        tracing::warn!(
            "Registration of user {} for event {} rejected: {}",
            session.user_id,
            event_id,
            e
        );
        return Err(e);
    }

    let payment_proof = if event.requires_payment {
        let raw = request
            .payment_proof
            .as_deref()
            .ok_or(ServiceError::PaymentProofRequired)?;
        Some(validate_payment_proof(raw, rules.payment_proof_max_bytes)?)
    } else {
        None
    };

    let now_str = timestamp(now);
    let txn = db.begin().await?;

    let bumped = EventEntity::update_many()
        .col_expr(
            event::Column::ParticipantCount,
            Expr::col(event::Column::ParticipantCount).add(1),
        )
        .col_expr(event::Column::UpdatedAt, Expr::value(now_str.clone()))
        .filter(event::Column::Id.eq(event_id))
        .filter(Expr::col(event::Column::ParticipantCount).lt(Expr::col(event::Column::Capacity)))
        .exec(&txn)
        .await?;
    if bumped.rows_affected == 0 {
        // Filled up since the checks ran
        return Err(ServiceError::EventFull);
    }

    let row = registration::ActiveModel {
        user_id: Set(session.user_id),
        event_id: Set(event_id),
        is_verified: Set(!event.requires_payment),
        attended: Set(false),
        attendance_scanned_at: Set(None),
        payment_proof: Set(payment_proof),
        created_at: Set(now_str.clone()),
        updated_at: Set(now_str),
        ..Default::default()
    };
    let saved = row.insert(&txn).await?;

    let quests_initialised = ensure_quest_progress(&txn, session.user_id, event_id, now).await?;
    let reminders_scheduled =
        notification_service::schedule_reminders(&txn, session.user_id, &event, now).await?;

    txn.commit().await?;

    tracing::info!(
        "📝 User {} registered for event {} ({} quests)",
        session.user_id,
        event_id,
        quests_initialised
    );

    Ok(RegistrationReceipt {
        registration_id: saved.id,
        event_id,
        is_verified: saved.is_verified,
        quests_initialised,
        reminders_scheduled,
        remaining_capacity: (event.remaining_capacity() - 1).max(0),
    })
}

/// Clone the event's quest templates into the user's progress record.
///
/// Safe to replay: only missing rows are created. Returns how many entries
/// were added.
pub async fn ensure_quest_progress<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    event_id: i32,
    now: DateTime<Utc>,
) -> Result<usize, ServiceError> {
    let now_str = timestamp(now);

    let parent = match QuestProgress::find()
        .filter(quest_progress::Column::UserId.eq(user_id))
        .filter(quest_progress::Column::EventId.eq(event_id))
        .one(conn)
        .await?
    {
        Some(parent) => parent,
        None => {
            quest_progress::ActiveModel {
                user_id: Set(user_id),
                event_id: Set(event_id),
                created_at: Set(now_str.clone()),
                ..Default::default()
            }
            .insert(conn)
            .await?
        }
    };

    let quests = Quest::find()
        .filter(quest::Column::EventId.eq(event_id))
        .order_by_asc(quest::Column::Id)
        .all(conn)
        .await?;

    let existing: HashSet<i32> = QuestProgressEntry::find()
        .filter(quest_progress_entry::Column::QuestProgressId.eq(parent.id))
        .all(conn)
        .await?
        .into_iter()
        .map(|e| e.quest_id)
        .collect();

    let mut created = 0;
    for quest in quests.iter().filter(|q| !existing.contains(&q.id)) {
        let quest_type = quest_type_of(quest)?;
        quest_progress_entry::ActiveModel {
            quest_progress_id: Set(parent.id),
            quest_id: Set(quest.id),
            user_id: Set(user_id),
            progress: Set(0),
            threshold: Set(quest_type.start(quest)),
            is_completed: Set(false),
            is_failed: Set(false),
            claimed: Set(false),
            completed_at: Set(None),
            claimed_at: Set(None),
            updated_at: Set(now_str.clone()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        created += 1;
    }

    Ok(created)
}

/// Withdraw from an event before anything has been earned there, by the
/// user or by a peer who scanned them.
pub async fn cancel_registration(
    db: &DatabaseConnection,
    session: &Session,
    event_id: i32,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let registration = find_registration(db, session.user_id, event_id)
        .await?
        .ok_or(ServiceError::NotRegistered)?;
    if registration.attended {
        return Err(ServiceError::InvalidState(
            "Attendance is already recorded for this event".to_string(),
        ));
    }

    let parent = QuestProgress::find()
        .filter(quest_progress::Column::UserId.eq(session.user_id))
        .filter(quest_progress::Column::EventId.eq(event_id))
        .one(db)
        .await?;

    let txn = db.begin().await?;

    // Any edge at this event, in either direction, blocks withdrawal
    let edges = NetworkConnection::find()
        .filter(network_connection::Column::EventId.eq(event_id))
        .filter(
            Condition::any()
                .add(network_connection::Column::ScannerId.eq(session.user_id))
                .add(network_connection::Column::ScannedId.eq(session.user_id)),
        )
        .count(&txn)
        .await?;
    if edges > 0 {
        return Err(ServiceError::InvalidState(
            "You already connected with people at this event".to_string(),
        ));
    }

    if let Some(parent) = &parent {
        let settled = QuestProgressEntry::find()
            .filter(quest_progress_entry::Column::QuestProgressId.eq(parent.id))
            .filter(quest_progress_entry::Column::IsCompleted.eq(true))
            .count(&txn)
            .await?;
        if settled > 0 {
            return Err(ServiceError::InvalidState(
                "Quests were already completed at this event".to_string(),
            ));
        }

        QuestProgressEntry::delete_many()
            .filter(quest_progress_entry::Column::QuestProgressId.eq(parent.id))
            .exec(&txn)
            .await?;
        QuestProgress::delete_by_id(parent.id).exec(&txn).await?;
    }

    ScheduledNotification::delete_many()
        .filter(scheduled_notification::Column::UserId.eq(session.user_id))
        .filter(scheduled_notification::Column::EventId.eq(event_id))
        .filter(scheduled_notification::Column::Sent.eq(false))
        .exec(&txn)
        .await?;

    Registration::delete_by_id(registration.id)
        .exec(&txn)
        .await?;

    EventEntity::update_many()
        .col_expr(
            event::Column::ParticipantCount,
            Expr::col(event::Column::ParticipantCount).sub(1),
        )
        .col_expr(event::Column::UpdatedAt, Expr::value(timestamp(now)))
        .filter(event::Column::Id.eq(event_id))
        .filter(event::Column::ParticipantCount.gt(0))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        "User {} cancelled registration for event {}",
        session.user_id,
        event_id
    );
    Ok(())
}

/// The session user's registrations, soonest event first
pub async fn my_registrations(
    db: &DatabaseConnection,
    session: &Session,
) -> Result<Vec<RegistrationView>, ServiceError> {
    let rows = Registration::find()
        .filter(registration::Column::UserId.eq(session.user_id))
        .find_also_related(EventEntity)
        .all(db)
        .await?;

    let mut views = Vec::with_capacity(rows.len());
    for (registration, event) in rows {
        let Some(event) = event else {
            continue;
        };
        views.push(RegistrationView {
            registration_id: registration.id,
            is_verified: registration.is_verified,
            attended: registration.attended,
            attendance_scanned_at: registration.attendance_scanned_at,
            registered_at: registration.created_at,
            event: Event::try_from(event)?,
        });
    }
    views.sort_by(|a, b| a.event.start_at.cmp(&b.event.start_at));
    Ok(views)
}

/// Organisers confirm a payment proof
pub async fn verify_registration(
    db: &DatabaseConnection,
    session: &Session,
    registration_id: i32,
    now: DateTime<Utc>,
) -> Result<registration::Model, ServiceError> {
    if !session.role.can_manage_events() {
        return Err(ServiceError::Forbidden);
    }

    let registration = Registration::find_by_id(registration_id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound("Registration"))?;
    if registration.is_verified {
        return Ok(registration);
    }

    let mut active: registration::ActiveModel = registration.into();
    active.is_verified = Set(true);
    active.updated_at = Set(timestamp(now));
    let updated = active.update(db).await?;

    tracing::info!(
        "Registration {} verified by user {}",
        updated.id,
        session.user_id
    );
    Ok(updated)
}
