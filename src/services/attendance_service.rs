//! Attendance Service - venue check-in and the early-bird ranking
//!
//! The organiser's device shows a rotating attendance QR. An attendee scans
//! it from inside the geofence; the scan marks the registration attended and
//! completes the attendance quest. Early-bird rank is decided in the same
//! transaction, so two attendees scanning at once cannot both take the last
//! slot.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::{Deserialize, Serialize};

use super::ServiceError;
use super::geo::within_radius;
use super::qr::{IssuedQr, QrCodec, QrKind, QrPayload};
use super::quest_service::{self, ProgressOutcome};
use super::registration_service::{find_registration, load_event};
use crate::domain::{QuestType, Session};
use crate::infrastructure::config::CampusRules;
use crate::models::registration::{self, Entity as Registration};
use crate::utils::time::timestamp;

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceScan {
    pub event_id: i32,
    /// Sealed QR text as read by the camera
    pub qr: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EarlyBirdVerdict {
    /// Event has no early-bird quest
    NoQuest,
    /// User has not checked in yet
    Pending,
    Credited { rank: usize },
    Missed { rank: usize, slots: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReceipt {
    pub event_id: i32,
    pub scanned_at: String,
    pub distance_m: f64,
    pub quests: Vec<ProgressOutcome>,
    pub early_bird: EarlyBirdVerdict,
}

/// Organiser-side QR for the venue screen
pub async fn issue_attendance_qr(
    db: &DatabaseConnection,
    codec: &QrCodec,
    rules: &CampusRules,
    session: &Session,
    event_id: i32,
    now: DateTime<Utc>,
) -> Result<IssuedQr, ServiceError> {
    if !session.role.can_manage_events() {
        return Err(ServiceError::Forbidden);
    }
    // Only issue codes for events that exist
    load_event(db, event_id).await?;
    codec.issue(&QrPayload::attendance(event_id, now), rules.qr_validity_secs)
}

/// 1-based position of `user_id` among attended registrations, ordered by
/// scan instant then registration id. `None` if the user has not attended.
pub fn arrival_rank(attended: &[registration::Model], user_id: i32) -> Option<usize> {
    let mut order: Vec<&registration::Model> = attended
        .iter()
        .filter(|r| r.attended && r.attendance_scanned_at.is_some())
        .collect();
    order.sort_by(|a, b| {
        a.attendance_scanned_at
            .cmp(&b.attendance_scanned_at)
            .then(a.id.cmp(&b.id))
    });
    order
        .iter()
        .position(|r| r.user_id == user_id)
        .map(|index| index + 1)
}

/// Credit or fail the user's early-bird entries based on arrival rank.
///
/// Re-running it after more check-ins gives the same answer: ranks of
/// earlier arrivals never move, and settled entries are left alone.
pub async fn evaluate_early_bird<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    event_id: i32,
    now: DateTime<Utc>,
) -> Result<(EarlyBirdVerdict, Vec<ProgressOutcome>), ServiceError> {
    let quests = quest_service::quests_of_type(conn, event_id, QuestType::EarlyBird).await?;
    if quests.is_empty() {
        return Ok((EarlyBirdVerdict::NoQuest, Vec::new()));
    }

    let attended = Registration::find()
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::Attended.eq(true))
        .all(conn)
        .await?;
    let Some(rank) = arrival_rank(&attended, user_id) else {
        return Ok((EarlyBirdVerdict::Pending, Vec::new()));
    };

    let mut outcomes = Vec::new();
    let mut verdict = EarlyBirdVerdict::Pending;
    for quest in &quests {
        let slots = QuestType::EarlyBird.completion_threshold(quest.target_count) as usize;
        if rank <= slots {
            let token = format!("early_bird:u{}:e{}", user_id, event_id);
            outcomes.push(quest_service::apply_progress(conn, user_id, quest, &token, now).await?);
            verdict = EarlyBirdVerdict::Credited { rank };
        } else {
            quest_service::mark_failed(conn, user_id, quest, now).await?;
            verdict = EarlyBirdVerdict::Missed { rank, slots };
        }
    }
    Ok((verdict, outcomes))
}

/// Check in at the venue
pub async fn scan_attendance(
    db: &DatabaseConnection,
    codec: &QrCodec,
    rules: &CampusRules,
    session: &Session,
    scan: AttendanceScan,
    now: DateTime<Utc>,
) -> Result<AttendanceReceipt, ServiceError> {
    let payload = codec.open(&scan.qr)?;
    if payload.kind != QrKind::Attendance {
        return Err(ServiceError::QrWrongKind);
    }
    if payload.event_id != scan.event_id {
        return Err(ServiceError::QrWrongEvent);
    }
    payload.check_fresh(now, rules.qr_validity_secs)?;

    let registration = find_registration(db, session.user_id, scan.event_id)
        .await?
        .ok_or(ServiceError::NotRegistered)?;
    if registration.attended {
        return Err(ServiceError::AlreadyAttended);
    }

    let event = load_event(db, scan.event_id).await?;
    let (inside, distance_m) = within_radius(
        (event.latitude, event.longitude),
        (scan.latitude, scan.longitude),
        rules.geofence_radius_m,
    );
    if !inside {
        tracing::warn!(
            "User {} scanned {:.0}m from event {}",
            session.user_id,
            distance_m,
            event.id
        );
        return Err(ServiceError::OutOfRange {
            distance_m,
            radius_m: rules.geofence_radius_m,
        });
    }

    let scanned_at = timestamp(now);
    let txn = db.begin().await?;

    let marked = Registration::update_many()
        .col_expr(registration::Column::Attended, Expr::value(true))
        .col_expr(
            registration::Column::AttendanceScannedAt,
            Expr::value(Some(scanned_at.clone())),
        )
        .col_expr(registration::Column::UpdatedAt, Expr::value(scanned_at.clone()))
        .filter(registration::Column::Id.eq(registration.id))
        .filter(registration::Column::Attended.eq(false))
        .exec(&txn)
        .await?;
    if marked.rows_affected == 0 {
        return Err(ServiceError::AlreadyAttended);
    }

    let token = format!("attendance:u{}:e{}", session.user_id, scan.event_id);
    let mut quests = Vec::new();
    for quest in quest_service::quests_of_type(&txn, scan.event_id, QuestType::Attendance).await? {
        quests.push(quest_service::apply_progress(&txn, session.user_id, &quest, &token, now).await?);
    }

    let (early_bird, early) =
        evaluate_early_bird(&txn, session.user_id, scan.event_id, now).await?;
    quests.extend(early);

    txn.commit().await?;

    tracing::info!(
        "✅ User {} checked in to event {} ({:?})",
        session.user_id,
        scan.event_id,
        early_bird
    );

    Ok(AttendanceReceipt {
        event_id: scan.event_id,
        scanned_at,
        distance_m,
        quests,
        early_bird,
    })
}
