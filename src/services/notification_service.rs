//! Notification Service - event reminders
//!
//! Reminders are rows, not pushes. An external dispatcher polls the due list,
//! delivers to the stored push token, then marks each row sent.

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Serialize;

use super::ServiceError;
use crate::domain::{Event, Role, Session};
use crate::models::scheduled_notification::{self, Entity as ScheduledNotification};
use crate::models::user::Entity as User;
use crate::utils::time::{parse_timestamp, timestamp};

/// (kind, lead time before the event starts)
const REMINDERS: [(&str, i64); 2] = [("reminder_24h", 24 * 60), ("reminder_1h", 60)];

#[derive(Debug, Clone, Serialize)]
pub struct DueNotification {
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub send_at: String,
    pub push_token: Option<String>,
}

fn reminder_text(kind: &str, event: &Event) -> (String, String) {
    let when = if kind == "reminder_1h" {
        "in 1 hour"
    } else {
        "tomorrow"
    };
    (
        format!("{} starts {}", event.title, when),
        format!(
            "Don't forget: {} at {}. Check in on arrival to earn your rewards!",
            event.title, event.location_name
        ),
    )
}

/// Queue the T-24h and T-1h reminders that are still in the future.
/// Returns how many were queued.
pub async fn schedule_reminders<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    event: &Event,
    now: DateTime<Utc>,
) -> Result<usize, ServiceError> {
    let Some(start) = parse_timestamp(&event.start_at) else {
        return Err(ServiceError::Database(format!(
            "event {} has an unreadable start time",
            event.id
        )));
    };

    let mut scheduled = 0;
    for (kind, lead_minutes) in REMINDERS {
        let send_at = start - Duration::minutes(lead_minutes);
        if send_at <= now {
            continue;
        }

        let exists = ScheduledNotification::find()
            .filter(scheduled_notification::Column::UserId.eq(user_id))
            .filter(scheduled_notification::Column::EventId.eq(event.id))
            .filter(scheduled_notification::Column::Kind.eq(kind))
            .count(conn)
            .await?;
        if exists > 0 {
            continue;
        }

        let (title, body) = reminder_text(kind, event);
        scheduled_notification::ActiveModel {
            user_id: Set(user_id),
            event_id: Set(event.id),
            kind: Set(kind.to_string()),
            title: Set(title),
            body: Set(body),
            send_at: Set(timestamp(send_at)),
            sent: Set(false),
            sent_at: Set(None),
            created_at: Set(timestamp(now)),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        scheduled += 1;
    }
    Ok(scheduled)
}

/// Unsent reminders whose time has come (admins only)
pub async fn due_notifications(
    db: &DatabaseConnection,
    session: &Session,
    now: DateTime<Utc>,
) -> Result<Vec<DueNotification>, ServiceError> {
    if session.role != Role::Admin {
        return Err(ServiceError::Forbidden);
    }

    let rows = ScheduledNotification::find()
        .filter(scheduled_notification::Column::Sent.eq(false))
        .filter(scheduled_notification::Column::SendAt.lte(timestamp(now)))
        .order_by_asc(scheduled_notification::Column::SendAt)
        .find_also_related(User)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(n, user)| DueNotification {
            id: n.id,
            user_id: n.user_id,
            event_id: n.event_id,
            kind: n.kind,
            title: n.title,
            body: n.body,
            send_at: n.send_at,
            push_token: user.and_then(|u| u.push_token),
        })
        .collect())
}

/// Mark a reminder delivered. Only the first call succeeds.
pub async fn mark_sent(
    db: &DatabaseConnection,
    session: &Session,
    notification_id: i32,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    if session.role != Role::Admin {
        return Err(ServiceError::Forbidden);
    }

    let result = ScheduledNotification::update_many()
        .col_expr(scheduled_notification::Column::Sent, Expr::value(true))
        .col_expr(
            scheduled_notification::Column::SentAt,
            Expr::value(Some(timestamp(now))),
        )
        .filter(scheduled_notification::Column::Id.eq(notification_id))
        .filter(scheduled_notification::Column::Sent.eq(false))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let exists = ScheduledNotification::find_by_id(notification_id)
            .one(db)
            .await?
            .is_some();
        return Err(if exists {
            ServiceError::Conflict("Notification already sent".to_string())
        } else {
            ServiceError::NotFound("Notification")
        });
    }
    Ok(())
}
