//! Network Service - attendee-to-attendee QR connections

use chrono::{DateTime, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};

use super::ServiceError;
use super::qr::{IssuedQr, QrCodec, QrKind, QrPayload};
use super::quest_service::{self, ProgressOutcome};
use super::registration_service::find_registration;
use crate::domain::{QuestType, Session};
use crate::infrastructure::config::CampusRules;
use crate::models::network_connection::{self, Entity as NetworkConnection};
use crate::models::user::Entity as User;
use crate::utils::time::timestamp;

#[derive(Debug, Clone, Deserialize)]
pub struct PeerScan {
    pub event_id: i32,
    pub qr: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReceipt {
    pub event_id: i32,
    pub peer_id: i32,
    pub peer_name: String,
    /// Scanner's networking quests
    pub quests: Vec<ProgressOutcome>,
    /// Peer's networking quests
    pub peer_quests: Vec<ProgressOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Connection {
    pub user_id: i32,
    pub display_name: String,
    pub faculty: String,
    pub connected_at: String,
}

/// The session user's personal networking QR for an event
pub async fn issue_network_qr(
    db: &DatabaseConnection,
    codec: &QrCodec,
    rules: &CampusRules,
    session: &Session,
    event_id: i32,
    now: DateTime<Utc>,
) -> Result<IssuedQr, ServiceError> {
    find_registration(db, session.user_id, event_id)
        .await?
        .ok_or(ServiceError::NotRegistered)?;
    codec.issue(
        &QrPayload::networking(event_id, session.user_id, now),
        rules.qr_validity_secs,
    )
}

async fn edge_exists<C: ConnectionTrait>(
    conn: &C,
    event_id: i32,
    a: i32,
    b: i32,
) -> Result<bool, ServiceError> {
    let count = NetworkConnection::find()
        .filter(network_connection::Column::EventId.eq(event_id))
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(network_connection::Column::ScannerId.eq(a))
                        .add(network_connection::Column::ScannedId.eq(b)),
                )
                .add(
                    Condition::all()
                        .add(network_connection::Column::ScannerId.eq(b))
                        .add(network_connection::Column::ScannedId.eq(a)),
                ),
        )
        .count(conn)
        .await?;
    Ok(count > 0)
}

async fn credit_networking<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    peer_id: i32,
    event_id: i32,
    now: DateTime<Utc>,
) -> Result<Vec<ProgressOutcome>, ServiceError> {
    let token = format!("network:e{}:u{}:p{}", event_id, user_id, peer_id);
    let mut outcomes = Vec::new();
    for quest in quest_service::quests_of_type(conn, event_id, QuestType::Networking).await? {
        outcomes.push(quest_service::apply_progress(conn, user_id, &quest, &token, now).await?);
    }
    Ok(outcomes)
}

/// Scan another attendee's networking QR.
///
/// Writes the edge in both directions and advances both users' networking
/// quests, all in one transaction.
pub async fn scan_peer(
    db: &DatabaseConnection,
    codec: &QrCodec,
    rules: &CampusRules,
    session: &Session,
    scan: PeerScan,
    now: DateTime<Utc>,
) -> Result<ConnectionReceipt, ServiceError> {
    let payload = codec.open(&scan.qr)?;
    if payload.kind != QrKind::Networking {
        return Err(ServiceError::QrWrongKind);
    }
    if payload.event_id != scan.event_id {
        return Err(ServiceError::QrWrongEvent);
    }
    payload.check_fresh(now, rules.qr_validity_secs)?;

    let peer_id = payload.user_id.ok_or(ServiceError::QrInvalid)?;
    if peer_id == session.user_id {
        return Err(ServiceError::SelfScan);
    }

    find_registration(db, session.user_id, scan.event_id)
        .await?
        .ok_or(ServiceError::NotRegistered)?;
    find_registration(db, peer_id, scan.event_id)
        .await?
        .ok_or(ServiceError::PeerNotRegistered)?;

    let peer = User::find_by_id(peer_id)
        .one(db)
        .await?
        .ok_or(ServiceError::PeerNotRegistered)?;

    let txn = db.begin().await?;

    if edge_exists(&txn, scan.event_id, session.user_id, peer_id).await? {
        return Err(ServiceError::AlreadyConnected);
    }

    let scanned_at = timestamp(now);
    for (scanner_id, scanned_id) in [(session.user_id, peer_id), (peer_id, session.user_id)] {
        network_connection::ActiveModel {
            event_id: Set(scan.event_id),
            scanner_id: Set(scanner_id),
            scanned_id: Set(scanned_id),
            scanned_at: Set(scanned_at.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let quests = credit_networking(&txn, session.user_id, peer_id, scan.event_id, now).await?;
    let peer_quests = credit_networking(&txn, peer_id, session.user_id, scan.event_id, now).await?;

    txn.commit().await?;

    tracing::info!(
        "🤝 Users {} and {} connected at event {}",
        session.user_id,
        peer_id,
        scan.event_id
    );

    Ok(ConnectionReceipt {
        event_id: scan.event_id,
        peer_id,
        peer_name: peer.display_name,
        quests,
        peer_quests,
    })
}

/// People the session user has connected with at an event
pub async fn list_connections(
    db: &DatabaseConnection,
    session: &Session,
    event_id: i32,
) -> Result<Vec<Connection>, ServiceError> {
    let rows = NetworkConnection::find()
        .filter(network_connection::Column::EventId.eq(event_id))
        .filter(network_connection::Column::ScannerId.eq(session.user_id))
        .order_by_asc(network_connection::Column::ScannedAt)
        .find_also_related(User)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(edge, user)| {
            user.map(|u| Connection {
                user_id: u.id,
                display_name: u.display_name,
                faculty: u.faculty,
                connected_at: edge.scanned_at,
            })
        })
        .collect())
}
