//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{EventRepository, LeaderboardRepository};
use crate::infrastructure::config::{CampusRules, Config};
use crate::infrastructure::{SeaOrmEventRepository, SeaOrmLeaderboardRepository};
use crate::services::qr::QrCodec;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    /// Check-in and registration tunables
    pub rules: CampusRules,
    /// Seals and opens attendance/networking QR payloads
    pub qr: Arc<QrCodec>,
    /// Event repository
    pub event_repo: Arc<dyn EventRepository>,
    /// Leaderboard repository
    pub leaderboard_repo: Arc<dyn LeaderboardRepository>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, config: &Config) -> Self {
        let event_repo = Arc::new(SeaOrmEventRepository::new(db.clone()));
        let leaderboard_repo = Arc::new(SeaOrmLeaderboardRepository::new(db.clone()));

        Self {
            db,
            rules: config.rules,
            qr: Arc::new(QrCodec::new(&config.qr_secret)),
            event_repo,
            leaderboard_repo,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
