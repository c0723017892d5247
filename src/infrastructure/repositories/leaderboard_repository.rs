//! SeaORM implementation of LeaderboardRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::domain::{DomainError, Faculty, LeaderboardRepository, LeaderboardRow};
use crate::models::leaderboard_entry::{Column, Entity as LeaderboardEntity};
use crate::models::user::Entity as UserEntity;

pub struct SeaOrmLeaderboardRepository {
    db: DatabaseConnection,
}

impl SeaOrmLeaderboardRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LeaderboardRepository for SeaOrmLeaderboardRepository {
    async fn entries_for_faculty(
        &self,
        faculty: Faculty,
    ) -> Result<Vec<LeaderboardRow>, DomainError> {
        let rows = LeaderboardEntity::find()
            .filter(Column::Faculty.eq(faculty.code()))
            .find_also_related(UserEntity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(entry, user)| LeaderboardRow {
                user_id: entry.user_id,
                display_name: user
                    .map(|u| u.display_name)
                    .unwrap_or_else(|| "Unknown".to_string()),
                points: entry.points,
                updated_at: entry.updated_at,
            })
            .collect())
    }
}
