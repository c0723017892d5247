//! SeaORM implementation of EventRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::domain::{DomainError, Event, EventFilter, EventRepository};
use crate::models::event::{Column, Entity as EventEntity};
use crate::models::registration::{self, Entity as RegistrationEntity};

/// SeaORM-based implementation of EventRepository
pub struct SeaOrmEventRepository {
    db: DatabaseConnection,
}

impl SeaOrmEventRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventRepository for SeaOrmEventRepository {
    async fn find_all(&self, filter: EventFilter) -> Result<Vec<Event>, DomainError> {
        let mut query = EventEntity::find();

        if let Some(category) = filter.category {
            query = query.filter(Column::Category.eq(category.code()));
        }
        if let Some(after) = filter.ending_after {
            query = query.filter(Column::EndAt.gt(after));
        }
        if let Some(organiser) = filter.organiser {
            query = query.filter(Column::Organiser.eq(organiser));
        }

        let models = query
            .order_by_asc(Column::StartAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;

        models.into_iter().map(Event::try_from).collect()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Event>, DomainError> {
        EventEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Event::try_from)
            .transpose()
    }

    async fn find_registered(&self, user_id: i32) -> Result<Vec<Event>, DomainError> {
        let rows = RegistrationEntity::find()
            .filter(registration::Column::UserId.eq(user_id))
            .find_also_related(EventEntity)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .filter_map(|(_, event)| event)
            .map(Event::try_from)
            .collect()
    }
}
