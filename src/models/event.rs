use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub organiser: String,
    pub category: String, // EventCategory code
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub start_at: String,
    pub end_at: String,
    pub registration_deadline: String,
    pub capacity: i32,
    pub participant_count: i32,
    pub requires_payment: bool,
    pub fee: Option<f64>,
    pub restricted_faculties: String, // JSON array of faculty codes, empty = open
    pub restricted_years: String,     // JSON array of years, empty = open
    pub created_by: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::registration::Entity")]
    Registration,
    #[sea_orm(has_many = "super::quest::Entity")]
    Quest,
}

impl Related<super::registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registration.def()
    }
}

impl Related<super::quest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for crate::domain::Event {
    type Error = crate::domain::DomainError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        use crate::domain::{DomainError, EventCategory, Faculty};

        let category = model.category.parse::<EventCategory>()?;
        let faculty_codes: Vec<String> = serde_json::from_str(&model.restricted_faculties)
            .map_err(|e| DomainError::Corrupt(format!("event {} faculties: {}", model.id, e)))?;
        let restricted_faculties = faculty_codes
            .iter()
            .map(|code| code.parse::<Faculty>())
            .collect::<Result<Vec<_>, _>>()?;
        let restricted_years: Vec<i32> = serde_json::from_str(&model.restricted_years)
            .map_err(|e| DomainError::Corrupt(format!("event {} years: {}", model.id, e)))?;

        Ok(Self {
            id: model.id,
            title: model.title,
            description: model.description,
            organiser: model.organiser,
            category,
            location_name: model.location_name,
            latitude: model.latitude,
            longitude: model.longitude,
            start_at: model.start_at,
            end_at: model.end_at,
            registration_deadline: model.registration_deadline,
            capacity: model.capacity,
            participant_count: model.participant_count,
            requires_payment: model.requires_payment,
            fee: model.fee,
            restricted_faculties,
            restricted_years,
        })
    }
}
