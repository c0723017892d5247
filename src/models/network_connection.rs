use sea_orm::entity::prelude::*;

/// Directed edge: `scanner_id` scanned `scanned_id` at an event
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "network_connections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub event_id: i32,
    pub scanner_id: i32,
    pub scanned_id: i32,
    pub scanned_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ScannedId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Scanned,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scanned.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
