use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "badge_progress_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub badge_progress_id: i32,
    pub badge_id: i32,
    pub progress: i32,
    pub is_unlocked: bool,
    pub unlocked_at: Option<String>,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::badge_progress::Entity",
        from = "Column::BadgeProgressId",
        to = "super::badge_progress::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    BadgeProgress,
    #[sea_orm(
        belongs_to = "super::badge::Entity",
        from = "Column::BadgeId",
        to = "super::badge::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Badge,
}

impl Related<super::badge_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BadgeProgress.def()
    }
}

impl Related<super::badge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Badge.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
