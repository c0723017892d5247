use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quest_progress_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub quest_progress_id: i32,
    pub quest_id: i32,
    pub user_id: i32,
    pub progress: i32,
    pub threshold: i32,
    pub is_completed: bool,
    pub is_failed: bool,
    pub claimed: bool,
    pub completed_at: Option<String>,
    pub claimed_at: Option<String>,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quest_progress::Entity",
        from = "Column::QuestProgressId",
        to = "super::quest_progress::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    QuestProgress,
    #[sea_orm(
        belongs_to = "super::quest::Entity",
        from = "Column::QuestId",
        to = "super::quest::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Quest,
}

impl Related<super::quest_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuestProgress.def()
    }
}

impl Related<super::quest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
