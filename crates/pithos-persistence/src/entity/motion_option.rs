//! `SeaORM` Entity for motion_options table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "motion_options")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub motion_id: i32,
    /// 1-based, contiguous within a motion
    #[sea_orm(primary_key, auto_increment = false)]
    pub option_no: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::motion::Entity",
        from = "Column::MotionId",
        to = "super::motion::Column::Id",
        on_delete = "Cascade"
    )]
    Motion,
}

impl Related<super::motion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Motion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
