//! `SeaORM` Entity for votes table
//!
//! Only direct votes are stored. Delegated weight is derived at tally time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub member_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub motion_id: i32,
    pub selection: i32,
    pub gmt_modified: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Member,
    #[sea_orm(
        belongs_to = "super::motion::Entity",
        from = "Column::MotionId",
        to = "super::motion::Column::Id",
        on_delete = "Cascade"
    )]
    Motion,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl Related<super::motion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Motion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
