//! `SeaORM` Entity for motions table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "motions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub author_id: i64,
    pub expires: DateTime,
    /// Set once the final result has been published
    pub closed: bool,
    pub gmt_create: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::motion_option::Entity")]
    MotionOption,
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
}

impl Related<super::motion_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MotionOption.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
