//! `SeaORM` Entity for members table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    /// Discord user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub accepts_delegates: bool,
    pub delegate_id: Option<i64>,
    /// `DelegationType` code; set whenever `delegate_id` is set
    pub delegation_type: Option<i32>,
    pub gmt_create: DateTime,
    pub gmt_modified: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::DelegateId",
        to = "Column::Id"
    )]
    Delegate,
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
