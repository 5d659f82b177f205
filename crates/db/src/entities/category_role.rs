//! Category-to-role mapping entity.
//!
//! Configured association between a report category and the department role
//! responsible for handling it. Consulted on report approval.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::report::ReportCategory;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_role")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub category: ReportCategory,
    pub role_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id",
        on_delete = "Cascade"
    )]
    Role,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
