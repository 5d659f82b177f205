//! User entity.
//!
//! The report engine consumes users for authorization and assignment; account
//! management itself lives outside this service's scope.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique)]
    pub username: String,

    /// Display name shown on non-anonymous reports.
    #[sea_orm(nullable)]
    pub name: Option<String>,

    /// Bearer token resolved by the auth middleware.
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Company an external maintainer belongs to.
    #[sea_orm(nullable)]
    pub company_id: Option<i64>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id",
        on_delete = "SetNull"
    )]
    Company,

    #[sea_orm(has_many = "super::user_role::Entity")]
    UserRoles,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_role::Relation::Role.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_role::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
