//! Seed the department roles and the category-to-role mapping.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, Statement};

use super::m20250601_000001_create_role_table::Role;
use super::m20250601_000005_create_category_role_table::CategoryRole;

const PUBLIC_RELATIONS_OFFICER: i64 = 1;
const TECHNICAL_MANAGER: i64 = 2;
const TECHNICAL_ASSISTANT: i64 = 3;
const EXTERNAL_MAINTAINER: i64 = 4;
const CITIZEN: i64 = 5;

const ROLES: [(i64, &str, Option<&str>); 5] = [
    (
        PUBLIC_RELATIONS_OFFICER,
        "Municipal Public Relations Officer",
        Some("Public Relations"),
    ),
    (TECHNICAL_MANAGER, "Technical Manager", Some("Technical Services")),
    (
        TECHNICAL_ASSISTANT,
        "Technical Assistant",
        Some("Technical Services"),
    ),
    (EXTERNAL_MAINTAINER, "External Maintainer", None),
    (CITIZEN, "Citizen", None),
];

const CATEGORY_ROLES: [(&str, i64); 9] = [
    ("Water Supply - Drinking Water", TECHNICAL_MANAGER),
    ("Sewer System", TECHNICAL_MANAGER),
    ("Public Lighting", TECHNICAL_MANAGER),
    ("Road Signs and Traffic Lights", TECHNICAL_MANAGER),
    ("Roads and Urban Furnishings", TECHNICAL_MANAGER),
    ("Architectural Barriers", TECHNICAL_ASSISTANT),
    ("Waste", TECHNICAL_ASSISTANT),
    ("Public Green Areas and Playgrounds", TECHNICAL_ASSISTANT),
    ("Other", TECHNICAL_ASSISTANT),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert_roles = Query::insert()
            .into_table(Role::Table)
            .columns([Role::Id, Role::Name, Role::Department])
            .to_owned();
        for (id, name, department) in ROLES {
            insert_roles.values_panic([id.into(), name.into(), department.into()]);
        }
        manager.exec_stmt(insert_roles).await?;

        // The explicit ids above bypass the serial sequence; advance it so
        // later inserts do not collide.
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "SELECT setval(pg_get_serial_sequence('role', 'id'), 100)".to_string(),
            ))
            .await?;

        let mut insert_mapping = Query::insert()
            .into_table(CategoryRole::Table)
            .columns([CategoryRole::Category, CategoryRole::RoleId])
            .to_owned();
        for (category, role_id) in CATEGORY_ROLES {
            insert_mapping.values_panic([category.into(), role_id.into()]);
        }
        manager.exec_stmt(insert_mapping).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete().from_table(CategoryRole::Table).to_owned())
            .await?;
        manager
            .exec_stmt(Query::delete().from_table(Role::Table).to_owned())
            .await?;
        Ok(())
    }
}
