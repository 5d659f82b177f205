//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_role_table;
mod m20250601_000002_create_company_table;
mod m20250601_000003_create_user_table;
mod m20250601_000004_create_user_role_table;
mod m20250601_000005_create_category_role_table;
mod m20250601_000006_create_report_table;
mod m20250601_000007_create_photo_table;
mod m20250601_000008_create_internal_comment_table;
mod m20250601_000009_create_message_table;
mod m20250601_000010_create_notification_table;
mod m20250601_000011_seed_roles_and_category_mapping;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_role_table::Migration),
            Box::new(m20250601_000002_create_company_table::Migration),
            Box::new(m20250601_000003_create_user_table::Migration),
            Box::new(m20250601_000004_create_user_role_table::Migration),
            Box::new(m20250601_000005_create_category_role_table::Migration),
            Box::new(m20250601_000006_create_report_table::Migration),
            Box::new(m20250601_000007_create_photo_table::Migration),
            Box::new(m20250601_000008_create_internal_comment_table::Migration),
            Box::new(m20250601_000009_create_message_table::Migration),
            Box::new(m20250601_000010_create_notification_table::Migration),
            Box::new(m20250601_000011_seed_roles_and_category_mapping::Migration),
        ]
    }
}
