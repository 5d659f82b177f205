//! Create category_role table migration.

use sea_orm_migration::prelude::*;

use super::m20250601_000001_create_role_table::Role;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CategoryRole::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CategoryRole::Category)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CategoryRole::RoleId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_role_role")
                            .from(CategoryRole::Table, CategoryRole::RoleId)
                            .to(Role::Table, Role::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CategoryRole::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(crate) enum CategoryRole {
    Table,
    Category,
    RoleId,
}
