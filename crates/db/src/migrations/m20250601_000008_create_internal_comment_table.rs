//! Create internal_comment table migration.

use sea_orm_migration::prelude::*;

use super::m20250601_000003_create_user_table::User;
use super::m20250601_000006_create_report_table::Report;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InternalComment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InternalComment::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InternalComment::ReportId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InternalComment::AuthorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InternalComment::Content).text().not_null())
                    .col(
                        ColumnDef::new(InternalComment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_internal_comment_report")
                            .from(InternalComment::Table, InternalComment::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_internal_comment_author")
                            .from(InternalComment::Table, InternalComment::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: report_id (comment listing per report)
        manager
            .create_index(
                Index::create()
                    .name("idx_internal_comment_report_id")
                    .table(InternalComment::Table)
                    .col(InternalComment::ReportId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InternalComment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(crate) enum InternalComment {
    Table,
    Id,
    ReportId,
    AuthorId,
    Content,
    CreatedAt,
}
