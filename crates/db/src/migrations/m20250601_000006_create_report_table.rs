//! Create report table migration.

use sea_orm_migration::prelude::*;

use super::m20250601_000003_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::ReporterId).big_integer())
                    .col(ColumnDef::new(Report::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Report::Description).text().not_null())
                    .col(ColumnDef::new(Report::Category).string_len(64).not_null())
                    .col(ColumnDef::new(Report::Latitude).double().not_null())
                    .col(ColumnDef::new(Report::Longitude).double().not_null())
                    .col(ColumnDef::new(Report::Address).string_len(512))
                    .col(
                        ColumnDef::new(Report::IsAnonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Report::Status).string_len(32).not_null())
                    .col(ColumnDef::new(Report::AssigneeId).big_integer())
                    .col(ColumnDef::new(Report::ExternalAssigneeId).big_integer())
                    .col(ColumnDef::new(Report::RejectionReason).text())
                    .col(
                        ColumnDef::new(Report::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Report::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_reporter")
                            .from(Report::Table, Report::ReporterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_assignee")
                            .from(Report::Table, Report::AssigneeId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_external_assignee")
                            .from(Report::Table, Report::ExternalAssigneeId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: status (triage listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_status")
                    .table(Report::Table)
                    .col(Report::Status)
                    .to_owned(),
            )
            .await?;

        // Index: category (filtered listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_category")
                    .table(Report::Table)
                    .col(Report::Category)
                    .to_owned(),
            )
            .await?;

        // Index: assignee_id (workload queries)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_assignee_id")
                    .table(Report::Table)
                    .col(Report::AssigneeId)
                    .to_owned(),
            )
            .await?;

        // Index: external_assignee_id (delegated-report listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_external_assignee_id")
                    .table(Report::Table)
                    .col(Report::ExternalAssigneeId)
                    .to_owned(),
            )
            .await?;

        // Index: (latitude, longitude) (map bounding-box queries)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_lat_lon")
                    .table(Report::Table)
                    .col(Report::Latitude)
                    .col(Report::Longitude)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(crate) enum Report {
    Table,
    Id,
    ReporterId,
    Title,
    Description,
    Category,
    Latitude,
    Longitude,
    Address,
    IsAnonymous,
    Status,
    AssigneeId,
    ExternalAssigneeId,
    RejectionReason,
    Version,
    CreatedAt,
    UpdatedAt,
}
