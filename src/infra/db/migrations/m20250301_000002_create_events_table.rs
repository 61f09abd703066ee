//! Migration: events table, owned by an organizer.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Events::OrganizerId).uuid().not_null())
                    .col(ColumnDef::new(Events::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Events::Description).text().null())
                    .col(
                        ColumnDef::new(Events::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Events::Location).string_len(255).not_null())
                    .col(ColumnDef::new(Events::Address).string_len(255).null())
                    .col(ColumnDef::new(Events::City).string_len(100).null())
                    .col(ColumnDef::new(Events::Category).string_len(100).null())
                    .col(ColumnDef::new(Events::ImageUrl).string_len(500).null())
                    .col(ColumnDef::new(Events::MaxAttendees).integer().null())
                    .col(
                        ColumnDef::new(Events::CurrentAttendees)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Events::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Events::EventType)
                            .string_len(20)
                            .not_null()
                            .default("PUBLIC"),
                    )
                    .col(ColumnDef::new(Events::PrivateCode).string_len(100).null())
                    .col(
                        ColumnDef::new(Events::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Events::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_organizer")
                            .from(Events::Table, Events::OrganizerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .check(
                        Expr::col(Events::CurrentAttendees).gte(0).and(
                            Expr::col(Events::MaxAttendees)
                                .is_null()
                                .or(Expr::col(Events::CurrentAttendees)
                                    .lte(Expr::col(Events::MaxAttendees))),
                        ),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_events_organizer_id")
                    .table(Events::Table)
                    .col(Events::OrganizerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_events_active_starts_at")
                    .table(Events::Table)
                    .col(Events::IsActive)
                    .col(Events::StartsAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(super) enum Events {
    Table,
    Id,
    OrganizerId,
    Title,
    Description,
    StartsAt,
    Location,
    Address,
    City,
    Category,
    ImageUrl,
    MaxAttendees,
    CurrentAttendees,
    IsActive,
    EventType,
    PrivateCode,
    CreatedAt,
    UpdatedAt,
}
