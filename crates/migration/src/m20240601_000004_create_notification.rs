//! Create `notification` table.
//! Records pushed to users; `read` flips once the client acknowledges.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(uuid(Notification::Id).primary_key())
                    .col(string_len(Notification::Kind, 32).not_null())
                    .col(ColumnDef::new(Notification::SenderId).uuid().null())
                    .col(uuid(Notification::RecipientId).not_null())
                    .col(ColumnDef::new(Notification::PostId).uuid().null())
                    .col(text(Notification::Message).not_null())
                    .col(boolean(Notification::Read).not_null())
                    .col(timestamp_with_time_zone(Notification::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Notification::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_recipient")
                            .from(Notification::Table, Notification::RecipientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Notification::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Notification {
    Table,
    Id,
    Kind,
    SenderId,
    RecipientId,
    PostId,
    Message,
    Read,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
