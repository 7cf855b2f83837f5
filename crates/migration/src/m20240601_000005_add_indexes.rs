use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Pet: listings always filter on approval and sort by creation time
        manager
            .create_index(
                Index::create()
                    .name("idx_pet_approved_created")
                    .table(Pet::Table)
                    .col(Pet::IsApproved)
                    .col(Pet::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pet_breed")
                    .table(Pet::Table)
                    .col(Pet::BreedId)
                    .to_owned(),
            )
            .await?;

        // Notification: per-recipient inbox ordered by time
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_recipient_created")
                    .table(Notification::Table)
                    .col(Notification::RecipientId)
                    .col(Notification::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_pet_approved_created").table(Pet::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_pet_breed").table(Pet::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_notification_recipient_created").table(Notification::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Pet { Table, IsApproved, CreatedAt, BreedId }

#[derive(DeriveIden)]
enum Notification { Table, RecipientId, CreatedAt }
