//! Create `pet` table.
//!
//! `image_url` and `adoption_requests` are Postgres arrays so that adoption
//! requests can be appended with a single conditional UPDATE.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pet::Table)
                    .if_not_exists()
                    .col(uuid(Pet::Id).primary_key())
                    .col(string_len(Pet::Name, 100).not_null())
                    .col(ColumnDef::new(Pet::BreedId).uuid().null())
                    .col(ColumnDef::new(Pet::Age).integer().null())
                    .col(ColumnDef::new(Pet::Gender).string_len(16).null())
                    .col(ColumnDef::new(Pet::Description).text().null())
                    .col(array(Pet::ImageUrl, ColumnType::Text).not_null())
                    .col(boolean(Pet::IsApproved).not_null())
                    .col(boolean(Pet::IsAdopted).not_null())
                    .col(ColumnDef::new(Pet::OwnerId).uuid().null())
                    .col(ColumnDef::new(Pet::SubmittedBy).uuid().null())
                    .col(array(Pet::AdoptionRequests, ColumnType::Uuid).not_null())
                    .col(timestamp_with_time_zone(Pet::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Pet::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pet_breed")
                            .from(Pet::Table, Pet::BreedId)
                            .to(Breed::Table, Breed::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pet_owner")
                            .from(Pet::Table, Pet::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pet_submitted_by")
                            .from(Pet::Table, Pet::SubmittedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Pet::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Pet {
    Table,
    Id,
    Name,
    BreedId,
    Age,
    Gender,
    Description,
    ImageUrl,
    IsApproved,
    IsAdopted,
    OwnerId,
    SubmittedBy,
    AdoptionRequests,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Breed { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
