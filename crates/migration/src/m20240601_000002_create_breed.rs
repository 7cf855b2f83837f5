//! Create `breed` table referenced by pets.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Breed::Table)
                    .if_not_exists()
                    .col(uuid(Breed::Id).primary_key())
                    .col(string_len(Breed::Name, 128).not_null())
                    .col(string_len(Breed::Species, 64).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_breed_species_name")
                    .table(Breed::Table)
                    .col(Breed::Species)
                    .col(Breed::Name)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Breed::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Breed { Table, Id, Name, Species }
