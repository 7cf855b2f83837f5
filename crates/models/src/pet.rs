use sea_orm::entity::prelude::*;
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::{breed, errors, user};

pub const NAME_MAX_LEN: usize = 100;
pub const AGE_MAX: i32 = 40;
pub const GENDERS: [&str; 3] = ["male", "female", "unknown"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pet")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub breed_id: Option<Uuid>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub image_url: Vec<String>,
    pub is_approved: bool,
    pub is_adopted: bool,
    pub owner_id: Option<Uuid>,
    pub submitted_by: Option<Uuid>,
    pub adoption_requests: Vec<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Breed,
    Owner,
    Submitter,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Breed => Entity::belongs_to(breed::Entity)
                .from(Column::BreedId)
                .to(breed::Column::Id)
                .into(),
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::OwnerId)
                .to(user::Column::Id)
                .into(),
            Relation::Submitter => Entity::belongs_to(user::Entity)
                .from(Column::SubmittedBy)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<breed::Entity> for Entity {
    fn to() -> RelationDef { Relation::Breed.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(errors::ModelError::Validation("name is required".into()));
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(errors::ModelError::Validation(format!("name must be at most {NAME_MAX_LEN} characters")));
    }
    Ok(())
}

pub fn validate_age(age: i32) -> Result<(), errors::ModelError> {
    if !(0..=AGE_MAX).contains(&age) {
        return Err(errors::ModelError::Validation(format!("age must be within 0..={AGE_MAX}")));
    }
    Ok(())
}

pub fn validate_gender(gender: &str) -> Result<(), errors::ModelError> {
    if !GENDERS.contains(&gender) {
        return Err(errors::ModelError::Validation("gender must be one of male, female, unknown".into()));
    }
    Ok(())
}

pub fn validate_image_url(url: &str) -> Result<(), errors::ModelError> {
    if url.trim().is_empty() {
        return Err(errors::ModelError::Validation("image_url entries must not be blank".into()));
    }
    Ok(())
}

/// Schema-level checks shared by every write path. `None` fields are left
/// untouched by the write and therefore skipped.
pub fn validate(
    name: Option<&str>,
    age: Option<i32>,
    gender: Option<&str>,
    image_url: &[String],
) -> Result<(), errors::ModelError> {
    if let Some(n) = name { validate_name(n)?; }
    if let Some(a) = age { validate_age(a)?; }
    if let Some(g) = gender { validate_gender(g)?; }
    image_url.iter().try_for_each(|u| validate_image_url(u))
}
