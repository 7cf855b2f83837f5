use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use service::pagination::Paginated;
use service::pet::domain::{Pet, PetInput, PetView};

use crate::auth::{AdminUser, AuthUser};
use crate::errors::JsonApiError;
use crate::state::AppState;

/// Pet fields plus the uploaded image URLs.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PetPayload {
    pub name: Option<String>,
    pub breed: Option<Uuid>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub description: Option<String>,
    /// `add_image` appends `imageUrl` instead of replacing the list.
    pub status: Option<String>,
    #[serde(default, alias = "image_url")]
    pub image_url: Vec<String>,
}

impl PetPayload {
    fn split(self) -> (PetInput, Vec<String>) {
        let input = PetInput {
            name: self.name,
            breed: self.breed,
            age: self.age,
            gender: self.gender,
            description: self.description,
            status: self.status,
        };
        (input, self.image_url)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdoptPayload {
    #[serde(default)]
    pub user_id: String,
}

#[utoipa::path(
    get, path = "/pets", tag = "pets",
    params(
        ("sortBy" = Option<String>, Query, description = "createdAt | updatedAt | name | age, optionally :asc or :desc"),
        ("limit" = Option<u32>, Query, description = "Page size, default 5"),
        ("page" = Option<u32>, Query, description = "1-based page"),
        ("q" = Option<String>, Query, description = "Case-insensitive name search"),
    ),
    responses((status = 200, description = "Approved pets"), (status = 400, description = "Bad query", body = crate::errors::ErrorBody))
)]
pub async fn list_approved(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Paginated<PetView>>, JsonApiError> {
    Ok(Json(state.pets.get_all_pet_approved(&params).await?))
}

#[utoipa::path(get, path = "/pets/pending", tag = "pets", responses((status = 200, description = "Pets awaiting approval"), (status = 403, description = "Admin only")))]
pub async fn list_pending(_admin: AdminUser, State(state): State<AppState>) -> Result<Json<Vec<PetView>>, JsonApiError> {
    Ok(Json(state.pets.get_all_pet_not_approved().await?))
}

#[utoipa::path(get, path = "/pets/{id}", tag = "pets", responses((status = 200, description = "Pet"), (status = 404, description = "Pet not found", body = crate::errors::ErrorBody)))]
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Pet>, JsonApiError> {
    match state.pets.get_pet_by_id(&id).await? {
        Some(pet) => Ok(Json(pet)),
        None => Err(service::ServiceError::not_found("Pet").into()),
    }
}

#[utoipa::path(post, path = "/pets", tag = "pets", request_body = PetPayload, responses((status = 200, description = "Created"), (status = 400, description = "Validation Error", body = crate::errors::ErrorBody)))]
pub async fn create(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<PetPayload>,
) -> Result<Json<Pet>, JsonApiError> {
    let (input, image_url) = payload.split();
    Ok(Json(state.pets.create_pet(input, image_url).await?))
}

#[utoipa::path(put, path = "/pets/{id}", tag = "pets", request_body = PetPayload, responses((status = 200, description = "Updated"), (status = 404, description = "Pet not found", body = crate::errors::ErrorBody)))]
pub async fn update(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PetPayload>,
) -> Result<Json<Pet>, JsonApiError> {
    let (input, image_url) = payload.split();
    Ok(Json(state.pets.update_pet(&id, input, image_url).await?))
}

#[utoipa::path(delete, path = "/pets/{id}", tag = "pets", responses((status = 200, description = "Deleted pet"), (status = 404, description = "Pet not found", body = crate::errors::ErrorBody)))]
pub async fn delete(_admin: AdminUser, State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Pet>, JsonApiError> {
    Ok(Json(state.pets.delete_pet(&id).await?))
}

#[utoipa::path(post, path = "/pets/submit", tag = "pets", request_body = PetPayload, responses((status = 200, description = "Submitted for approval"), (status = 400, description = "No file uploaded", body = crate::errors::ErrorBody)))]
pub async fn submit(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PetPayload>,
) -> Result<Json<Pet>, JsonApiError> {
    let (input, image_url) = payload.split();
    Ok(Json(state.pets.submit_pet(&user.id.to_string(), input, image_url).await?))
}

#[utoipa::path(post, path = "/pets/{id}/approve", tag = "pets", responses((status = 200, description = "Approved"), (status = 400, description = "Pet is already approved", body = crate::errors::ErrorBody)))]
pub async fn approve(_admin: AdminUser, State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Pet>, JsonApiError> {
    Ok(Json(state.pets.approve_pet(&id).await?))
}

#[utoipa::path(post, path = "/pets/{id}/adoption-requests", tag = "pets", responses((status = 200, description = "Request recorded"), (status = 400, description = "Rejected", body = crate::errors::ErrorBody)))]
pub async fn request_adoption(user: AuthUser, State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Pet>, JsonApiError> {
    Ok(Json(state.pets.request_adoption(&user.id.to_string(), &id).await?))
}

#[utoipa::path(post, path = "/pets/{id}/adopt", tag = "pets", request_body = AdoptPayload, responses((status = 200, description = "Adopted"), (status = 400, description = "Rejected", body = crate::errors::ErrorBody)))]
pub async fn adopt(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AdoptPayload>,
) -> Result<Json<Pet>, JsonApiError> {
    Ok(Json(state.pets.adopt_pet(&payload.user_id, &id).await?))
}
