use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `status` value that switches `update_pet` into append mode.
pub const ADD_IMAGE_STATUS: &str = "add_image";

/// Domain pet (business view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub breed: Option<Uuid>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "image_url")]
    pub image_url: Vec<String>,
    pub is_approved: bool,
    pub is_adopted: bool,
    pub owner: Option<Uuid>,
    pub submitted_by: Option<Uuid>,
    pub adoption_requests: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pet {
    pub fn has_requested(&self, user_id: Uuid) -> bool {
        self.adoption_requests.contains(&user_id)
    }
}

impl From<models::pet::Model> for Pet {
    fn from(m: models::pet::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            breed: m.breed_id,
            age: m.age,
            gender: m.gender,
            description: m.description,
            image_url: m.image_url,
            is_approved: m.is_approved,
            is_adopted: m.is_adopted,
            owner: m.owner_id,
            submitted_by: m.submitted_by,
            adoption_requests: m.adoption_requests,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

/// Client-supplied pet fields for create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetInput {
    pub name: Option<String>,
    pub breed: Option<Uuid>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub description: Option<String>,
    /// Update mode switch; only [`ADD_IMAGE_STATUS`] is meaningful.
    pub status: Option<String>,
}

impl PetInput {
    pub fn is_add_image(&self) -> bool {
        self.status.as_deref() == Some(ADD_IMAGE_STATUS)
    }
}

/// Fully-formed insert command handed to the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPet {
    pub name: String,
    pub breed: Option<Uuid>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub description: Option<String>,
    pub image_url: Vec<String>,
    pub is_approved: bool,
    pub owner: Option<Uuid>,
    pub submitted_by: Option<Uuid>,
}

/// Patch applied by `PetRepository::update`; `None` leaves a field as is.
/// The image list is always written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PetChanges {
    pub name: Option<String>,
    pub breed: Option<Uuid>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub description: Option<String>,
    pub image_url: Vec<String>,
}

impl PetChanges {
    pub fn apply(&self, pet: &mut Pet) {
        if let Some(n) = &self.name { pet.name = n.trim().to_string(); }
        if let Some(b) = self.breed { pet.breed = Some(b); }
        if let Some(a) = self.age { pet.age = Some(a); }
        if let Some(g) = &self.gender { pet.gender = Some(g.clone()); }
        if let Some(d) = &self.description { pet.description = Some(d.clone()); }
        pet.image_url = self.image_url.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<models::user::Model> for UserRef {
    fn from(m: models::user::Model) -> Self { Self { id: m.id, name: m.name, email: m.email } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedRef {
    pub id: Uuid,
    pub name: String,
    pub species: String,
}

impl From<models::breed::Model> for BreedRef {
    fn from(m: models::breed::Model) -> Self { Self { id: m.id, name: m.name, species: m.species } }
}

/// A stored reference: the bare id unless the listing asked to resolve it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Id(Uuid),
    Resolved(T),
}

/// References a listing may resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Populate {
    Owner,
    Breed,
    SubmittedBy,
}

/// Pet with its references resolved per the requested [`Populate`] set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetView {
    pub id: Uuid,
    pub name: String,
    pub breed: Option<Ref<BreedRef>>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "image_url")]
    pub image_url: Vec<String>,
    pub is_approved: bool,
    pub is_adopted: bool,
    pub owner: Option<Ref<UserRef>>,
    pub submitted_by: Option<Ref<UserRef>>,
    pub adoption_requests: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PetView {
    /// Resolve the requested references from pre-fetched lookup maps. A
    /// requested reference whose target is gone resolves to `None`.
    pub fn resolve(
        pet: Pet,
        populate: &[Populate],
        users: &HashMap<Uuid, UserRef>,
        breeds: &HashMap<Uuid, BreedRef>,
    ) -> Self {
        fn pick<T: Clone>(id: Option<Uuid>, wanted: bool, map: &HashMap<Uuid, T>) -> Option<Ref<T>> {
            let id = id?;
            if !wanted {
                return Some(Ref::Id(id));
            }
            map.get(&id).cloned().map(Ref::Resolved)
        }

        Self {
            id: pet.id,
            breed: pick(pet.breed, populate.contains(&Populate::Breed), breeds),
            owner: pick(pet.owner, populate.contains(&Populate::Owner), users),
            submitted_by: pick(pet.submitted_by, populate.contains(&Populate::SubmittedBy), users),
            name: pet.name,
            age: pet.age,
            gender: pet.gender,
            description: pet.description,
            image_url: pet.image_url,
            is_approved: pet.is_approved,
            is_adopted: pet.is_adopted,
            adoption_requests: pet.adoption_requests,
            created_at: pet.created_at,
            updated_at: pet.updated_at,
        }
    }

    /// User ids a set of pets needs resolved.
    pub fn user_ids(pets: &[Pet], populate: &[Populate]) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = pets
            .iter()
            .flat_map(|p| {
                let owner = p.owner.filter(|_| populate.contains(&Populate::Owner));
                let submitter = p.submitted_by.filter(|_| populate.contains(&Populate::SubmittedBy));
                owner.into_iter().chain(submitter)
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Breed ids a set of pets needs resolved.
    pub fn breed_ids(pets: &[Pet], populate: &[Populate]) -> Vec<Uuid> {
        if !populate.contains(&Populate::Breed) {
            return Vec::new();
        }
        let mut ids: Vec<Uuid> = pets.iter().filter_map(|p| p.breed).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet(owner: Option<Uuid>, breed: Option<Uuid>) -> Pet {
        let now = Utc::now();
        Pet {
            id: Uuid::new_v4(),
            name: "Rex".into(),
            breed,
            age: None,
            gender: None,
            description: None,
            image_url: vec![],
            is_approved: true,
            is_adopted: false,
            owner,
            submitted_by: owner,
            adoption_requests: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn unrequested_references_stay_as_ids() {
        let owner = Uuid::new_v4();
        let view = PetView::resolve(pet(Some(owner), None), &[Populate::Breed], &HashMap::new(), &HashMap::new());
        assert_eq!(view.owner, Some(Ref::Id(owner)));
        assert_eq!(view.breed, None);
    }

    #[test]
    fn requested_references_resolve_or_vanish() {
        let owner = Uuid::new_v4();
        let breed = Uuid::new_v4();
        let users = HashMap::from([(owner, UserRef { id: owner, name: "Ann".into(), email: "ann@example.com".into() })]);
        let view = PetView::resolve(pet(Some(owner), Some(breed)), &[Populate::Owner, Populate::Breed], &users, &HashMap::new());
        assert!(matches!(view.owner, Some(Ref::Resolved(ref u)) if u.name == "Ann"));
        assert_eq!(view.breed, None);
    }

    #[test]
    fn serialized_view_keeps_image_url_key() {
        let view = PetView::resolve(pet(None, None), &[], &HashMap::new(), &HashMap::new());
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("image_url").is_some());
        assert_eq!(json["isApproved"], true);
    }

    #[test]
    fn lookup_ids_are_deduplicated() {
        let shared = Uuid::new_v4();
        let pets = vec![pet(Some(shared), Some(shared)), pet(Some(shared), None)];
        assert_eq!(PetView::user_ids(&pets, &[Populate::Owner, Populate::SubmittedBy]), vec![shared]);
        assert!(PetView::breed_ids(&pets, &[Populate::Owner]).is_empty());
    }
}
