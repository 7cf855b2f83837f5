use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{NewPet, Pet, PetChanges, PetView, Populate};
use super::query::{PetFilter, PetQuery, SortSpec};
use crate::errors::ServiceError;
use crate::pagination::Paginated;

/// Repository abstraction for pet persistence.
///
/// The three conditional writes re-check their guard inside the write itself
/// and return `Ok(None)` when it no longer holds, so concurrent requests on
/// the same pet cannot both succeed.
#[async_trait]
pub trait PetRepository: Send + Sync {
    async fn insert(&self, pet: NewPet) -> Result<Pet, ServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Pet>, ServiceError>;
    /// Find-and-update; returns the updated document.
    async fn update(&self, id: Uuid, changes: PetChanges) -> Result<Option<Pet>, ServiceError>;
    /// Find-and-delete; returns the removed document.
    async fn delete(&self, id: Uuid) -> Result<Option<Pet>, ServiceError>;
    async fn find_all(&self, filter: &PetFilter, sort: SortSpec, populate: &[Populate]) -> Result<Vec<PetView>, ServiceError>;
    async fn list(&self, query: &PetQuery) -> Result<Paginated<PetView>, ServiceError>;

    /// Approve if still unapproved, clearing the owner.
    async fn mark_approved(&self, id: Uuid) -> Result<Option<Pet>, ServiceError>;
    /// Append `user_id` if the pet is approved, not adopted and not yet requested by them.
    async fn push_adoption_request(&self, id: Uuid, user_id: Uuid) -> Result<Option<Pet>, ServiceError>;
    /// Hand the pet to `user_id` if approved, unowned, not adopted and requested by them.
    async fn complete_adoption(&self, id: Uuid, user_id: Uuid) -> Result<Option<Pet>, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::{DateTime, TimeZone, Utc};

    use crate::pagination::PageMeta;
    use crate::pet::domain::{BreedRef, UserRef};

    #[derive(Default)]
    pub struct MockPetRepository {
        pets: Mutex<HashMap<Uuid, Pet>>,
        users: Mutex<HashMap<Uuid, UserRef>>,
        breeds: Mutex<HashMap<Uuid, BreedRef>>,
        // strictly increasing timestamps keep createdAt ordering deterministic
        ticks: Mutex<i64>,
        fail_writes: Mutex<bool>,
    }

    impl MockPetRepository {
        pub fn seed_user(&self, name: &str) -> UserRef {
            let user = UserRef { id: Uuid::new_v4(), name: name.to_string(), email: format!("{}@example.com", name.to_lowercase()) };
            self.users.lock().unwrap().insert(user.id, user.clone());
            user
        }

        pub fn seed_breed(&self, name: &str, species: &str) -> BreedRef {
            let breed = BreedRef { id: Uuid::new_v4(), name: name.to_string(), species: species.to_string() };
            self.breeds.lock().unwrap().insert(breed.id, breed.clone());
            breed
        }

        /// Make every subsequent write fail as a storage error would.
        pub fn fail_writes(&self, fail: bool) {
            *self.fail_writes.lock().unwrap() = fail;
        }

        pub fn len(&self) -> usize {
            self.pets.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn now(&self) -> DateTime<Utc> {
            let mut ticks = self.ticks.lock().unwrap();
            *ticks += 1;
            Utc.timestamp_millis_opt(1_700_000_000_000 + *ticks).single().unwrap_or_else(Utc::now)
        }

        fn check_writable(&self) -> Result<(), ServiceError> {
            if *self.fail_writes.lock().unwrap() {
                return Err(ServiceError::Db("storage unavailable".into()));
            }
            Ok(())
        }

        fn views(&self, pets: Vec<Pet>, populate: &[Populate]) -> Vec<PetView> {
            let users = self.users.lock().unwrap();
            let breeds = self.breeds.lock().unwrap();
            pets.into_iter().map(|p| PetView::resolve(p, populate, &users, &breeds)).collect()
        }

        fn matching(&self, filter: &PetFilter, sort: SortSpec) -> Vec<Pet> {
            let pets = self.pets.lock().unwrap();
            let mut found: Vec<Pet> = pets.values().filter(|p| filter.matches(p)).cloned().collect();
            found.sort_by(|a, b| sort.compare(a, b));
            found
        }

        /// Apply `f` to the pet when `guard` holds; the lock makes check and
        /// write one step.
        fn write_if<G, F>(&self, id: Uuid, guard: G, f: F) -> Result<Option<Pet>, ServiceError>
        where
            G: FnOnce(&Pet) -> bool,
            F: FnOnce(&mut Pet),
        {
            self.check_writable()?;
            let now = self.now();
            let mut pets = self.pets.lock().unwrap();
            let Some(pet) = pets.get_mut(&id) else { return Ok(None) };
            if !guard(pet) {
                return Ok(None);
            }
            f(pet);
            pet.updated_at = now;
            Ok(Some(pet.clone()))
        }
    }

    #[async_trait]
    impl PetRepository for MockPetRepository {
        async fn insert(&self, pet: NewPet) -> Result<Pet, ServiceError> {
            self.check_writable()?;
            let now = self.now();
            let created = Pet {
                id: Uuid::new_v4(),
                name: pet.name,
                breed: pet.breed,
                age: pet.age,
                gender: pet.gender,
                description: pet.description,
                image_url: pet.image_url,
                is_approved: pet.is_approved,
                is_adopted: false,
                owner: pet.owner,
                submitted_by: pet.submitted_by,
                adoption_requests: Vec::new(),
                created_at: now,
                updated_at: now,
            };
            self.pets.lock().unwrap().insert(created.id, created.clone());
            Ok(created)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Pet>, ServiceError> {
            Ok(self.pets.lock().unwrap().get(&id).cloned())
        }

        async fn update(&self, id: Uuid, changes: PetChanges) -> Result<Option<Pet>, ServiceError> {
            self.write_if(id, |_| true, |pet| changes.apply(pet))
        }

        async fn delete(&self, id: Uuid) -> Result<Option<Pet>, ServiceError> {
            self.check_writable()?;
            Ok(self.pets.lock().unwrap().remove(&id))
        }

        async fn find_all(&self, filter: &PetFilter, sort: SortSpec, populate: &[Populate]) -> Result<Vec<PetView>, ServiceError> {
            let found = self.matching(filter, sort);
            Ok(self.views(found, populate))
        }

        async fn list(&self, query: &PetQuery) -> Result<Paginated<PetView>, ServiceError> {
            let (page_idx, per_page) = query.pagination.normalize(query.max_per_page);
            let found = self.matching(&query.filter, query.sort);
            let total = found.len() as u64;
            let page: Vec<Pet> = found
                .into_iter()
                .skip((page_idx * per_page) as usize)
                .take(per_page as usize)
                .collect();
            Ok(Paginated { items: self.views(page, &query.populate), pagination: PageMeta::new(page_idx, per_page, total) })
        }

        async fn mark_approved(&self, id: Uuid) -> Result<Option<Pet>, ServiceError> {
            self.write_if(id, |p| !p.is_approved, |p| {
                p.is_approved = true;
                p.owner = None;
            })
        }

        async fn push_adoption_request(&self, id: Uuid, user_id: Uuid) -> Result<Option<Pet>, ServiceError> {
            self.write_if(
                id,
                |p| p.is_approved && !p.is_adopted && !p.has_requested(user_id),
                |p| p.adoption_requests.push(user_id),
            )
        }

        async fn complete_adoption(&self, id: Uuid, user_id: Uuid) -> Result<Option<Pet>, ServiceError> {
            self.write_if(
                id,
                |p| p.is_approved && !p.is_adopted && p.owner.is_none() && p.has_requested(user_id),
                |p| {
                    p.is_adopted = true;
                    p.adoption_requests.clear();
                    p.owner = Some(user_id);
                },
            )
        }
    }
}
