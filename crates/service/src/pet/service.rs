use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::domain::{NewPet, Pet, PetChanges, PetInput, PetView, Populate};
use super::query::{approved_listing, PetFilter, SortSpec};
use super::repository::PetRepository;
use crate::errors::ServiceError;
use crate::metrics;
use crate::notification::domain::{NewNotification, NotificationKind};
use crate::notification::repository::NotificationRepository;
use crate::pagination::Paginated;
use crate::presence::Presence;

/// Event name used when pushing a notification to a live connection.
pub const NOTIFICATION_EVENT: &str = "notification";

#[derive(Debug, Clone)]
pub struct PetServiceConfig {
    pub listing: configs::ListingConfig,
    pub approval_message: String,
}

impl Default for PetServiceConfig {
    fn default() -> Self {
        Self {
            listing: configs::ListingConfig::default(),
            approval_message: configs::DEFAULT_APPROVAL_MESSAGE.to_string(),
        }
    }
}

impl From<&configs::AppConfig> for PetServiceConfig {
    fn from(cfg: &configs::AppConfig) -> Self {
        Self { listing: cfg.listing.clone(), approval_message: cfg.notifications.approval_message.clone() }
    }
}

/// Pet moderation and adoption workflow, independent of the web framework.
pub struct PetService<R, N, P>
where
    R: PetRepository + ?Sized,
    N: NotificationRepository + ?Sized,
    P: Presence + ?Sized,
{
    pets: Arc<R>,
    notifications: Arc<N>,
    presence: Arc<P>,
    cfg: PetServiceConfig,
}

/// Service wired against trait objects, as the server holds it.
pub type DynPetService = PetService<dyn PetRepository, dyn NotificationRepository, dyn Presence>;

fn parse_id(raw: &str, missing: &str, malformed: &str) -> Result<Uuid, ServiceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ServiceError::Validation(missing.to_string()));
    }
    Uuid::parse_str(raw).map_err(|_| ServiceError::InvalidId(malformed.to_string()))
}

fn parse_pet_id(raw: &str, missing: &str) -> Result<Uuid, ServiceError> {
    parse_id(raw, missing, "Invalid Pet ID format")
}

fn parse_user_id(raw: &str, missing: &str) -> Result<Uuid, ServiceError> {
    parse_id(raw, missing, "Invalid User ID format")
}

fn schema_error(e: models::errors::ModelError) -> ServiceError {
    ServiceError::Validation(format!("Validation Error: {e}"))
}

fn pet_not_found() -> ServiceError {
    ServiceError::not_found("Pet")
}

fn uploaded(image_url: Vec<String>) -> Vec<String> {
    image_url.into_iter().filter(|u| !u.trim().is_empty()).collect()
}

/// Business-rule error for a pet that cannot take an adoption step. Shared by
/// the pre-check and the post-conflict re-read.
fn adoption_blocker(pet: &Pet, user_id: Uuid, completing: bool) -> Option<ServiceError> {
    let rule = |m: &str| Some(ServiceError::BusinessRule(m.to_string()));
    if !pet.is_approved {
        return rule("Pet is not available for adoption");
    }
    if pet.is_adopted {
        return rule("Pet has already been adopted");
    }
    if completing {
        if pet.owner.is_some() {
            return rule("Pet has already been adopted");
        }
        if !pet.has_requested(user_id) {
            return rule("This user did not request to adopt this pet");
        }
    } else if pet.has_requested(user_id) {
        return rule("You have already requested to adopt this pet");
    }
    None
}

impl<R, N, P> PetService<R, N, P>
where
    R: PetRepository + ?Sized,
    N: NotificationRepository + ?Sized,
    P: Presence + ?Sized,
{
    pub fn new(pets: Arc<R>, notifications: Arc<N>, presence: Arc<P>, cfg: PetServiceConfig) -> Self {
        Self { pets, notifications, presence, cfg }
    }

    /// Create a pet directly as an admin; it is approved immediately.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::pet::domain::PetInput;
    /// use service::pet::repository::mock::MockPetRepository;
    /// use service::pet::service::{PetService, PetServiceConfig};
    /// use service::notification::repository::mock::MockNotificationRepository;
    /// use service::presence::mock::RecordingPresence;
    /// let svc = PetService::new(
    ///     Arc::new(MockPetRepository::default()),
    ///     Arc::new(MockNotificationRepository::default()),
    ///     Arc::new(RecordingPresence::default()),
    ///     PetServiceConfig::default(),
    /// );
    /// let input = PetInput { name: Some("Milo".into()), ..Default::default() };
    /// let pet = tokio_test::block_on(svc.create_pet(input, vec!["https://cdn.example.com/milo.png".into()])).unwrap();
    /// assert!(pet.is_approved);
    /// assert_eq!(pet.submitted_by, None);
    /// ```
    #[instrument(skip_all)]
    pub async fn create_pet(&self, input: PetInput, image_url: Vec<String>) -> Result<Pet, ServiceError> {
        let image_url = uploaded(image_url);
        let name = input.name.clone().unwrap_or_default();
        models::pet::validate(Some(&name), input.age, input.gender.as_deref(), &image_url).map_err(schema_error)?;

        let new = NewPet {
            name,
            breed: input.breed,
            age: input.age,
            gender: input.gender,
            description: input.description,
            image_url,
            is_approved: true,
            owner: None,
            submitted_by: None,
        };
        let pet = self.pets.insert(new).await.map_err(|e| match e {
            ServiceError::Validation(msg) => ServiceError::Validation(format!("Validation Error: {msg}")),
            other => {
                error!(error = %other, "pet_create_failed");
                ServiceError::Db("Error adding pet".into())
            }
        })?;
        metrics::PETS_CREATED_TOTAL.inc();
        info!(pet_id = %pet.id, "pet_created");
        Ok(pet)
    }

    /// Patch a pet. With `status = "add_image"` the uploaded images are
    /// appended; otherwise a non-empty upload replaces the list.
    #[instrument(skip_all, fields(pet_id = %pet_id))]
    pub async fn update_pet(&self, pet_id: &str, input: PetInput, image_url: Vec<String>) -> Result<Pet, ServiceError> {
        let id = parse_pet_id(pet_id, "Pet ID is required for update")?;
        let existing = self.pets.find_by_id(id).await?.ok_or_else(pet_not_found)?;
        let image_url = uploaded(image_url);

        let images = if input.is_add_image() {
            if image_url.is_empty() {
                return Err(ServiceError::Validation("No file uploaded".into()));
            }
            let mut images = existing.image_url;
            images.extend(image_url);
            images
        } else if !image_url.is_empty() {
            image_url
        } else {
            existing.image_url
        };

        models::pet::validate(input.name.as_deref(), input.age, input.gender.as_deref(), &images).map_err(schema_error)?;

        let changes = PetChanges {
            name: input.name,
            breed: input.breed,
            age: input.age,
            gender: input.gender,
            description: input.description,
            image_url: images,
        };
        let pet = self.pets.update(id, changes).await?.ok_or_else(pet_not_found)?;
        info!(pet_id = %pet.id, images = pet.image_url.len(), "pet_updated");
        Ok(pet)
    }

    #[instrument(skip_all, fields(pet_id = %pet_id))]
    pub async fn delete_pet(&self, pet_id: &str) -> Result<Pet, ServiceError> {
        let id = parse_pet_id(pet_id, "Pet ID is required")?;
        let removed = self.pets.delete(id).await.map_err(|e| {
            error!(error = %e, "pet_delete_failed");
            ServiceError::Db("Error deleting pet".into())
        })?;
        let pet = removed.ok_or_else(pet_not_found)?;
        metrics::PETS_DELETED_TOTAL.inc();
        info!(pet_id = %pet.id, "pet_deleted");
        Ok(pet)
    }

    /// Submit a pet for moderation on behalf of `user_id`.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::pet::domain::PetInput;
    /// use service::pet::repository::mock::MockPetRepository;
    /// use service::pet::service::{PetService, PetServiceConfig};
    /// use service::notification::repository::mock::MockNotificationRepository;
    /// use service::presence::mock::RecordingPresence;
    /// let repo = Arc::new(MockPetRepository::default());
    /// let user = repo.seed_user("Lan");
    /// let svc = PetService::new(
    ///     repo,
    ///     Arc::new(MockNotificationRepository::default()),
    ///     Arc::new(RecordingPresence::default()),
    ///     PetServiceConfig::default(),
    /// );
    /// let input = PetInput { name: Some("Rex".into()), ..Default::default() };
    /// let pet = tokio_test::block_on(svc.submit_pet(&user.id.to_string(), input, vec!["https://cdn.example.com/rex.png".into()])).unwrap();
    /// assert!(!pet.is_approved);
    /// assert_eq!(pet.owner, Some(user.id));
    /// assert_eq!(pet.submitted_by, Some(user.id));
    /// ```
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn submit_pet(&self, user_id: &str, input: PetInput, image_url: Vec<String>) -> Result<Pet, ServiceError> {
        let image_url = uploaded(image_url);
        if image_url.is_empty() {
            return Err(ServiceError::Validation("No file uploaded".into()));
        }
        let user = parse_user_id(user_id, "User ID is required")?;
        let name = input.name.clone().unwrap_or_default();
        models::pet::validate(Some(&name), input.age, input.gender.as_deref(), &image_url).map_err(schema_error)?;

        let new = NewPet {
            name,
            breed: input.breed,
            age: input.age,
            gender: input.gender,
            description: input.description,
            image_url,
            is_approved: false,
            owner: Some(user),
            submitted_by: Some(user),
        };
        let pet = self.pets.insert(new).await?;
        metrics::PETS_SUBMITTED_TOTAL.inc();
        info!(pet_id = %pet.id, user_id = %user, "pet_submitted");
        Ok(pet)
    }

    /// Moderation queue, oldest submission first.
    #[instrument(skip(self))]
    pub async fn get_all_pet_not_approved(&self) -> Result<Vec<PetView>, ServiceError> {
        self.pets
            .find_all(&PetFilter::pending(), SortSpec::default(), &[Populate::SubmittedBy, Populate::Breed])
            .await
    }

    /// Public listing of approved pets driven by raw query-string pairs.
    #[instrument(skip_all)]
    pub async fn get_all_pet_approved(&self, params: &HashMap<String, String>) -> Result<Paginated<PetView>, ServiceError> {
        let query = approved_listing(params, &self.cfg.listing)?;
        self.pets.list(&query).await
    }

    /// Approve a submitted pet and notify its submitter.
    #[instrument(skip_all, fields(pet_id = %pet_id))]
    pub async fn approve_pet(&self, pet_id: &str) -> Result<Pet, ServiceError> {
        let id = parse_pet_id(pet_id, "Pet ID is required")?;
        let existing = self.pets.find_by_id(id).await?.ok_or_else(pet_not_found)?;
        if existing.is_approved {
            return Err(ServiceError::BusinessRule("Pet is already approved".into()));
        }

        let pet = match self.pets.mark_approved(id).await? {
            Some(pet) => pet,
            None => {
                // lost a race: another request approved or deleted it
                return Err(match self.pets.find_by_id(id).await? {
                    Some(_) => ServiceError::BusinessRule("Pet is already approved".into()),
                    None => pet_not_found(),
                });
            }
        };
        metrics::PETS_APPROVED_TOTAL.inc();
        info!(pet_id = %pet.id, "pet_approved");

        match pet.submitted_by {
            Some(submitter) => self.notify_approved(submitter).await?,
            None => warn!(pet_id = %pet.id, "pet_approved_without_submitter"),
        }
        Ok(pet)
    }

    async fn notify_approved(&self, recipient: Uuid) -> Result<(), ServiceError> {
        let mut notification = self
            .notifications
            .create(NewNotification {
                kind: NotificationKind::Approve,
                sender: None,
                recipient,
                post: None,
                message: self.cfg.approval_message.clone(),
            })
            .await?;

        let Some(conn) = self.presence.connection_for(recipient) else {
            metrics::NOTIFICATIONS_OFFLINE_TOTAL.inc();
            info!(user_id = %recipient, "notification_recipient_offline");
            return Ok(());
        };
        notification.sender = None;
        let payload = match serde_json::to_value(&notification) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, notification_id = %notification.id, "notification_encode_failed");
                return Ok(());
            }
        };
        match self.presence.emit(&conn, NOTIFICATION_EVENT, payload) {
            Ok(()) => {
                metrics::NOTIFICATIONS_DELIVERED_TOTAL.inc();
                info!(user_id = %recipient, notification_id = %notification.id, "notification_delivered");
            }
            Err(e) => warn!(user_id = %recipient, error = %e, "notification_emit_failed"),
        }
        Ok(())
    }

    /// Record `user_id`'s interest in adopting the pet.
    #[instrument(skip_all, fields(user_id = %user_id, pet_id = %pet_id))]
    pub async fn request_adoption(&self, user_id: &str, pet_id: &str) -> Result<Pet, ServiceError> {
        const MISSING: &str = "User ID and Pet ID are required";
        if user_id.trim().is_empty() || pet_id.trim().is_empty() {
            return Err(ServiceError::Validation(MISSING.into()));
        }
        let user = parse_user_id(user_id, MISSING)?;
        let id = parse_pet_id(pet_id, MISSING)?;

        let existing = self.pets.find_by_id(id).await?.ok_or_else(pet_not_found)?;
        if let Some(err) = adoption_blocker(&existing, user, false) {
            return Err(err);
        }

        let Some(pet) = self.pets.push_adoption_request(id, user).await? else {
            return Err(self.conflict(id, user, false).await);
        };
        metrics::ADOPTION_REQUESTS_TOTAL.inc();
        info!(pet_id = %pet.id, user_id = %user, requests = pet.adoption_requests.len(), "adoption_requested");
        Ok(pet)
    }

    /// Hand the pet over to a user who requested it.
    #[instrument(skip_all, fields(user_id = %user_id, pet_id = %pet_id))]
    pub async fn adopt_pet(&self, user_id: &str, pet_id: &str) -> Result<Pet, ServiceError> {
        const MISSING: &str = "User ID and Pet ID are required";
        if user_id.trim().is_empty() || pet_id.trim().is_empty() {
            return Err(ServiceError::Validation(MISSING.into()));
        }
        let user = parse_user_id(user_id, MISSING)?;
        let id = parse_pet_id(pet_id, MISSING)?;

        let existing = self.pets.find_by_id(id).await?.ok_or_else(pet_not_found)?;
        if let Some(err) = adoption_blocker(&existing, user, true) {
            return Err(err);
        }

        let Some(pet) = self.pets.complete_adoption(id, user).await? else {
            return Err(self.conflict(id, user, true).await);
        };
        metrics::ADOPTIONS_TOTAL.inc();
        info!(pet_id = %pet.id, user_id = %user, "pet_adopted");
        Ok(pet)
    }

    /// Explain why a conditional write did not apply.
    async fn conflict(&self, id: Uuid, user: Uuid, completing: bool) -> ServiceError {
        match self.pets.find_by_id(id).await {
            Ok(Some(pet)) => adoption_blocker(&pet, user, completing).unwrap_or_else(|| {
                warn!(pet_id = %id, "conditional_write_conflict");
                ServiceError::BusinessRule("Pet has already been adopted".into())
            }),
            Ok(None) => pet_not_found(),
            Err(e) => e,
        }
    }

    /// Direct lookup; `Ok(None)` when the pet does not exist.
    #[instrument(skip_all, fields(pet_id = %pet_id))]
    pub async fn get_pet_by_id(&self, pet_id: &str) -> Result<Option<Pet>, ServiceError> {
        let id = parse_pet_id(pet_id, "Pet ID is required")?;
        self.pets.find_by_id(id).await
    }
}
