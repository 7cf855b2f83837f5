use std::sync::Arc;

use service::notification::repository::NotificationRepository;
use service::notification::service::NotificationService;
use service::pet::repository::PetRepository;
use service::presence::{Presence, SocketRegistry};
use service::{DynPetService, PetService, PetServiceConfig};

use crate::auth::JwtKeys;

/// Shared handler state; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pets: Arc<DynPetService>,
    pub notifications: Arc<NotificationService<dyn NotificationRepository>>,
    pub registry: Arc<SocketRegistry>,
    pub jwt: JwtKeys,
}

impl AppState {
    pub fn new(
        pet_repo: Arc<dyn PetRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        registry: Arc<SocketRegistry>,
        cfg: PetServiceConfig,
        jwt_secret: impl Into<String>,
    ) -> Self {
        let presence: Arc<dyn Presence> = registry.clone();
        let pets = PetService::new(pet_repo, notification_repo.clone(), presence, cfg);
        Self {
            pets: Arc::new(pets),
            notifications: Arc::new(NotificationService::new(notification_repo)),
            registry,
            jwt: JwtKeys::new(jwt_secret),
        }
    }
}
