use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use super::domain::Notification;
use super::repository::NotificationRepository;
use crate::errors::ServiceError;

/// Read side of notifications for the signed-in user.
pub struct NotificationService<N: NotificationRepository + ?Sized> {
    repo: Arc<N>,
}

impl<N: NotificationRepository + ?Sized> NotificationService<N> {
    pub fn new(repo: Arc<N>) -> Self { Self { repo } }

    #[instrument(skip_all, fields(user_id = %recipient))]
    pub async fn list_for(&self, recipient: Uuid) -> Result<Vec<Notification>, ServiceError> {
        self.repo.list_for_recipient(recipient).await
    }
}
