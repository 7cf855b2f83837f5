use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{NewNotification, Notification};
use crate::errors::ServiceError;

/// Repository abstraction for notification persistence.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: NewNotification) -> Result<Notification, ServiceError>;
    /// Newest first.
    async fn list_for_recipient(&self, recipient: Uuid) -> Result<Vec<Notification>, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;

    #[derive(Default)]
    pub struct MockNotificationRepository {
        items: Mutex<Vec<Notification>>,
        fail_writes: Mutex<bool>,
    }

    impl MockNotificationRepository {
        /// Everything stored so far, in insertion order.
        pub fn all(&self) -> Vec<Notification> {
            self.items.lock().unwrap().clone()
        }

        pub fn fail_writes(&self, fail: bool) {
            *self.fail_writes.lock().unwrap() = fail;
        }
    }

    #[async_trait]
    impl NotificationRepository for MockNotificationRepository {
        async fn create(&self, n: NewNotification) -> Result<Notification, ServiceError> {
            if *self.fail_writes.lock().unwrap() {
                return Err(ServiceError::Db("storage unavailable".into()));
            }
            let now = Utc::now();
            let stored = Notification {
                id: Uuid::new_v4(),
                kind: n.kind,
                sender: n.sender,
                recipient: n.recipient,
                post: n.post,
                message: n.message,
                read: false,
                created_at: now,
                updated_at: now,
            };
            self.items.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn list_for_recipient(&self, recipient: Uuid) -> Result<Vec<Notification>, ServiceError> {
            let items = self.items.lock().unwrap();
            Ok(items.iter().rev().filter(|n| n.recipient == recipient).cloned().collect())
        }
    }
}
