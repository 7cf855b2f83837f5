use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use models::notification;

use crate::errors::ServiceError;
use crate::notification::domain::{NewNotification, Notification};
use crate::notification::repository::NotificationRepository;

/// SeaORM-backed repository implementation.
pub struct SeaOrmNotificationRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl NotificationRepository for SeaOrmNotificationRepository {
    async fn create(&self, n: NewNotification) -> Result<Notification, ServiceError> {
        let now = Utc::now().into();
        let am = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(n.kind.as_str().to_string()),
            sender_id: Set(n.sender),
            recipient_id: Set(n.recipient),
            post_id: Set(n.post),
            message: Set(n.message),
            read: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };
        am.insert(&self.db).await?.try_into()
    }

    async fn list_for_recipient(&self, recipient: Uuid) -> Result<Vec<Notification>, ServiceError> {
        notification::Entity::find()
            .filter(notification::Column::RecipientId.eq(recipient))
            .order_by_desc(notification::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }
}
