use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Approve,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Approve => "APPROVE",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVE" => Ok(NotificationKind::Approve),
            other => Err(ServiceError::Db(format!("unknown notification type {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub sender: Option<Uuid>,
    pub recipient: Uuid,
    pub post: Option<Uuid>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<models::notification::Model> for Notification {
    type Error = ServiceError;

    fn try_from(m: models::notification::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            kind: m.kind.parse()?,
            sender: m.sender_id,
            recipient: m.recipient_id,
            post: m.post_id,
            message: m.message,
            read: m.read,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        })
    }
}

/// Fields of a notification about to be stored; new notifications are unread.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub sender: Option<Uuid>,
    pub recipient: Uuid,
    pub post: Option<Uuid>,
    pub message: String,
}
