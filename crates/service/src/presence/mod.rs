//! Live-connection lookup used to push events to signed-in users.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub mod registry;

pub use registry::{ConnectionGuard, SocketRegistry};

/// Handle of one live connection. Carries the user it belongs to so emits
/// can be routed without a second index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    pub user_id: Uuid,
    pub id: Uuid,
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.id)
    }
}

/// Event pushed down a connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEvent {
    pub event: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresenceError {
    #[error("connection {0} is no longer registered")]
    Gone(ConnectionId),
    #[error("connection {0} has no live subscriber")]
    Closed(ConnectionId),
}

pub trait Presence: Send + Sync {
    fn connection_for(&self, user_id: Uuid) -> Option<ConnectionId>;
    fn emit(&self, conn: &ConnectionId, event: &str, payload: serde_json::Value) -> Result<(), PresenceError>;
}

/// Recording fake for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingPresence {
        online: Mutex<HashMap<Uuid, ConnectionId>>,
        sent: Mutex<Vec<(ConnectionId, ServerEvent)>>,
        fail_emits: Mutex<bool>,
    }

    impl RecordingPresence {
        pub fn go_online(&self, user_id: Uuid) -> ConnectionId {
            let conn = ConnectionId { user_id, id: Uuid::new_v4() };
            self.online.lock().unwrap().insert(user_id, conn);
            conn
        }

        pub fn fail_emits(&self, fail: bool) {
            *self.fail_emits.lock().unwrap() = fail;
        }

        pub fn sent(&self) -> Vec<(ConnectionId, ServerEvent)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Presence for RecordingPresence {
        fn connection_for(&self, user_id: Uuid) -> Option<ConnectionId> {
            self.online.lock().unwrap().get(&user_id).copied()
        }

        fn emit(&self, conn: &ConnectionId, event: &str, payload: serde_json::Value) -> Result<(), PresenceError> {
            if *self.fail_emits.lock().unwrap() {
                return Err(PresenceError::Closed(*conn));
            }
            self.sent.lock().unwrap().push((*conn, ServerEvent { event: event.to_string(), payload }));
            Ok(())
        }
    }
}
