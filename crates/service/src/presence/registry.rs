use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use super::{ConnectionId, Presence, PresenceError, ServerEvent};

struct Slot {
    conn: ConnectionId,
    tx: broadcast::Sender<ServerEvent>,
}

/// Concurrent user -> connection map. The latest connection of a user wins;
/// the replaced one sees its channel close.
pub struct SocketRegistry {
    slots: DashMap<Uuid, Slot>,
    capacity: usize,
}

impl SocketRegistry {
    pub fn new(capacity: usize) -> Self {
        Self { slots: DashMap::new(), capacity: capacity.max(1) }
    }

    /// Register a new connection for `user_id`. Dropping the guard
    /// deregisters it, unless a newer connection has replaced it.
    pub fn connect(self: &Arc<Self>, user_id: Uuid) -> (ConnectionGuard, broadcast::Receiver<ServerEvent>) {
        let conn = ConnectionId { user_id, id: Uuid::new_v4() };
        let (tx, rx) = broadcast::channel(self.capacity);
        self.slots.insert(user_id, Slot { conn, tx });
        debug!(%conn, "socket_connected");
        (ConnectionGuard { registry: Arc::clone(self), conn }, rx)
    }

    pub fn disconnect(&self, conn: &ConnectionId) -> bool {
        let removed = self.slots.remove_if(&conn.user_id, |_, slot| slot.conn == *conn).is_some();
        if removed {
            debug!(%conn, "socket_disconnected");
        }
        removed
    }

    pub fn online(&self) -> usize {
        self.slots.len()
    }
}

impl Presence for SocketRegistry {
    fn connection_for(&self, user_id: Uuid) -> Option<ConnectionId> {
        self.slots.get(&user_id).map(|slot| slot.conn)
    }

    fn emit(&self, conn: &ConnectionId, event: &str, payload: serde_json::Value) -> Result<(), PresenceError> {
        let slot = self.slots.get(&conn.user_id).ok_or(PresenceError::Gone(*conn))?;
        if slot.conn != *conn {
            return Err(PresenceError::Gone(*conn));
        }
        slot.tx
            .send(ServerEvent { event: event.to_string(), payload })
            .map(|_| ())
            .map_err(|_| PresenceError::Closed(*conn))
    }
}

/// Keeps a connection registered for as long as it is alive.
pub struct ConnectionGuard {
    registry: Arc<SocketRegistry>,
    conn: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.conn
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.disconnect(&self.conn);
    }
}
