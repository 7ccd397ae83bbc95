use {
    async_trait::async_trait,
    dashmap::DashMap,
    std::collections::HashSet,
    tokio::sync::mpsc,
    tracing::{debug, warn},
};

use {parley_chat::EventPublisher, parley_common::new_id};

use crate::events::EventFrame;

/// One live WebSocket connection as the registry sees it.
struct Connection {
    user_id: String,
    sender: mpsc::UnboundedSender<String>,
}

/// Connection/room bookkeeping plus the broadcast primitive.
///
/// Rooms are plain string keys: a user id for identity rooms, a chat id
/// for chat rooms. A room exists exactly while it has members; sends to
/// an unknown room are dropped silently. Broadcast is fire-and-forget:
/// each member gets the frame pushed onto its outbound queue in the
/// caller's task, so two broadcasts from the same task arrive at every
/// shared member in call order.
#[derive(Default)]
pub struct RoomRegistry {
    connections: DashMap<String, Connection>,
    rooms: DashMap<String, HashSet<String>>,
    memberships: DashMap<String, HashSet<String>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly authenticated connection and returns its id.
    pub fn register(&self, user_id: &str, sender: mpsc::UnboundedSender<String>) -> String {
        let conn_id = new_id();
        self.connections.insert(
            conn_id.clone(),
            Connection {
                user_id: user_id.to_string(),
                sender,
            },
        );
        self.memberships.insert(conn_id.clone(), HashSet::new());
        conn_id
    }

    pub fn user_of(&self, conn_id: &str) -> Option<String> {
        self.connections
            .get(conn_id)
            .map(|conn| conn.user_id.clone())
    }

    pub fn join(&self, conn_id: &str, room: &str) {
        if !self.connections.contains_key(conn_id) {
            return;
        }
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(conn_id.to_string());
        if let Some(mut joined) = self.memberships.get_mut(conn_id) {
            joined.insert(room.to_string());
        }
        debug!(conn_id, room, "joined room");
    }

    pub fn leave(&self, conn_id: &str, room: &str) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(conn_id);
            if members.is_empty() {
                drop(members);
                self.rooms.remove_if(room, |_, members| members.is_empty());
            }
        }
        if let Some(mut joined) = self.memberships.get_mut(conn_id) {
            joined.remove(room);
        }
    }

    /// Drops a connection and every room membership it held. Rooms left
    /// empty disappear with it.
    pub fn remove_connection(&self, conn_id: &str) {
        if let Some((_, joined)) = self.memberships.remove(conn_id) {
            for room in joined {
                self.leave(conn_id, &room);
            }
        }
        self.connections.remove(conn_id);
        debug!(conn_id, "connection removed");
    }

    /// Queues a frame on a single connection. Used for handshake errors
    /// before the connection has joined any room.
    pub fn send_to_connection(&self, conn_id: &str, frame: &EventFrame) {
        let Some(encoded) = frame.encode() else {
            warn!(event = %frame.event, "failed to encode event frame");
            return;
        };
        if let Some(conn) = self.connections.get(conn_id) {
            let _ = conn.sender.send(encoded);
        }
    }

    /// Fans a frame out to every current member of a room. Members whose
    /// outbound queue is gone (socket mid-teardown) are skipped.
    pub fn broadcast(&self, room: &str, frame: &EventFrame) {
        let Some(encoded) = frame.encode() else {
            warn!(event = %frame.event, room, "failed to encode event frame");
            return;
        };
        let Some(members) = self.rooms.get(room) else {
            return;
        };
        for conn_id in members.iter() {
            if let Some(conn) = self.connections.get(conn_id) {
                let _ = conn.sender.send(encoded.clone());
            }
        }
    }

    #[cfg(test)]
    pub fn room_size(&self, room: &str) -> usize {
        self.rooms.get(room).map_or(0, |members| members.len())
    }
}

#[async_trait]
impl EventPublisher for RoomRegistry {
    async fn publish(&self, room: &str, event: &str, payload: serde_json::Value) {
        self.broadcast(room, &EventFrame::new(event, payload));
    }
}
