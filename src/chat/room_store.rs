//! In-memory room store with bounded per-room history.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use log::info;
use tokio::sync::{Mutex, RwLock};

use crate::chat::message::{Message, MessageDraft};

/// Maximum number of messages retained per room.
pub const HISTORY_LIMIT: usize = 50;

/// A named chat room and its rolling history, oldest first.
#[derive(Debug)]
struct Room {
    name: String,
    messages: VecDeque<Message>,
}

impl Room {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            messages: VecDeque::with_capacity(HISTORY_LIMIT + 1),
        }
    }

    /// Append a message and evict from the front until the cap holds again.
    fn push(&mut self, draft: MessageDraft) -> Message {
        let message = draft.stamp(&self.name);
        self.messages.push_back(message.clone());
        while self.messages.len() > HISTORY_LIMIT {
            self.messages.pop_front();
        }
        message
    }
}

/// Owns every room for the lifetime of the process.
///
/// The room map is guarded by a read-write lock and each room by its own
/// mutex, so posts to different rooms do not contend once both rooms exist.
/// Lock order is always map, then room.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: RwLock<BTreeMap<String, Arc<Mutex<Room>>>>,
}

impl RoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to `room`, creating the room if it does not exist yet.
    ///
    /// Returns the stored message with its server-assigned id and timestamp.
    pub async fn post(&self, room: &str, draft: MessageDraft) -> Message {
        let existing = self.rooms.read().await.get(room).cloned();
        if let Some(entry) = existing {
            return entry.lock().await.push(draft);
        }

        // Create and fill the room under the map write lock so no reader can
        // observe it before its first message lands.
        let mut rooms = self.rooms.write().await;
        let entry = rooms
            .entry(room.to_string())
            .or_insert_with(|| {
                info!("Room created: {room}");
                Arc::new(Mutex::new(Room::new(room)))
            })
            .clone();
        let mut guard = entry.lock().await;
        drop(rooms);
        guard.push(draft)
    }

    /// The current history of `room`, oldest first.
    ///
    /// An unknown room yields an empty history.
    pub async fn history(&self, room: &str) -> Vec<Message> {
        let Some(entry) = self.rooms.read().await.get(room).cloned() else {
            return Vec::new();
        };
        let guard = entry.lock().await;
        guard.messages.iter().cloned().collect()
    }

    /// Names of all known rooms, sorted.
    pub async fn list_rooms(&self) -> Vec<String> {
        self.rooms.read().await.keys().cloned().collect()
    }

    /// Whether `room` exists.
    pub async fn contains(&self, room: &str) -> bool {
        self.rooms.read().await.contains_key(room)
    }
}
