//! Per-client session bookkeeping.

use std::collections::HashMap;

use tokio::sync::RwLock;

/// Display name given to clients that have not chosen one.
pub const DEFAULT_USERNAME: &str = "Anonymous";

/// Transient state for one client identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    /// Current display name.
    pub username: String,
    /// Last room the client posted to, if any.
    pub room: Option<String>,
}

impl Default for ClientSession {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            room: None,
        }
    }
}

/// Result of swapping a client's username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameChange {
    /// The name the client had before the swap.
    pub previous: String,
    /// The client's current room at the time of the swap.
    pub room: Option<String>,
}

/// Maps client identifiers to sessions.
///
/// Identifiers come from the connection origin, so clients sharing an
/// address share a session. Sessions are never evicted.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    sessions: RwLock<HashMap<String, ClientSession>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `client_id`, creating a default one if needed.
    pub async fn touch(&self, client_id: &str) -> ClientSession {
        if let Some(session) = self.get(client_id).await {
            return session;
        }
        self.sessions
            .write()
            .await
            .entry(client_id.to_string())
            .or_default()
            .clone()
    }

    /// Look up a session without creating it.
    pub async fn get(&self, client_id: &str) -> Option<ClientSession> {
        self.sessions.read().await.get(client_id).cloned()
    }

    /// Set the client's current room, creating the session if needed.
    pub async fn set_room(&self, client_id: &str, room: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.entry(client_id.to_string()).or_default().room = Some(room.to_string());
    }

    /// Swap the username of an existing session.
    ///
    /// Returns `None` when `client_id` has no session.
    pub async fn set_username(&self, client_id: &str, username: &str) -> Option<UsernameChange> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(client_id)?;
        let previous = std::mem::replace(&mut session.username, username.to_string());
        Some(UsernameChange {
            previous,
            room: session.room.clone(),
        })
    }

    /// Record that the client is posting to `room`, optionally under a new name.
    ///
    /// Without a `username` the session keeps the name it already has.
    pub async fn enter(&self, client_id: &str, room: &str, username: Option<&str>) -> ClientSession {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(client_id.to_string()).or_default();
        session.room = Some(room.to_string());
        if let Some(username) = username {
            session.username = username.to_string();
        }
        session.clone()
    }

    /// Number of known sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_touch_creates_default_session() {
        let registry = ClientRegistry::new();
        let session = registry.touch("10.0.0.1").await;

        assert_eq!(session.username, DEFAULT_USERNAME);
        assert_eq!(session.room, None);
        assert_eq!(registry.len().await, 1);

        // Touching again does not reset anything.
        registry.set_room("10.0.0.1", "lobby").await;
        let session = registry.touch("10.0.0.1").await;
        assert_eq!(session.room.as_deref(), Some("lobby"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_room_creates_session() {
        let registry = ClientRegistry::new();
        registry.set_room("10.0.0.2", "games").await;

        let session = registry.get("10.0.0.2").await.unwrap();
        assert_eq!(session.room.as_deref(), Some("games"));
        assert_eq!(session.username, DEFAULT_USERNAME);
    }

    #[tokio::test]
    async fn test_set_username_returns_previous() {
        let registry = ClientRegistry::new();
        registry.enter("10.0.0.3", "lobby", Some("Alice")).await;

        let change = registry.set_username("10.0.0.3", "Bob").await.unwrap();
        assert_eq!(change.previous, "Alice");
        assert_eq!(change.room.as_deref(), Some("lobby"));
        assert_eq!(registry.get("10.0.0.3").await.unwrap().username, "Bob");
    }

    #[tokio::test]
    async fn test_enter_without_username_keeps_name() {
        let registry = ClientRegistry::new();
        registry.enter("10.0.0.5", "lobby", Some("Carol")).await;

        let session = registry.enter("10.0.0.5", "games", None).await;
        assert_eq!(session.username, "Carol");
        assert_eq!(session.room.as_deref(), Some("games"));
    }

    #[tokio::test]
    async fn test_set_username_unknown_client() {
        let registry = ClientRegistry::new();
        assert!(registry.set_username("10.0.0.4", "Bob").await.is_none());
        assert!(registry.is_empty().await);
    }
}
