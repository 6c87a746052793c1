//! Chat message types.

use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Characters a message id is drawn from.
const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of a generated message id.
pub const ID_LEN: usize = 8;

/// The kind of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Authored by a client.
    Message,
    /// Synthesized by the server to describe an event, such as a rename.
    System,
}

/// A message as stored in a room's history.
///
/// Messages are immutable once the room store has accepted them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Random identifier, not checked for uniqueness.
    pub id: String,
    /// Whether this is a client or a system message.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// The message content.
    pub text: String,
    /// Name of the room this message belongs to.
    pub room: String,
    /// Display name of the sender when the message was posted.
    pub username: String,
    /// Opaque reference to a quoted message.
    #[serde(rename = "replyTo", default)]
    pub reply_to: Value,
    /// Local time the store accepted the message, in ISO-8601.
    pub timestamp: String,
}

/// The client-supplied part of a message, before the store stamps it.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub kind: MessageKind,
    pub text: String,
    pub username: String,
    pub reply_to: Value,
}

impl MessageDraft {
    /// A draft for a message authored by `username`.
    pub fn message(text: impl Into<String>, username: impl Into<String>, reply_to: Value) -> Self {
        Self {
            kind: MessageKind::Message,
            text: text.into(),
            username: username.into(),
            reply_to,
        }
    }

    /// A draft for a server-synthesized message.
    ///
    /// System messages carry the username of the client whose action produced them.
    pub fn system(text: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::System,
            text: text.into(),
            username: username.into(),
            reply_to: Value::Null,
        }
    }

    /// Turn the draft into a stored message for `room`.
    pub(crate) fn stamp(self, room: &str) -> Message {
        Message {
            id: generate_id(),
            kind: self.kind,
            text: self.text,
            room: room.to_string(),
            username: self.username,
            reply_to: self.reply_to,
            timestamp: timestamp_now(),
        }
    }
}

/// Generate a random lowercase alphanumeric message id.
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// The current local wall-clock time as an ISO-8601 string with microseconds.
pub fn timestamp_now() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
