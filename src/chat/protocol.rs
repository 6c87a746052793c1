//! Request and reply records exchanged between the transport and the router.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::chat::message::Message;

/// Why a request was turned down.
///
/// The display text is the `error` string clients see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Missing or malformed fields, or an unrecognized request type.
    #[error("Invalid request")]
    InvalidRequest,

    /// A session update for a client that has never posted.
    #[error("Unknown update type")]
    UnknownUpdateType,

    /// A history read without a room name.
    #[error("Room parameter required")]
    MissingRoom,
}

impl Serialize for Rejection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inputs of the post message operation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PostMessageRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub room: String,
    pub username: Option<String>,
    #[serde(rename = "replyTo")]
    pub reply_to: Value,
}

impl PostMessageRequest {
    /// A well-formed post of `text` to `room`.
    pub fn new(room: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: "message".to_string(),
            text: text.into(),
            room: room.into(),
            ..Self::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: Value) -> Self {
        self.reply_to = reply_to;
        self
    }
}

/// Inputs of the update session operation, as decoded from the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdateSessionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub username: Option<String>,
}

impl UpdateSessionRequest {
    /// A username change request.
    pub fn username(username: impl Into<String>) -> Self {
        Self {
            kind: "username".to_string(),
            username: Some(username.into()),
        }
    }
}

/// A validated session update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Username(String),
}

impl TryFrom<UpdateSessionRequest> for SessionUpdate {
    type Error = Rejection;

    fn try_from(request: UpdateSessionRequest) -> Result<Self, Self::Error> {
        match (request.kind.as_str(), request.username) {
            ("username", Some(username)) => Ok(SessionUpdate::Username(username)),
            _ => Err(Rejection::InvalidRequest),
        }
    }
}

/// A decoded POST body, routed on its `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Post(PostMessageRequest),
    Update(UpdateSessionRequest),
}

impl ChatCommand {
    /// Classify a JSON body.
    ///
    /// Bodies that do not decode into the expected record fall back to its
    /// default, which the router then rejects.
    pub fn from_value(value: Value) -> Self {
        let is_post = value.get("type").and_then(Value::as_str) == Some("message");
        if is_post {
            ChatCommand::Post(serde_json::from_value(value).unwrap_or_default())
        } else {
            ChatCommand::Update(serde_json::from_value(value).unwrap_or_default())
        }
    }
}

/// The envelope every operation replies with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Rejection>,
}

impl<T> Reply<T> {
    /// A successful reply carrying `body`.
    pub fn ok(body: T) -> Self {
        Self {
            success: true,
            body: Some(body),
            error: None,
        }
    }

    /// A successful reply with nothing beyond the success flag.
    pub fn done() -> Self {
        Self {
            success: true,
            body: None,
            error: None,
        }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self {
            success: false,
            body: None,
            error: Some(rejection),
        }
    }
}

/// Body of a successful post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Posted {
    pub message: Message,
}

/// Body of a history read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct History {
    pub room: String,
    pub messages: Vec<Message>,
}

/// Body of a room listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomList {
    pub rooms: Vec<String>,
}

/// Reply to a dispatched [`ChatCommand`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandReply {
    Posted(Reply<Posted>),
    Updated(Reply<()>),
}

impl CommandReply {
    pub fn success(&self) -> bool {
        match self {
            CommandReply::Posted(reply) => reply.success,
            CommandReply::Updated(reply) => reply.success,
        }
    }
}
