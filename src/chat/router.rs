//! Translates chat requests into room store and client registry operations.

use std::sync::Arc;

use log::debug;

use crate::chat::client_registry::{ClientRegistry, DEFAULT_USERNAME};
use crate::chat::message::MessageDraft;
use crate::chat::protocol::{
    ChatCommand, CommandReply, History, PostMessageRequest, Posted, Rejection, Reply, RoomList,
    SessionUpdate, UpdateSessionRequest,
};
use crate::chat::room_store::RoomStore;

/// Normalize a requested display name, falling back to the default for blank input.
fn display_name(username: &str) -> String {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        DEFAULT_USERNAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Stateless front door to the chat stores.
///
/// Cloning a router is cheap; clones share the same stores.
#[derive(Debug, Clone, Default)]
pub struct ChatRouter {
    rooms: Arc<RoomStore>,
    clients: Arc<ClientRegistry>,
}

impl ChatRouter {
    /// Create a router over the given stores.
    pub fn new(rooms: Arc<RoomStore>, clients: Arc<ClientRegistry>) -> Self {
        Self { rooms, clients }
    }

    pub fn rooms(&self) -> &RoomStore {
        &self.rooms
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Store a message posted by `client_id`.
    ///
    /// Requires `type == "message"` and non-blank text and room. The client's
    /// session moves to the posted room and, when a username is given, takes
    /// that name. Text and room are stored trimmed, so `" lobby "` posts to `lobby`.
    pub async fn post_message(&self, client_id: &str, request: PostMessageRequest) -> Reply<Posted> {
        let text = request.text.trim();
        let room = request.room.trim();
        if request.kind != "message" || text.is_empty() || room.is_empty() {
            debug!("Rejected post from {client_id}: type={:?} room={room:?}", request.kind);
            return Reply::rejected(Rejection::InvalidRequest);
        }

        let username = request.username.as_deref().map(display_name);
        let session = self.clients.enter(client_id, room, username.as_deref()).await;

        let draft = MessageDraft::message(text, session.username, request.reply_to);
        let message = self.rooms.post(room, draft).await;
        debug!("{client_id} posted {} to {room}", message.id);

        Reply::ok(Posted { message })
    }

    /// Apply a session update for `client_id`.
    ///
    /// A rename of a client that is in a room leaves a system message there.
    pub async fn update_session(&self, client_id: &str, request: UpdateSessionRequest) -> Reply<()> {
        let update = match SessionUpdate::try_from(request) {
            Ok(update) => update,
            Err(rejection) => {
                debug!("Rejected update from {client_id}: {rejection}");
                return Reply::rejected(rejection);
            }
        };

        match update {
            SessionUpdate::Username(requested) => {
                let username = display_name(&requested);
                let Some(change) = self.clients.set_username(client_id, &username).await else {
                    debug!("Rejected rename from unknown client {client_id}");
                    return Reply::rejected(Rejection::UnknownUpdateType);
                };

                if let Some(room) = change.room {
                    let text = format!("{}'s nickname is now {username}", change.previous);
                    self.rooms.post(&room, MessageDraft::system(text, username)).await;
                }
                Reply::done()
            }
        }
    }

    /// Read the history of `room`. Unknown rooms read as empty.
    pub async fn history(&self, room: &str) -> Reply<History> {
        let messages = self.rooms.history(room).await;
        Reply::ok(History {
            room: room.to_string(),
            messages,
        })
    }

    pub async fn list_rooms(&self) -> Reply<RoomList> {
        Reply::ok(RoomList {
            rooms: self.rooms.list_rooms().await,
        })
    }

    /// Run a decoded POST body.
    pub async fn dispatch(&self, client_id: &str, command: ChatCommand) -> CommandReply {
        match command {
            ChatCommand::Post(request) => CommandReply::Posted(self.post_message(client_id, request).await),
            ChatCommand::Update(request) => CommandReply::Updated(self.update_session(client_id, request).await),
        }
    }
}
