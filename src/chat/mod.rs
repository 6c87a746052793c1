//! The chat core: rooms, client sessions and the request router.
//!
//! Everything here is in-memory and safe to call from many tasks at once.
//! Nothing in this module fails; rejected requests are ordinary replies.

mod client_registry;
mod message;
mod protocol;
mod room_store;
mod router;
mod tests;

// Re-export public items
pub use client_registry::{ClientRegistry, ClientSession, UsernameChange, DEFAULT_USERNAME};
pub use message::{generate_id, timestamp_now, Message, MessageDraft, MessageKind, ID_LEN};
pub use protocol::{
    ChatCommand, CommandReply, History, PostMessageRequest, Posted, Rejection, Reply, RoomList,
    SessionUpdate, UpdateSessionRequest,
};
pub use room_store::{RoomStore, HISTORY_LIMIT};
pub use router::ChatRouter;
