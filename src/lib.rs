//! A minimal multi-room chat backend over plain HTTP polling.
//!
//! Clients post messages to named rooms and poll room history. Rooms are
//! created on their first message and keep only their most recent
//! [`HISTORY_LIMIT`] messages. Nothing is persisted.
//!
//! # Features
//!
//! - In-memory room store with a bounded history per room
//! - Per-client sessions keyed by peer address, with renames announced in the room
//! - A small HTTP/1.x server with routing, CORS replies and graceful shutdown
//!
//! # Examples
//!
//! ## Using the router directly
//!
//! ```
//! use pollchat::{ChatRouter, PostMessageRequest};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let router = ChatRouter::default();
//!
//! let reply = router
//!     .post_message("10.0.0.1", PostMessageRequest::new("lobby", "hello").with_username("Alice"))
//!     .await;
//! assert!(reply.success);
//!
//! let history = router.history("lobby").await;
//! assert_eq!(history.body.unwrap().messages.len(), 1);
//! # }
//! ```
//!
//! ## Serving over HTTP
//!
//! ```no_run
//! use pollchat::{adapter, ChatRouter, HttpServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = HttpServer::new(ServerConfig::from_env()?);
//!     adapter::mount(&server, ChatRouter::default()).await;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

// Chat endpoints on top of the server
pub mod adapter;

// Rooms, sessions and the request router
pub mod chat;

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use chat::{
    ChatRouter, ClientRegistry, Message, MessageKind, PostMessageRequest, Rejection, Reply,
    RoomStore, UpdateSessionRequest, HISTORY_LIMIT,
};
pub use parser::{Error as ParserError, HttpRequest, HttpVersion, Method, parse_request};
pub use server::{Error as ServerError, HttpResponse, HttpServer, ServerConfig, StatusCode};
