//! HTTP server for the chat transport.
//!
//! A small tokio-based HTTP/1.x server: one request per connection, exact
//! path routing and a bounded number of concurrent connections.

mod response;
mod config;
mod error;
mod handler;
mod http_server;

// Re-export public items
pub use response::{HttpResponse, StatusCode, SERVER_NAME};
pub use config::{RequestLimits, ServerConfig};
pub use error::Error;
pub use handler::{HandlerFn, HandlerFuture, Route};
pub use http_server::HttpServer;
