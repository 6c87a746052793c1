//! HTTP/1.x request parser for the chat transport.
//!
//! Parses the request line, headers and a `Content-Length` delimited body,
//! and decodes query strings and url-encoded form bodies.

mod request;
mod method;
mod version;
mod error;

// Re-export public items
pub use request::{HttpRequest, decode_component, parse_urlencoded};
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

// Re-export the request framing functions
pub use request::{expected_length, parse_request};
