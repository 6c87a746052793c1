//! Server errors.

use thiserror::Error;

use crate::parser::{Error as ParserError, Method};

/// Failures while serving a connection or starting the server.
///
/// Per-connection errors are logged and answered with a status code; only
/// `start` returns them to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be parsed (400).
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No route for the path (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A route exists for the path but not for the method (405).
    #[error("Method {0} not allowed for path: {1}")]
    MethodNotAllowed(Method, String),

    /// Declared or buffered request size above the limit (413).
    #[error("Request of {0} bytes exceeds the limit")]
    PayloadTooLarge(usize),

    /// A reply could not be serialized (500).
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A configuration value could not be used.
    #[error("Invalid configuration for {name}: {value:?}")]
    InvalidConfig { name: &'static str, value: String },
}
