//! Request parsing errors.

use thiserror::Error;

/// Why a request could not be parsed.
///
/// Every variant ends up as a `400 Bad Request`.
#[derive(Debug, Error)]
pub enum Error {
    /// Nothing arrived before the head ended.
    #[error("Empty request")]
    EmptyRequest,

    /// The request line does not have exactly method, target and version.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// A method other than GET, HEAD, POST or OPTIONS.
    #[error("Unsupported method: {0}")]
    InvalidMethod(String),

    #[error("Empty request target")]
    InvalidPath,

    /// Anything but HTTP/1.0 or HTTP/1.1.
    #[error("Unsupported HTTP version: {0}")]
    InvalidVersion(String),

    /// A header line without a colon.
    #[error("Header line without a name/value separator")]
    InvalidHeaderFormat,

    #[error("Missing header: {0}")]
    MissingHeader(String),

    /// A form body that is not UTF-8.
    #[error("Invalid request body")]
    InvalidBody,

    #[error("Invalid JSON body: {0}")]
    JsonError(#[from] serde_json::Error),
}
