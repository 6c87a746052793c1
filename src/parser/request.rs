//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::IntErrorKind;
use std::str::FromStr;
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target, including any query string
    pub path: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers
    pub headers: HashMap<String, String>,
    /// The request body
    pub body: Vec<u8>,
    /// Percent-decoded query parameters parsed from the path
    pub query_params: HashMap<String, String>,
    /// The address of the peer that sent the request, when known
    pub remote_addr: Option<SocketAddr>,
}

/// Decode one `application/x-www-form-urlencoded` component.
///
/// `+` stands for a space; invalid UTF-8 is replaced rather than rejected.
pub fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Split `a=1&b=2` pairs into a map of decoded keys and values.
///
/// Keys without `=` map to an empty string. Later duplicates win.
pub fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    input
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode_component(k), decode_component(v)),
            None => (decode_component(pair), String::new()),
        })
        .collect()
}

impl HttpRequest {
    /// Create a new HTTP request.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `path` - The request path
    /// * `version` - The HTTP version
    /// * `headers` - The HTTP headers
    ///
    /// # Returns
    ///
    /// A new HTTP request with an empty body
    pub fn new(method: Method, path: String, version: HttpVersion, headers: HashMap<String, String>) -> Self {
        let query_params = path
            .split_once('?')
            .map(|(_, query)| parse_urlencoded(query))
            .unwrap_or_default();

        Self {
            method,
            path,
            version,
            headers,
            body: Vec::new(),
            query_params,
            remote_addr: None,
        }
    }

    /// Create a new HTTP request with a body.
    pub fn with_body(method: Method, path: String, version: HttpVersion, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        let mut request = Self::new(method, path, version, headers);
        request.body = body;
        request
    }

    /// Attach the peer address the request arrived from.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// The path without its query string, used for routing.
    pub fn route_path(&self) -> &str {
        match self.path.split_once('?') {
            Some((path, _)) => path,
            None => &self.path,
        }
    }

    /// Get a header value.
    ///
    /// Header names are matched case-insensitively.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                Some(v)
            } else {
                None
            }
        })
    }

    /// The declared body length, if the request carries a valid `Content-Length`.
    pub fn content_length(&self) -> Option<usize> {
        self.get_header("Content-Length")
            .and_then(|value| value.parse().ok())
    }

    /// Parse the request body as JSON.
    ///
    /// Bodies without a `Content-Type` are read as JSON too; only a body
    /// declared as something else is refused.
    ///
    /// # Returns
    ///
    /// The parsed JSON value, or an error if the body is not valid JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if self.has_content_type() && !self.is_json() {
            return Err(Error::MissingHeader("Content-Type: application/json".to_string()));
        }

        let json = serde_json::from_slice(&self.body)?;
        Ok(json)
    }

    /// Check if the request has a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type_is("application/json")
    }

    /// Check if the request has a url-encoded form body.
    pub fn is_form(&self) -> bool {
        self.content_type_is("application/x-www-form-urlencoded")
    }

    fn has_content_type(&self) -> bool {
        self.get_header("Content-Type").is_some()
    }

    fn content_type_is(&self, expected: &str) -> bool {
        self.get_header("Content-Type")
            .is_some_and(|content_type| content_type.starts_with(expected))
    }

    /// Decode a url-encoded form body.
    pub fn form(&self) -> Result<HashMap<String, String>, Error> {
        if !self.is_form() {
            return Err(Error::MissingHeader(
                "Content-Type: application/x-www-form-urlencoded".to_string(),
            ));
        }
        let body = std::str::from_utf8(&self.body).map_err(|_| Error::InvalidBody)?;
        Ok(parse_urlencoded(body))
    }

    /// Get a decoded query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

}

/// Locate the blank line that ends the head.
///
/// Returns the length of the head and the length of the separator.
/// Whichever of `\r\n\r\n` and `\n\n` comes first wins, so a body is
/// never searched for the head's separator.
fn find_head_end(input: &[u8]) -> Option<(usize, usize)> {
    let crlf = input.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| (pos, 4));
    let lf = input.windows(2).position(|w| w == b"\n\n").map(|pos| (pos, 2));
    match (crlf, lf) {
        (Some(crlf), Some(lf)) if lf.0 < crlf.0 => Some(lf),
        (crlf, lf) => crlf.or(lf),
    }
}

/// How many bytes a complete request starting with `input` occupies.
///
/// Returns `None` while the head is still incomplete. A request without a
/// `Content-Length` header ends with its head. A length too large to
/// represent saturates at `usize::MAX`.
pub fn expected_length(input: &[u8]) -> Option<usize> {
    let (head_len, sep_len) = find_head_end(input)?;
    let head = String::from_utf8_lossy(&input[..head_len]);
    let body_len = head
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, value)| match value.trim().parse::<usize>() {
            Ok(len) => Some(len),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(usize::MAX),
            Err(_) => None,
        })
        .unwrap_or(0);
    Some((head_len + sep_len).saturating_add(body_len))
}

/// Parse an HTTP request from a byte slice.
///
/// # Arguments
///
/// * `input` - A byte slice containing the HTTP request to parse
///
/// # Returns
///
/// The parsed HTTP request, or an error if the request is invalid
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    // Separate the head from the body
    let (head_bytes, body_bytes) = match find_head_end(input) {
        Some((head_len, sep_len)) => (&input[..head_len], &input[head_len + sep_len..]),
        None => (input, &input[input.len()..]),
    };

    // Convert the head to a string
    let input_str = match std::str::from_utf8(head_bytes) {
        Ok(s) => s,
        Err(_) => return Err(Error::MalformedRequestLine("Invalid UTF-8".to_string())),
    };

    // Split the head into lines
    let mut lines = input_str.lines();

    // Parse the request line
    let request_line = match lines.next() {
        Some(line) => line,
        None => return Err(Error::EmptyRequest),
    };

    // Split the request line into method, path, and version
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    // Parse the method
    let method = Method::from_str(parts[0])?;

    // Parse the path
    let path = parts[1].to_string();
    if path.is_empty() {
        return Err(Error::InvalidPath);
    }

    // Parse the version
    let version = HttpVersion::from_str(parts[2])?;

    // Parse the headers
    let mut headers = HashMap::new();
    for line in lines {
        // Empty line indicates the end of headers
        if line.is_empty() {
            break;
        }

        // Split the line into name and value
        let parts: Vec<&str> = line.splitn(2, ':').collect();
        if parts.len() != 2 {
            return Err(Error::InvalidHeaderFormat);
        }

        // Trim whitespace from the name and value
        let name = parts[0].trim().to_string();
        let value = parts[1].trim().to_string();

        // Add the header to the map
        headers.insert(name, value);
    }

    // Check for required headers
    if version == HttpVersion::Http11 && !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("Host")) {
        return Err(Error::MissingHeader("Host".to_string()));
    }

    let mut request = HttpRequest::new(method, path, version, headers);

    // Keep the body, trimmed to the declared length
    let body_len = request
        .content_length()
        .map_or(body_bytes.len(), |declared| declared.min(body_bytes.len()));
    request.body = body_bytes[..body_len].to_vec();

    Ok(request)
}
