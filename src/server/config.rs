//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

use crate::server::error::Error;

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// The read buffer size.
    pub read_buffer_size: usize,
    /// Largest accepted request, head and body together, in bytes.
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            max_connections: 1024,
            read_buffer_size: 8192,
            max_request_size: 64 * 1024,
        }
    }
}

/// The per-connection subset of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Bytes read from the socket per call.
    pub read_buffer_size: usize,
    /// Largest accepted request in bytes.
    pub max_request_size: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        ServerConfig::default().limits()
    }
}

fn parse_var<T: FromStr>(name: &'static str, value: String) -> Result<T, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig { name, value })
}

impl ServerConfig {
    pub fn limits(&self) -> RequestLimits {
        RequestLimits {
            read_buffer_size: self.read_buffer_size,
            max_request_size: self.max_request_size,
        }
    }

    /// Defaults overlaid with the process environment.
    ///
    /// Reads `CHAT_ADDR`, `PORT`, `CHAT_MAX_CONNECTIONS` and `CHAT_MAX_REQUEST_SIZE`.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    ///
    /// `PORT` replaces only the port of the address, after `CHAT_ADDR` is applied.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("CHAT_ADDR") {
            config.addr = parse_var("CHAT_ADDR", value)?;
        }
        if let Some(value) = lookup("PORT") {
            config.addr.set_port(parse_var("PORT", value)?);
        }
        if let Some(value) = lookup("CHAT_MAX_CONNECTIONS") {
            config.max_connections = parse_var("CHAT_MAX_CONNECTIONS", value)?;
        }
        if let Some(value) = lookup("CHAT_MAX_REQUEST_SIZE") {
            config.max_request_size = parse_var("CHAT_MAX_REQUEST_SIZE", value)?;
        }

        if config.max_connections == 0 {
            return Err(Error::InvalidConfig {
                name: "CHAT_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        Ok(config)
    }
}
