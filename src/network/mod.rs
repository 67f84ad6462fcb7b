//! Network module - Handles the client side of the editor protocol
//!
//! Provides:
//! - Client for connecting to a CoText server
//! - Handler registry for dispatching received frames
//! - Connection configuration and host resolution

mod client;
mod handler;

pub use client::*;
pub use handler::*;

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// What the receive loop does with bytes that fail to decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedFramePolicy {
    /// Skip the offending byte and resume decoding at the next one
    #[default]
    Ignore,
    /// Return the decode error to the caller
    Surface,
}

/// Configuration for network operations
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Host to connect to
    pub host: String,
    /// Port to connect to
    pub port: u16,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Optional receive timeout in milliseconds
    ///
    /// When set, a read that sees no bytes for this long tears the
    /// connection down and reports a timeout.
    pub read_timeout_ms: Option<u64>,
    /// Handling of undecodable input
    pub malformed_frames: MalformedFramePolicy,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: crate::protocol::DEFAULT_PORT,
            connect_timeout_ms: 5000,
            read_timeout_ms: None,
            malformed_frames: MalformedFramePolicy::default(),
        }
    }
}

impl NetworkConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            ..Default::default()
        }
    }

    pub fn with_read_timeout(mut self, timeout_ms: u64) -> Self {
        self.read_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn surfacing_malformed_frames(mut self) -> Self {
        self.malformed_frames = MalformedFramePolicy::Surface;
        self
    }

    /// The address string this configuration points at
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resolve a hostname to a socket address
pub async fn resolve_host(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    use tokio::net::lookup_host;

    let addr_string = format!("{}:{}", host, port);
    let mut addrs = lookup_host(&addr_string).await?;

    addrs.next().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Could not resolve host: {}", host),
        )
    })
}
