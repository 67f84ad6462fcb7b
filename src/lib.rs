//! CoText - Collaborative Text Editor Client Transport
//!
//! The client side of the CoText wire protocol: a binary frame codec
//! and a connection manager that dispatches server frames to registered
//! handlers.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cotext::network::{Client, NetworkConfig};
//! use cotext::protocol::Message;
//!
//! # async fn run() -> cotext::ProtocolResult<()> {
//! let mut client = Client::new(NetworkConfig::new("localhost", 52021));
//! client.add_handler(Arc::new(|message: &Message| {
//!     println!("<- {:?}", message.kind);
//! }));
//!
//! client.connect().await?;
//! client.send(&Message::doc_list()).await?;
//! while client.is_connected() {
//!     client.receive_once().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod protocol;

pub use error::{ProtocolError, ProtocolResult};
