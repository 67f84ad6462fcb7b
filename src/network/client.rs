//! CoText Client
//!
//! Connects to a CoText server and drives the frame exchange.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::handler::{HandlerRegistry, MessageHandler};
use super::{MalformedFramePolicy, NetworkConfig};
use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::{encode, Decoder, Message};

/// Client state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connected,
}

/// CoText Client
///
/// Owns the socket and both codec buffers. All operations take
/// `&mut self`, so one task drives the connection at a time; a send
/// can never interleave with another send halfway through a frame.
pub struct Client {
    /// Client configuration
    config: NetworkConfig,
    /// The TCP stream, present while connected
    stream: Option<TcpStream>,
    /// Decoder for server frames
    decoder: Decoder,
    /// Read buffer
    read_buf: BytesMut,
    /// Write buffer
    write_buf: BytesMut,
    /// Subscribers for received frames
    handlers: HandlerRegistry,
    /// Current state
    state: ClientState,
}

impl Client {
    /// Create a new client
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            stream: None,
            decoder: Decoder::new(true),
            read_buf: BytesMut::with_capacity(4096),
            write_buf: BytesMut::with_capacity(4096),
            handlers: HandlerRegistry::new(),
            state: ClientState::Disconnected,
        }
    }

    /// Connect to the configured server
    ///
    /// Fails with `AlreadyConnected` when a connection is live. A failed
    /// attempt leaves the client disconnected and a later retry is fine.
    pub async fn connect(&mut self) -> ProtocolResult<()> {
        if self.state != ClientState::Disconnected {
            return Err(ProtocolError::AlreadyConnected);
        }

        let address = self.config.address();
        tracing::info!("Connecting to {}", address);

        let addr = super::resolve_host(&self.config.host, self.config.port)
            .await
            .map_err(|source| ProtocolError::ConnectionFailed {
                addr: address.clone(),
                source,
            })?;

        // Connect with timeout
        let stream = match tokio::time::timeout(
            Duration::from_millis(self.config.connect_timeout_ms),
            TcpStream::connect(addr),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ProtocolError::ConnectionFailed {
                    addr: address,
                    source,
                });
            }
            Err(_) => {
                return Err(ProtocolError::ConnectionFailed {
                    addr: address,
                    source: std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "connect timed out",
                    ),
                });
            }
        };

        self.stream = Some(stream);
        self.decoder.reset();
        self.read_buf.clear();
        self.write_buf.clear();
        self.state = ClientState::Connected;

        tracing::info!("Connected to {}", addr);
        Ok(())
    }

    /// Disconnect from the server
    ///
    /// Sends a logout notice first; failures there are logged, not
    /// surfaced, since the connection is going away either way. The state
    /// ends up `Disconnected` even when closing the socket fails.
    pub async fn disconnect(&mut self) -> ProtocolResult<()> {
        if self.state != ClientState::Connected {
            return Err(ProtocolError::NotConnected);
        }

        if let Err(e) = self.send(&Message::user_logout()).await {
            tracing::debug!("Logout notice failed: {}", e);
        }
        let closed = match self.stream.as_mut() {
            Some(stream) => stream.shutdown().await,
            None => Ok(()),
        };
        self.drop_connection();

        if let Err(source) = closed {
            return Err(ProtocolError::ConnectionFailed {
                addr: self.config.address(),
                source,
            });
        }

        tracing::info!("Disconnected from {}", self.config.address());
        Ok(())
    }

    /// Encode a frame and send it to the server
    pub async fn send(&mut self, message: &Message) -> ProtocolResult<()> {
        let stream = self.stream.as_mut().ok_or(ProtocolError::NotConnected)?;

        self.write_buf.clear();
        encode(message, false, &mut self.write_buf)?;

        stream.write_all(&self.write_buf).await?;
        stream.flush().await?;

        tracing::trace!("Sent {:?} ({} bytes)", message.kind, self.write_buf.len());
        Ok(())
    }

    /// Receive and dispatch at most one frame
    ///
    /// Blocks until a whole frame arrives, then runs the registered
    /// handlers and returns the frame. `Ok(None)` means nothing was
    /// dispatched: the client was already disconnected, the server
    /// closed the connection (the client is torn down, check
    /// [`Client::is_connected`]), or an unknown tag or failed read was
    /// dropped under the default policy. Cancel-safe, so it can sit in
    /// a `tokio::select!` arm.
    pub async fn receive_once(&mut self) -> ProtocolResult<Option<Message>> {
        if self.state != ClientState::Connected {
            return Ok(None);
        }

        let message = match self.receive_frame().await {
            Ok(Some(message)) => message,
            Ok(None) => {
                if !self.read_buf.is_empty() {
                    tracing::warn!(
                        "Connection closed mid-frame, {} byte(s) discarded",
                        self.read_buf.len()
                    );
                } else {
                    tracing::info!("Server closed the connection");
                }
                self.drop_connection();
                return Ok(None);
            }
            Err(error) => return self.handle_receive_error(error),
        };

        tracing::trace!("Received {:?}", message.kind);
        self.handlers.dispatch(&message);
        Ok(Some(message))
    }

    /// Read until one frame decodes or the stream ends
    async fn receive_frame(&mut self) -> ProtocolResult<Option<Message>> {
        let read_timeout = self.config.read_timeout_ms.map(Duration::from_millis);

        loop {
            // Try to decode a frame from the buffer
            if let Some(message) = self.decoder.decode(&mut self.read_buf)? {
                return Ok(Some(message));
            }

            // Read more data
            let stream = self.stream.as_mut().ok_or(ProtocolError::NotConnected)?;
            let mut buf = [0u8; 4096];
            let n = match read_timeout {
                Some(timeout) => match tokio::time::timeout(timeout, stream.read(&mut buf)).await
                {
                    Ok(result) => result?,
                    Err(_) => return Err(ProtocolError::Timeout),
                },
                None => stream.read(&mut buf).await?,
            };

            if n == 0 {
                return Ok(None);
            }
            self.read_buf.extend_from_slice(&buf[..n]);
        }
    }

    /// Map receive errors according to configuration and tear down when
    /// the connection is no longer usable
    fn handle_receive_error(&mut self, error: ProtocolError) -> ProtocolResult<Option<Message>> {
        match error {
            // The bad tag byte is already consumed; decoding resumes at
            // the next byte either way.
            ProtocolError::InvalidType(tag) => match self.config.malformed_frames {
                MalformedFramePolicy::Ignore => {
                    tracing::warn!("Dropping frame with unknown tag {:#04x}", tag);
                    Ok(None)
                }
                MalformedFramePolicy::Surface => Err(ProtocolError::InvalidType(tag)),
            },
            ProtocolError::Timeout => {
                tracing::warn!("Read timed out, dropping connection");
                self.drop_connection();
                Err(ProtocolError::Timeout)
            }
            ProtocolError::UnexpectedIo(e) => {
                tracing::warn!("Read failed: {}", e);
                self.drop_connection();
                match self.config.malformed_frames {
                    MalformedFramePolicy::Ignore => Ok(None),
                    MalformedFramePolicy::Surface => Err(ProtocolError::UnexpectedIo(e)),
                }
            }
            other => Err(other),
        }
    }

    /// Forget the socket and all buffered state
    fn drop_connection(&mut self) {
        self.stream = None;
        self.decoder.reset();
        self.read_buf.clear();
        self.write_buf.clear();
        self.state = ClientState::Disconnected;
    }

    /// Register a handler for received frames
    pub fn add_handler(&mut self, handler: Arc<dyn MessageHandler>) {
        self.handlers.add(handler);
    }

    /// Unregister a previously registered handler
    pub fn remove_handler(&mut self, handler: &Arc<dyn MessageHandler>) -> bool {
        self.handlers.remove(handler)
    }

    /// Number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Get the current state
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.state == ClientState::Connected
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }
}
