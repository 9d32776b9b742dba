//! TCP bridge server.
//!
//! One task per connection. Each decoded command is executed by the
//! [`CommandHandler`] on the blocking pool under `command_timeout_ms`, and
//! the response is written back as a bare JSON object.

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use flstudio_mcp_core::{BridgeSettings, Command, Error, Response, Result};

use crate::framing::JsonStreamDecoder;
use crate::handler::{dispatch, CommandHandler};

/// Message returned when a command outlives `command_timeout_ms`.
pub const TIMEOUT_MESSAGE: &str = "Timeout waiting for operation to complete";

/// Stops a running [`BridgeServer`] and its connections.
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    /// Request shutdown.
    pub fn shutdown(&self) {
        self.0.send_replace(true);
    }
}

/// Bridge server bound to a socket.
pub struct BridgeServer {
    listener: TcpListener,
    handler: Arc<dyn CommandHandler>,
    settings: BridgeSettings,
    shutdown: Arc<watch::Sender<bool>>,
}

impl BridgeServer {
    /// Bind to `settings.host:settings.port`.
    pub async fn bind(settings: BridgeSettings, handler: Arc<dyn CommandHandler>) -> Result<Self> {
        let listener = TcpListener::bind(settings.address()).await?;
        let (shutdown, _) = watch::channel(false);
        info!("Bridge listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            handler,
            settings,
            shutdown: Arc::new(shutdown),
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Accept connections until shutdown is requested.
    pub async fn run(self) -> Result<()> {
        let mut stop = self.shutdown.subscribe();
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let connection = Connection {
                            id: Uuid::new_v4(),
                            peer,
                            handler: Arc::clone(&self.handler),
                            settings: self.settings.clone(),
                        };
                        let stop = self.shutdown.subscribe();
                        tokio::spawn(async move {
                            let id = connection.id;
                            if let Err(e) = connection.serve(stream, stop).await {
                                warn!("Connection error: id={}, error={}", id, e);
                            }
                        });
                    }
                    Err(e) => error!("Error accepting connection: {}", e),
                },
                _ = stop.changed() => break,
            }
        }
        info!("Bridge stopped");
        Ok(())
    }
}

struct Connection {
    id: Uuid,
    peer: SocketAddr,
    handler: Arc<dyn CommandHandler>,
    settings: BridgeSettings,
}

impl Connection {
    async fn serve(self, mut stream: TcpStream, mut stop: watch::Receiver<bool>) -> Result<()> {
        info!("Client connected: id={}, peer={}", self.id, self.peer);
        let mut decoder = JsonStreamDecoder::new(self.settings.max_message_bytes);
        let mut buf = vec![0u8; self.settings.read_buffer_bytes];

        loop {
            let n = tokio::select! {
                read = stream.read(&mut buf) => read?,
                _ = stop.changed() => break,
            };
            if n == 0 {
                break;
            }

            if let Err(e) = decoder.push(&buf[..n]) {
                // The rest of the oversized message is still in flight; it
                // cannot be resynchronised, so the connection is closed.
                warn!("Closing after oversized message: id={}, error={}", self.id, e);
                self.reply(&mut stream, &Response::from(e)).await?;
                let _ = stream.shutdown().await;
                break;
            }

            loop {
                match decoder.next_message() {
                    Ok(Some(value)) => {
                        let response = self.execute(value).await;
                        self.reply(&mut stream, &response).await?;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Invalid JSON: id={}, error={}", self.id, e);
                        self.reply(&mut stream, &Response::from(e)).await?;
                        break;
                    }
                }
            }
        }

        info!("Client disconnected: id={}", self.id);
        Ok(())
    }

    async fn execute(&self, value: Value) -> Response {
        let command: Command = match serde_json::from_value(value) {
            Ok(command) => command,
            Err(e) => return Response::from(Error::InvalidParams(format!("Malformed command: {e}"))),
        };

        match command.kind() {
            Ok(kind) if kind.mutates_state() => {
                info!("Received command: id={}, type={}", self.id, kind)
            }
            Ok(kind) => debug!("Received command: id={}, type={}", self.id, kind),
            Err(_) => {
                warn!("Unknown command: id={}, type={}", self.id, command.command_type);
                return Response::from(Error::UnknownCommand(command.command_type));
            }
        }

        let handler = Arc::clone(&self.handler);
        let work = tokio::task::spawn_blocking(move || dispatch(handler.as_ref(), &command));
        match tokio::time::timeout(self.settings.command_timeout(), work).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!("Command task failed: id={}, error={}", self.id, e);
                Response::error(e.to_string())
            }
            Err(_) => {
                warn!("Command timed out: id={}", self.id);
                Response::error(TIMEOUT_MESSAGE)
            }
        }
    }

    async fn reply(&self, stream: &mut TcpStream, response: &Response) -> Result<()> {
        debug!("Sending response: id={}, status={:?}", self.id, response.status);
        let bytes = serde_json::to_vec(response)?;
        stream.write_all(&bytes).await?;
        Ok(())
    }
}
