//! Server network layer handling WebSocket connections and request dispatch

use crate::config::ServerConfig;
use crate::error::GameError;
use crate::session::ConnectionId;
use crate::session_manager::SessionManager;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::ServerMessage;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type FrameSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type FrameStream = SplitStream<WebSocketStream<TcpStream>>;

/// Accepts client connections and runs one task per connection
pub struct Server {
    listener: TcpListener,
    manager: Arc<SessionManager>,
    config: ServerConfig,
    next_connection_id: ConnectionId,
}

impl Server {
    pub async fn new(addr: &str, config: ServerConfig) -> Result<Self, BoxError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            manager: Arc::new(SessionManager::new(&config)),
            config,
            next_connection_id: 1,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn manager(&self) -> Arc<SessionManager> {
        Arc::clone(&self.manager)
    }

    /// Spawns task that periodically drops idle sessions
    fn spawn_session_reaper(&self) {
        let manager = Arc::clone(&self.manager);
        let ttl = self.config.session_ttl;
        let period = self.config.reap_period();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                let reaped = manager.store().reap_idle(ttl).await;
                if !reaped.is_empty() {
                    debug!("Reaped sessions {:?}", reaped);
                }
            }
        });
    }

    /// Main accept loop. Runs until the task is dropped.
    pub async fn run(&mut self) -> Result<(), BoxError> {
        self.spawn_session_reaper();
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let connection_id = self.next_connection_id;
                    self.next_connection_id += 1;

                    let manager = Arc::clone(&self.manager);
                    tokio::spawn(handle_connection(stream, addr, connection_id, manager));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Drives a single client from handshake to disconnect
///
/// Whatever happens on this connection stays on it: failures end this task
/// only, and the sessions it owned are released on the way out.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connection_id: ConnectionId,
    manager: Arc<SessionManager>,
) {
    let websocket = match tokio_tungstenite::accept_async(stream).await {
        Ok(websocket) => websocket,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    info!("Connection {} established from {}", connection_id, addr);

    let (sink, stream) = websocket.split();
    match serve_connection(sink, stream, connection_id, &manager).await {
        Ok(()) => info!("Connection {} closed", connection_id),
        Err(e) => info!("Connection {} ended: {}", connection_id, e),
    }

    manager.disconnect(connection_id).await;
}

async fn serve_connection(
    mut sink: FrameSink,
    mut stream: FrameStream,
    connection_id: ConnectionId,
    manager: &SessionManager,
) -> Result<(), GameError> {
    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!("Read error on connection {}: {}", connection_id, e);
                return Err(GameError::ChannelClosed);
            }
        };

        match frame {
            Message::Text(text) => {
                if let Some(response) = process_frame(manager, connection_id, &text).await {
                    send_message(&mut sink, &response).await?;
                }
            }
            Message::Binary(_) => {
                warn!("Ignoring binary frame from connection {}", connection_id);
            }
            Message::Close(_) => break,
            // Ping/pong replies are handled by the WebSocket layer
            _ => {}
        }
    }

    Ok(())
}

/// Decodes and applies one text frame, returning the reply if there is one
///
/// Errors never leave this function: malformed frames and bad requests turn
/// into error replies, unknown sessions are logged and dropped.
pub async fn process_frame(
    manager: &SessionManager,
    connection_id: ConnectionId,
    text: &str,
) -> Option<ServerMessage> {
    let message = match shared::decode_client(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("Failed to decode message from connection {}: {}", connection_id, e);
            return GameError::MalformedMessage(e.to_string()).to_response();
        }
    };
    debug!("Connection {} sent {:?}", connection_id, message);

    match manager.handle(connection_id, message).await {
        Ok(response) => Some(response),
        Err(e) => {
            warn!("Rejected request from connection {}: {}", connection_id, e);
            e.to_response()
        }
    }
}

async fn send_message(sink: &mut FrameSink, message: &ServerMessage) -> Result<(), GameError> {
    let text = match shared::encode(message) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to encode {:?}: {}", message, e);
            return Ok(());
        }
    };
    sink.send(Message::Text(text))
        .await
        .map_err(|_| GameError::ChannelClosed)
}
