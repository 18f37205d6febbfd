use crate::game::ClientGameState;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{ClientMessage, Position, ServerMessage, SessionId};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How long `request` waits for a reply before giving up
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// One connection to a game server together with the game it is playing
pub struct Client {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    game_state: ClientGameState,
    reply_timeout: Duration,
}

impl Client {
    pub async fn connect(url: &str) -> Result<Self, BoxError> {
        info!("Connecting to {}...", url);
        let (socket, _) = tokio_tungstenite::connect_async(url).await?;

        Ok(Client {
            socket,
            game_state: ClientGameState::new(),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        })
    }

    pub fn reply_timeout(&self) -> Duration {
        self.reply_timeout
    }

    /// The server stays silent for requests naming an unknown session, so
    /// every request is bounded by this deadline.
    pub fn set_reply_timeout(&mut self, timeout: Duration) {
        self.reply_timeout = timeout;
    }

    pub fn game(&self) -> &ClientGameState {
        &self.game_state
    }

    pub fn game_mut(&mut self) -> &mut ClientGameState {
        &mut self.game_state
    }

    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), BoxError> {
        let text = shared::encode(message)?;
        self.send_text(text).await
    }

    /// Sends an arbitrary text frame, bypassing message encoding
    pub async fn send_text(&mut self, text: String) -> Result<(), BoxError> {
        self.socket.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Waits for the next server message and folds it into the game view
    pub async fn recv(&mut self) -> Result<ServerMessage, BoxError> {
        while let Some(frame) = self.socket.next().await {
            match frame? {
                Message::Text(text) => {
                    let message = shared::decode_server(&text)?;
                    debug!("Received {:?}", message);
                    self.game_state.apply(&message);
                    return Ok(message);
                }
                Message::Close(_) => break,
                Message::Binary(_) => warn!("Ignoring unexpected binary frame"),
                _ => {}
            }
        }
        Err("connection closed by server".into())
    }

    /// Sends one request and waits for its reply, up to the reply timeout
    pub async fn request(&mut self, message: &ClientMessage) -> Result<ServerMessage, BoxError> {
        self.send(message).await?;
        match tokio::time::timeout(self.reply_timeout, self.recv()).await {
            Ok(reply) => reply,
            Err(_) => {
                warn!("No reply to {:?} within {:?}", message, self.reply_timeout);
                Err(format!("no reply within {:?}", self.reply_timeout).into())
            }
        }
    }

    fn current_session(&self) -> Result<SessionId, BoxError> {
        self.game_state
            .session_id()
            .ok_or_else(|| "no game in progress".into())
    }

    pub async fn start_game(
        &mut self,
        rows: usize,
        columns: usize,
        mines: usize,
    ) -> Result<SessionId, BoxError> {
        let response = self
            .request(&ClientMessage::StartGame {
                rows,
                columns,
                mines,
            })
            .await?;

        match response {
            ServerMessage::GameCreated { session_id, .. } => Ok(session_id),
            ServerMessage::Error { message, .. } => Err(message.into()),
            other => Err(format!("unexpected reply to start_game: {:?}", other).into()),
        }
    }

    pub async fn reveal(&mut self, pos: Position) -> Result<ServerMessage, BoxError> {
        let session_id = self.current_session()?;
        self.request(&ClientMessage::RevealCell {
            session_id,
            x: pos.0,
            y: pos.1,
        })
        .await
    }

    pub async fn solve(&mut self) -> Result<Vec<Position>, BoxError> {
        let session_id = self.current_session()?;
        match self.request(&ClientMessage::Solve { session_id }).await? {
            ServerMessage::MinesRevealed { mines } => Ok(mines),
            other => Err(format!("unexpected reply to solve: {:?}", other).into()),
        }
    }

    /// Submits the current mark set for checking
    pub async fn verify_marks(&mut self) -> Result<ServerMessage, BoxError> {
        let session_id = self.current_session()?;
        let marks = self.game_state.marks();
        self.request(&ClientMessage::VerifyMarks { session_id, marks })
            .await
    }

    pub async fn close(mut self) -> Result<(), BoxError> {
        self.socket.close(None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Accepts one WebSocket connection and reads frames without answering
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(_)) = socket.next().await {}
        });
        format!("ws://{}", addr)
    }

    #[tokio::test]
    async fn test_request_gives_up_without_reply() {
        let url = silent_server().await;
        let mut client = Client::connect(&url).await.unwrap();
        assert_eq!(client.reply_timeout(), DEFAULT_REPLY_TIMEOUT);
        client.set_reply_timeout(Duration::from_millis(50));

        let pending = client.request(&ClientMessage::Solve {
            session_id: SessionId(1),
        });
        let result = tokio::time::timeout(Duration::from_secs(2), pending)
            .await
            .expect("request ignored its reply timeout");
        let error = result.unwrap_err().to_string();
        assert!(error.contains("no reply"), "unexpected error: {}", error);
    }

    #[tokio::test]
    async fn test_start_game_times_out_against_silent_server() {
        let url = silent_server().await;
        let mut client = Client::connect(&url).await.unwrap();
        client.set_reply_timeout(Duration::from_millis(50));

        assert!(client.start_game(3, 3, 1).await.is_err());
        assert!(client.game().session_id().is_none());
    }
}
