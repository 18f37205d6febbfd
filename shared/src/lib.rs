use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_PORT: u16 = 8766;
pub const DEFAULT_HOST: &str = "127.0.0.1";

pub const GAME_OVER_MESSAGE: &str = "You hit a mine";
pub const GAME_WON_MESSAGE: &str = "Congratulations! Every mine is marked correctly";
pub const MARKS_INCORRECT_MESSAGE: &str = "Some marks are not correct";

/// A cell coordinate as `(x, y)`, where `x` is the row and `y` the column.
///
/// Serialized as a two element array, `[x, y]`.
pub type Position = (usize, usize);

/// Opaque identifier for one game session.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messages sent from a client to the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    StartGame {
        rows: usize,
        columns: usize,
        mines: usize,
    },
    #[serde(rename_all = "camelCase")]
    RevealCell {
        session_id: SessionId,
        x: usize,
        y: usize,
    },
    #[serde(rename_all = "camelCase")]
    Solve { session_id: SessionId },
    #[serde(rename_all = "camelCase")]
    VerifyMarks {
        session_id: SessionId,
        marks: Vec<Position>,
    },
}

impl ClientMessage {
    /// The session this message refers to, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            ClientMessage::StartGame { .. } => None,
            ClientMessage::RevealCell { session_id, .. }
            | ClientMessage::Solve { session_id }
            | ClientMessage::VerifyMarks { session_id, .. } => Some(*session_id),
        }
    }
}

/// Messages sent from the server to a client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    GameCreated {
        session_id: SessionId,
        rows: usize,
        columns: usize,
        total_mines: usize,
    },
    CellRevealed {
        x: usize,
        y: usize,
        value: u8,
    },
    GameOver {
        message: String,
    },
    MinesRevealed {
        mines: Vec<Position>,
    },
    GameWon {
        message: String,
    },
    MarksIncorrect {
        message: String,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

/// Category of a rejected request.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidConfiguration,
    InvalidCoordinate,
    MalformedMessage,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::InvalidConfiguration => "invalid configuration",
            ErrorCode::InvalidCoordinate => "invalid coordinate",
            ErrorCode::MalformedMessage => "malformed message",
        };
        f.write_str(name)
    }
}

pub fn encode<T: Serialize>(message: &T) -> serde_json::Result<String> {
    serde_json::to_string(message)
}

pub fn decode_client(text: &str) -> serde_json::Result<ClientMessage> {
    serde_json::from_str(text)
}

pub fn decode_server(text: &str) -> serde_json::Result<ServerMessage> {
    serde_json::from_str(text)
}
