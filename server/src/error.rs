use shared::{ErrorCode, Position, ServerMessage, SessionId};
use thiserror::Error;

/// Failures of a single request. None of them outlive the message that caused them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid configuration: {rows}x{columns} board with {mines} mines ({reason})")]
    InvalidConfiguration {
        rows: usize,
        columns: usize,
        mines: usize,
        reason: &'static str,
    },
    #[error("Invalid coordinate ({}, {}) on a {rows}x{columns} board", .position.0, .position.1)]
    InvalidCoordinate {
        position: Position,
        rows: usize,
        columns: usize,
    },
    #[error("Unknown session {0}")]
    UnknownSession(SessionId),
    #[error("Malformed message: {0}")]
    MalformedMessage(String),
    #[error("Channel closed")]
    ChannelClosed,
}

impl GameError {
    /// The response a client receives for this error, if it receives one at all.
    ///
    /// Unknown sessions are only logged, and a closed channel has nobody to answer.
    pub fn to_response(&self) -> Option<ServerMessage> {
        let code = match self {
            GameError::InvalidConfiguration { .. } => ErrorCode::InvalidConfiguration,
            GameError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
            GameError::MalformedMessage(_) => ErrorCode::MalformedMessage,
            GameError::UnknownSession(_) | GameError::ChannelClosed => return None,
        };
        Some(ServerMessage::Error {
            code,
            message: self.to_string(),
        })
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_response() {
        let error = GameError::InvalidConfiguration {
            rows: 2,
            columns: 2,
            mines: 4,
            reason: "too many mines",
        };
        match error.to_response() {
            Some(ServerMessage::Error { code, message }) => {
                assert_eq!(code, ErrorCode::InvalidConfiguration);
                assert!(message.contains("2x2"));
                assert!(message.contains("too many mines"));
            }
            other => panic!("Unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_coordinate_response() {
        let error = GameError::InvalidCoordinate {
            position: (5, 1),
            rows: 3,
            columns: 3,
        };
        match error.to_response() {
            Some(ServerMessage::Error { code, message }) => {
                assert_eq!(code, ErrorCode::InvalidCoordinate);
                assert!(message.contains("(5, 1)"));
            }
            other => panic!("Unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_silent_errors() {
        assert!(GameError::UnknownSession(SessionId(9)).to_response().is_none());
        assert!(GameError::ChannelClosed.to_response().is_none());
    }
}
