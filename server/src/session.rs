//! Per-game state and the rules applied to each request against it

use crate::board::{Board, Cell};
use crate::error::Result;
use log::info;
use shared::{
    Position, ServerMessage, SessionId, GAME_OVER_MESSAGE, GAME_WON_MESSAGE,
    MARKS_INCORRECT_MESSAGE,
};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Identifier the network layer assigns to each accepted connection
pub type ConnectionId = u64;

/// Lifecycle of a session. `Lost` and `Won` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Lost,
    Won,
}

impl SessionStatus {
    pub fn is_resolved(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

/// One game instance with its own board
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    /// Connection that created the session
    pub owner: ConnectionId,
    board: Board,
    status: SessionStatus,
    last_activity: Instant,
}

impl Session {
    pub fn new(id: SessionId, owner: ConnectionId, board: Board) -> Self {
        Self {
            id,
            owner,
            board,
            status: SessionStatus::Active,
            last_activity: Instant::now(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_idle(&self, ttl: Duration) -> bool {
        self.last_activity.elapsed() > ttl
    }

    /// Moves an active session into a terminal state; resolved sessions never change
    fn resolve(&mut self, outcome: SessionStatus) {
        if self.status == SessionStatus::Active {
            info!("Session {} resolved as {:?}", self.id, outcome);
            self.status = outcome;
        }
    }

    pub fn created_message(&self) -> ServerMessage {
        ServerMessage::GameCreated {
            session_id: self.id,
            rows: self.board.rows(),
            columns: self.board.columns(),
            total_mines: self.board.mine_count(),
        }
    }

    /// Reveals one cell. Hitting a mine loses the game.
    ///
    /// Revealing is stateless apart from the loss transition, so asking for
    /// the same cell twice yields the same answer.
    pub fn reveal(&mut self, pos: Position) -> Result<ServerMessage> {
        self.touch();
        match self.board.cell(pos)? {
            Cell::Mine => {
                self.resolve(SessionStatus::Lost);
                Ok(ServerMessage::GameOver {
                    message: GAME_OVER_MESSAGE.to_string(),
                })
            }
            Cell::Clear(value) => Ok(ServerMessage::CellRevealed {
                x: pos.0,
                y: pos.1,
                value,
            }),
        }
    }

    pub fn solve(&mut self) -> ServerMessage {
        self.touch();
        ServerMessage::MinesRevealed {
            mines: self.board.mine_positions().to_vec(),
        }
    }

    /// Checks a caller-held mark set against the real mines, as a set
    pub fn verify_marks(&mut self, marks: &[Position]) -> Result<ServerMessage> {
        self.touch();
        for &mark in marks {
            self.board.check_bounds(mark)?;
        }

        let submitted: HashSet<Position> = marks.iter().copied().collect();
        let actual: HashSet<Position> = self.board.mine_positions().iter().copied().collect();

        if submitted == actual {
            self.resolve(SessionStatus::Won);
            Ok(ServerMessage::GameWon {
                message: GAME_WON_MESSAGE.to_string(),
            })
        } else {
            Ok(ServerMessage::MarksIncorrect {
                message: MARKS_INCORRECT_MESSAGE.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_session(rows: usize, columns: usize, mines: usize, seed: u64) -> Session {
        let board =
            Board::generate(rows, columns, mines, &mut StdRng::seed_from_u64(seed)).unwrap();
        Session::new(SessionId(1), 1, board)
    }

    fn first_clear_cell(session: &Session) -> Position {
        let board = session.board();
        (0..board.rows())
            .flat_map(|x| (0..board.columns()).map(move |y| (x, y)))
            .find(|&pos| !board.is_mine(pos).unwrap())
            .unwrap()
    }

    #[test]
    fn test_session_creation() {
        let session = test_session(3, 4, 2, 0);
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(
            session.created_message(),
            ServerMessage::GameCreated {
                session_id: SessionId(1),
                rows: 3,
                columns: 4,
                total_mines: 2
            }
        );
    }

    #[test]
    fn test_reveal_is_idempotent() {
        let mut session = test_session(8, 8, 10, 11);
        let pos = first_clear_cell(&session);

        let first = session.reveal(pos).unwrap();
        let second = session.reveal(pos).unwrap();
        assert_eq!(first, second);
        assert!(matches!(first, ServerMessage::CellRevealed { .. }));
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn test_reveal_mine_loses() {
        let mut session = test_session(3, 3, 1, 4);
        let mine = session.board().mine_positions()[0];

        let response = session.reveal(mine).unwrap();
        assert_eq!(
            response,
            ServerMessage::GameOver {
                message: GAME_OVER_MESSAGE.to_string()
            }
        );
        assert_eq!(session.status(), SessionStatus::Lost);
        assert!(session.status().is_resolved());
    }

    #[test]
    fn test_lost_session_still_answers() {
        let mut session = test_session(3, 3, 1, 4);
        let mine = session.board().mine_positions()[0];
        session.reveal(mine).unwrap();

        let clear = first_clear_cell(&session);
        assert!(matches!(
            session.reveal(clear).unwrap(),
            ServerMessage::CellRevealed { .. }
        ));
        // A correct mark set after losing is acknowledged but the loss stands
        assert!(matches!(
            session.verify_marks(&[mine]).unwrap(),
            ServerMessage::GameWon { .. }
        ));
        assert_eq!(session.status(), SessionStatus::Lost);
    }

    #[test]
    fn test_reveal_out_of_range() {
        let mut session = test_session(3, 3, 1, 0);
        assert!(matches!(
            session.reveal((3, 0)),
            Err(GameError::InvalidCoordinate { .. })
        ));
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn test_verify_marks_set_semantics() {
        let mut session = test_session(8, 8, 10, 21);
        let mines = session.board().mine_positions().to_vec();
        let clear = first_clear_cell(&session);

        let mut reversed = mines.clone();
        reversed.reverse();
        let mut duplicated = mines.clone();
        duplicated.push(mines[0]);
        let subset = mines[1..].to_vec();
        let mut superset = mines.clone();
        superset.push(clear);
        let mut swapped = mines.clone();
        swapped[0] = clear;

        for marks in [&subset, &superset, &swapped, &Vec::new()] {
            assert!(matches!(
                session.verify_marks(marks).unwrap(),
                ServerMessage::MarksIncorrect { .. }
            ));
        }
        assert_eq!(session.status(), SessionStatus::Active);

        for marks in [&reversed, &duplicated] {
            assert!(matches!(
                session.verify_marks(marks).unwrap(),
                ServerMessage::GameWon { .. }
            ));
        }
        assert_eq!(session.status(), SessionStatus::Won);
    }

    #[test]
    fn test_verify_marks_out_of_range() {
        let mut session = test_session(4, 4, 2, 2);
        let mut marks = session.board().mine_positions().to_vec();
        marks.push((0, 9));
        assert!(matches!(
            session.verify_marks(&marks),
            Err(GameError::InvalidCoordinate { position: (0, 9), .. })
        ));
    }

    #[test]
    fn test_solve_unaffected_by_prior_calls() {
        let mut session = test_session(6, 6, 8, 9);
        let expected = session.board().mine_positions().to_vec();

        let clear = first_clear_cell(&session);
        session.reveal(clear).unwrap();
        session.verify_marks(&[clear]).unwrap();
        session.reveal(expected[0]).unwrap();

        assert_eq!(session.solve(), ServerMessage::MinesRevealed { mines: expected });
    }

    #[test]
    fn test_idle_detection() {
        let mut session = test_session(2, 2, 1, 0);
        assert!(!session.is_idle(Duration::from_secs(1)));

        session.last_activity = Instant::now() - Duration::from_secs(2);
        assert!(session.is_idle(Duration::from_secs(1)));

        session.touch();
        assert!(!session.is_idle(Duration::from_secs(1)));
    }
}
