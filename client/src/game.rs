use log::{debug, info, warn};
use shared::{Position, ServerMessage, SessionId};
use std::collections::{HashMap, HashSet};

/// How a game ended from the client's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Lost,
    Won,
}

/// Client-side view of one game
///
/// The server is the authority on mines and numbers; this view only holds
/// what the server has told us so far, plus the marks, which never leave the
/// client except when submitted for verification.
#[derive(Debug, Clone, Default)]
pub struct ClientGameState {
    session_id: Option<SessionId>,
    rows: usize,
    columns: usize,
    total_mines: usize,
    revealed: HashMap<Position, u8>,
    marks: HashSet<Position>,
    known_mines: Vec<Position>,
    outcome: Option<Outcome>,
    last_notice: Option<String>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything about the current game
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    pub fn total_mines(&self) -> usize {
        self.total_mines
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Text of the last game over, win or incorrect-marks notice
    pub fn last_notice(&self) -> Option<&str> {
        self.last_notice.as_deref()
    }

    pub fn revealed_value(&self, pos: Position) -> Option<u8> {
        self.revealed.get(&pos).copied()
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    /// Mine positions from the last solve, empty until one was requested
    pub fn known_mines(&self) -> &[Position] {
        &self.known_mines
    }

    fn contains(&self, (x, y): Position) -> bool {
        x < self.rows && y < self.columns
    }

    pub fn is_marked(&self, pos: Position) -> bool {
        self.marks.contains(&pos)
    }

    /// Flips the mark on a cell and returns whether it is now marked
    ///
    /// Revealed cells, cells off the board and finished games are left alone.
    pub fn toggle_mark(&mut self, pos: Position) -> bool {
        if self.is_finished() || !self.contains(pos) || self.revealed.contains_key(&pos) {
            return self.is_marked(pos);
        }
        if !self.marks.remove(&pos) {
            self.marks.insert(pos);
        }
        self.is_marked(pos)
    }

    /// Marks sorted in row-major order, ready to submit
    pub fn marks(&self) -> Vec<Position> {
        let mut marks: Vec<Position> = self.marks.iter().copied().collect();
        marks.sort_unstable();
        marks
    }

    /// Mines left to find according to the marks; negative when over-marked
    pub fn remaining_mines(&self) -> isize {
        self.total_mines as isize - self.marks.len() as isize
    }

    /// Whether asking the server to reveal `pos` makes sense
    pub fn can_reveal(&self, pos: Position) -> bool {
        self.session_id.is_some()
            && !self.is_finished()
            && self.contains(pos)
            && !self.is_marked(pos)
            && !self.revealed.contains_key(&pos)
    }

    /// Folds a server message into the view
    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::GameCreated {
                session_id,
                rows,
                columns,
                total_mines,
            } => {
                self.reset();
                self.session_id = Some(*session_id);
                self.rows = *rows;
                self.columns = *columns;
                self.total_mines = *total_mines;
                info!(
                    "Joined session {} ({}x{}, {} mines)",
                    session_id, rows, columns, total_mines
                );
            }
            ServerMessage::CellRevealed { x, y, value } => {
                self.revealed.insert((*x, *y), *value);
            }
            ServerMessage::GameOver { message } => {
                self.outcome = Some(Outcome::Lost);
                self.last_notice = Some(message.clone());
            }
            ServerMessage::MinesRevealed { mines } => {
                self.known_mines = mines.clone();
            }
            ServerMessage::GameWon { message } => {
                if self.outcome.is_none() {
                    self.outcome = Some(Outcome::Won);
                }
                self.last_notice = Some(message.clone());
            }
            ServerMessage::MarksIncorrect { message } => {
                debug!("Marks rejected: {}", message);
                self.last_notice = Some(message.clone());
            }
            ServerMessage::Error { code, message } => {
                warn!("Server rejected request ({}): {}", code, message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created_game(rows: usize, columns: usize, mines: usize) -> ClientGameState {
        let mut game = ClientGameState::new();
        game.apply(&ServerMessage::GameCreated {
            session_id: SessionId(5),
            rows,
            columns,
            total_mines: mines,
        });
        game
    }

    #[test]
    fn test_game_created() {
        let game = created_game(3, 4, 2);
        assert_eq!(game.session_id(), Some(SessionId(5)));
        assert_eq!(game.dimensions(), (3, 4));
        assert_eq!(game.total_mines(), 2);
        assert_eq!(game.remaining_mines(), 2);
        assert!(!game.is_finished());
    }

    #[test]
    fn test_toggle_mark_and_counter() {
        let mut game = created_game(3, 3, 1);

        assert!(game.toggle_mark((0, 0)));
        assert!(game.toggle_mark((1, 1)));
        assert_eq!(game.remaining_mines(), -1);
        assert_eq!(game.marks(), vec![(0, 0), (1, 1)]);

        assert!(!game.toggle_mark((0, 0)));
        assert_eq!(game.remaining_mines(), 0);
        assert_eq!(game.marks(), vec![(1, 1)]);
    }

    #[test]
    fn test_revealed_cells_cannot_be_marked() {
        let mut game = created_game(3, 3, 1);
        game.apply(&ServerMessage::CellRevealed { x: 2, y: 1, value: 1 });

        assert!(!game.toggle_mark((2, 1)));
        assert!(!game.toggle_mark((5, 5)));
        assert_eq!(game.revealed_value((2, 1)), Some(1));
        assert!(!game.can_reveal((2, 1)));
    }

    #[test]
    fn test_marked_cells_are_not_revealed() {
        let mut game = created_game(3, 3, 1);
        assert!(game.can_reveal((0, 2)));
        game.toggle_mark((0, 2));
        assert!(!game.can_reveal((0, 2)));
        assert!(!game.can_reveal((3, 0)));
    }

    #[test]
    fn test_game_over_ends_game() {
        let mut game = created_game(3, 3, 1);
        game.apply(&ServerMessage::GameOver {
            message: "boom".to_string(),
        });
        assert_eq!(game.outcome(), Some(Outcome::Lost));
        assert_eq!(game.last_notice(), Some("boom"));
        assert!(!game.can_reveal((0, 0)));

        // A later correct verification does not overturn the loss
        game.apply(&ServerMessage::GameWon {
            message: "yay".to_string(),
        });
        assert_eq!(game.outcome(), Some(Outcome::Lost));
    }

    #[test]
    fn test_incorrect_marks_keep_playing() {
        let mut game = created_game(3, 3, 1);
        game.apply(&ServerMessage::MarksIncorrect {
            message: "nope".to_string(),
        });
        assert!(!game.is_finished());
        assert_eq!(game.last_notice(), Some("nope"));
    }

    #[test]
    fn test_new_game_resets_state() {
        let mut game = created_game(3, 3, 1);
        game.toggle_mark((0, 0));
        game.apply(&ServerMessage::CellRevealed { x: 1, y: 1, value: 1 });
        game.apply(&ServerMessage::MinesRevealed {
            mines: vec![(0, 0)],
        });
        assert_eq!(game.known_mines().to_vec(), vec![(0, 0)]);

        game.apply(&ServerMessage::GameCreated {
            session_id: SessionId(6),
            rows: 5,
            columns: 5,
            total_mines: 4,
        });
        assert_eq!(game.session_id(), Some(SessionId(6)));
        assert!(game.marks().is_empty());
        assert_eq!(game.revealed_count(), 0);
        assert!(game.known_mines().is_empty());
    }
}
