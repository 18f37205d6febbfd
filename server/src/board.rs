//! Minefield generation and adjacency counting
//!
//! A board is generated once per session and never mutated afterwards. Cell
//! values are a pure function of position, which is why the session layer
//! does not need to remember which cells were already revealed.

use crate::error::{GameError, Result};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use shared::Position;

/// Offsets of the Moore neighbourhood around a cell.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Contents of a single board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Mine,
    /// Number of mines among the neighbouring cells, always in `0..=8`
    Clear(u8),
}

impl Cell {
    pub fn is_mine(self) -> bool {
        matches!(self, Cell::Mine)
    }
}

/// A fully generated minefield
///
/// Cells are stored row-major; `(x, y)` addresses row `x`, column `y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
    mines: Vec<Position>,
}

impl Board {
    /// Generates a board with `mines` distinct mine cells chosen uniformly at random
    ///
    /// Mine cells are picked with a partial Fisher-Yates shuffle over the
    /// flattened index space, so the cost stays linear in the board size even
    /// when almost every cell is a mine. Identical seeds produce identical
    /// boards.
    pub fn generate<R: Rng + ?Sized>(
        rows: usize,
        columns: usize,
        mines: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let invalid = |reason| GameError::InvalidConfiguration {
            rows,
            columns,
            mines,
            reason,
        };

        if rows == 0 || columns == 0 {
            return Err(invalid("rows and columns must be at least 1"));
        }
        let total = rows
            .checked_mul(columns)
            .ok_or_else(|| invalid("board is too large"))?;
        if mines >= total {
            return Err(invalid("mine count must be lower than the number of cells"));
        }

        let mut indices: Vec<usize> = (0..total).collect();
        let (chosen, _) = indices.partial_shuffle(rng, mines);
        // Sorted so mine positions come out in row-major order
        chosen.sort_unstable();

        let mut cells = vec![Cell::Clear(0); total];
        let mut mine_positions = Vec::with_capacity(mines);
        for &index in chosen.iter() {
            cells[index] = Cell::Mine;
            mine_positions.push((index / columns, index % columns));
        }

        let mut board = Board {
            rows,
            columns,
            cells,
            mines: mine_positions,
        };
        board.compute_adjacency();

        debug!(
            "Generated {}x{} board with {} mines",
            rows, columns, mines
        );
        Ok(board)
    }

    /// Fills every non-mine cell with its neighbouring mine count
    fn compute_adjacency(&mut self) {
        for x in 0..self.rows {
            for y in 0..self.columns {
                let index = self.index((x, y));
                if self.cells[index].is_mine() {
                    continue;
                }
                let count = self
                    .neighbors((x, y))
                    .filter(|&pos| self.cells[self.index(pos)].is_mine())
                    .count();
                self.cells[index] = Cell::Clear(count as u8);
            }
        }
    }

    fn index(&self, (x, y): Position) -> usize {
        x * self.columns + y
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }

    /// Mine coordinates in row-major order
    pub fn mine_positions(&self) -> &[Position] {
        &self.mines
    }

    pub fn contains(&self, (x, y): Position) -> bool {
        x < self.rows && y < self.columns
    }

    /// Returns the cell at `pos`, or `InvalidCoordinate` when it lies off the board
    pub fn cell(&self, pos: Position) -> Result<Cell> {
        self.check_bounds(pos)?;
        Ok(self.cells[self.index(pos)])
    }

    pub fn is_mine(&self, pos: Position) -> Result<bool> {
        self.cell(pos).map(Cell::is_mine)
    }

    pub fn check_bounds(&self, pos: Position) -> Result<()> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(GameError::InvalidCoordinate {
                position: pos,
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    /// Iterates over the in-bounds Moore neighbours of `pos`, without wraparound
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        let (x, y) = pos;
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            self.contains((nx, ny)).then_some((nx, ny))
        })
    }
}
