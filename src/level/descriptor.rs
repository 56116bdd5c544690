//! Level layout grid and its textual encoding

use super::cell::Cell;

/// Row separator inside an encoded board snapshot
pub const ROW_SEPARATOR: char = '\n';

/// A rectangular grid of cells describing a level's board.
///
/// Rows shorter than the widest row are padded with empty cells, so every
/// descriptor has a single width. The grid is never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LevelDescriptor {
    cells: Vec<Vec<Cell>>,
    width: usize,
}

impl LevelDescriptor {
    /// Build a descriptor from textual rows
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Self {
        let width = rows
            .iter()
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0);

        let cells = rows
            .iter()
            .map(|row| {
                let mut line: Vec<Cell> = row.as_ref().chars().map(Cell::from_code).collect();
                line.resize(width, Cell::Empty);
                line
            })
            .collect();

        Self { cells, width }
    }

    /// Canonical textual rows, as handed to the engine
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|line| line.iter().map(|cell| cell.code()).collect())
            .collect()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at (row, col), `None` outside the grid
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|line| line.get(col)).copied()
    }

    /// Total hits required to clear every breakable cell
    pub fn cardinality(&self) -> u32 {
        self.cells
            .iter()
            .flatten()
            .map(|cell| cell.cardinality_cost())
            .sum()
    }

    /// Serialize this board into an opaque snapshot string
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.height() * (self.width + 1));
        for (i, row) in self.rows().iter().enumerate() {
            if i > 0 {
                out.push(ROW_SEPARATOR);
            }
            out.push_str(row);
        }
        out
    }

    /// Decode a snapshot produced by [`LevelDescriptor::encode`].
    ///
    /// An empty snapshot means "nothing saved" and yields `None`. A board
    /// without any cells encodes to the empty string, so it does not survive
    /// a round trip; every other board does.
    pub fn decode_snapshot(snapshot: &str) -> Option<Self> {
        if snapshot.is_empty() {
            return None;
        }
        let rows: Vec<&str> = snapshot.split(ROW_SEPARATOR).collect();
        Some(Self::from_rows(&rows))
    }
}
