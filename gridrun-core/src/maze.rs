//! Maze layout parsing

use serde::{Deserialize, Serialize};

use crate::board::{in_bounds, Pos, GRID_SIZE};

/// Classic 20x20 layout.
///
/// `#` wall, `.` pellet, ` ` open floor, `G` adversary pen, `P` player start.
pub const CLASSIC_LAYOUT: [&str; 20] = [
    "####################",
    "#........##........#",
    "#.##.###.##.###.##.#",
    "#..................#",
    "#.##.#.######.#.##.#",
    "#....#...##...#....#",
    "####.###.##.###.####",
    "####.#........#.####",
    "####.#.##GG##.#.####",
    "#......#GGGG#......#",
    "####.#.######.#.####",
    "####.#........#.####",
    "####.#.######.#.####",
    "#........##........#",
    "#.##.###.##.###.##.#",
    "#..#.....P......#..#",
    "##.#.#.######.#.#.##",
    "#....#...##...#....#",
    "#.######.##.######.#",
    "####################",
];

/// Errors raised while parsing a layout
#[derive(Debug, thiserror::Error)]
pub enum MazeError {
    #[error("layout has {0} rows, expected {GRID_SIZE}")]
    RowCount(usize),

    #[error("row {row} has {len} cells, expected {GRID_SIZE}")]
    RowLength { row: usize, len: usize },

    #[error("unknown cell '{ch}' at ({x}, {y})")]
    UnknownCell { ch: char, x: usize, y: usize },

    #[error("layout needs exactly one player start, found {0}")]
    PlayerStart(usize),

    #[error("layout has no adversary pen")]
    NoPen,
}

/// Static content of a single cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Open,
    /// Adversary pen: open to adversaries, closed to the player
    Pen,
}

/// Parsed maze: static walls plus the initial pellet placement
#[derive(Clone, Debug)]
pub struct Maze {
    cells: Vec<Cell>,
    pellets: Vec<bool>,
    player_start: Pos,
    pen: Vec<Pos>,
}

impl Maze {
    /// Parse a layout of `GRID_SIZE` rows of `GRID_SIZE` characters
    pub fn parse(rows: &[&str]) -> Result<Self, MazeError> {
        if rows.len() != GRID_SIZE as usize {
            return Err(MazeError::RowCount(rows.len()));
        }

        let size = GRID_SIZE as usize;
        let mut cells = vec![Cell::Wall; size * size];
        let mut pellets = vec![false; size * size];
        let mut starts = Vec::new();
        let mut pen = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != size {
                return Err(MazeError::RowLength { row: y, len });
            }
            for (x, ch) in row.chars().enumerate() {
                let idx = y * size + x;
                cells[idx] = match ch {
                    '#' => Cell::Wall,
                    '.' => {
                        pellets[idx] = true;
                        Cell::Open
                    }
                    ' ' => Cell::Open,
                    'P' => {
                        starts.push(Pos::new(x as i32, y as i32));
                        Cell::Open
                    }
                    'G' => {
                        pen.push(Pos::new(x as i32, y as i32));
                        Cell::Pen
                    }
                    _ => return Err(MazeError::UnknownCell { ch, x, y }),
                };
            }
        }

        if starts.len() != 1 {
            return Err(MazeError::PlayerStart(starts.len()));
        }
        if pen.is_empty() {
            return Err(MazeError::NoPen);
        }

        Ok(Self {
            cells,
            pellets,
            player_start: starts[0],
            pen,
        })
    }

    /// The built-in layout
    pub fn classic() -> Self {
        Self::parse(&CLASSIC_LAYOUT).expect("classic layout is well-formed")
    }

    /// Cell at `pos`; anything off the grid reads as wall
    pub fn cell(&self, pos: Pos) -> Cell {
        if !in_bounds(pos.x, pos.y) {
            return Cell::Wall;
        }
        self.cells[index(pos)]
    }

    /// Whether the player may stand on `pos`
    pub fn is_open(&self, pos: Pos) -> bool {
        self.cell(pos) == Cell::Open
    }

    /// Whether an adversary may stand on `pos`
    pub fn is_open_for_adversary(&self, pos: Pos) -> bool {
        self.cell(pos) != Cell::Wall
    }

    /// Initial pellet flags, row-major
    pub fn initial_pellets(&self) -> &[bool] {
        &self.pellets
    }

    pub fn pellet_count(&self) -> usize {
        self.pellets.iter().filter(|&&p| p).count()
    }

    pub fn player_start(&self) -> Pos {
        self.player_start
    }

    /// Pen cells, in layout order
    pub fn pen(&self) -> &[Pos] {
        &self.pen
    }
}

impl Default for Maze {
    fn default() -> Self {
        Self::classic()
    }
}

/// Row-major index of an in-bounds position
pub(crate) fn index(pos: Pos) -> usize {
    (pos.y * GRID_SIZE + pos.x) as usize
}
