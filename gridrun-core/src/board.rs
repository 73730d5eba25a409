//! Grid geometry with column/row coordinates

use serde::{Deserialize, Serialize};

/// Width and height of the square maze
pub const GRID_SIZE: i32 = 20;

/// Grid coordinates: `x` is the column, `y` is the row (0 at the top)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Check if this position is on the grid
    pub fn is_valid(&self) -> bool {
        in_bounds(self.x, self.y)
    }

    /// Neighbouring position one cell away in `dir`
    pub fn step(&self, dir: Direction) -> Pos {
        let (dx, dy) = dir.delta();
        Pos::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance between two positions
    pub fn distance_to(&self, other: Pos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Check raw coordinates against the grid bounds
pub fn in_bounds(x: i32, y: i32) -> bool {
    (0..GRID_SIZE).contains(&x) && (0..GRID_SIZE).contains(&y)
}

/// Movement command for the player
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

/// All directions in a fixed order
pub const DIRECTIONS: [Direction; 4] = [
    Direction::Left,
    Direction::Up,
    Direction::Right,
    Direction::Down,
];

impl Direction {
    /// Offset vector (dx, dy)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
        }
    }

    /// Single-letter code used in logs and configs (`L`, `U`, `R`, `D`)
    pub fn code(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Up => 'U',
            Direction::Right => 'R',
            Direction::Down => 'D',
        }
    }

    pub fn from_code(code: char) -> Option<Direction> {
        match code.to_ascii_uppercase() {
            'L' => Some(Direction::Left),
            'U' => Some(Direction::Up),
            'R' => Some(Direction::Right),
            'D' => Some(Direction::Down),
            _ => None,
        }
    }
}
