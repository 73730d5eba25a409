//! GRIDRUN Core - Maze chase game engine
//!
//! This crate provides the simulated environment that controllers are
//! evaluated in:
//! - Grid geometry (column/row coordinates, four movement directions)
//! - Maze layouts (walls, pellets, adversary pen)
//! - Game state with seeded adversaries, scoring, lives and terminal flags

pub mod board;
pub mod game;
pub mod maze;

// Re-exports for convenient access
pub use board::{in_bounds, Direction, Pos, DIRECTIONS, GRID_SIZE};
pub use game::{GameState, ADVERSARY_COUNT, PELLET_POINTS, STARTING_LIVES};
pub use maze::{Cell, Maze, MazeError, CLASSIC_LAYOUT};
