//! Environment contract and the maze implementation
//!
//! Level 4 - Collaborator interfaces

use gridrun_core::{Direction, GameState, Maze, Pos, GRID_SIZE, PELLET_POINTS};

use crate::error::EvalError;

/// Terminal conditions reported by an environment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerminalFlags {
    pub stopped: bool,
    pub won: bool,
    pub over: bool,
    pub not_started: bool,
}

impl TerminalFlags {
    /// Whether any flag is raised
    pub fn any(&self) -> bool {
        self.stopped || self.won || self.over || self.not_started
    }
}

/// A stepped simulation owned by one trial.
///
/// Grid queries are only made for coordinates inside `bounds()`.
pub trait Environment {
    /// False while the state is not yet initialised
    fn is_ready(&self) -> bool {
        true
    }

    /// Grid width and height
    fn bounds(&self) -> (i32, i32);

    /// Cell currently occupied by the controlled agent
    fn agent_position(&self) -> Pos;

    fn is_traversable(&self, x: i32, y: i32) -> bool;

    fn has_reward(&self, x: i32, y: i32) -> bool;

    fn has_threat(&self, x: i32, y: i32) -> bool;

    /// Store the command applied on the next step
    fn set_pending_action(&mut self, action: Direction);

    /// Advance simulated time by one tick
    fn step(&mut self) -> Result<(), EvalError>;

    /// Current cumulative score
    fn score(&self) -> u32;

    fn terminal_flags(&self) -> TerminalFlags;

    /// Human-readable frame for display mode
    fn render(&self) -> String {
        String::new()
    }

    /// Called once when the trial ends
    fn release(&mut self) {}
}

/// Builds a fresh environment for each trial
pub trait EnvironmentFactory: Sync {
    type Env: Environment;

    fn construct(&self, seed: u64) -> Result<Self::Env, EvalError>;

    /// Upper bound on the score of a single trial
    fn max_trial_score(&self) -> u32;
}

// ============================================================================
// Maze implementation
// ============================================================================

impl Environment for GameState {
    fn bounds(&self) -> (i32, i32) {
        (GRID_SIZE, GRID_SIZE)
    }

    fn agent_position(&self) -> Pos {
        self.player()
    }

    fn is_traversable(&self, x: i32, y: i32) -> bool {
        self.is_open(Pos::new(x, y))
    }

    fn has_reward(&self, x: i32, y: i32) -> bool {
        self.has_pellet(Pos::new(x, y))
    }

    fn has_threat(&self, x: i32, y: i32) -> bool {
        self.has_adversary(Pos::new(x, y))
    }

    fn set_pending_action(&mut self, action: Direction) {
        self.set_desired_direction(action);
    }

    fn step(&mut self) -> Result<(), EvalError> {
        GameState::step(self);
        Ok(())
    }

    fn score(&self) -> u32 {
        GameState::score(self)
    }

    fn terminal_flags(&self) -> TerminalFlags {
        TerminalFlags {
            stopped: self.is_stopped(),
            won: self.is_won(),
            over: self.is_over(),
            not_started: self.is_title_screen(),
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn release(&mut self) {
        self.stop();
    }
}

/// Factory for started maze games
#[derive(Clone, Debug, Default)]
pub struct MazeFactory {
    maze: Maze,
}

impl MazeFactory {
    pub fn new(maze: Maze) -> Self {
        Self { maze }
    }

    /// Factory over the built-in layout
    pub fn classic() -> Self {
        Self::new(Maze::classic())
    }
}

impl EnvironmentFactory for MazeFactory {
    type Env = GameState;

    fn construct(&self, seed: u64) -> Result<GameState, EvalError> {
        let mut game = GameState::with_maze(self.maze.clone(), seed);
        game.start();
        Ok(game)
    }

    fn max_trial_score(&self) -> u32 {
        self.maze.pellet_count() as u32 * PELLET_POINTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_flags_any() {
        assert!(!TerminalFlags::default().any());
        let flags = TerminalFlags {
            won: true,
            ..Default::default()
        };
        assert!(flags.any());
    }

    #[test]
    fn test_factory_builds_started_games() {
        let factory = MazeFactory::classic();
        let env = factory.construct(5).unwrap();
        assert!(!env.terminal_flags().any());
        assert_eq!(env.bounds(), (GRID_SIZE, GRID_SIZE));
        assert_eq!(factory.max_trial_score(), 169 * PELLET_POINTS);
    }

    #[test]
    fn test_maze_queries() {
        let env = MazeFactory::classic().construct(5).unwrap();
        let start = env.agent_position();
        assert!(env.is_traversable(start.x, start.y));
        assert!(!env.is_traversable(0, 0));
        assert!(env.has_reward(start.x - 1, start.y));
        assert!(!env.has_reward(start.x, start.y));
        assert!(env.has_threat(8, 9));
    }

    #[test]
    fn test_release_stops_game() {
        let mut env = MazeFactory::classic().construct(5).unwrap();
        env.release();
        assert!(env.terminal_flags().stopped);
    }
}
