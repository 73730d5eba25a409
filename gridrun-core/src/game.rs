//! Game state and tick resolution

use std::fmt;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::board::{Direction, Pos, DIRECTIONS, GRID_SIZE};
use crate::maze::{index, Cell, Maze};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Points awarded per pellet eaten
pub const PELLET_POINTS: u32 = 50;

/// Lives at the start of a game
pub const STARTING_LIVES: u8 = 3;

/// Number of adversaries roaming the maze
pub const ADVERSARY_COUNT: usize = 4;

/// Adversaries move once every this many ticks
const ADVERSARY_MOVE_PERIOD: u32 = 2;

// ============================================================================
// CORE TYPES
// ============================================================================

/// A roaming adversary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adversary {
    pub pos: Pos,
    heading: Option<Direction>,
    start: Pos,
}

impl Adversary {
    fn new(start: Pos) -> Self {
        Self {
            pos: start,
            heading: None,
            start,
        }
    }

    fn reset(&mut self) {
        self.pos = self.start;
        self.heading = None;
    }
}

/// Complete state of one game
#[derive(Clone, Debug)]
pub struct GameState {
    maze: Maze,
    pellets: Vec<bool>,
    pellets_left: usize,
    player: Pos,
    heading: Option<Direction>,
    desired: Option<Direction>,
    adversaries: Vec<Adversary>,
    score: u32,
    lives: u8,
    tick: u32,
    title_screen: bool,
    stopped: bool,
    won: bool,
    over: bool,
    rng: ChaCha8Rng,
}

impl GameState {
    /// New game on the classic maze, sitting on the title screen
    pub fn new(seed: u64) -> Self {
        Self::with_maze(Maze::classic(), seed)
    }

    /// New game on a custom maze, sitting on the title screen
    pub fn with_maze(maze: Maze, seed: u64) -> Self {
        let adversaries = maze
            .pen()
            .iter()
            .rev()
            .cycle()
            .take(ADVERSARY_COUNT)
            .map(|&p| Adversary::new(p))
            .collect();

        Self {
            pellets: maze.initial_pellets().to_vec(),
            pellets_left: maze.pellet_count(),
            player: maze.player_start(),
            heading: None,
            desired: None,
            adversaries,
            score: 0,
            lives: STARTING_LIVES,
            tick: 0,
            title_screen: true,
            stopped: false,
            won: false,
            over: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            maze,
        }
    }

    /// Leave the title screen and begin play
    pub fn start(&mut self) {
        self.title_screen = false;
    }

    /// Halt the game; further steps are ignored
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn adversaries(&self) -> impl Iterator<Item = Pos> + '_ {
        self.adversaries.iter().map(|a| a.pos)
    }

    pub fn has_adversary(&self, pos: Pos) -> bool {
        self.adversaries.iter().any(|a| a.pos == pos)
    }

    pub fn has_pellet(&self, pos: Pos) -> bool {
        pos.is_valid() && self.pellets[index(pos)]
    }

    /// Whether the player could stand on `pos`
    pub fn is_open(&self, pos: Pos) -> bool {
        self.maze.is_open(pos)
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Highest score reachable on this maze
    pub fn max_score(&self) -> u32 {
        self.maze.pellet_count() as u32 * PELLET_POINTS
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn pellets_left(&self) -> usize {
        self.pellets_left
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn desired_direction(&self) -> Option<Direction> {
        self.desired
    }

    pub fn set_desired_direction(&mut self, dir: Direction) {
        self.desired = Some(dir);
    }

    pub fn is_title_screen(&self) -> bool {
        self.title_screen
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    /// Whether the game has ended for any reason
    pub fn is_finished(&self) -> bool {
        self.stopped || self.won || self.over
    }

    // ------------------------------------------------------------------------
    // Tick resolution
    // ------------------------------------------------------------------------

    /// Advance the game by one tick
    pub fn step(&mut self) {
        if self.title_screen || self.is_finished() {
            return;
        }
        self.tick += 1;

        let prev_player = self.player;
        self.move_player();
        self.eat_pellet();
        if self.pellets_left == 0 {
            self.won = true;
            return;
        }

        let prev_adversaries: Vec<Pos> = self.adversaries().collect();
        if self.tick % ADVERSARY_MOVE_PERIOD == 0 {
            self.move_adversaries();
        }

        if self.caught(prev_player, &prev_adversaries) {
            self.lose_life();
        }
    }

    fn move_player(&mut self) {
        if let Some(dir) = self.desired {
            if self.maze.is_open(self.player.step(dir)) {
                self.heading = Some(dir);
            }
        }
        if let Some(dir) = self.heading {
            let next = self.player.step(dir);
            if self.maze.is_open(next) {
                self.player = next;
            }
        }
    }

    fn eat_pellet(&mut self) {
        let idx = index(self.player);
        if self.pellets[idx] {
            self.pellets[idx] = false;
            self.pellets_left -= 1;
            self.score += PELLET_POINTS;
        }
    }

    fn move_adversaries(&mut self) {
        for i in 0..self.adversaries.len() {
            let adversary = self.adversaries[i];
            let open: Vec<Direction> = DIRECTIONS
                .iter()
                .copied()
                .filter(|&d| self.maze.is_open_for_adversary(adversary.pos.step(d)))
                .collect();
            let forward: Vec<Direction> = open
                .iter()
                .copied()
                .filter(|&d| Some(d.opposite()) != adversary.heading)
                .collect();

            let choices = if forward.is_empty() { &open } else { &forward };
            if choices.is_empty() {
                continue;
            }
            let dir = choices[self.rng.gen_range(0..choices.len())];
            let a = &mut self.adversaries[i];
            a.pos = a.pos.step(dir);
            a.heading = Some(dir);
        }
    }

    /// Contact on the same cell, or player and adversary swapping cells
    fn caught(&self, prev_player: Pos, prev_adversaries: &[Pos]) -> bool {
        self.adversaries.iter().zip(prev_adversaries).any(|(a, &prev)| {
            a.pos == self.player || (a.pos == prev_player && prev == self.player)
        })
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.over = true;
            return;
        }
        self.player = self.maze.player_start();
        self.heading = None;
        for a in &mut self.adversaries {
            a.reset();
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..GRID_SIZE {
            let row: String = (0..GRID_SIZE)
                .map(|x| {
                    let pos = Pos::new(x, y);
                    if pos == self.player {
                        '@'
                    } else if self.has_adversary(pos) {
                        'A'
                    } else if self.has_pellet(pos) {
                        '.'
                    } else {
                        match self.maze.cell(pos) {
                            Cell::Wall => '#',
                            Cell::Pen => '-',
                            Cell::Open => ' ',
                        }
                    }
                })
                .collect();
            writeln!(f, "{}", row)?;
        }
        write!(
            f,
            "score {}  lives {}  tick {}  pellets {}",
            self.score, self.lives, self.tick, self.pellets_left
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_game(seed: u64) -> GameState {
        let mut game = GameState::new(seed);
        game.start();
        game
    }

    #[test]
    fn test_game_creation() {
        let game = GameState::new(1);
        assert!(game.is_title_screen());
        assert!(!game.is_finished());
        assert_eq!(game.score(), 0);
        assert_eq!(game.lives(), STARTING_LIVES);
        assert_eq!(game.adversaries().count(), ADVERSARY_COUNT);
        assert_eq!(game.max_score(), 169 * PELLET_POINTS);
    }

    #[test]
    fn test_title_screen_ignores_steps() {
        let mut game = GameState::new(1);
        game.step();
        assert_eq!(game.tick(), 0);
        assert_eq!(game.player(), game.maze().player_start());
    }

    #[test]
    fn test_player_eats_pellet() {
        let mut game = started_game(1);
        let start = game.player();
        game.set_desired_direction(Direction::Left);
        game.step();
        assert_eq!(game.player(), start.step(Direction::Left));
        assert_eq!(game.score(), PELLET_POINTS);
        assert_eq!(game.pellets_left(), 168);
        assert!(!game.has_pellet(game.player()));
    }

    #[test]
    fn test_blocked_desire_keeps_heading() {
        let mut game = started_game(1);
        let start = game.player();
        game.set_desired_direction(Direction::Right);
        game.step();
        // Wall above the start cell: keep moving right
        game.set_desired_direction(Direction::Up);
        game.step();
        assert_eq!(game.player(), Pos::new(start.x + 2, start.y));
    }

    #[test]
    fn test_wall_blocks_player() {
        let mut game = started_game(1);
        let start = game.player();
        game.set_desired_direction(Direction::Up);
        game.step();
        assert_eq!(game.player(), start);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_stop_sets_flag_and_freezes() {
        let mut game = started_game(1);
        game.stop();
        assert!(game.is_stopped());
        game.step();
        assert_eq!(game.tick(), 0);
    }

    #[test]
    fn test_adversaries_stay_on_open_cells() {
        let mut game = started_game(7);
        for _ in 0..200 {
            game.step();
            for pos in game.adversaries() {
                assert!(game.maze().is_open_for_adversary(pos));
            }
            if game.is_finished() {
                break;
            }
        }
    }

    #[test]
    fn test_same_seed_same_game() {
        let mut a = started_game(99);
        let mut b = started_game(99);
        for _ in 0..150 {
            a.step();
            b.step();
        }
        assert_eq!(
            a.adversaries().collect::<Vec<_>>(),
            b.adversaries().collect::<Vec<_>>()
        );
        assert_eq!(a.lives(), b.lives());
    }

    #[test]
    fn test_render_dimensions() {
        let game = GameState::new(3);
        let text = game.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), GRID_SIZE as usize + 1);
        assert!(lines[..GRID_SIZE as usize]
            .iter()
            .all(|l| l.chars().count() == GRID_SIZE as usize));
        assert_eq!(lines[15].chars().nth(9), Some('@'));
        assert!(lines[20].starts_with("score 0"));
    }
}
