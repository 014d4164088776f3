/// Session: the complete state of one game.
///
/// Owned by the host and advanced one tick at a time by `step::step`.
/// There is no global state anywhere: everything a tick needs hangs
/// off this struct, including the RNG, so seeded sessions replay
/// deterministically.
///
/// ## Hazard grid
///
/// Live blast tiles are mirrored into a boolean grid
/// (`blast_grid[row][col]`) for O(1) danger queries by AI and
/// collision code. Rebuilt via `rebuild_blast_grid()` whenever blast
/// tiles are added or expire.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{SessionConfig, Tuning};
use crate::domain::bomb::{self, BlastTile, Bomb};
use crate::domain::entity::{Enemy, Player, Powerup};
use crate::domain::grid::Grid;
use crate::sim::arena::{self, SetupError};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    InProgress,
    Defeat,
    Victory,
}

pub struct Session {
    // ── Terrain ──
    pub grid: Grid,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bombs: Vec<Bomb>,
    pub blast_tiles: Vec<BlastTile>,
    pub powerups: Vec<Powerup>,

    // ── Derived: O(1) hazard lookup ──
    pub blast_grid: Vec<Vec<bool>>,

    // ── Meta ──
    pub outcome: Outcome,
    pub score: u32,
    pub tick: u64,

    // ── HUD message line ──
    pub message: String,
    pub message_timer: u32,

    // ── Knobs ──
    pub tuning: Tuning,
    config: SessionConfig,
    pub rng: ChaCha8Rng,
}

impl Session {
    /// Build a fresh session. Fails fast on malformed configuration
    /// rather than risking unbounded placement loops later.
    pub fn start(config: SessionConfig, tuning: Tuning) -> Result<Self, SetupError> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let layout = arena::generate(&config, &mut rng)?;

        let (px, py) = layout.player_spawn;
        let player = Player::new(
            px,
            py,
            config.start_lives,
            config.start_bombs,
            config.start_radius,
            config.start_speed,
        );

        let width = layout.grid.width();
        let height = layout.grid.height();

        Ok(Session {
            grid: layout.grid,
            player,
            enemies: layout.enemies,
            bombs: vec![],
            blast_tiles: vec![],
            powerups: vec![],
            blast_grid: vec![vec![false; width]; height],
            outcome: Outcome::InProgress,
            score: 0,
            tick: 0,
            message: String::new(),
            message_timer: 0,
            tuning,
            config,
            rng,
        })
    }

    /// Throw away all transient state and regenerate the arena.
    /// The RNG stream continues, so a seeded session's successive
    /// restarts are reproducible as a sequence.
    pub fn restart(&mut self) -> Result<(), SetupError> {
        let layout = arena::generate(&self.config, &mut self.rng)?;

        let (px, py) = layout.player_spawn;
        self.player = Player::new(
            px,
            py,
            self.config.start_lives,
            self.config.start_bombs,
            self.config.start_radius,
            self.config.start_speed,
        );

        self.blast_grid = vec![vec![false; layout.grid.width()]; layout.grid.height()];
        self.grid = layout.grid;
        self.enemies = layout.enemies;
        self.bombs.clear();
        self.blast_tiles.clear();
        self.powerups.clear();
        self.outcome = Outcome::InProgress;
        self.score = 0;
        self.tick = 0;
        self.message.clear();
        self.message_timer = 0;
        Ok(())
    }

    // ── Queries ──

    /// Is there a bomb (armed or still lingering) at this cell?
    /// Bomb cells block movement for every entity.
    #[inline]
    pub fn bomb_at(&self, col: usize, row: usize) -> bool {
        self.bombs.iter().any(|b| b.col == col && b.row == row)
    }

    /// Is this cell covered by a live blast tile?
    #[inline]
    pub fn hazard_at(&self, col: usize, row: usize) -> bool {
        self.blast_grid
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    // ── Maintenance ──

    /// Rebuild the hazard grid from current blast tiles.
    /// Call after any blast tile is added or removed.
    #[inline]
    pub fn rebuild_blast_grid(&mut self) {
        self.blast_grid =
            bomb::build_blast_grid(&self.blast_tiles, self.grid.width(), self.grid.height());
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}
