/// Procedural arena setup.
///
/// Layout: Wall border, checkerboard pillar walls on even inner
/// coordinates, random crates at the configured density, a cleared
/// three-cell start zone in the top-left corner, and enemies scattered
/// on floor cells away from the start.
///
/// Placement retries are bounded; a grid too dense or too small to
/// take the requested enemies fails fast instead of looping forever.

use rand::Rng;
use thiserror::Error;

use crate::config::SessionConfig;
use crate::domain::entity::{Enemy, EnemyKind};
use crate::domain::grid::Grid;
use crate::domain::tile::Tile;

/// Smallest arena that fits the border, the start zone and pillars.
pub const MIN_SIZE: usize = 9;

const ATTEMPTS_PER_ENEMY: usize = 40;

/// Player spawn cell; the adjacent east and south cells are kept clear
/// so the first bomb has an escape route.
pub const PLAYER_SPAWN: (usize, usize) = (1, 1);

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("arena {width}x{height} is too small; minimum is {MIN_SIZE}x{MIN_SIZE}")]
    ArenaTooSmall { width: usize, height: usize },
    #[error("crate density {0} must be within 0.0..=1.0")]
    InvalidDensity(f64),
    #[error(
        "placed only {placed} of {requested} enemies after {attempts} attempts; \
         lower the crate density or enemy count"
    )]
    EnemyPlacementExhausted { placed: usize, requested: usize, attempts: usize },
}

pub struct ArenaLayout {
    pub grid: Grid,
    pub player_spawn: (usize, usize),
    pub enemies: Vec<Enemy>,
}

pub fn generate(cfg: &SessionConfig, rng: &mut impl Rng) -> Result<ArenaLayout, SetupError> {
    let (width, height) = (cfg.grid_width, cfg.grid_height);
    if width < MIN_SIZE || height < MIN_SIZE {
        return Err(SetupError::ArenaTooSmall { width, height });
    }
    if !(0.0..=1.0).contains(&cfg.crate_density) {
        return Err(SetupError::InvalidDensity(cfg.crate_density));
    }

    let mut tiles = vec![vec![Tile::Floor; width]; height];

    // Outer walls
    for col in 0..width {
        tiles[0][col] = Tile::Wall;
        tiles[height - 1][col] = Tile::Wall;
    }
    for row in 1..height - 1 {
        tiles[row][0] = Tile::Wall;
        tiles[row][width - 1] = Tile::Wall;
    }

    // Inner pillars (checkerboard pattern)
    for row in (2..height - 2).step_by(2) {
        for col in (2..width - 2).step_by(2) {
            tiles[row][col] = Tile::Wall;
        }
    }

    // Random crates on remaining floor
    for row in 1..height - 1 {
        for col in 1..width - 1 {
            if tiles[row][col] == Tile::Floor && rng.gen_bool(cfg.crate_density) {
                tiles[row][col] = Tile::Crate;
            }
        }
    }

    // Start zone stays clear so the player is never boxed in
    let (px, py) = PLAYER_SPAWN;
    tiles[py][px] = Tile::Floor;
    tiles[py][px + 1] = Tile::Floor;
    tiles[py + 1][px] = Tile::Floor;

    let enemies = place_enemies(cfg, &tiles, rng)?;

    Ok(ArenaLayout {
        grid: Grid::from_rows(tiles),
        player_spawn: PLAYER_SPAWN,
        enemies,
    })
}

/// Scatter the configured enemy mix on floor cells outside the start
/// corner. Attempts are bounded per enemy.
fn place_enemies(
    cfg: &SessionConfig,
    tiles: &[Vec<Tile>],
    rng: &mut impl Rng,
) -> Result<Vec<Enemy>, SetupError> {
    let width = tiles[0].len();
    let height = tiles.len();

    let mut roster = Vec::new();
    roster.extend(std::iter::repeat(EnemyKind::Wanderer).take(cfg.wanderers));
    roster.extend(std::iter::repeat(EnemyKind::Hunter).take(cfg.hunters));
    roster.extend(std::iter::repeat(EnemyKind::Sentry).take(cfg.sentries));

    let requested = roster.len();
    let mut enemies: Vec<Enemy> = Vec::with_capacity(requested);
    let mut attempts = 0;

    for kind in roster {
        let mut placed = false;
        for _ in 0..ATTEMPTS_PER_ENEMY {
            attempts += 1;
            let col = rng.gen_range(1..width - 1);
            let row = rng.gen_range(1..height - 1);

            let near_start = col <= 3 && row <= 3;
            let occupied = enemies.iter().any(|e| e.col == col && e.row == row);
            if tiles[row][col] == Tile::Floor && !near_start && !occupied {
                enemies.push(Enemy::new(kind, col, row));
                placed = true;
                break;
            }
        }
        if !placed {
            return Err(SetupError::EnemyPlacementExhausted {
                placed: enemies.len(),
                requested,
                attempts,
            });
        }
    }

    Ok(enemies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn cfg() -> SessionConfig {
        SessionConfig { seed: Some(1), ..SessionConfig::default() }
    }

    #[test]
    fn generated_arena_has_wall_border_and_clear_start() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let layout = generate(&cfg(), &mut rng).unwrap();
        let g = &layout.grid;

        for col in 0..g.width() {
            assert_eq!(g.tile_at(col, 0), Tile::Wall);
            assert_eq!(g.tile_at(col, g.height() - 1), Tile::Wall);
        }
        for row in 0..g.height() {
            assert_eq!(g.tile_at(0, row), Tile::Wall);
            assert_eq!(g.tile_at(g.width() - 1, row), Tile::Wall);
        }

        let (px, py) = layout.player_spawn;
        assert_eq!(g.tile_at(px, py), Tile::Floor);
        assert_eq!(g.tile_at(px + 1, py), Tile::Floor);
        assert_eq!(g.tile_at(px, py + 1), Tile::Floor);
    }

    #[test]
    fn enemies_spawn_on_floor_away_from_start() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let layout = generate(&cfg(), &mut rng).unwrap();
        assert_eq!(layout.enemies.len(), 5);
        for e in &layout.enemies {
            assert_eq!(layout.grid.tile_at(e.col, e.row), Tile::Floor);
            assert!(e.col > 3 || e.row > 3);
        }
    }

    #[test]
    fn same_seed_same_arena() {
        let mut a = ChaCha8Rng::seed_from_u64(9);
        let mut b = ChaCha8Rng::seed_from_u64(9);
        let la = generate(&cfg(), &mut a).unwrap();
        let lb = generate(&cfg(), &mut b).unwrap();
        assert_eq!(la.grid.rows(), lb.grid.rows());
        assert_eq!(la.enemies.len(), lb.enemies.len());
    }

    #[test]
    fn tiny_arena_fails_fast() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let bad = SessionConfig { grid_width: 5, grid_height: 5, ..cfg() };
        assert!(matches!(
            generate(&bad, &mut rng),
            Err(SetupError::ArenaTooSmall { .. })
        ));
    }

    #[test]
    fn out_of_range_density_fails_fast() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let bad = SessionConfig { crate_density: 1.5, ..cfg() };
        assert!(matches!(
            generate(&bad, &mut rng),
            Err(SetupError::InvalidDensity(_))
        ));
    }

    #[test]
    fn saturated_arena_exhausts_placement_instead_of_looping() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // Density 1.0 turns every eligible cell into a crate, so no
        // enemy can ever be placed.
        let bad = SessionConfig { crate_density: 1.0, ..cfg() };
        assert!(matches!(
            generate(&bad, &mut rng),
            Err(SetupError::EnemyPlacementExhausted { .. })
        ));
    }
}
