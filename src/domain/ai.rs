/// Enemy decision policies.
///
/// Pure functions over a borrowed view of the arena with no side effects;
/// the step function applies the chosen direction. A policy runs only
/// when its enemy is settled and its decision interval has elapsed.
///
/// Hazard override comes first: an enemy standing inside a live blast
/// abandons its type policy and dives for any adjacent open safe cell
/// (or idles, trapped). The hazard set is the live blast tiles; an
/// armed bomb blocks movement but is not yet dangerous terrain.

use rand::Rng;

use super::bomb::Bomb;
use super::entity::{Direction, Enemy, EnemyKind, DIRECTIONS};
use super::grid::Grid;

/// Read-only context for one decision.
pub struct AiView<'a> {
    pub grid: &'a Grid,
    pub blast_grid: &'a [Vec<bool>],
    pub bombs: &'a [Bomb],
    pub player: (usize, usize),
}

impl<'a> AiView<'a> {
    fn bomb_at(&self, col: usize, row: usize) -> bool {
        self.bombs.iter().any(|b| b.col == col && b.row == row)
    }

    /// Is this cell free of live blast tiles?
    pub fn safe(&self, col: usize, row: usize) -> bool {
        self.blast_grid
            .get(row)
            .and_then(|r| r.get(col))
            .map_or(true, |hazard| !hazard)
    }

    /// Can an enemy commit a move into this cell? Floor, no bomb,
    /// and not currently ablaze.
    fn open(&self, col: usize, row: usize) -> bool {
        self.grid.is_walkable(col, row) && !self.bomb_at(col, row) && self.safe(col, row)
    }

    /// The neighbor in `dir` if an enemy may move there.
    fn try_dir(&self, col: usize, row: usize, dir: Direction) -> Option<Direction> {
        let (ncol, nrow) = dir.step_from(col, row)?;
        if self.open(ncol, nrow) {
            Some(dir)
        } else {
            None
        }
    }
}

/// Pick the next move for a settled enemy, or None to idle.
pub fn decide(enemy: &Enemy, view: &AiView, rng: &mut impl Rng) -> Option<Direction> {
    if !view.safe(enemy.col, enemy.row) {
        return escape(enemy.col, enemy.row, view, rng);
    }
    match enemy.kind {
        EnemyKind::Wanderer => random_step(enemy.col, enemy.row, view, rng),
        EnemyKind::Hunter => chase_step(enemy.col, enemy.row, view, rng),
        EnemyKind::Sentry => patrol_step(enemy.col, enemy.row, enemy.facing, view, rng),
    }
}

// ── Policies ──

/// Standing in a blast: any adjacent open cell will do, all of them
/// are safe by the open() definition. No way out → idle and burn.
fn escape(col: usize, row: usize, view: &AiView, rng: &mut impl Rng) -> Option<Direction> {
    random_step(col, row, view, rng)
}

fn random_step(col: usize, row: usize, view: &AiView, rng: &mut impl Rng) -> Option<Direction> {
    let candidates: Vec<Direction> = DIRECTIONS
        .iter()
        .filter_map(|&d| view.try_dir(col, row, d))
        .collect();
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.gen_range(0..candidates.len())])
    }
}

/// Move along the axis with the larger distance to the player, then
/// the other axis, then that axis reversed, then give up into a
/// random step.
fn chase_step(col: usize, row: usize, view: &AiView, rng: &mut impl Rng) -> Option<Direction> {
    let (pcol, prow) = view.player;
    let dx = pcol as i32 - col as i32;
    let dy = prow as i32 - row as i32;

    let horizontal = if dx > 0 { Direction::Right } else { Direction::Left };
    let vertical = if dy > 0 { Direction::Down } else { Direction::Up };

    let (primary, secondary) = if dx.abs() > dy.abs() {
        (horizontal, vertical)
    } else {
        (vertical, horizontal)
    };

    view.try_dir(col, row, primary)
        .or_else(|| view.try_dir(col, row, secondary))
        .or_else(|| view.try_dir(col, row, secondary.opposite()))
        .or_else(|| random_step(col, row, view, rng))
}

/// Keep walking the current facing; when blocked, turn to a random
/// perpendicular, then the other one, then reverse.
fn patrol_step(
    col: usize,
    row: usize,
    facing: Direction,
    view: &AiView,
    rng: &mut impl Rng,
) -> Option<Direction> {
    if let Some(d) = view.try_dir(col, row, facing) {
        return Some(d);
    }
    let turns = facing.perpendicular();
    let first = turns[rng.gen_range(0..2)];
    let second = if first == turns[0] { turns[1] } else { turns[0] };
    view.try_dir(col, row, first)
        .or_else(|| view.try_dir(col, row, second))
        .or_else(|| view.try_dir(col, row, facing.opposite()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bomb::{BlastPart, BlastTile};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn view<'a>(
        grid: &'a Grid,
        blast_grid: &'a [Vec<bool>],
        bombs: &'a [Bomb],
        player: (usize, usize),
    ) -> AiView<'a> {
        AiView { grid, blast_grid, bombs, player }
    }

    fn no_blasts(grid: &Grid) -> Vec<Vec<bool>> {
        vec![vec![false; grid.width()]; grid.height()]
    }

    #[test]
    fn hunter_steps_toward_player_on_open_axis() {
        let g = Grid::parse(&[
            "#######",
            "#.....#",
            "#######",
        ]);
        let blasts = no_blasts(&g);
        let enemy = Enemy::new(EnemyKind::Hunter, 1, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        // Player directly east, clear corridor
        let dir = decide(&enemy, &view(&g, &blasts, &[], (5, 1)), &mut rng);
        assert_eq!(dir, Some(Direction::Right));
    }

    #[test]
    fn hunter_falls_back_to_other_axis_when_blocked() {
        let g = Grid::parse(&[
            "#####",
            "#.#.#",
            "#...#",
            "#####",
        ]);
        let blasts = no_blasts(&g);
        let enemy = Enemy::new(EnemyKind::Hunter, 1, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        // Player east but the wall at (2,1) blocks the primary axis
        let dir = decide(&enemy, &view(&g, &blasts, &[], (3, 1)), &mut rng);
        assert_eq!(dir, Some(Direction::Down));
    }

    #[test]
    fn sentry_keeps_walking_until_blocked_then_turns() {
        let g = Grid::parse(&[
            "#####",
            "#...#",
            "#...#",
            "#####",
        ]);
        let blasts = no_blasts(&g);
        let mut enemy = Enemy::new(EnemyKind::Sentry, 1, 1);
        enemy.facing = Direction::Right;
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let dir = decide(&enemy, &view(&g, &blasts, &[], (1, 2)), &mut rng);
        assert_eq!(dir, Some(Direction::Right));

        // At the east wall, facing right: only perpendicular/reverse remain
        enemy.col = 3;
        let dir = decide(&enemy, &view(&g, &blasts, &[], (1, 2)), &mut rng)
            .expect("sentry should turn, not idle");
        assert_ne!(dir, Direction::Right);
    }

    #[test]
    fn enemy_trapped_inside_blast_idles() {
        let g = Grid::parse(&[
            "#####",
            "#...#",
            "#####",
        ]);
        let tiles = [
            BlastTile { col: 1, row: 1, part: BlastPart::Center, remaining: 5 },
            BlastTile { col: 2, row: 1, part: BlastPart::End(Direction::Right), remaining: 5 },
        ];
        let blasts = crate::domain::bomb::build_blast_grid(&tiles, g.width(), g.height());
        let enemy = Enemy::new(EnemyKind::Wanderer, 1, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        // Own cell ablaze, sole open neighbor (2,1) also ablaze → trapped
        let dir = decide(&enemy, &view(&g, &blasts, &[], (3, 1)), &mut rng);
        assert_eq!(dir, None);
    }

    #[test]
    fn enemy_in_blast_takes_the_one_safe_exit() {
        let g = Grid::parse(&[
            "#####",
            "#...#",
            "#####",
        ]);
        let tiles =
            [BlastTile { col: 2, row: 1, part: BlastPart::Center, remaining: 5 }];
        let blasts = crate::domain::bomb::build_blast_grid(&tiles, g.width(), g.height());
        let enemy = Enemy::new(EnemyKind::Sentry, 2, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        // Standing on the center tile: override kicks in before the
        // sentry policy, either corridor end is acceptable.
        let dir = decide(&enemy, &view(&g, &blasts, &[], (1, 1)), &mut rng)
            .expect("an open safe neighbor exists");
        assert!(dir == Direction::Left || dir == Direction::Right);
    }

    #[test]
    fn armed_bomb_blocks_movement_but_is_not_hazard() {
        let g = Grid::parse(&[
            "#####",
            "#...#",
            "#####",
        ]);
        let blasts = no_blasts(&g);
        let bombs = [Bomb::new(2, 1, 1, 60)];
        let enemy = Enemy::new(EnemyKind::Hunter, 1, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        // Bomb east of the enemy: path blocked, but the enemy's own cell
        // counts as safe, so the type policy (not escape) runs.
        let dir = decide(&enemy, &view(&g, &blasts, &bombs, (3, 1)), &mut rng);
        assert_eq!(dir, None); // corridor fully blocked by the bomb
    }
}
