/// Bombs and blast geometry.
///
/// Lifecycle: Armed --(fuse expiry OR caught in a blast)--> Exploding
/// --(linger expiry)--> Spent --> removed by the step function.
///
/// A bomb in Exploding state is only a countdown shell; the hazard
/// itself lives in the independently-timed blast tiles. Danger checks
/// (AI safety, contact damage) query blast tiles, never bombs.

use super::entity::{Direction, DIRECTIONS};
use super::grid::Grid;
use super::tile::Tile;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BombState {
    Armed,
    Exploding,
    Spent,
}

#[derive(Clone, Debug)]
pub struct Bomb {
    pub col: usize,
    pub row: usize,
    pub radius: u32,
    pub state: BombState,
    pub fuse_remaining: u32,
    pub linger_remaining: u32,
    fuse_total: u32,
}

impl Bomb {
    pub fn new(col: usize, row: usize, radius: u32, fuse: u32) -> Self {
        Bomb {
            col,
            row,
            radius,
            state: BombState::Armed,
            fuse_remaining: fuse,
            linger_remaining: 0,
            fuse_total: fuse,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state == BombState::Armed
    }

    /// Fuse burn-down ratio 0.0 (fresh) → 1.0 (about to blow).
    /// Drives the renderer's flash cue.
    pub fn fuse_progress(&self) -> f32 {
        if self.fuse_total == 0 {
            return 1.0;
        }
        1.0 - (self.fuse_remaining as f32 / self.fuse_total as f32)
    }
}

// ── Blast geometry ──

/// Which slice of a blast pattern a tile belongs to. The renderer
/// picks glyphs from this; the hazard semantics are identical.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlastPart {
    Center,
    Arm(Direction),
    End(Direction),
}

/// A grid cell currently marked hazardous by an active blast.
/// Timed out independently from the bomb that produced it.
#[derive(Clone, Copy, Debug)]
pub struct BlastTile {
    pub col: usize,
    pub row: usize,
    pub part: BlastPart,
    pub remaining: u32,
}

/// The computed footprint of one detonation.
pub struct Blast {
    /// Every cell covered, center first.
    pub tiles: Vec<(usize, usize, BlastPart)>,
    /// Crates consumed by the arms, one per arm at most.
    pub crates_hit: Vec<(usize, usize)>,
}

impl Blast {
    pub fn covers(&self, col: usize, row: usize) -> bool {
        self.tiles.iter().any(|&(c, r, _)| c == col && r == row)
    }
}

/// Compute the cross-shaped blast footprint around a center cell.
///
/// Each of the four arms extends independently up to `radius` cells:
/// Floor is covered and the arm continues, a Crate is covered and the
/// arm stops (the crate is reported for destruction), a Wall stops the
/// arm without being covered.
pub fn compute_blast(grid: &Grid, col: usize, row: usize, radius: u32) -> Blast {
    let mut tiles = vec![(col, row, BlastPart::Center)];
    let mut crates_hit = Vec::new();

    for dir in DIRECTIONS {
        let mut cur = (col, row);
        for dist in 1..=radius {
            let Some((ncol, nrow)) = dir.step_from(cur.0, cur.1) else {
                break;
            };
            cur = (ncol, nrow);

            match grid.tile_at(ncol, nrow) {
                Tile::Wall => break,
                Tile::Crate => {
                    tiles.push((ncol, nrow, BlastPart::End(dir)));
                    crates_hit.push((ncol, nrow));
                    break;
                }
                Tile::Floor => {
                    let part = if dist == radius {
                        BlastPart::End(dir)
                    } else {
                        BlastPart::Arm(dir)
                    };
                    tiles.push((ncol, nrow, part));
                }
            }
        }
    }

    Blast { tiles, crates_hit }
}

/// Rebuild the O(1) hazard-lookup grid from the live blast tiles.
/// `blast_grid[row][col] == true` ↔ that cell is currently hazardous.
pub fn build_blast_grid(tiles: &[BlastTile], width: usize, height: usize) -> Vec<Vec<bool>> {
    let mut grid = vec![vec![false; width]; height];
    for t in tiles {
        if t.row < height && t.col < width {
            grid[t.row][t.col] = true;
        }
    }
    grid
}
