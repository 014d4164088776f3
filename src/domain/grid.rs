/// The arena terrain: a rectangular tile matrix with a Wall border.
///
/// The grid is owned by the session and read by everything else.
/// `destroy` is the only mutator: Crate becomes Floor, and nothing else ever
/// changes a tile after construction.

use super::tile::Tile;

#[derive(Clone, Debug)]
pub struct Grid {
    tiles: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
}

impl Grid {
    /// Build a grid from finalized rows. Rows must be rectangular.
    pub fn from_rows(tiles: Vec<Vec<Tile>>) -> Self {
        let height = tiles.len();
        let width = if height > 0 { tiles[0].len() } else { 0 };
        debug_assert!(tiles.iter().all(|r| r.len() == width));
        Grid { tiles, width, height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Query terrain at (col, row). Out of bounds reads as Wall,
    /// never a panic, so callers probe neighbors freely.
    #[inline]
    pub fn tile_at(&self, col: usize, row: usize) -> Tile {
        if col < self.width && row < self.height {
            self.tiles[row][col]
        } else {
            Tile::Wall
        }
    }

    #[inline]
    pub fn is_walkable(&self, col: usize, row: usize) -> bool {
        self.tile_at(col, row).is_walkable()
    }

    /// Convert a Crate to Floor. No-op on Wall, Floor, or out of bounds.
    /// Returns true if a crate was actually removed.
    pub fn destroy(&mut self, col: usize, row: usize) -> bool {
        if col < self.width && row < self.height && self.tiles[row][col].is_destructible() {
            self.tiles[row][col] = Tile::Floor;
            true
        } else {
            false
        }
    }

    /// Row-major snapshot of the terrain, for the renderer.
    pub fn rows(&self) -> &[Vec<Tile>] {
        &self.tiles
    }
}

// ── Test fixture ──
//
// Legend: '#' = Wall, '+' = Crate, '.' or ' ' = Floor.

#[cfg(test)]
impl Grid {
    pub fn parse(rows: &[&str]) -> Self {
        let tiles = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|ch| match ch {
                        '#' => Tile::Wall,
                        '+' => Tile::Crate,
                        _ => Tile::Floor,
                    })
                    .collect()
            })
            .collect();
        Grid::from_rows(tiles)
    }
}
