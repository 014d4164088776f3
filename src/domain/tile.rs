/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Floor,
    Wall,  // Indestructible
    Crate, // Destructible by blasts
}

impl Tile {
    /// Can an entity occupy this cell?
    pub fn is_walkable(self) -> bool {
        matches!(self, Tile::Floor)
    }

    /// Can a blast destroy this tile?
    pub fn is_destructible(self) -> bool {
        matches!(self, Tile::Crate)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Floor
    }
}
