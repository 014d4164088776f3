/// Entities: Player, Enemy, Powerup, and the shared grid-motion model.
///
/// An entity is either settled at a grid cell or committed to a single
/// one-cell move. The logical (col, row) coordinate only changes at the
/// moment the move snaps; collision and AI queries never see an entity
/// "between" cells.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const DIRECTIONS: [Direction; 4] =
    [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// The two directions at right angles to this one.
    pub fn perpendicular(self) -> [Direction; 2] {
        match self {
            Direction::Up | Direction::Down => [Direction::Left, Direction::Right],
            Direction::Left | Direction::Right => [Direction::Up, Direction::Down],
        }
    }

    /// Neighbor cell in this direction, or None when it would leave
    /// the coordinate space on the low side. High-side overflow is the
    /// grid's problem (out of bounds reads as Wall).
    pub fn step_from(self, col: usize, row: usize) -> Option<(usize, usize)> {
        let (dx, dy) = self.delta();
        let ncol = col as i32 + dx;
        let nrow = row as i32 + dy;
        if ncol < 0 || nrow < 0 {
            None
        } else {
            Some((ncol as usize, nrow as usize))
        }
    }
}

/// Discrete input intent for one tick: movement is continuous (held
/// key), bomb placement is edge-triggered (fresh press).
#[derive(Clone, Copy, Debug, Default)]
pub struct InputIntent {
    pub movement: Option<Direction>,
    pub place_bomb: bool,
}

/// A one-cell move in progress. Progress runs 0..1 toward the adjacent
/// cell; the owning entity's grid coordinate is still the source cell.
#[derive(Clone, Copy, Debug)]
pub struct Motion {
    pub dir: Direction,
    pub progress: f32,
}

impl Motion {
    pub fn new(dir: Direction) -> Self {
        Motion { dir, progress: 0.0 }
    }

    /// Advance by `speed` cells. Returns true when the move snaps:
    /// within one speed-unit of the target counts as arrival, so the
    /// entity never overshoots.
    pub fn advance(&mut self, speed: f32) -> bool {
        self.progress = (self.progress + speed).min(1.0);
        self.progress >= 1.0
    }

    /// Continuous offset from the source cell, in cell units.
    pub fn offset(&self) -> (f32, f32) {
        let (dx, dy) = self.dir.delta();
        (dx as f32 * self.progress, dy as f32 * self.progress)
    }
}

// ── Player ──

#[derive(Clone, Debug)]
pub struct Player {
    pub col: usize,
    pub row: usize,
    pub motion: Option<Motion>,
    pub facing: Direction,
    pub speed: f32, // cells per tick
    pub lives: u32,
    pub bombs_available: u32,
    pub max_bombs: u32,
    pub blast_radius: u32,
    pub invincible_ticks: u32,
}

impl Player {
    pub fn new(col: usize, row: usize, lives: u32, bombs: u32, radius: u32, speed: f32) -> Self {
        Player {
            col,
            row,
            motion: None,
            facing: Direction::Down,
            speed,
            lives,
            bombs_available: bombs,
            max_bombs: bombs,
            blast_radius: radius,
            invincible_ticks: 0,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.motion.is_none()
    }

    /// Decrement lives unless inside the post-hit grace window.
    /// Returns true if damage was actually applied.
    pub fn take_damage(&mut self, invincibility: u32) -> bool {
        if self.invincible_ticks > 0 || self.lives == 0 {
            return false;
        }
        self.lives -= 1;
        self.invincible_ticks = invincibility;
        true
    }

    /// Continuous position in cell units, for interpolated rendering.
    pub fn visual_pos(&self) -> (f32, f32) {
        let (ox, oy) = self.motion.map_or((0.0, 0.0), |m| m.offset());
        (self.col as f32 + ox, self.row as f32 + oy)
    }
}

// ── Enemy ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    /// Drifts to a uniformly random open neighbor.
    Wanderer,
    /// Closes on the player along the larger-delta axis.
    Hunter,
    /// Walks straight until blocked, then turns.
    Sentry,
}

impl EnemyKind {
    pub fn speed(self) -> f32 {
        match self {
            EnemyKind::Wanderer => 0.05,
            EnemyKind::Hunter => 0.075,
            EnemyKind::Sentry => 0.04,
        }
    }

    pub fn starting_lives(self) -> u32 {
        match self {
            EnemyKind::Wanderer => 1,
            EnemyKind::Hunter => 2,
            EnemyKind::Sentry => 3,
        }
    }

    /// Ticks between decision-policy invocations.
    pub fn decision_interval(self) -> u32 {
        match self {
            EnemyKind::Wanderer => 20,
            EnemyKind::Hunter => 16,
            EnemyKind::Sentry => 24,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub col: usize,
    pub row: usize,
    pub motion: Option<Motion>,
    pub facing: Direction,
    pub lives: u32,
    pub invincible_ticks: u32,
    pub decision_timer: u32,
}

impl Enemy {
    pub fn new(kind: EnemyKind, col: usize, row: usize) -> Self {
        Enemy {
            kind,
            col,
            row,
            motion: None,
            facing: Direction::Down,
            lives: kind.starting_lives(),
            invincible_ticks: 0,
            decision_timer: kind.decision_interval(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.motion.is_none()
    }

    pub fn take_damage(&mut self, invincibility: u32) -> bool {
        if self.invincible_ticks > 0 || self.lives == 0 {
            return false;
        }
        self.lives -= 1;
        self.invincible_ticks = invincibility;
        true
    }

    pub fn visual_pos(&self) -> (f32, f32) {
        let (ox, oy) = self.motion.map_or((0.0, 0.0), |m| m.offset());
        (self.col as f32 + ox, self.row as f32 + oy)
    }
}

// ── Powerup ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerupKind {
    SpeedUp,
    BombUp,
    RangeUp,
}

pub const POWERUP_KINDS: [PowerupKind; 3] =
    [PowerupKind::SpeedUp, PowerupKind::BombUp, PowerupKind::RangeUp];

#[derive(Clone, Copy, Debug)]
pub struct Powerup {
    pub col: usize,
    pub row: usize,
    pub kind: PowerupKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_snaps_without_overshoot() {
        let mut m = Motion::new(Direction::Right);
        // 0.4 per tick: two ticks mid-flight, third snaps
        assert!(!m.advance(0.4));
        assert!(!m.advance(0.4));
        assert!(m.advance(0.4));
        assert!((m.progress - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn motion_offset_tracks_direction() {
        let mut m = Motion::new(Direction::Up);
        m.advance(0.25);
        let (ox, oy) = m.offset();
        assert!((ox - 0.0).abs() < 0.001);
        assert!((oy + 0.25).abs() < 0.001);
    }

    #[test]
    fn damage_respects_invincibility_window() {
        let mut p = Player::new(1, 1, 3, 1, 1, 0.15);
        assert!(p.take_damage(10));
        assert_eq!(p.lives, 2);
        // Second hit inside the window is swallowed
        assert!(!p.take_damage(10));
        assert_eq!(p.lives, 2);
        // Window elapses, damage lands again
        p.invincible_ticks = 0;
        assert!(p.take_damage(10));
        assert_eq!(p.lives, 1);
    }

    #[test]
    fn step_from_rejects_negative_coords() {
        assert_eq!(Direction::Up.step_from(3, 0), None);
        assert_eq!(Direction::Left.step_from(0, 3), None);
        assert_eq!(Direction::Down.step_from(3, 0), Some((3, 1)));
    }
}
