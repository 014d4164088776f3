/// One fixed-rate simulation tick.
///
/// Phase order within a tick:
///   1. player intent (bomb placement, movement commit)
///   2. motion advance + timer burn-down
///   3. blast aging
///   4. bomb fuses and detonation (chains resolve in the same tick)
///   5. blast damage
///   6. enemy contact damage
///   7. enemy decisions
///   8. powerup pickup
///   9. outcome check
///
/// Phases communicate only through the session, so each resolve_*
/// function reads the state every earlier phase left behind.

use rand::Rng;

use crate::domain::ai::{self, AiView};
use crate::domain::bomb::{self, BlastTile, Bomb, BombState};
use crate::domain::entity::{InputIntent, Motion, Powerup, PowerupKind, POWERUP_KINDS};
use crate::domain::tile::Tile;
use crate::sim::event::GameEvent;
use crate::sim::session::{Outcome, Session};

/// Advance the session by one tick. A finished session is inert: no
/// state changes, no events.
pub fn step(s: &mut Session, intent: &InputIntent) -> Vec<GameEvent> {
    if s.outcome != Outcome::InProgress {
        return vec![];
    }

    let mut events = Vec::new();
    s.tick += 1;

    if s.message_timer > 0 {
        s.message_timer -= 1;
        if s.message_timer == 0 {
            s.message.clear();
        }
    }

    resolve_player_intent(s, intent, &mut events);
    advance_motions(s);
    expire_blasts(s);
    resolve_bombs(s, &mut events);
    resolve_blast_damage(s, &mut events);
    resolve_contact_damage(s, &mut events);
    resolve_enemy_ai(s);
    resolve_powerup_pickup(s, &mut events);
    resolve_outcome(s, &mut events);

    events
}

/// Bomb placement needs a settled player on a clear floor cell with
/// stock in hand. Movement commits a whole-cell move; bombs block it,
/// live blasts do not (walking into fire is allowed, and punished by
/// the damage phase).
fn resolve_player_intent(s: &mut Session, intent: &InputIntent, events: &mut Vec<GameEvent>) {
    if intent.place_bomb && s.player.is_settled() {
        let (col, row) = (s.player.col, s.player.row);
        if s.player.bombs_available > 0
            && !s.bomb_at(col, row)
            && s.grid.tile_at(col, row) == Tile::Floor
        {
            s.player.bombs_available -= 1;
            s.bombs
                .push(Bomb::new(col, row, s.player.blast_radius, s.tuning.fuse_ticks));
            events.push(GameEvent::BombPlaced { col, row });
        }
    }

    if let Some(dir) = intent.movement {
        if s.player.is_settled() {
            s.player.facing = dir;
            if let Some((ncol, nrow)) = dir.step_from(s.player.col, s.player.row) {
                if s.grid.is_walkable(ncol, nrow) && !s.bomb_at(ncol, nrow) {
                    s.player.motion = Some(Motion::new(dir));
                }
            }
        }
    }
}

/// Advance every in-flight move; a snap updates the logical cell and
/// clears the motion in the same instant. Per-entity timers burn down
/// here too.
fn advance_motions(s: &mut Session) {
    if let Some(mut m) = s.player.motion {
        if m.advance(s.player.speed) {
            if let Some((col, row)) = m.dir.step_from(s.player.col, s.player.row) {
                s.player.col = col;
                s.player.row = row;
            }
            s.player.motion = None;
        } else {
            s.player.motion = Some(m);
        }
    }
    if s.player.invincible_ticks > 0 {
        s.player.invincible_ticks -= 1;
    }

    for e in &mut s.enemies {
        if let Some(mut m) = e.motion {
            if m.advance(e.kind.speed()) {
                if let Some((col, row)) = m.dir.step_from(e.col, e.row) {
                    e.col = col;
                    e.row = row;
                }
                e.motion = None;
            } else {
                e.motion = Some(m);
            }
        }
        if e.invincible_ticks > 0 {
            e.invincible_ticks -= 1;
        }
        if e.decision_timer > 0 {
            e.decision_timer -= 1;
        }
    }
}

/// Age out blast tiles from previous ticks. Runs before detonation so
/// fresh blasts get their full linger duration.
fn expire_blasts(s: &mut Session) {
    if s.blast_tiles.is_empty() {
        return;
    }
    for t in &mut s.blast_tiles {
        t.remaining = t.remaining.saturating_sub(1);
    }
    s.blast_tiles.retain(|t| t.remaining > 0);
    s.rebuild_blast_grid();
}

/// Burn fuses, detonate expired bombs, and cascade: any armed bomb
/// caught in a blast footprint detonates in the same tick. The
/// worklist is bounded by the number of live bombs because a bomb
/// leaves the Armed state the moment it is queued for processing.
fn resolve_bombs(s: &mut Session, events: &mut Vec<GameEvent>) {
    if s.bombs.is_empty() {
        return;
    }

    let mut queue: Vec<usize> = Vec::new();
    for (i, b) in s.bombs.iter_mut().enumerate() {
        match b.state {
            BombState::Armed => {
                b.fuse_remaining = b.fuse_remaining.saturating_sub(1);
                if b.fuse_remaining == 0 {
                    queue.push(i);
                }
            }
            BombState::Exploding => {
                b.linger_remaining = b.linger_remaining.saturating_sub(1);
                if b.linger_remaining == 0 {
                    b.state = BombState::Spent;
                }
            }
            BombState::Spent => {}
        }
    }

    let detonated = !queue.is_empty();
    while let Some(i) = queue.pop() {
        // A chained bomb may have been queued twice; the state flip in
        // detonate() makes the second entry a no-op.
        if s.bombs[i].is_armed() {
            detonate(s, i, &mut queue, events);
        }
    }

    s.bombs.retain(|b| b.state != BombState::Spent);
    if detonated {
        s.rebuild_blast_grid();
    }
}

fn detonate(s: &mut Session, idx: usize, queue: &mut Vec<usize>, events: &mut Vec<GameEvent>) {
    let (col, row, radius) = {
        let b = &mut s.bombs[idx];
        b.state = BombState::Exploding;
        b.linger_remaining = s.tuning.blast_linger_ticks;
        (b.col, b.row, b.radius)
    };
    events.push(GameEvent::BombExploded { col, row });

    // Stock returns on detonation regardless of how it was triggered.
    s.player.bombs_available += 1;

    let blast = bomb::compute_blast(&s.grid, col, row, radius);

    for &(c, r) in &blast.crates_hit {
        if s.grid.destroy(c, r) {
            s.score += 10;
            events.push(GameEvent::CrateDestroyed { col: c, row: r });
            maybe_spawn_powerup(s, c, r, events);
        }
    }

    for &(c, r, part) in &blast.tiles {
        s.blast_tiles.push(BlastTile {
            col: c,
            row: r,
            part,
            remaining: s.tuning.blast_linger_ticks,
        });
    }

    for (j, other) in s.bombs.iter().enumerate() {
        if j != idx && other.is_armed() && blast.covers(other.col, other.row) {
            queue.push(j);
        }
    }
}

fn maybe_spawn_powerup(s: &mut Session, col: usize, row: usize, events: &mut Vec<GameEvent>) {
    if s.powerups.len() >= s.tuning.max_powerups {
        return;
    }
    if s.powerups.iter().any(|p| p.col == col && p.row == row) {
        return;
    }
    if !s.rng.gen_bool(s.tuning.powerup_chance) {
        return;
    }
    let kind = POWERUP_KINDS[s.rng.gen_range(0..POWERUP_KINDS.len())];
    s.powerups.push(Powerup { col, row, kind });
    events.push(GameEvent::PowerupSpawned { col, row, kind });
}

/// Anyone whose logical cell is ablaze takes one hit, gated by their
/// invincibility window. Dead enemies are compacted by the outcome
/// phase so this tick's events can still name their cell.
fn resolve_blast_damage(s: &mut Session, events: &mut Vec<GameEvent>) {
    if s.blast_tiles.is_empty() {
        return;
    }

    let player_burning = s.hazard_at(s.player.col, s.player.row);
    if player_burning && s.player.take_damage(s.tuning.player_invincibility_ticks) {
        events.push(GameEvent::PlayerHit { lives_left: s.player.lives });
    }

    let inv = s.tuning.enemy_invincibility_ticks;
    for e in &mut s.enemies {
        if s.blast_grid[e.row][e.col] && e.take_damage(inv) {
            if e.lives == 0 {
                s.score += 100;
                events.push(GameEvent::EnemyKilled { col: e.col, row: e.row });
            } else {
                events.push(GameEvent::EnemyHit { col: e.col, row: e.row });
            }
        }
    }
}

/// Sharing a cell with a live enemy costs the player one life.
/// The invincibility window keeps a lingering overlap from draining
/// the whole stock.
fn resolve_contact_damage(s: &mut Session, events: &mut Vec<GameEvent>) {
    let (pc, pr) = (s.player.col, s.player.row);
    let touching = s.enemies.iter().any(|e| e.lives > 0 && e.col == pc && e.row == pr);
    if touching && s.player.take_damage(s.tuning.player_invincibility_ticks) {
        events.push(GameEvent::PlayerHit { lives_left: s.player.lives });
    }
}

/// Run decision policies for settled enemies whose interval elapsed.
fn resolve_enemy_ai(s: &mut Session) {
    let view = AiView {
        grid: &s.grid,
        blast_grid: &s.blast_grid,
        bombs: &s.bombs,
        player: (s.player.col, s.player.row),
    };
    for e in &mut s.enemies {
        if !e.is_settled() || e.decision_timer > 0 || e.lives == 0 {
            continue;
        }
        e.decision_timer = e.kind.decision_interval();
        if let Some(dir) = ai::decide(e, &view, &mut s.rng) {
            e.facing = dir;
            e.motion = Some(Motion::new(dir));
        }
    }
}

fn resolve_powerup_pickup(s: &mut Session, events: &mut Vec<GameEvent>) {
    let (pc, pr) = (s.player.col, s.player.row);
    let Some(i) = s.powerups.iter().position(|p| p.col == pc && p.row == pr) else {
        return;
    };
    let p = s.powerups.swap_remove(i);
    match p.kind {
        PowerupKind::SpeedUp => {
            s.player.speed = (s.player.speed + s.tuning.speed_increment).min(s.tuning.speed_cap);
        }
        PowerupKind::BombUp => {
            s.player.max_bombs += 1;
            s.player.bombs_available += 1;
        }
        PowerupKind::RangeUp => {
            s.player.blast_radius += 1;
        }
    }
    events.push(GameEvent::PowerupCollected { kind: p.kind });
}

/// Compact dead enemies and settle the session outcome. Defeat wins
/// ties: a blast that takes the last life and the last enemy is still
/// a loss.
fn resolve_outcome(s: &mut Session, events: &mut Vec<GameEvent>) {
    s.enemies.retain(|e| e.lives > 0);

    if s.player.lives == 0 {
        s.outcome = Outcome::Defeat;
        events.push(GameEvent::PlayerDefeated);
    } else if s.enemies.is_empty() {
        s.outcome = Outcome::Victory;
        events.push(GameEvent::AllEnemiesCleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SessionConfig, Tuning};
    use crate::domain::entity::{Direction, Enemy, EnemyKind, PowerupKind};
    use crate::domain::grid::Grid;

    /// A session whose generated arena is swapped for a hand-built one.
    fn fixture(rows: &[&str]) -> Session {
        let config = SessionConfig { seed: Some(1), ..SessionConfig::default() };
        let mut s = Session::start(config, Tuning::default()).unwrap();
        s.grid = Grid::parse(rows);
        s.blast_grid = vec![vec![false; s.grid.width()]; s.grid.height()];
        s.enemies.clear();
        s.player.col = 1;
        s.player.row = 1;
        s
    }

    fn idle() -> InputIntent {
        InputIntent::default()
    }

    fn bomb_intent() -> InputIntent {
        InputIntent { movement: None, place_bomb: true }
    }

    fn move_intent(dir: Direction) -> InputIntent {
        InputIntent { movement: Some(dir), place_bomb: false }
    }

    #[test]
    fn placed_bomb_explodes_when_fuse_runs_out_and_stock_returns() {
        let mut s = fixture(&[
            "#####",
            "#...#",
            "#####",
        ]);
        let fuse = s.tuning.fuse_ticks as usize;

        let events = step(&mut s, &bomb_intent());
        assert!(matches!(events[0], GameEvent::BombPlaced { col: 1, row: 1 }));
        assert_eq!(s.player.bombs_available, 0);

        let mut exploded_at = None;
        for i in 1..=fuse {
            let events = step(&mut s, &idle());
            if events.iter().any(|e| matches!(e, GameEvent::BombExploded { .. })) {
                exploded_at = Some(i);
                break;
            }
        }
        // Placement tick already burns one fuse tick.
        assert_eq!(exploded_at, Some(fuse - 1));
        assert_eq!(s.player.bombs_available, 1);
        assert!(!s.blast_tiles.is_empty());
        assert!(s.hazard_at(1, 1));
    }

    #[test]
    fn blast_tiles_expire_after_linger() {
        let mut s = fixture(&[
            "#####",
            "#...#",
            "#####",
        ]);
        s.bombs.push(Bomb::new(1, 1, 1, 1));
        s.player.col = 3; // out of the way, lives intact

        step(&mut s, &idle());
        assert!(s.hazard_at(1, 1));

        for _ in 0..s.tuning.blast_linger_ticks {
            step(&mut s, &idle());
        }
        assert!(s.blast_tiles.is_empty());
        assert!(!s.hazard_at(1, 1));
        assert!(s.bombs.is_empty());
    }

    #[test]
    fn armed_bomb_in_blast_chains_in_the_same_tick() {
        let mut s = fixture(&[
            "######",
            "#....#",
            "######",
        ]);
        s.bombs.push(Bomb::new(1, 1, 1, 1));
        s.bombs.push(Bomb::new(2, 1, 1, 60));
        s.player.col = 4;

        let events = step(&mut s, &idle());
        let explosions = events
            .iter()
            .filter(|e| matches!(e, GameEvent::BombExploded { .. }))
            .count();
        assert_eq!(explosions, 2);
        assert!(s.bombs.iter().all(|b| b.state == BombState::Exploding));
        // Both detonations return stock.
        assert_eq!(s.player.bombs_available, 3);
    }

    #[test]
    fn blast_destroys_crate_and_scores() {
        let mut s = fixture(&[
            "#####",
            "#.+.#",
            "#####",
        ]);
        s.bombs.push(Bomb::new(1, 1, 1, 1));

        let events = step(&mut s, &idle());
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::CrateDestroyed { col: 2, row: 1 })));
        assert_eq!(s.grid.tile_at(2, 1), Tile::Floor);
        assert!(s.score >= 10);
        // The crate absorbed the arm, so the cell behind it is intact.
        assert!(!s.hazard_at(3, 1));
    }

    #[test]
    fn player_in_blast_loses_one_life_per_window() {
        let mut s = fixture(&[
            "#####",
            "#...#",
            "#####",
        ]);
        s.bombs.push(Bomb::new(1, 1, 1, 1));

        let events = step(&mut s, &idle());
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerHit { lives_left: 2 })));
        assert_eq!(s.player.lives, 2);

        // Still standing in the blast, but inside the grace window.
        for _ in 0..3 {
            step(&mut s, &idle());
        }
        assert_eq!(s.player.lives, 2);
    }

    #[test]
    fn killing_the_last_enemy_wins_the_session() {
        let mut s = fixture(&[
            "#####",
            "#...#",
            "#####",
        ]);
        s.player.col = 3;
        s.enemies.push(Enemy::new(EnemyKind::Wanderer, 1, 1));
        s.bombs.push(Bomb::new(1, 1, 1, 1));

        let events = step(&mut s, &idle());
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::EnemyKilled { col: 1, row: 1 })));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::AllEnemiesCleared)));
        assert_eq!(s.outcome, Outcome::Victory);
        assert!(s.enemies.is_empty());
        assert!(s.score >= 100);
    }

    #[test]
    fn tough_enemy_survives_with_a_grace_window() {
        let mut s = fixture(&[
            "#####",
            "#...#",
            "#####",
        ]);
        s.player.col = 3;
        s.enemies.push(Enemy::new(EnemyKind::Sentry, 1, 1));
        s.bombs.push(Bomb::new(1, 1, 1, 1));

        let events = step(&mut s, &idle());
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::EnemyHit { col: 1, row: 1 })));
        assert_eq!(s.enemies[0].lives, 2);
        assert_eq!(s.outcome, Outcome::InProgress);
    }

    #[test]
    fn losing_the_last_life_ends_the_session() {
        let mut s = fixture(&[
            "#####",
            "#...#",
            "#####",
        ]);
        s.player.lives = 1;
        s.bombs.push(Bomb::new(1, 1, 1, 1));

        let events = step(&mut s, &idle());
        assert!(events.iter().any(|e| matches!(e, GameEvent::PlayerDefeated)));
        assert_eq!(s.outcome, Outcome::Defeat);

        // Finished sessions are inert.
        let tick = s.tick;
        assert!(step(&mut s, &bomb_intent()).is_empty());
        assert_eq!(s.tick, tick);
    }

    #[test]
    fn movement_snaps_after_enough_ticks() {
        let mut s = fixture(&[
            "#####",
            "#...#",
            "#####",
        ]);
        s.player.speed = 0.5;

        step(&mut s, &move_intent(Direction::Right));
        assert_eq!(s.player.col, 1); // mid-flight
        assert!(!s.player.is_settled());

        step(&mut s, &move_intent(Direction::Right));
        assert_eq!(s.player.col, 2);
        assert!(s.player.is_settled());
        assert_eq!(s.player.facing, Direction::Right);
    }

    #[test]
    fn bomb_blocks_player_movement() {
        let mut s = fixture(&[
            "#####",
            "#...#",
            "#####",
        ]);
        s.bombs.push(Bomb::new(2, 1, 1, 60));

        step(&mut s, &move_intent(Direction::Right));
        assert!(s.player.is_settled());
        assert_eq!(s.player.col, 1);
        assert_eq!(s.player.facing, Direction::Right);
    }

    #[test]
    fn pickup_applies_powerup_effect() {
        let mut s = fixture(&[
            "#####",
            "#...#",
            "#####",
        ]);
        s.powerups.push(Powerup { col: 1, row: 1, kind: PowerupKind::BombUp });

        let events = step(&mut s, &idle());
        assert!(events.iter().any(|e| {
            matches!(e, GameEvent::PowerupCollected { kind: PowerupKind::BombUp })
        }));
        assert_eq!(s.player.max_bombs, 2);
        assert_eq!(s.player.bombs_available, 2);
        assert!(s.powerups.is_empty());
    }

    #[test]
    fn speed_powerup_respects_cap() {
        let mut s = fixture(&[
            "#####",
            "#...#",
            "#####",
        ]);
        s.player.speed = s.tuning.speed_cap;
        s.powerups.push(Powerup { col: 1, row: 1, kind: PowerupKind::SpeedUp });

        step(&mut s, &idle());
        assert_eq!(s.player.speed, s.tuning.speed_cap);
    }

    #[test]
    fn hunter_commits_a_move_toward_the_player() {
        let mut s = fixture(&[
            "######",
            "#....#",
            "######",
        ]);
        s.player.col = 4;
        let mut hunter = Enemy::new(EnemyKind::Hunter, 1, 1);
        hunter.decision_timer = 0;
        s.enemies.push(hunter);

        step(&mut s, &idle());
        let e = &s.enemies[0];
        assert_eq!(e.facing, Direction::Right);
        assert!(e.motion.is_some());
        assert_eq!(e.decision_timer, EnemyKind::Hunter.decision_interval());
    }

    #[test]
    fn enemy_contact_costs_the_player_a_life() {
        let mut s = fixture(&[
            "#####",
            "#...#",
            "#####",
        ]);
        s.enemies.push(Enemy::new(EnemyKind::Wanderer, 1, 1));

        let events = step(&mut s, &idle());
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerHit { lives_left: 2 })));
        assert_eq!(s.player.lives, 2);
    }
}
