/// Events emitted during a simulation step.
/// The host consumes these for HUD messages and cues.

use crate::domain::entity::PowerupKind;

#[derive(Clone, Debug)]
pub enum GameEvent {
    BombPlaced { col: usize, row: usize },
    BombExploded { col: usize, row: usize },
    CrateDestroyed { col: usize, row: usize },
    PowerupSpawned { col: usize, row: usize, kind: PowerupKind },
    PowerupCollected { kind: PowerupKind },
    PlayerHit { lives_left: u32 },
    EnemyHit { col: usize, row: usize },
    EnemyKilled { col: usize, row: usize },
    PlayerDefeated,
    AllEnemiesCleared,
}
