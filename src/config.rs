/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: Tuning,
    pub session: SessionConfig,
}

/// Fixed-rate timing and balance knobs. All durations are in ticks.
#[derive(Clone, Debug)]
pub struct Tuning {
    pub tick_rate_ms: u64,
    pub fuse_ticks: u32,
    pub blast_linger_ticks: u32,
    pub player_invincibility_ticks: u32,
    pub enemy_invincibility_ticks: u32,
    pub powerup_chance: f64,
    pub max_powerups: usize,
    pub speed_increment: f32,
    pub speed_cap: f32,
}

/// What a fresh session looks like: arena shape and starting stats.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub grid_width: usize,
    pub grid_height: usize,
    pub crate_density: f64,
    pub wanderers: usize,
    pub hunters: usize,
    pub sentries: usize,
    pub start_lives: u32,
    pub start_bombs: u32,
    pub start_radius: u32,
    pub start_speed: f32,
    /// Fixed seed for reproducible sessions; None = random.
    pub seed: Option<u64>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    session: TomlSession,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_fuse")]
    fuse_ticks: u32,
    #[serde(default = "default_linger")]
    blast_linger_ticks: u32,
    #[serde(default = "default_player_invincibility")]
    player_invincibility_ticks: u32,
    #[serde(default = "default_enemy_invincibility")]
    enemy_invincibility_ticks: u32,
    #[serde(default = "default_powerup_chance")]
    powerup_chance: f64,
    #[serde(default = "default_max_powerups")]
    max_powerups: usize,
    #[serde(default = "default_speed_increment")]
    speed_increment: f32,
    #[serde(default = "default_speed_cap")]
    speed_cap: f32,
}

#[derive(Deserialize, Debug)]
struct TomlSession {
    #[serde(default = "default_grid_width")]
    grid_width: usize,
    #[serde(default = "default_grid_height")]
    grid_height: usize,
    #[serde(default = "default_crate_density")]
    crate_density: f64,
    #[serde(default = "default_wanderers")]
    wanderers: usize,
    #[serde(default = "default_hunters")]
    hunters: usize,
    #[serde(default = "default_sentries")]
    sentries: usize,
    #[serde(default = "default_lives")]
    start_lives: u32,
    #[serde(default = "default_bombs")]
    start_bombs: u32,
    #[serde(default = "default_radius")]
    start_radius: u32,
    #[serde(default = "default_speed")]
    start_speed: f32,
    #[serde(default)]
    seed: Option<u64>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 50 }
fn default_fuse() -> u32 { 60 }                   // 3s
fn default_linger() -> u32 { 10 }                 // 500ms blast display
fn default_player_invincibility() -> u32 { 10 }   // 500ms
fn default_enemy_invincibility() -> u32 { 6 }     // 300ms
fn default_powerup_chance() -> f64 { 0.3 }
fn default_max_powerups() -> usize { 6 }
fn default_speed_increment() -> f32 { 0.025 }
fn default_speed_cap() -> f32 { 0.25 }

fn default_grid_width() -> usize { 15 }
fn default_grid_height() -> usize { 13 }
fn default_crate_density() -> f64 { 0.4 }
fn default_wanderers() -> usize { 2 }
fn default_hunters() -> usize { 2 }
fn default_sentries() -> usize { 1 }
fn default_lives() -> u32 { 3 }
fn default_bombs() -> u32 { 1 }
fn default_radius() -> u32 { 1 }
fn default_speed() -> f32 { 0.15 }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            fuse_ticks: default_fuse(),
            blast_linger_ticks: default_linger(),
            player_invincibility_ticks: default_player_invincibility(),
            enemy_invincibility_ticks: default_enemy_invincibility(),
            powerup_chance: default_powerup_chance(),
            max_powerups: default_max_powerups(),
            speed_increment: default_speed_increment(),
            speed_cap: default_speed_cap(),
        }
    }
}

impl Default for TomlSession {
    fn default() -> Self {
        TomlSession {
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
            crate_density: default_crate_density(),
            wanderers: default_wanderers(),
            hunters: default_hunters(),
            sentries: default_sentries(),
            start_lives: default_lives(),
            start_bombs: default_bombs(),
            start_radius: default_radius(),
            start_speed: default_speed(),
            seed: None,
        }
    }
}

impl Default for Tuning {
    fn default() -> Self {
        TomlTiming::default().into()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        TomlSession::default().into()
    }
}

impl From<TomlTiming> for Tuning {
    fn from(t: TomlTiming) -> Self {
        Tuning {
            tick_rate_ms: t.tick_rate_ms,
            fuse_ticks: t.fuse_ticks,
            blast_linger_ticks: t.blast_linger_ticks,
            player_invincibility_ticks: t.player_invincibility_ticks,
            enemy_invincibility_ticks: t.enemy_invincibility_ticks,
            powerup_chance: t.powerup_chance,
            max_powerups: t.max_powerups,
            speed_increment: t.speed_increment,
            speed_cap: t.speed_cap,
        }
    }
}

impl From<TomlSession> for SessionConfig {
    fn from(s: TomlSession) -> Self {
        SessionConfig {
            grid_width: s.grid_width,
            grid_height: s.grid_height,
            crate_density: s.crate_density,
            wanderers: s.wanderers,
            hunters: s.hunters,
            sentries: s.sentries,
            start_lives: s.start_lives,
            start_bombs: s.start_bombs,
            start_radius: s.start_radius,
            start_speed: s.start_speed,
            seed: s.seed,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        GameConfig {
            tuning: toml_cfg.timing.into(),
            session: toml_cfg.session.into(),
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: TomlConfig = toml::from_str(
            "[session]\ngrid_width = 21\nseed = 42\n",
        )
        .unwrap();
        let session: SessionConfig = cfg.session.into();
        assert_eq!(session.grid_width, 21);
        assert_eq!(session.grid_height, default_grid_height());
        assert_eq!(session.seed, Some(42));
        let tuning: Tuning = cfg.timing.into();
        assert_eq!(tuning.fuse_ticks, default_fuse());
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        let tuning: Tuning = cfg.timing.into();
        assert_eq!(tuning.tick_rate_ms, 50);
        assert_eq!(tuning.max_powerups, 6);
    }
}
