/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::entity::{Direction, InputIntent, PowerupKind};
use sim::event::GameEvent;
use sim::session::{Outcome, Session};
use sim::step;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::Screen;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let mut session = match Session::start(config.session, config.tuning) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Setup failed: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut session, &mut renderer);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Grid Blast!");
    println!("Final Score: {}", session.score);
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut screen = Screen::Title;
    let mut paused = false;
    let mut pending_bomb = false;
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(session.tuning.tick_rate_ms);

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(session, &kb, &mut screen, &mut paused) {
            break;
        }

        // Bomb placement is edge-triggered and latched until the next
        // simulation tick, so a press between ticks is never dropped.
        if screen == Screen::Playing && !paused && kb.any_pressed(KEYS_BOMB) {
            pending_bomb = true;
        }

        if last_tick.elapsed() >= tick_rate {
            if screen == Screen::Playing && !paused {
                let intent = InputIntent {
                    movement: detect_movement(&kb),
                    place_bomb: std::mem::take(&mut pending_bomb),
                };
                let events = step::step(session, &intent);
                apply_event_messages(session, &events);

                if session.outcome != Outcome::InProgress {
                    screen = Screen::Finished;
                }
            }
            // Missed ticks are dropped, not replayed: a pause or a
            // stalled terminal never fast-forwards the simulation.
            last_tick = Instant::now();
        }

        renderer.render(screen, session, paused)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_BOMB: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];

fn detect_movement(kb: &InputState) -> Option<Direction> {
    if kb.any_held(KEYS_UP) || kb.any_pressed(KEYS_UP) {
        Some(Direction::Up)
    } else if kb.any_held(KEYS_DOWN) || kb.any_pressed(KEYS_DOWN) {
        Some(Direction::Down)
    } else if kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT) {
        Some(Direction::Left)
    } else if kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT) {
        Some(Direction::Right)
    } else {
        None
    }
}

/// Regenerate the arena; a failed regeneration (the config was valid
/// once, so only placement exhaustion can occur) leaves the session
/// untouched and reports on the HUD.
fn restart_session(session: &mut Session) {
    match session.restart() {
        Ok(()) => session.set_message("Restarted", 30),
        Err(e) => session.set_message(&format!("Restart failed: {e}"), 80),
    }
}

/// Screen transitions and one-shot control keys.
/// Returns true to quit the program.
fn handle_meta(
    session: &mut Session,
    kb: &InputState,
    screen: &mut Screen,
    paused: &mut bool,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM);
    let esc = kb.was_pressed(KeyCode::Esc);

    match *screen {
        Screen::Title => {
            if confirm {
                // The session is fresh at startup; after that a visit
                // to the title means the last arena is stale.
                if session.tick > 0 {
                    restart_session(session);
                }
                session.message.clear();
                session.message_timer = 0;
                *paused = false;
                *screen = Screen::Playing;
            } else if kb.any_pressed(KEYS_QUIT) || esc {
                return true;
            }
        }

        Screen::Playing => {
            if kb.any_pressed(KEYS_PAUSE) {
                *paused = !*paused;
                if *paused {
                    session.set_message("PAUSED  [P] Resume", 0);
                } else {
                    session.message.clear();
                    session.message_timer = 0;
                }
                return false;
            }
            if kb.any_pressed(KEYS_RESTART) {
                *paused = false;
                restart_session(session);
                return false;
            }
            if esc {
                *paused = false;
                *screen = Screen::Title;
            }
        }

        Screen::Finished => {
            if confirm {
                restart_session(session);
                *screen = Screen::Playing;
            } else if esc || kb.any_pressed(KEYS_QUIT) {
                *screen = Screen::Title;
            }
        }
    }

    false
}

/// Turn simulation events into HUD messages.
fn apply_event_messages(session: &mut Session, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::PowerupCollected { kind } => {
                let msg = match kind {
                    PowerupKind::SpeedUp => "Speed up!",
                    PowerupKind::BombUp => "Extra bomb!",
                    PowerupKind::RangeUp => "Blast range up!",
                };
                session.set_message(msg, 30);
            }
            GameEvent::PlayerHit { lives_left } => {
                session.set_message(&format!("Hit! {lives_left} lives left"), 30);
            }
            GameEvent::PlayerDefeated => {
                session.set_message("DEFEATED", 0);
            }
            GameEvent::AllEnemiesCleared => {
                session.set_message("ARENA CLEARED!", 0);
            }
            _ => {}
        }
    }
}
