/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::bomb::BlastPart;
use crate::domain::entity::{Direction, EnemyKind, PowerupKind};
use crate::domain::tile::Tile;
use crate::sim::session::{Outcome, Session};
use crate::ui::Screen;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// inter-row gap pixels on VTE-based terminals match the cell color
    /// and no horizontal lines show through.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 28 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer: differs from any
    /// real cell, so every position gets diff'd on the next frame.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Renderer ──

/// Each arena cell is 2 terminal columns wide.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, screen: Screen, s: &Session, paused: bool) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change → full clear for a clean transition
        if self.last_screen != Some(screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(screen);
        }

        self.front.clear();

        match screen {
            Screen::Title => self.compose_title(),
            Screen::Playing => self.compose_game(s),
            Screen::Finished => self.compose_finished(s),
        }

        if paused && screen == Screen::Playing {
            self.compose_pause_overlay(s);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors at start of frame. No ResetColor here:
        // the terminal's native default may differ from BASE_BG.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, s: &Session) {
        let buf_w = self.front.width;

        // ── HUD row ──
        let hud = format!(
            " Score:{:<7} Lives:{}  Bombs:{}/{}  Range:{}  Speed:{:.2} ",
            s.score,
            s.player.lives,
            s.player.bombs_available,
            s.player.max_bombs,
            s.player.blast_radius,
            s.player.speed,
        );
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Arena: tiles, then static objects, then actors ──
        for (gy, tiles_row) in s.grid.rows().iter().enumerate() {
            let row = MAP_ROW + gy;
            if row >= self.front.height {
                break;
            }
            for (gx, &tile) in tiles_row.iter().enumerate() {
                let col = gx * CELL_W;
                if col + 1 >= buf_w {
                    break;
                }
                self.compose_cell(s, gx, gy, tile, col, row);
            }
        }

        self.compose_actors(s);

        // ── Message bar ──
        let msg_row = MAP_ROW + s.grid.height() + 1;
        if msg_row < self.front.height && !s.message.is_empty() {
            let msg = format!(" ◈ {} ", s.message);
            for x in 0..buf_w {
                self.front.set(x, msg_row, Cell::new(' ', Color::Black, MSG_BG));
            }
            self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + s.grid.height() + 3;
        if help_row < self.front.height {
            let help = " ←↑↓→/WASD:Move  SPACE:Bomb  P:Pause  R:Restart  ESC:Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Terrain and static objects for one arena cell.
    fn compose_cell(&mut self, s: &Session, gx: usize, gy: usize, tile: Tile, col: usize, row: usize) {
        // Blast tiles paint over everything static
        if let Some(t) = s.blast_tiles.iter().find(|t| t.col == gx && t.row == gy) {
            let fg = Color::Rgb { r: 255, g: 220, b: 80 };
            let bg = Color::Rgb { r: 160, g: 40, b: 0 };
            let (c0, c1) = match t.part {
                BlastPart::Center => ('▓', '▓'),
                BlastPart::Arm(Direction::Left) | BlastPart::Arm(Direction::Right) => ('═', '═'),
                BlastPart::Arm(Direction::Up) | BlastPart::Arm(Direction::Down) => ('║', '║'),
                BlastPart::End(Direction::Left) => ('◄', '═'),
                BlastPart::End(Direction::Right) => ('═', '►'),
                BlastPart::End(Direction::Up) => ('▲', '║'),
                BlastPart::End(Direction::Down) => ('║', '▼'),
            };
            self.front.set(col, row, Cell::new(c0, fg, bg));
            self.front.set(col + 1, row, Cell::new(c1, fg, bg));
            return;
        }

        // Bombs: flash faster as the fuse burns down
        if let Some(b) = s.bombs.iter().find(|b| b.col == gx && b.row == gy) {
            let urgent = b.fuse_progress() > 0.75;
            let fg = if urgent && s.tick % 2 == 0 {
                Color::Rgb { r: 255, g: 80, b: 80 }
            } else {
                Color::Rgb { r: 230, g: 230, b: 230 }
            };
            self.front.set(col, row, Cell::new('(', fg, Color::Reset));
            self.front.set(col + 1, row, Cell::new(')', fg, Color::Reset));
            return;
        }

        if let Some(p) = s.powerups.iter().find(|p| p.col == gx && p.row == gy) {
            let (letter, fg) = match p.kind {
                PowerupKind::SpeedUp => ('S', Color::Rgb { r: 100, g: 220, b: 255 }),
                PowerupKind::BombUp => ('B', Color::Rgb { r: 255, g: 220, b: 80 }),
                PowerupKind::RangeUp => ('R', Color::Rgb { r: 255, g: 120, b: 220 }),
            };
            self.front.set(col, row, Cell::new('◈', fg, Color::Reset));
            self.front.set(col + 1, row, Cell::new(letter, fg, Color::Reset));
            return;
        }

        let (c0, c1, fg, bg) = match tile {
            Tile::Floor => (' ', ' ', Color::Reset, Color::Reset),
            Tile::Wall => (
                '█', '█',
                Color::Rgb { r: 110, g: 110, b: 120 },
                Color::Rgb { r: 60, g: 60, b: 70 },
            ),
            Tile::Crate => (
                '▒', '▒',
                Color::Rgb { r: 190, g: 130, b: 60 },
                Color::Rgb { r: 100, g: 65, b: 30 },
            ),
        };
        self.front.set(col, row, Cell::new(c0, fg, bg));
        self.front.set(col + 1, row, Cell::new(c1, fg, bg));
    }

    /// Enemies and the player, drawn at their interpolated positions.
    fn compose_actors(&mut self, s: &Session) {
        for e in &s.enemies {
            // Post-hit flicker
            if e.invincible_ticks > 0 && s.tick % 2 == 0 {
                continue;
            }
            let (ch, fg) = match e.kind {
                EnemyKind::Wanderer => ('o', Color::Rgb { r: 120, g: 220, b: 120 }),
                EnemyKind::Hunter => ('A', Color::Rgb { r: 255, g: 90, b: 90 }),
                EnemyKind::Sentry => ('O', Color::Rgb { r: 180, g: 140, b: 255 }),
            };
            let (vx, vy) = e.visual_pos();
            self.put_actor(vx, vy, ch, fg);
        }

        if s.player.invincible_ticks > 0 && s.tick % 2 == 0 {
            return;
        }
        let (vx, vy) = s.player.visual_pos();
        let col = (vx * CELL_W as f32).round() as usize;
        let row = MAP_ROW + vy.round() as usize;
        if row < self.front.height && col + 1 < self.front.width {
            let fg = Color::Rgb { r: 255, g: 255, b: 200 };
            let under = self.front.get(col, row);
            self.front.set(col, row, Cell::new('@', fg, under.bg));
            // Facing pip in the second half-cell
            let pip = match s.player.facing {
                Direction::Up => '\'',
                Direction::Down => ',',
                Direction::Left => '<',
                Direction::Right => '>',
            };
            let under = self.front.get(col + 1, row);
            self.front.set(col + 1, row, Cell::new(pip, Color::DarkGrey, under.bg));
        }
    }

    fn put_actor(&mut self, vx: f32, vy: f32, ch: char, fg: Color) {
        let col = (vx * CELL_W as f32).round() as usize;
        let row = MAP_ROW + vy.round() as usize;
        if row < self.front.height && col < self.front.width {
            let under = self.front.get(col, row);
            self.front.set(col, row, Cell::new(ch, fg, under.bg));
        }
    }

    // ── Static screens ──

    fn compose_title(&mut self) {
        let title = [
            r"   ___  ___  ___  ___    ___  _     _   ___  _____ ",
            r"  / __|| _ \|_ _||   \  | _ )| |   /_\ / __||_   _|",
            r" | (_ || |/  | | | |) | | _ \| |_ / _ \\__ \  | |  ",
            r"  \___||_|  |___||___/  |___/|___/_/ \_\___/  |_|  ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, Color::Rgb { r: 255, g: 200, b: 50 }, Color::Reset);
        }

        let subtitle = "━━━ Terminal Bombing Arena ━━━";
        self.front.put_str(12, 7, subtitle, Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);

        let menu_base = 10;
        let hi = Color::Rgb { r: 80, g: 255, b: 80 };
        self.front.put_str(8, menu_base, "ENTER   Start", hi, Color::Reset);
        self.front.put_str(8, menu_base + 1, "  Q     Quit", Color::White, Color::Reset);

        let help = [
            "How to play",
            "  ←↑↓→ / WASD   Move",
            "  SPACE         Drop bomb",
            "  P             Pause       R  Restart",
            "",
            "  Clear every enemy. Crates hide powerups:",
            "  ◈S speed   ◈B extra bomb   ◈R blast range",
        ];
        let help_base = menu_base + 3;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 {
                Color::Rgb { r: 255, g: 200, b: 50 }
            } else {
                Color::White
            };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }
    }

    fn compose_finished(&mut self, s: &Session) {
        let (art, color) = if s.outcome == Outcome::Victory {
            (
                [
                    "╔═══════════════════════════════╗",
                    "║     ★ ARENA  CLEARED ★       ║",
                    "╚═══════════════════════════════╝",
                ],
                Color::Rgb { r: 255, g: 220, b: 50 },
            )
        } else {
            (
                [
                    "╔═══════════════════════════════╗",
                    "║      ✕ GAME  OVER ✕          ║",
                    "╚═══════════════════════════════╝",
                ],
                Color::Rgb { r: 255, g: 60, b: 60 },
            )
        };
        for (i, l) in art.iter().enumerate() {
            self.front.put_str(6, 4 + i, l, color, Color::Reset);
        }

        let score = format!("◈ Final Score: {}", s.score);
        self.front.put_str(8, 9, &score, Color::White, Color::Reset);
        if s.outcome != Outcome::Victory {
            let left = format!("◈ Enemies left: {}", s.enemies.len());
            self.front.put_str(8, 10, &left, Color::White, Color::Reset);
        }
        self.front.put_str(8, 12, "▸ ENTER: Play Again", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        self.front.put_str(8, 13, "▸ ESC:   Back to Title", Color::DarkGrey, Color::Reset);
    }

    fn compose_pause_overlay(&mut self, s: &Session) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let view_cols = s.grid.width() * CELL_W;
        let box_w = 24_usize.min(view_cols.max(24));
        let box_h = 7;
        let box_x = view_cols.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + s.grid.height().saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::Reset, dim));
            }
        }

        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };
        self.front.put_str(box_x + 3, box_y + 1, "▶  PAUSED  ◀", hdr, dim);
        self.front.put_str(box_x + 3, box_y + 3, "P    Resume", key_c, dim);
        self.front.put_str(box_x + 3, box_y + 4, "R    Restart", key_c, dim);
        self.front.put_str(box_x + 3, box_y + 5, "ESC  Title", key_c, dim);
    }
}
