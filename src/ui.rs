use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Modifier, Style},
    Terminal,
};
use std::io::stdout;
use std::time::{Duration, Instant};

use crate::config::current_accent_color;
use crate::wm::Geometry;

pub type Term = Terminal<CrosstermBackend<std::io::Stdout>>;

// ── Terminal setup / teardown ─────────────────────────────────────────────────

pub fn init_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

pub fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Mouse reporting for as long as the guard lives.
pub struct MouseCapture;

impl MouseCapture {
    pub fn enable() -> Result<Self> {
        execute!(stdout(), EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for MouseCapture {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture);
    }
}

// ── Color helpers ─────────────────────────────────────────────────────────────

pub fn normal_style()   -> Style { Style::default().fg(current_accent_color()) }
pub fn sel_style()      -> Style { Style::default().fg(Color::Black).bg(current_accent_color()).add_modifier(Modifier::BOLD) }
pub fn title_style()    -> Style { Style::default().fg(current_accent_color()).add_modifier(Modifier::BOLD) }
pub fn dim_style()      -> Style { Style::default().fg(current_accent_color()).add_modifier(Modifier::DIM) }
pub fn error_style()    -> Style { Style::default().fg(Color::Red).add_modifier(Modifier::BOLD) }

// ── Geometry helpers ──────────────────────────────────────────────────────────

pub fn point_in_rect(x: u16, y: u16, r: Rect) -> bool {
    x >= r.x && x < r.x.saturating_add(r.width) && y >= r.y && y < r.y.saturating_add(r.height)
}

/// Portion of `geometry` that lies inside `area`, or None when nothing is visible.
pub fn clip(geometry: Geometry, area: Rect) -> Option<Rect> {
    let left = i64::from(geometry.x).max(i64::from(area.x));
    let top = i64::from(geometry.y).max(i64::from(area.y));
    let right = (i64::from(geometry.x) + i64::from(geometry.width))
        .min(i64::from(area.x) + i64::from(area.width));
    let bottom = (i64::from(geometry.y) + i64::from(geometry.height))
        .min(i64::from(area.y) + i64::from(area.height));
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect {
        x: left as u16,
        y: top as u16,
        width: (right - left) as u16,
        height: (bottom - top) as u16,
    })
}

pub fn write_text(buf: &mut [char], start: usize, text: &str) {
    for (i, ch) in text.chars().enumerate() {
        let idx = start + i;
        if idx >= buf.len() {
            break;
        }
        buf[idx] = ch;
    }
}

/// Keep the last `max` chars of `text`, which is what a narrow input line shows.
pub fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(max)).collect()
}

// ── Ticker ────────────────────────────────────────────────────────────────────

/// Fires at most once per period. Dropping it stops the ticks.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    last: Instant,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last: Instant::now(),
        }
    }

    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> bool {
        if now.duration_since(self.last) >= self.period {
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Time left until the next tick is due.
    pub fn remaining(&self) -> Duration {
        self.period.saturating_sub(self.last.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom(x: i32, y: i32, width: i32, height: i32) -> Geometry {
        Geometry {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn clip_keeps_inside_part() {
        let area = Rect::new(0, 1, 80, 22);
        assert_eq!(clip(geom(70, 20, 30, 10), area), Some(Rect::new(70, 20, 10, 3)));
        assert_eq!(clip(geom(5, 5, 10, 4), area), Some(Rect::new(5, 5, 10, 4)));
    }

    #[test]
    fn clip_drops_fully_outside() {
        let area = Rect::new(0, 1, 80, 22);
        assert_eq!(clip(geom(100, 5, 10, 4), area), None);
        assert_eq!(clip(geom(-20, 5, 10, 4), area), None);
    }

    #[test]
    fn write_text_truncates_at_buffer_end() {
        let mut row = vec![' '; 5];
        write_text(&mut row, 3, "abc");
        assert_eq!(row.into_iter().collect::<String>(), "   ab");
    }

    #[test]
    fn tail_chars_counts_chars_not_bytes() {
        assert_eq!(tail_chars("città", 3), "ttà");
        assert_eq!(tail_chars("ab", 5), "ab");
    }

    #[test]
    fn ticker_fires_once_per_period() {
        let mut ticker = Ticker::new(Duration::from_secs(1));
        let start = ticker.last;
        assert!(!ticker.poll_at(start + Duration::from_millis(500)));
        assert!(ticker.poll_at(start + Duration::from_millis(1000)));
        assert!(!ticker.poll_at(start + Duration::from_millis(1500)));
        assert!(ticker.poll_at(start + Duration::from_millis(2100)));
    }
}
