use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::time::Duration;

use crate::i18n::{tr, Language, TextKey, LANGUAGES};
use crate::ui::{dim_style, normal_style, sel_style, title_style, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    Pending,
    Chosen(Language),
    Quit,
}

/// Language picker shown once before the desktop.
#[derive(Debug, Clone, Default)]
pub struct SetupState {
    selected: usize,
}

impl SetupState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlighted(&self) -> Language {
        LANGUAGES[self.selected]
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SetupOutcome {
        match key.code {
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                SetupOutcome::Pending
            }
            KeyCode::Down | KeyCode::Tab => {
                self.selected = (self.selected + 1).min(LANGUAGES.len() - 1);
                SetupOutcome::Pending
            }
            KeyCode::Enter => SetupOutcome::Chosen(self.highlighted()),
            KeyCode::Esc => SetupOutcome::Quit,
            KeyCode::Char('q') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                SetupOutcome::Quit
            }
            _ => SetupOutcome::Pending,
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        let size = f.area();
        f.render_widget(Clear, size);
        let lang = self.highlighted();

        let width = 40.min(size.width);
        let height = (LANGUAGES.len() as u16 + 7).min(size.height);
        let panel = Rect {
            x: size.x + size.width.saturating_sub(width) / 2,
            y: size.y + size.height.saturating_sub(height) / 2,
            width,
            height,
        };
        f.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .style(normal_style())
                .title(Span::styled(" FutureOS ", title_style())),
            panel,
        );

        let inner = Rect {
            x: panel.x + 1,
            y: panel.y + 1,
            width: panel.width.saturating_sub(2),
            height: panel.height.saturating_sub(2),
        };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(inner);

        f.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(tr(lang, TextKey::Welcome), title_style())),
                Line::from(Span::styled(tr(lang, TextKey::SelectLanguage), dim_style())),
            ])
            .alignment(Alignment::Center),
            rows[0],
        );

        let choices: Vec<Line> = LANGUAGES
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let style = if i == self.selected { sel_style() } else { normal_style() };
                Line::from(Span::styled(format!("  {}  ", l.native_name()), style))
            })
            .collect();
        f.render_widget(
            Paragraph::new(choices).alignment(Alignment::Center),
            rows[1],
        );
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("[Enter] {}", tr(lang, TextKey::Continue)),
                dim_style(),
            ))
            .alignment(Alignment::Center),
            rows[2],
        );
    }
}

/// Block until a language is chosen. `None` means the user quit.
pub fn run_setup(terminal: &mut Term) -> Result<Option<Language>> {
    let mut state = SetupState::new();
    loop {
        terminal.draw(|f| state.draw(f))?;
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match state.handle_key(key) {
                SetupOutcome::Pending => {}
                SetupOutcome::Chosen(lang) => {
                    tracing::info!(language = %lang, "language selected");
                    return Ok(Some(lang));
                }
                SetupOutcome::Quit => return Ok(None),
            }
        }
    }
}
