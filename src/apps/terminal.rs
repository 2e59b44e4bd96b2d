use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::apps::{edit_line, AppEvent, DrawContext};
use crate::shell::{self, HistoryEntry};
use crate::ui::{dim_style, normal_style, title_style};
use crate::vfs::{VirtualFileTree, HOME_DIR};

const BANNER: [&str; 2] = [
    "Benvenuto in FutureOS Terminal v1.0.0",
    "Digita 'help' per vedere i comandi disponibili.",
];

pub struct TerminalApp {
    cwd: String,
    history: Vec<HistoryEntry>,
    input: String,
    submitted: Vec<String>,
    recall_pos: Option<usize>,
}

impl Default for TerminalApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalApp {
    pub fn new() -> Self {
        Self {
            cwd: HOME_DIR.to_string(),
            history: shell::seeded_history(Local::now()),
            input: String::new(),
            submitted: Vec::new(),
            recall_pos: None,
        }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Run the pending input line. Blank input is dropped without a history entry.
    pub fn submit(&mut self, fs: &VirtualFileTree) {
        let line = std::mem::take(&mut self.input);
        self.recall_pos = None;
        if line.trim().is_empty() {
            return;
        }
        tracing::debug!(command = %line, cwd = %self.cwd, "terminal command");
        shell::run_line(&line, &mut self.cwd, &mut self.history, fs, Local::now());
        self.submitted.push(line);
    }

    fn recall_previous(&mut self) {
        if self.submitted.is_empty() {
            return;
        }
        let pos = match self.recall_pos {
            Some(pos) => pos.saturating_sub(1),
            None => self.submitted.len() - 1,
        };
        self.recall_pos = Some(pos);
        self.input = self.submitted[pos].clone();
    }

    fn recall_next(&mut self) {
        let Some(pos) = self.recall_pos else {
            return;
        };
        if pos + 1 < self.submitted.len() {
            self.recall_pos = Some(pos + 1);
            self.input = self.submitted[pos + 1].clone();
        } else {
            self.recall_pos = None;
            self.input.clear();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, fs: &mut VirtualFileTree) -> AppEvent {
        match key.code {
            KeyCode::Enter => self.submit(fs),
            KeyCode::Up => self.recall_previous(),
            KeyCode::Down => self.recall_next(),
            _ => {
                if edit_line(&mut self.input, &key) {
                    self.recall_pos = None;
                }
            }
        }
        AppEvent::None
    }

    pub fn draw(&self, f: &mut Frame, area: Rect, ctx: &DrawContext) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let mut lines: Vec<Line> = BANNER
            .iter()
            .map(|l| Line::from(Span::styled(*l, title_style())))
            .collect();
        lines.push(Line::from(""));

        for entry in &self.history {
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", shell::prompt(&entry.directory)), dim_style()),
                Span::styled(entry.command.clone(), normal_style()),
            ]));
            for out in entry.output.lines() {
                lines.push(Line::from(Span::styled(format!("  {out}"), normal_style())));
            }
        }

        let cursor = if ctx.focused { "█" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", shell::prompt(&self.cwd)), dim_style()),
            Span::styled(format!("{}{cursor}", self.input), normal_style()),
        ]));

        // Without wrapping each Line is one row, so the tail is what fits.
        let skip = lines.len().saturating_sub(area.height as usize);
        let visible: Vec<Line> = lines.into_iter().skip(skip).collect();
        f.render_widget(Paragraph::new(visible), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn type_line(app: &mut TerminalApp, fs: &mut VirtualFileTree, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyEvent::from(KeyCode::Char(c)), fs);
        }
        app.handle_key(KeyEvent::from(KeyCode::Enter), fs);
    }

    #[test]
    fn starts_at_home_with_seeded_history() {
        let app = TerminalApp::new();
        assert_eq!(app.cwd(), HOME_DIR);
        let commands: Vec<&str> = app.history().iter().map(|e| e.command.as_str()).collect();
        assert_eq!(commands, ["ls", "pwd"]);
    }

    #[test]
    fn typed_commands_run_against_the_tree() {
        let mut fs = VirtualFileTree::seeded();
        let mut app = TerminalApp::new();
        type_line(&mut app, &mut fs, "cd Documents");
        assert_eq!(app.cwd(), "/home/user/Documents");
        type_line(&mut app, &mut fs, "ls");
        let last = app.history().last().unwrap();
        assert_eq!(last.output, "notes.txt  welcome.txt");
        assert_eq!(last.directory, "/home/user/Documents");
        assert!(app.input().is_empty());
    }

    #[test]
    fn blank_input_adds_nothing() {
        let mut fs = VirtualFileTree::seeded();
        let mut app = TerminalApp::new();
        let before = app.history().len();
        type_line(&mut app, &mut fs, "   ");
        assert_eq!(app.history().len(), before);
    }

    #[test]
    fn history_keeps_the_line_as_typed() {
        let mut fs = VirtualFileTree::seeded();
        let mut app = TerminalApp::new();
        type_line(&mut app, &mut fs, "  pwd ");
        let last = app.history().last().unwrap();
        assert_eq!(last.command, "  pwd ");
        assert_eq!(last.output, HOME_DIR);
    }

    #[test]
    fn clear_empties_history() {
        let mut fs = VirtualFileTree::seeded();
        let mut app = TerminalApp::new();
        type_line(&mut app, &mut fs, "clear");
        assert!(app.history().is_empty());
    }

    #[test]
    fn arrows_recall_submitted_lines() {
        let mut fs = VirtualFileTree::seeded();
        let mut app = TerminalApp::new();
        type_line(&mut app, &mut fs, "pwd");
        type_line(&mut app, &mut fs, "whoami");
        app.handle_key(KeyEvent::from(KeyCode::Up), &mut fs);
        assert_eq!(app.input(), "whoami");
        app.handle_key(KeyEvent::from(KeyCode::Up), &mut fs);
        assert_eq!(app.input(), "pwd");
        app.handle_key(KeyEvent::from(KeyCode::Up), &mut fs);
        assert_eq!(app.input(), "pwd");
        app.handle_key(KeyEvent::from(KeyCode::Down), &mut fs);
        assert_eq!(app.input(), "whoami");
        app.handle_key(KeyEvent::from(KeyCode::Down), &mut fs);
        assert_eq!(app.input(), "");
    }

    #[test]
    fn draws_prompt_with_current_directory() {
        let fs = VirtualFileTree::seeded();
        let app = TerminalApp::new();
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        let ctx = DrawContext {
            fs: &fs,
            lang: crate::i18n::Language::It,
            focused: true,
            uptime: Duration::ZERO,
        };
        terminal.draw(|f| app.draw(f, f.area(), &ctx)).unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("user@futureos:/home/user$"));
        assert!(text.contains("Benvenuto in FutureOS Terminal"));
    }
}
