use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::rc::Rc;

use crate::apps::{
    confirmation_answer, edit_line, AppEvent, Confirmation, DrawContext, Toast, CONFIRM_HINT,
};
use crate::i18n::{tr, TextKey};
use crate::ui::{
    dim_style, error_style, normal_style, point_in_rect, sel_style, tail_chars, title_style,
};

pub const DISCARD_PROMPT: &str = "Il file corrente non è salvato. Continuare?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    pub name: String,
    pub content: String,
    pub modified: Option<DateTime<Local>>,
}

impl SavedDocument {
    fn seed(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            content: content.to_string(),
            modified: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotepadFocus {
    Editor,
    FileName,
    Documents,
}

impl NotepadFocus {
    fn next(self) -> Self {
        match self {
            NotepadFocus::Editor => NotepadFocus::FileName,
            NotepadFocus::FileName => NotepadFocus::Documents,
            NotepadFocus::Documents => NotepadFocus::Editor,
        }
    }
}

/// What happens once the user agrees to drop unsaved edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingDiscard {
    New,
    Open(usize),
}

/// Toolbar, body, status line.
fn split_rows(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area)
}

/// Saved documents on the left, editor on the right.
fn split_columns(body: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(18), Constraint::Min(1)])
        .split(body)
}

fn documents_block() -> Block<'static> {
    Block::default()
        .borders(Borders::RIGHT)
        .title(Span::styled("File salvati", title_style()))
}

pub struct NotepadApp {
    content: String,
    filename: String,
    modified: bool,
    documents: Vec<SavedDocument>,
    focus: NotepadFocus,
    selected_doc: usize,
    confirm: Confirmation<PendingDiscard>,
}

impl Default for NotepadApp {
    fn default() -> Self {
        Self::new()
    }
}

impl NotepadApp {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            filename: String::new(),
            modified: false,
            documents: vec![
                SavedDocument::seed(
                    "welcome.txt",
                    "Benvenuto in FutureOS!\n\nQuesto è un file di esempio.",
                ),
                SavedDocument::seed(
                    "notes.txt",
                    "Le mie note:\n\n- FutureOS è fantastico\n- Il notepad funziona perfettamente",
                ),
            ],
            focus: NotepadFocus::Editor,
            selected_doc: 0,
            confirm: Confirmation::default(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn documents(&self) -> &[SavedDocument] {
        &self.documents
    }

    pub fn focus(&self) -> NotepadFocus {
        self.focus
    }

    pub fn pending(&self) -> Option<PendingDiscard> {
        self.confirm.pending().copied()
    }

    pub fn set_filename(&mut self, name: &str) {
        self.filename = name.to_string();
    }

    pub fn insert_char(&mut self, c: char) {
        self.content.push(c);
        self.modified = true;
    }

    pub fn delete_char(&mut self) {
        if self.content.pop().is_some() {
            self.modified = true;
        }
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    /// Store the buffer under its file name, replacing a document of the same name.
    pub fn save(&mut self) -> AppEvent {
        let base = self.filename.trim();
        if base.is_empty() {
            return AppEvent::Notify(Toast::error("Errore", "Specificare un nome per il file"));
        }
        let name = if base.ends_with(".txt") {
            base.to_string()
        } else {
            format!("{base}.txt")
        };
        let doc = SavedDocument {
            name: name.clone(),
            content: self.content.clone(),
            modified: Some(Local::now()),
        };
        match self.documents.iter_mut().find(|d| d.name == name) {
            Some(existing) => *existing = doc,
            None => self.documents.push(doc),
        }
        self.modified = false;
        tracing::info!(file = %name, "notepad document saved");
        AppEvent::Notify(Toast::info(
            "File salvato",
            format!("{name} è stato salvato con successo"),
        ))
    }

    pub fn new_document(&mut self) {
        if self.modified {
            self.confirm.request(PendingDiscard::New);
        } else {
            self.apply(PendingDiscard::New);
        }
    }

    pub fn open_document(&mut self, index: usize) {
        if index >= self.documents.len() {
            return;
        }
        if self.modified {
            self.confirm.request(PendingDiscard::Open(index));
        } else {
            self.apply(PendingDiscard::Open(index));
        }
    }

    pub fn resolve_confirmation(&mut self, accepted: bool) {
        if let Some(action) = self.confirm.resolve(accepted) {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: PendingDiscard) {
        match action {
            PendingDiscard::New => {
                self.content.clear();
                self.filename.clear();
            }
            PendingDiscard::Open(index) => {
                let Some(doc) = self.documents.get(index) else {
                    return;
                };
                self.content = doc.content.clone();
                self.filename = doc.name.replacen(".txt", "", 1);
                self.focus = NotepadFocus::Editor;
            }
        }
        self.modified = false;
    }

    /// Index of the saved document listed under `(x, y)`.
    pub fn item_at(&self, x: u16, y: u16, area: Rect) -> Option<usize> {
        if area.width < 10 || area.height < 4 || self.confirm.is_pending() {
            return None;
        }
        let list = documents_block().inner(split_columns(split_rows(area)[1])[0]);
        if !point_in_rect(x, y, list) {
            return None;
        }
        let index = usize::from(y - list.y);
        (index < self.documents.len()).then_some(index)
    }

    /// A click highlights a saved document; a double click opens it.
    pub fn click_item(&mut self, index: usize, double: bool) {
        if index >= self.documents.len() {
            return;
        }
        self.focus = NotepadFocus::Documents;
        self.selected_doc = index;
        if double {
            self.open_document(index);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        if self.confirm.is_pending() {
            if let Some(answer) = confirmation_answer(&key) {
                self.resolve_confirmation(answer);
            }
            return AppEvent::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => return self.save(),
                KeyCode::Char('n') => self.new_document(),
                _ => {}
            }
            return AppEvent::None;
        }

        if key.code == KeyCode::Tab {
            self.focus = self.focus.next();
            return AppEvent::None;
        }

        match self.focus {
            NotepadFocus::Editor => match key.code {
                KeyCode::Enter => self.insert_char('\n'),
                KeyCode::Char(c) => self.insert_char(c),
                KeyCode::Backspace => self.delete_char(),
                _ => {}
            },
            NotepadFocus::FileName => match key.code {
                KeyCode::Enter => return self.save(),
                _ => {
                    edit_line(&mut self.filename, &key);
                }
            },
            NotepadFocus::Documents => match key.code {
                KeyCode::Up => self.selected_doc = self.selected_doc.saturating_sub(1),
                KeyCode::Down => {
                    self.selected_doc =
                        (self.selected_doc + 1).min(self.documents.len().saturating_sub(1));
                }
                KeyCode::Enter => self.open_document(self.selected_doc),
                _ => {}
            },
        }
        AppEvent::None
    }

    pub fn draw(&self, f: &mut Frame, area: Rect, ctx: &DrawContext) {
        if area.width < 10 || area.height < 4 {
            return;
        }
        let rows = split_rows(area);

        let name_style = if self.focus == NotepadFocus::FileName {
            sel_style()
        } else {
            normal_style()
        };
        let name_shown = if self.filename.is_empty() && self.focus != NotepadFocus::FileName {
            "Nome file...".to_string()
        } else {
            self.filename.clone()
        };
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(
                    format!(
                        "[^N] {}  [^S] {}  [Tab] Focus  ",
                        tr(ctx.lang, TextKey::NewFile),
                        tr(ctx.lang, TextKey::Save)
                    ),
                    dim_style(),
                ),
                Span::styled(format!(" {name_shown} "), name_style),
            ])),
            rows[0],
        );

        let cols = split_columns(rows[1]);

        let doc_lines: Vec<Line> = self
            .documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let style = if self.focus == NotepadFocus::Documents && i == self.selected_doc {
                    sel_style()
                } else {
                    normal_style()
                };
                Line::from(Span::styled(doc.name.clone(), style))
            })
            .collect();
        f.render_widget(Paragraph::new(doc_lines).block(documents_block()), cols[0]);

        let editor = cols[1];
        if self.content.is_empty() {
            f.render_widget(
                Paragraph::new(Span::styled("Inizia a scrivere...", dim_style())),
                editor,
            );
        } else {
            let cursor = if ctx.focused && self.focus == NotepadFocus::Editor {
                "█"
            } else {
                ""
            };
            let text = format!("{}{cursor}", self.content);
            let lines: Vec<Line> = text
                .split('\n')
                .map(|l| Line::from(Span::styled(tail_chars(l, editor.width as usize), normal_style())))
                .collect();
            let skip = lines.len().saturating_sub(editor.height as usize);
            f.render_widget(
                Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>()),
                editor,
            );
        }

        let status = if self.confirm.is_pending() {
            Line::from(Span::styled(
                format!("{DISCARD_PROMPT} {CONFIRM_HINT}"),
                error_style(),
            ))
        } else {
            let mut spans = vec![Span::styled(
                format!(
                    "Caratteri: {}  Parole: {}",
                    self.char_count(),
                    self.word_count()
                ),
                dim_style(),
            )];
            if self.modified {
                spans.push(Span::styled("  ● Non salvato", title_style()));
            }
            if !self.filename.is_empty() {
                spans.push(Span::styled(
                    format!("  File: {}.txt", self.filename.trim_end_matches(".txt")),
                    dim_style(),
                ));
            }
            Line::from(spans)
        };
        f.render_widget(Paragraph::new(status), rows[2]);
    }
}
