//! Browser over the shared virtual tree.
//!
//! Creating folders and files writes to the same tree the terminal reads, so a
//! folder made here shows up in `ls`. Deletion is only acknowledged and never
//! touches the tree.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::apps::{
    confirmation_answer, edit_line, AppEvent, Confirmation, DrawContext, Toast, CONFIRM_HINT,
};
use crate::i18n::{tr, TextKey};
use crate::ui::{dim_style, error_style, normal_style, point_in_rect, sel_style, title_style};
use crate::vfs::{self, Entry, EntryKind, VfsError, VirtualFileTree, HOME_DIR, ROOT};

pub const GRID_COLUMNS: usize = 4;
const GRID_CELL_WIDTH: usize = 18;

/// Toolbar, path, body, footer.
fn split_rows(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewItemKind {
    Folder,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItemDialog {
    pub kind: NewItemKind,
    pub name: String,
}

pub struct FileManagerApp {
    cwd: String,
    cursor: usize,
    selected: BTreeSet<String>,
    view: ViewMode,
    dialog: Option<NewItemDialog>,
    confirm: Confirmation<usize>,
}

impl Default for FileManagerApp {
    fn default() -> Self {
        Self::new()
    }
}

impl FileManagerApp {
    pub fn new() -> Self {
        Self {
            cwd: HOME_DIR.to_string(),
            cursor: 0,
            selected: BTreeSet::new(),
            view: ViewMode::Grid,
            dialog: None,
            confirm: Confirmation::default(),
        }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn dialog(&self) -> Option<&NewItemDialog> {
        self.dialog.as_ref()
    }

    pub fn delete_pending(&self) -> bool {
        self.confirm.is_pending()
    }

    pub fn can_go_up(&self) -> bool {
        self.cwd != ROOT
    }

    fn entries(&self, fs: &VirtualFileTree) -> Vec<Entry> {
        fs.list(&self.cwd).unwrap_or_default()
    }

    /// Switch to `path` when it names a folder. Returns false otherwise.
    pub fn navigate(&mut self, path: &str, fs: &VirtualFileTree) -> bool {
        if !fs.is_folder(path) {
            return false;
        }
        self.cwd = vfs::normalize(ROOT, path);
        self.selected.clear();
        self.cursor = 0;
        true
    }

    pub fn go_up(&mut self, fs: &VirtualFileTree) {
        if self.can_go_up() {
            let parent = vfs::parent(&self.cwd);
            self.navigate(&parent, fs);
        }
    }

    pub fn open_entry(&mut self, name: &str, fs: &VirtualFileTree) -> AppEvent {
        let path = vfs::join(&self.cwd, name);
        if fs.is_folder(&path) {
            self.navigate(&path, fs);
            AppEvent::None
        } else if fs.read_file(&path).is_some() {
            AppEvent::Notify(Toast::info(
                "File aperto",
                format!("Apertura di {name} (simulazione)"),
            ))
        } else {
            AppEvent::None
        }
    }

    pub fn toggle_selection(&mut self, name: &str) {
        if !self.selected.remove(name) {
            self.selected.insert(name.to_string());
        }
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        };
    }

    pub fn begin_create(&mut self, kind: NewItemKind) {
        self.dialog = Some(NewItemDialog {
            kind,
            name: String::new(),
        });
    }

    pub fn cancel_create(&mut self) {
        self.dialog = None;
    }

    /// Insert the dialog's item into the tree. A blank name does nothing; a
    /// clash leaves the dialog open so the name can be changed.
    pub fn create(&mut self, fs: &mut VirtualFileTree) -> AppEvent {
        let Some(dialog) = self.dialog.as_ref() else {
            return AppEvent::None;
        };
        let name = dialog.name.trim().to_string();
        if name.is_empty() {
            return AppEvent::None;
        }
        let result = match dialog.kind {
            NewItemKind::Folder => fs.create_folder(&self.cwd, &name),
            NewItemKind::File => fs.create_file(&self.cwd, &name, ""),
        };
        match result {
            Ok(()) => {
                let label = match dialog.kind {
                    NewItemKind::Folder => "Cartella",
                    NewItemKind::File => "File",
                };
                tracing::info!(path = %vfs::join(&self.cwd, &name), "created {label}");
                self.dialog = None;
                AppEvent::Notify(Toast::info(
                    format!("{label} creata"),
                    format!("{name} è stata creata con successo"),
                ))
            }
            Err(VfsError::AlreadyExists(_)) => AppEvent::Notify(Toast::error(
                "Errore",
                "Un elemento con questo nome esiste già",
            )),
            Err(err) => {
                tracing::warn!(error = %err, "file manager create failed");
                AppEvent::Notify(Toast::error("Errore", "Nome non valido"))
            }
        }
    }

    pub fn request_delete(&mut self) {
        if !self.selected.is_empty() {
            self.confirm.request(self.selected.len());
        }
    }

    pub fn resolve_delete(&mut self, accepted: bool) -> AppEvent {
        match self.confirm.resolve(accepted) {
            Some(count) => {
                self.selected.clear();
                AppEvent::Notify(Toast::info(
                    "Elementi eliminati",
                    format!("{count} elementi eliminati (simulazione)"),
                ))
            }
            None => AppEvent::None,
        }
    }

    fn move_cursor(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }

    pub fn handle_key(&mut self, key: KeyEvent, fs: &mut VirtualFileTree) -> AppEvent {
        if self.confirm.is_pending() {
            return match confirmation_answer(&key) {
                Some(answer) => self.resolve_delete(answer),
                None => AppEvent::None,
            };
        }

        if let Some(dialog) = self.dialog.as_mut() {
            match key.code {
                KeyCode::Enter => return self.create(fs),
                KeyCode::Esc => self.cancel_create(),
                _ => {
                    edit_line(&mut dialog.name, &key);
                }
            }
            return AppEvent::None;
        }

        let entries = self.entries(fs);
        let row = match self.view {
            ViewMode::Grid => GRID_COLUMNS as isize,
            ViewMode::List => 1,
        };
        match key.code {
            KeyCode::Up => self.move_cursor(-row, entries.len()),
            KeyCode::Down => self.move_cursor(row, entries.len()),
            KeyCode::Left => self.move_cursor(-1, entries.len()),
            KeyCode::Right => self.move_cursor(1, entries.len()),
            KeyCode::Enter => {
                if let Some(entry) = entries.get(self.cursor) {
                    let name = entry.name.clone();
                    return self.open_entry(&name, fs);
                }
            }
            KeyCode::Char(' ') => {
                if let Some(entry) = entries.get(self.cursor) {
                    let name = entry.name.clone();
                    self.toggle_selection(&name);
                }
            }
            KeyCode::Backspace => self.go_up(fs),
            KeyCode::Char('d') => self.begin_create(NewItemKind::Folder),
            KeyCode::Char('f') => self.begin_create(NewItemKind::File),
            KeyCode::Char('v') => self.toggle_view(),
            KeyCode::Delete | KeyCode::Char('x') => self.request_delete(),
            _ => {}
        }
        AppEvent::None
    }

    /// Body rows scrolled off the top so the cursor stays in view.
    fn scroll_skip(&self, body_height: u16) -> usize {
        let cursor_row = match self.view {
            ViewMode::Grid => self.cursor / GRID_COLUMNS,
            ViewMode::List => self.cursor,
        };
        (cursor_row + 1).saturating_sub(body_height as usize)
    }

    /// Index of the entry drawn under `(x, y)` when the app occupies `area`.
    pub fn item_at(&self, x: u16, y: u16, area: Rect, fs: &VirtualFileTree) -> Option<usize> {
        if area.width < 10 || area.height < 4 || self.dialog.is_some() || self.confirm.is_pending()
        {
            return None;
        }
        let body = split_rows(area)[2];
        if !point_in_rect(x, y, body) {
            return None;
        }
        let row = usize::from(y - body.y) + self.scroll_skip(body.height);
        let index = match self.view {
            ViewMode::Grid => {
                let col = usize::from(x - body.x) / GRID_CELL_WIDTH;
                if col >= GRID_COLUMNS {
                    return None;
                }
                row * GRID_COLUMNS + col
            }
            ViewMode::List => row,
        };
        (index < self.entries(fs).len()).then_some(index)
    }

    /// A click moves the cursor and toggles selection; a double click also opens.
    pub fn click_item(&mut self, index: usize, double: bool, fs: &VirtualFileTree) -> AppEvent {
        let Some(entry) = self.entries(fs).into_iter().nth(index) else {
            return AppEvent::None;
        };
        self.cursor = index;
        self.toggle_selection(&entry.name);
        if double {
            self.open_entry(&entry.name, fs)
        } else {
            AppEvent::None
        }
    }

    pub fn draw(&self, f: &mut Frame, area: Rect, ctx: &DrawContext) {
        if area.width < 10 || area.height < 4 {
            return;
        }
        let rows = split_rows(area);

        let back = if self.can_go_up() { "[Bksp] Indietro" } else { "" };
        let mut toolbar = format!(
            "{back}  [d] {}  [f] {}  [v] Vista",
            tr(ctx.lang, TextKey::NewFolder),
            tr(ctx.lang, TextKey::NewFile)
        );
        if !self.selected.is_empty() {
            toolbar.push_str(&format!(
                "  [x] {} ({})",
                tr(ctx.lang, TextKey::Delete),
                self.selected.len()
            ));
        }
        f.render_widget(Paragraph::new(Span::styled(toolbar, dim_style())), rows[0]);
        f.render_widget(
            Paragraph::new(Span::styled(format!(" {} ", self.cwd), title_style())),
            rows[1],
        );

        let entries = self.entries(ctx.fs);
        if entries.is_empty() {
            f.render_widget(
                Paragraph::new(Span::styled("Cartella vuota", dim_style())),
                rows[2],
            );
        } else {
            let lines = match self.view {
                ViewMode::Grid => self.grid_lines(&entries),
                ViewMode::List => self.list_lines(&entries, rows[2].width as usize),
            };
            let skip = self.scroll_skip(rows[2].height);
            f.render_widget(
                Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>()),
                rows[2],
            );
        }

        let footer = if self.confirm.is_pending() {
            Line::from(Span::styled(
                format!("Eliminare {} elementi? {CONFIRM_HINT}", self.selected.len()),
                error_style(),
            ))
        } else if let Some(dialog) = &self.dialog {
            let kind = match dialog.kind {
                NewItemKind::Folder => "cartella",
                NewItemKind::File => "file",
            };
            Line::from(vec![
                Span::styled(format!("Crea nuovo {kind}: "), title_style()),
                Span::styled(format!("{}█", dialog.name), sel_style()),
            ])
        } else {
            Line::from(Span::styled(
                format!(
                    "{} elementi  [Invio] {}",
                    entries.len(),
                    tr(ctx.lang, TextKey::Open)
                ),
                dim_style(),
            ))
        };
        f.render_widget(Paragraph::new(footer), rows[3]);
    }

    fn entry_style(&self, index: usize, entry: &Entry) -> ratatui::style::Style {
        if index == self.cursor {
            sel_style()
        } else if self.selected.contains(&entry.name) {
            title_style()
        } else {
            normal_style()
        }
    }

    fn grid_lines(&self, entries: &[Entry]) -> Vec<Line<'static>> {
        entries
            .chunks(GRID_COLUMNS)
            .enumerate()
            .map(|(row, chunk)| {
                let spans: Vec<Span> = chunk
                    .iter()
                    .enumerate()
                    .map(|(col, entry)| {
                        let index = row * GRID_COLUMNS + col;
                        let mark = if self.selected.contains(&entry.name) { '*' } else { ' ' };
                        let mut cell = format!("{mark}{} {}", file_icon(entry), entry.name);
                        cell = cell.chars().take(GRID_CELL_WIDTH - 1).collect();
                        Span::styled(
                            format!("{cell:<width$}", width = GRID_CELL_WIDTH),
                            self.entry_style(index, entry),
                        )
                    })
                    .collect();
                Line::from(spans)
            })
            .collect()
    }

    fn list_lines(&self, entries: &[Entry], width: usize) -> Vec<Line<'static>> {
        let name_width = width.saturating_sub(32).max(8);
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let mark = if self.selected.contains(&entry.name) { '*' } else { ' ' };
                let size = match entry.kind {
                    EntryKind::File => format_file_size(entry.size.unwrap_or(0)),
                    EntryKind::Folder => "-".to_string(),
                };
                let modified = entry
                    .modified
                    .map(|m| m.format("%d/%m/%Y %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let name: String = entry.name.chars().take(name_width).collect();
                Line::from(Span::styled(
                    format!(
                        "{mark}{} {name:<name_width$} {size:>9}  {modified}",
                        file_icon(entry)
                    ),
                    self.entry_style(index, entry),
                ))
            })
            .collect()
    }
}

/// Glyph for an entry, chosen from the extension for files.
pub fn file_icon(entry: &Entry) -> &'static str {
    if entry.kind == EntryKind::Folder {
        return "[D]";
    }
    let ext = entry
        .name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "js" | "jsx" | "ts" | "tsx" => "[S]",
        "png" | "jpg" | "jpeg" | "gif" => "[I]",
        "mp3" | "wav" => "[A]",
        "mp4" | "avi" => "[V]",
        _ => "[T]",
    }
}

/// Human size with one decimal above a kilobyte. Zero shows as "-".
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    match size {
        0 => "-".to_string(),
        s if s < KB => format!("{s} B"),
        s if s < MB => format!("{:.1} KB", s as f64 / KB as f64),
        s => format!("{:.1} MB", s as f64 / MB as f64),
    }
}
