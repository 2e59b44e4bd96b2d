pub mod file_manager;
pub mod notepad;
pub mod settings;
pub mod terminal;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{layout::Rect, Frame};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::i18n::{Language, TextKey};
use crate::vfs::VirtualFileTree;

pub use file_manager::FileManagerApp;
pub use notepad::NotepadApp;
pub use settings::SettingsApp;
pub use terminal::TerminalApp;

// ── App identity ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AppId {
    Terminal,
    Notepad,
    FileManager,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown application: {0}")]
pub struct UnknownApp(pub String);

impl AppId {
    pub const ALL: [AppId; 4] = [
        AppId::Terminal,
        AppId::Notepad,
        AppId::FileManager,
        AppId::Settings,
    ];

    /// Stable identifier used in window ids and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            AppId::Terminal => "terminal",
            AppId::Notepad => "notepad",
            AppId::FileManager => "filemanager",
            AppId::Settings => "settings",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            AppId::Terminal => "[>_]",
            AppId::Notepad => "[Ed]",
            AppId::FileManager => "[Fs]",
            AppId::Settings => "[**]",
        }
    }

    pub fn title_key(self) -> TextKey {
        match self {
            AppId::Terminal => TextKey::Terminal,
            AppId::Notepad => TextKey::Notepad,
            AppId::FileManager => TextKey::FileManager,
            AppId::Settings => TextKey::Settings,
        }
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AppId {
    type Err = UnknownApp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        AppId::ALL
            .into_iter()
            .find(|app| app.key() == folded)
            .ok_or_else(|| UnknownApp(s.to_string()))
    }
}

// ── Events flowing back to the desktop ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub body: String,
}

impl Toast {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    None,
    Notify(Toast),
}

// ── Pending confirmation ──────────────────────────────────────────────────────

/// A destructive action waiting for a yes/no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation<A> {
    None,
    Pending(A),
}

impl<A> Default for Confirmation<A> {
    fn default() -> Self {
        Confirmation::None
    }
}

impl<A> Confirmation<A> {
    pub fn request(&mut self, action: A) {
        *self = Confirmation::Pending(action);
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Confirmation::Pending(_))
    }

    pub fn pending(&self) -> Option<&A> {
        match self {
            Confirmation::Pending(action) => Some(action),
            Confirmation::None => None,
        }
    }

    /// Resolve with the user's answer; yields the action only when accepted.
    pub fn resolve(&mut self, accepted: bool) -> Option<A> {
        match std::mem::take(self) {
            Confirmation::Pending(action) if accepted => Some(action),
            _ => None,
        }
    }
}

/// Map a key press to a yes/no answer for a pending confirmation.
pub fn confirmation_answer(key: &KeyEvent) -> Option<bool> {
    match key.code {
        KeyCode::Enter | KeyCode::Char('y' | 'Y' | 's' | 'S') => Some(true),
        KeyCode::Esc | KeyCode::Char('n' | 'N') => Some(false),
        _ => None,
    }
}

pub const CONFIRM_HINT: &str = "[S]ì / [N]o";

/// Apply a plain text-entry key to `buf`. Returns true when `buf` changed.
pub fn edit_line(buf: &mut String, key: &KeyEvent) -> bool {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return false;
    }
    match key.code {
        KeyCode::Char(c) => {
            buf.push(c);
            true
        }
        KeyCode::Backspace => buf.pop().is_some(),
        _ => false,
    }
}

// ── Instances ─────────────────────────────────────────────────────────────────

/// What an app needs to know to draw itself.
pub struct DrawContext<'a> {
    pub fs: &'a VirtualFileTree,
    pub lang: Language,
    pub focused: bool,
    pub uptime: Duration,
}

pub enum AppInstance {
    Terminal(TerminalApp),
    Notepad(NotepadApp),
    FileManager(FileManagerApp),
    Settings(SettingsApp),
}

impl AppInstance {
    pub fn launch(app: AppId, lang: Language) -> Self {
        match app {
            AppId::Terminal => AppInstance::Terminal(TerminalApp::new()),
            AppId::Notepad => AppInstance::Notepad(NotepadApp::new()),
            AppId::FileManager => AppInstance::FileManager(FileManagerApp::new()),
            AppId::Settings => AppInstance::Settings(SettingsApp::new(lang)),
        }
    }

    pub fn id(&self) -> AppId {
        match self {
            AppInstance::Terminal(_) => AppId::Terminal,
            AppInstance::Notepad(_) => AppId::Notepad,
            AppInstance::FileManager(_) => AppId::FileManager,
            AppInstance::Settings(_) => AppId::Settings,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, fs: &mut VirtualFileTree) -> AppEvent {
        match self {
            AppInstance::Terminal(app) => app.handle_key(key, fs),
            AppInstance::Notepad(app) => app.handle_key(key),
            AppInstance::FileManager(app) => app.handle_key(key, fs),
            AppInstance::Settings(app) => app.handle_key(key),
        }
    }

    /// Clickable item under `(x, y)` when the app is drawn into `area`.
    pub fn item_at(&self, x: u16, y: u16, area: Rect, fs: &VirtualFileTree) -> Option<usize> {
        match self {
            AppInstance::Terminal(_) => None,
            AppInstance::Notepad(app) => app.item_at(x, y, area),
            AppInstance::FileManager(app) => app.item_at(x, y, area, fs),
            AppInstance::Settings(app) => app.item_at(x, y, area),
        }
    }

    pub fn click_item(&mut self, index: usize, double: bool, fs: &VirtualFileTree) -> AppEvent {
        match self {
            AppInstance::Terminal(_) => AppEvent::None,
            AppInstance::Notepad(app) => {
                app.click_item(index, double);
                AppEvent::None
            }
            AppInstance::FileManager(app) => app.click_item(index, double, fs),
            AppInstance::Settings(app) => app.click_item(index, double),
        }
    }

    pub fn draw(&self, f: &mut Frame, area: Rect, ctx: &DrawContext) {
        match self {
            AppInstance::Terminal(app) => app.draw(f, area, ctx),
            AppInstance::Notepad(app) => app.draw(f, area, ctx),
            AppInstance::FileManager(app) => app.draw(f, area, ctx),
            AppInstance::Settings(app) => app.draw(f, area, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_ids_parse_from_keys_and_component_names() {
        assert_eq!("terminal".parse::<AppId>(), Ok(AppId::Terminal));
        assert_eq!("FileManager".parse::<AppId>(), Ok(AppId::FileManager));
        assert_eq!("file-manager".parse::<AppId>(), Ok(AppId::FileManager));
        assert_eq!("Settings".parse::<AppId>(), Ok(AppId::Settings));
    }

    #[test]
    fn unknown_app_ids_are_rejected() {
        assert_eq!(
            "Calculator".parse::<AppId>(),
            Err(UnknownApp("Calculator".to_string()))
        );
        assert!("".parse::<AppId>().is_err());
    }

    #[test]
    fn launch_builds_matching_instance() {
        for app in AppId::ALL {
            assert_eq!(AppInstance::launch(app, Language::En).id(), app);
        }
    }

    #[test]
    fn confirmation_yields_action_only_when_accepted() {
        let mut confirm = Confirmation::default();
        assert!(!confirm.is_pending());
        confirm.request(3);
        assert_eq!(confirm.pending(), Some(&3));
        assert_eq!(confirm.resolve(false), None);
        assert!(!confirm.is_pending());
        confirm.request(4);
        assert_eq!(confirm.resolve(true), Some(4));
        assert_eq!(confirm.resolve(true), None);
    }

    #[test]
    fn edit_line_ignores_control_chords() {
        let mut buf = String::new();
        assert!(edit_line(&mut buf, &KeyEvent::from(KeyCode::Char('a'))));
        assert!(!edit_line(
            &mut buf,
            &KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)
        ));
        assert_eq!(buf, "a");
        assert!(edit_line(&mut buf, &KeyEvent::from(KeyCode::Backspace)));
        assert!(!edit_line(&mut buf, &KeyEvent::from(KeyCode::Backspace)));
    }
}
