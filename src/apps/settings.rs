use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::rc::Rc;
use std::time::Duration;

use crate::apps::{confirmation_answer, AppEvent, Confirmation, DrawContext, Toast, CONFIRM_HINT};
use crate::config::{Theme, THEMES};
use crate::i18n::{tr, Language, TextKey, LANGUAGES};
use crate::shell::{SYSTEM_NAME, USER_NAME};
use crate::ui::{dim_style, error_style, normal_style, point_in_rect, sel_style, title_style};

/// Preferences edited in the window. They live only as long as the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsDraft {
    pub language: Language,
    pub theme: Theme,
    pub animations: bool,
    pub notifications: bool,
    pub auto_save: bool,
}

impl Default for SettingsDraft {
    fn default() -> Self {
        Self {
            language: Language::It,
            theme: Theme::Dark,
            animations: true,
            notifications: true,
            auto_save: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsRow {
    Language,
    Theme,
    Animations,
    Notifications,
    AutoSave,
    Save,
    Reset,
}

pub const ROWS: [SettingsRow; 7] = [
    SettingsRow::Language,
    SettingsRow::Theme,
    SettingsRow::Animations,
    SettingsRow::Notifications,
    SettingsRow::AutoSave,
    SettingsRow::Save,
    SettingsRow::Reset,
];

pub struct SettingsApp {
    draft: SettingsDraft,
    selected: usize,
    confirm_reset: Confirmation<()>,
}

fn cycle<T: Copy + PartialEq>(options: &[T], current: T, forward: bool) -> T {
    let idx = options.iter().position(|o| *o == current).unwrap_or(0);
    let len = options.len();
    let next = if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    };
    options[next]
}

/// Preference rows on the left, system info on the right.
fn split_columns(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area)
}

/// First screen row of `ROWS`, below the heading and a blank line.
const ROWS_TOP: u16 = 2;

fn on_off(value: bool) -> &'static str {
    if value {
        "[x]"
    } else {
        "[ ]"
    }
}

pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{}h {:02}m {:02}s", secs / 3600, (secs / 60) % 60, secs % 60)
}

impl SettingsApp {
    pub fn new(language: Language) -> Self {
        Self {
            draft: SettingsDraft {
                language,
                ..SettingsDraft::default()
            },
            selected: 0,
            confirm_reset: Confirmation::default(),
        }
    }

    pub fn draft(&self) -> &SettingsDraft {
        &self.draft
    }

    pub fn selected_row(&self) -> SettingsRow {
        ROWS[self.selected]
    }

    pub fn reset_pending(&self) -> bool {
        self.confirm_reset.is_pending()
    }

    /// Nothing is persisted; the toast is the whole effect.
    pub fn save(&self) -> AppEvent {
        tracing::debug!(draft = ?self.draft, "settings save requested");
        AppEvent::Notify(Toast::info(
            "Impostazioni salvate",
            "Le tue preferenze sono state salvate con successo",
        ))
    }

    pub fn request_reset(&mut self) {
        self.confirm_reset.request(());
    }

    pub fn resolve_reset(&mut self, accepted: bool) -> AppEvent {
        match self.confirm_reset.resolve(accepted) {
            Some(()) => {
                self.draft = SettingsDraft::default();
                AppEvent::Notify(Toast::info(
                    "Impostazioni ripristinate",
                    "Le impostazioni sono state ripristinate ai valori predefiniti",
                ))
            }
            None => AppEvent::None,
        }
    }

    /// Change the value on the selected row, or run its action.
    pub fn activate(&mut self, forward: bool) -> AppEvent {
        match self.selected_row() {
            SettingsRow::Language => {
                self.draft.language = cycle(&LANGUAGES, self.draft.language, forward)
            }
            SettingsRow::Theme => self.draft.theme = cycle(&THEMES, self.draft.theme, forward),
            SettingsRow::Animations => self.draft.animations = !self.draft.animations,
            SettingsRow::Notifications => self.draft.notifications = !self.draft.notifications,
            SettingsRow::AutoSave => self.draft.auto_save = !self.draft.auto_save,
            SettingsRow::Save => return self.save(),
            SettingsRow::Reset => self.request_reset(),
        }
        AppEvent::None
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        if self.confirm_reset.is_pending() {
            return match confirmation_answer(&key) {
                Some(answer) => self.resolve_reset(answer),
                None => AppEvent::None,
            };
        }
        match key.code {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Tab => self.selected = (self.selected + 1).min(ROWS.len() - 1),
            KeyCode::Left => return self.activate(false),
            KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') => return self.activate(true),
            _ => {}
        }
        AppEvent::None
    }

    pub fn item_at(&self, x: u16, y: u16, area: Rect) -> Option<usize> {
        if area.width < 10 || area.height < 4 || self.confirm_reset.is_pending() {
            return None;
        }
        let left = split_columns(area)[0];
        if !point_in_rect(x, y, left) || y < left.y + ROWS_TOP {
            return None;
        }
        let index = usize::from(y - left.y - ROWS_TOP);
        (index < ROWS.len()).then_some(index)
    }

    /// A click picks the row; a double click changes it or runs its action.
    pub fn click_item(&mut self, index: usize, double: bool) -> AppEvent {
        if index >= ROWS.len() {
            return AppEvent::None;
        }
        self.selected = index;
        if double {
            self.activate(true)
        } else {
            AppEvent::None
        }
    }

    fn row_text(&self, row: SettingsRow) -> String {
        match row {
            SettingsRow::Language => format!("Lingua:            < {} >", self.draft.language.native_name()),
            SettingsRow::Theme => format!("Tema:              < {} >", self.draft.theme.label()),
            SettingsRow::Animations => format!("{} Animazioni", on_off(self.draft.animations)),
            SettingsRow::Notifications => format!("{} Notifiche", on_off(self.draft.notifications)),
            SettingsRow::AutoSave => format!("{} Salvataggio automatico", on_off(self.draft.auto_save)),
            SettingsRow::Save => "[ Salva Impostazioni ]".to_string(),
            SettingsRow::Reset => "[ Ripristina ]".to_string(),
        }
    }

    pub fn draw(&self, f: &mut Frame, area: Rect, ctx: &DrawContext) {
        if area.width < 10 || area.height < 4 {
            return;
        }
        let cols = split_columns(area);

        let mut lines = vec![
            Line::from(Span::styled(tr(ctx.lang, TextKey::Settings), title_style())),
            Line::from(""),
        ];
        for (i, row) in ROWS.iter().enumerate() {
            let style = if i == self.selected && ctx.focused {
                sel_style()
            } else {
                normal_style()
            };
            lines.push(Line::from(Span::styled(self.row_text(*row), style)));
        }
        lines.push(Line::from(""));
        if self.confirm_reset.is_pending() {
            lines.push(Line::from(Span::styled(
                format!("Ripristinare le impostazioni predefinite? {CONFIRM_HINT}"),
                error_style(),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "[↑↓] Scegli  [←→/Invio] Cambia",
                dim_style(),
            )));
        }
        f.render_widget(Paragraph::new(lines), cols[0]);

        let info = [
            ("Sistema Operativo", SYSTEM_NAME.to_string()),
            ("Versione Kernel", "5.4.0-future".to_string()),
            ("Architettura", "x86_64".to_string()),
            ("Memoria RAM", "8 GB".to_string()),
            ("Spazio disco", "256 GB SSD".to_string()),
            ("Uptime", format_uptime(ctx.uptime)),
            ("Utente", USER_NAME.to_string()),
        ];
        let info_lines: Vec<Line> = info
            .into_iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{label}: "), dim_style()),
                    Span::styled(value, normal_style()),
                ])
            })
            .collect();
        f.render_widget(
            Paragraph::new(info_lines).block(
                Block::default()
                    .borders(Borders::LEFT)
                    .title(Span::styled(" Informazioni Sistema", title_style())),
            ),
            cols[1],
        );
    }
}
