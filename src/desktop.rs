use anyhow::Result;
use chrono::Local;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::apps::{AppEvent, AppId, AppInstance, DrawContext, Toast, ToastKind};
use crate::i18n::{tr, Language};
use crate::ui::{
    clip, dim_style, error_style, normal_style, point_in_rect, sel_style, title_style,
    write_text, MouseCapture, Term, Ticker,
};
use crate::vfs::VirtualFileTree;
use crate::wm::{Chrome, Viewport, WindowId, WindowLimits, WindowRecord, WindowRegistry};

const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(450);
const TOAST_DURATION: Duration = Duration::from_secs(4);
const CLOCK_PERIOD: Duration = Duration::from_secs(1);
const TITLE_MIN_BUTTON: &str = "[-]";
const TITLE_MAX_BUTTON: &str = "[+]";
const TITLE_RESTORE_BUTTON: &str = "[R]";
const TITLE_CLOSE_BUTTON: &str = "[X]";
const TASK_START_LABEL: &str = "[FutureOS]";
const TASK_SEPARATOR: &str = " | ";
const TOAST_WIDTH: u16 = 44;
const ICON_WIDTH: u16 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowHit {
    Close,
    Maximize,
    Minimize,
    Title,
    Resize,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClickTarget {
    Icon(AppId),
    Item { app: AppId, index: usize },
}

#[derive(Debug, Clone, Copy)]
struct LastClick {
    target: ClickTarget,
    at: Instant,
}

#[derive(Debug, Clone)]
struct ActiveToast {
    toast: Toast,
    expires: Instant,
}

#[derive(Debug, Default)]
struct TaskbarLayout {
    shortcuts: Vec<(AppId, Rect)>,
    buttons: Vec<(WindowId, Rect)>,
    clock: Rect,
}

pub struct DesktopState {
    registry: WindowRegistry,
    chrome: Chrome,
    fs: VirtualFileTree,
    apps: BTreeMap<AppId, AppInstance>,
    toasts: Vec<ActiveToast>,
    lang: Language,
    last_click: Option<LastClick>,
    started_at: Instant,
    clock: String,
}

// ── Layout ────────────────────────────────────────────────────────────────────

fn full_rect(viewport: Viewport) -> Rect {
    Rect {
        x: 0,
        y: 0,
        width: viewport.width.clamp(0, i32::from(u16::MAX)) as u16,
        height: viewport.height.clamp(0, i32::from(u16::MAX)) as u16,
    }
}

fn taskbar_area(size: Rect) -> Rect {
    Rect {
        x: size.x,
        y: size.y + size.height.saturating_sub(1),
        width: size.width,
        height: if size.height > 1 { 1 } else { 0 },
    }
}

fn desktop_area(size: Rect) -> Rect {
    Rect {
        height: size.height.saturating_sub(1),
        ..size
    }
}

fn icon_rect(index: usize, desk: Rect) -> Rect {
    Rect {
        x: desk.x + 1,
        y: desk.y + 1 + (index as u16) * 3,
        width: ICON_WIDTH.min(desk.width),
        height: 2,
    }
}

fn title_close_button_rect(area: Rect) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(TITLE_CLOSE_BUTTON.len() as u16 + 1),
        y: area.y,
        width: TITLE_CLOSE_BUTTON.len() as u16,
        height: 1,
    }
}

fn title_max_button_rect(area: Rect) -> Rect {
    let close = title_close_button_rect(area);
    Rect {
        x: close.x.saturating_sub(TITLE_MAX_BUTTON.len() as u16),
        y: area.y,
        width: TITLE_MAX_BUTTON.len() as u16,
        height: 1,
    }
}

fn title_min_button_rect(area: Rect) -> Rect {
    let max = title_max_button_rect(area);
    Rect {
        x: max.x.saturating_sub(TITLE_MIN_BUTTON.len() as u16),
        y: area.y,
        width: TITLE_MIN_BUTTON.len() as u16,
        height: 1,
    }
}

fn is_resize_corner(area: Rect, x: u16, y: u16) -> bool {
    area.width >= 4
        && area.height >= 4
        && x == area.x + area.width - 1
        && y == area.y + area.height - 1
}

/// Area inside the border, below the title row.
fn window_inner(area: Rect) -> Rect {
    Rect::new(area.x + 1, area.y + 1, area.width - 2, area.height - 2)
}

fn task_button_text(title: &str, minimized: bool) -> String {
    let label: String = title.chars().take(16).collect();
    if minimized {
        format!("({label})")
    } else {
        format!("[{label}]")
    }
}

fn hit_window_area(area: Rect, maximized: bool, x: u16, y: u16) -> WindowHit {
    if point_in_rect(x, y, title_close_button_rect(area)) {
        WindowHit::Close
    } else if point_in_rect(x, y, title_max_button_rect(area)) {
        WindowHit::Maximize
    } else if point_in_rect(x, y, title_min_button_rect(area)) {
        WindowHit::Minimize
    } else if !maximized && is_resize_corner(area, x, y) {
        WindowHit::Resize
    } else if y == area.y {
        WindowHit::Title
    } else {
        WindowHit::Content
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

impl DesktopState {
    pub fn new(lang: Language, viewport: Viewport) -> Self {
        Self::with_registry(lang, WindowRegistry::new(WindowLimits::CELLS, viewport))
    }

    pub fn with_registry(lang: Language, registry: WindowRegistry) -> Self {
        Self {
            registry,
            chrome: Chrome::new(),
            fs: VirtualFileTree::seeded(),
            apps: BTreeMap::new(),
            toasts: Vec::new(),
            lang,
            last_click: None,
            started_at: Instant::now(),
            clock: Local::now().format("%H:%M:%S").to_string(),
        }
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn fs(&self) -> &VirtualFileTree {
        &self.fs
    }

    pub fn is_running(&self, app: AppId) -> bool {
        self.apps.contains_key(&app)
    }

    pub fn toasts(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().map(|t| &t.toast)
    }

    fn size(&self) -> Rect {
        full_rect(self.registry.viewport())
    }

    pub fn open_app(&mut self, app: AppId) -> WindowId {
        let id = self.registry.open(app);
        let lang = self.lang;
        self.apps.entry(app).or_insert_with(|| {
            tracing::info!(app = %app, window = %id, "app launched");
            AppInstance::launch(app, lang)
        });
        id
    }

    pub fn close_window(&mut self, id: WindowId) {
        self.registry.close(id);
        if self.registry.find_by_app(id.app).is_none() && self.apps.remove(&id.app).is_some() {
            tracing::info!(app = %id.app, window = %id, "app closed");
        }
    }

    pub fn notify(&mut self, toast: Toast, now: Instant) {
        tracing::debug!(title = %toast.title, body = %toast.body, "toast");
        self.toasts.push(ActiveToast {
            toast,
            expires: now + TOAST_DURATION,
        });
    }

    fn apply_event(&mut self, event: AppEvent, now: Instant) {
        if let AppEvent::Notify(toast) = event {
            self.notify(toast, now);
        }
    }

    /// Periodic housekeeping: refresh the clock and drop expired toasts.
    pub fn tick(&mut self, now: Instant) {
        self.clock = Local::now().format("%H:%M:%S").to_string();
        self.toasts.retain(|t| t.expires > now);
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.registry.set_viewport(Viewport {
            width: i32::from(width),
            height: i32::from(height),
        });
    }

    fn is_double_click(&mut self, target: ClickTarget, now: Instant) -> bool {
        if let Some(prev) = self.last_click {
            if prev.target == target && now.duration_since(prev.at) <= DOUBLE_CLICK_WINDOW {
                self.last_click = None;
                return true;
            }
        }
        self.last_click = Some(LastClick { target, at: now });
        false
    }

    fn window_area(&self, win: &WindowRecord) -> Option<Rect> {
        clip(win.geometry, desktop_area(self.size()))
    }

    fn hit_window(&self, x: u16, y: u16) -> Option<(WindowId, WindowHit)> {
        let visible: Vec<&WindowRecord> =
            self.registry.iter_by_z().filter(|w| w.is_visible()).collect();
        visible.into_iter().rev().find_map(|win| {
            let area = self.window_area(win)?;
            point_in_rect(x, y, area).then(|| (win.id, hit_window_area(area, win.maximized, x, y)))
        })
    }

    fn taskbar_layout(&self, task: Rect) -> TaskbarLayout {
        let mut layout = TaskbarLayout::default();
        if task.width == 0 || task.height == 0 {
            return layout;
        }
        let clock_w = (self.clock.len() as u16 + 2).min(task.width);
        layout.clock = Rect {
            x: task.x + task.width - clock_w,
            y: task.y,
            width: clock_w,
            height: 1,
        };
        let limit = layout.clock.x;

        let mut x = task.x + TASK_START_LABEL.len() as u16 + TASK_SEPARATOR.len() as u16;
        for app in AppId::ALL {
            let width = app.icon().len() as u16;
            if x + width >= limit {
                return layout;
            }
            layout.shortcuts.push((app, Rect::new(x, task.y, width, 1)));
            x += width + 1;
        }
        x += TASK_SEPARATOR.len() as u16 - 1;

        for win in self.registry.taskbar_entries() {
            let text = task_button_text(tr(self.lang, win.app().title_key()), win.minimized);
            let width = text.chars().count() as u16;
            if x + width >= limit {
                break;
            }
            layout.buttons.push((win.id, Rect::new(x, task.y, width, 1)));
            x += width + 1;
        }
        layout
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('q') {
            return Flow::Quit;
        }
        match key.code {
            KeyCode::F(n @ 1..=4) => {
                self.open_app(AppId::ALL[usize::from(n) - 1]);
            }
            KeyCode::F(9) => {
                if let Some(id) = self.registry.focused().map(|w| w.id) {
                    self.close_window(id);
                }
            }
            _ => {
                let Some(app) = self.registry.focused().map(|w| w.app()) else {
                    return Flow::Continue;
                };
                if let Some(instance) = self.apps.get_mut(&app) {
                    let event = instance.handle_key(key, &mut self.fs);
                    self.apply_event(event, now);
                }
            }
        }
        Flow::Continue
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Flow {
        let (x, y) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Drag(MouseButton::Left) => {
                self.chrome
                    .pointer_move(&mut self.registry, i32::from(x), i32::from(y));
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.chrome.release();
            }
            MouseEventKind::Down(MouseButton::Left) => self.press(x, y, now),
            MouseEventKind::Down(MouseButton::Right) => self.press_secondary(x, y),
            _ => {}
        }
        Flow::Continue
    }

    fn press(&mut self, x: u16, y: u16, now: Instant) {
        let size = self.size();
        let task = taskbar_area(size);
        if point_in_rect(x, y, task) {
            let layout = self.taskbar_layout(task);
            if let Some((app, _)) = layout.shortcuts.iter().find(|(_, r)| point_in_rect(x, y, *r)) {
                self.open_app(*app);
            } else if let Some((id, _)) = layout.buttons.iter().find(|(_, r)| point_in_rect(x, y, *r)) {
                self.registry.activate_from_taskbar(*id);
            }
            return;
        }

        if let Some((id, hit)) = self.hit_window(x, y) {
            let (px, py) = (i32::from(x), i32::from(y));
            match hit {
                WindowHit::Close => self.close_window(id),
                WindowHit::Minimize => self.registry.minimize(id),
                WindowHit::Maximize => {
                    self.registry.focus(id);
                    self.registry.toggle_maximize(id);
                }
                WindowHit::Title => self.chrome.press_title(&mut self.registry, id, px, py),
                WindowHit::Resize => {
                    self.chrome
                        .press_resize_handle(&mut self.registry, id, px, py)
                }
                WindowHit::Content => {
                    self.registry.focus(id);
                    self.click_content(id, x, y, now);
                }
            }
            return;
        }

        let desk = desktop_area(size);
        let icon = AppId::ALL
            .into_iter()
            .enumerate()
            .find(|(i, _)| point_in_rect(x, y, icon_rect(*i, desk)))
            .map(|(_, app)| app);
        if let Some(app) = icon {
            if self.is_double_click(ClickTarget::Icon(app), now) {
                self.open_app(app);
            }
        }
    }

    /// Right click on a taskbar button minimizes or restores its window.
    fn press_secondary(&mut self, x: u16, y: u16) {
        let task = taskbar_area(self.size());
        if !point_in_rect(x, y, task) {
            return;
        }
        let layout = self.taskbar_layout(task);
        if let Some((id, _)) = layout.buttons.iter().find(|(_, r)| point_in_rect(x, y, *r)) {
            self.registry.toggle_minimized(*id);
        }
    }

    fn click_content(&mut self, id: WindowId, x: u16, y: u16, now: Instant) {
        let Some((app, area)) = self
            .registry
            .get(id)
            .and_then(|win| Some((win.app(), self.window_area(win)?)))
        else {
            return;
        };
        if area.width < 8 || area.height < 3 {
            return;
        }
        let inner = window_inner(area);
        let Some(index) = self
            .apps
            .get(&app)
            .and_then(|instance| instance.item_at(x, y, inner, &self.fs))
        else {
            return;
        };
        let double = self.is_double_click(ClickTarget::Item { app, index }, now);
        if let Some(instance) = self.apps.get_mut(&app) {
            let event = instance.click_item(index, double, &self.fs);
            self.apply_event(event, now);
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    pub fn draw(&self, f: &mut Frame) {
        let size = f.area();
        let desk = desktop_area(size);
        f.render_widget(Clear, size);

        self.draw_icons(f, desk);

        let focused = self.registry.focused().map(|w| w.id);
        let uptime = self.started_at.elapsed();
        for win in self.registry.iter_by_z().filter(|w| w.is_visible()) {
            if let Some(area) = clip(win.geometry, desk) {
                self.draw_window(f, win, area, Some(win.id) == focused, uptime);
            }
        }

        self.draw_toasts(f, desk);
        self.draw_taskbar(f, taskbar_area(size));
    }

    fn draw_icons(&self, f: &mut Frame, desk: Rect) {
        for (i, app) in AppId::ALL.into_iter().enumerate() {
            let rect = icon_rect(i, desk);
            if rect.y + rect.height > desk.y + desk.height {
                break;
            }
            let lines = vec![
                Line::from(Span::styled(format!(" {}", app.icon()), title_style())),
                Line::from(Span::styled(tr(self.lang, app.title_key()), normal_style())),
            ];
            f.render_widget(Paragraph::new(lines), rect);
        }
    }

    fn draw_window(
        &self,
        f: &mut Frame,
        win: &WindowRecord,
        area: Rect,
        focused: bool,
        uptime: Duration,
    ) {
        if area.width < 8 || area.height < 3 {
            return;
        }
        f.render_widget(Clear, area);
        let border_style = if focused { title_style() } else { dim_style() };
        f.render_widget(Block::default().borders(Borders::ALL).style(border_style), area);

        let mut chars: Vec<char> = vec![' '; area.width.saturating_sub(2) as usize];
        write_text(&mut chars, 0, &format!(" {} ", tr(self.lang, win.app().title_key())));
        let max_button = if win.maximized {
            TITLE_RESTORE_BUTTON
        } else {
            TITLE_MAX_BUTTON
        };
        let buttons = format!("{TITLE_MIN_BUTTON}{max_button}{TITLE_CLOSE_BUTTON}");
        if chars.len() >= buttons.len() {
            let button_x = chars.len() - buttons.len();
            write_text(&mut chars, button_x, &buttons);
        }
        let title_color = if focused { sel_style() } else { dim_style() };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                chars.into_iter().collect::<String>(),
                title_color,
            ))),
            Rect::new(area.x + 1, area.y, area.width - 2, 1),
        );

        let inner = window_inner(area);
        if let Some(app) = self.apps.get(&win.app()) {
            let ctx = DrawContext {
                fs: &self.fs,
                lang: self.lang,
                focused,
                uptime,
            };
            app.draw(f, inner, &ctx);
        }
    }

    fn draw_toasts(&self, f: &mut Frame, desk: Rect) {
        let width = TOAST_WIDTH.min(desk.width);
        let mut bottom = desk.y + desk.height;
        for active in self.toasts.iter().rev() {
            if bottom < desk.y + 4 {
                break;
            }
            let rect = Rect::new(desk.x + desk.width - width, bottom - 4, width, 4);
            let style = match active.toast.kind {
                ToastKind::Info => title_style(),
                ToastKind::Error => error_style(),
            };
            f.render_widget(Clear, rect);
            f.render_widget(
                Paragraph::new(vec![
                    Line::from(Span::styled(active.toast.title.clone(), style)),
                    Line::from(Span::styled(active.toast.body.clone(), normal_style())),
                ])
                .block(Block::default().borders(Borders::ALL).style(style)),
                rect,
            );
            bottom -= 4;
        }
    }

    fn draw_taskbar(&self, f: &mut Frame, task: Rect) {
        if task.height == 0 || task.width == 0 {
            return;
        }
        let mut row = vec![' '; task.width as usize];
        write_text(&mut row, 0, TASK_START_LABEL);
        write_text(&mut row, TASK_START_LABEL.len(), TASK_SEPARATOR);

        let layout = self.taskbar_layout(task);
        for (app, rect) in &layout.shortcuts {
            write_text(&mut row, usize::from(rect.x - task.x), app.icon());
        }
        if let Some((_, last)) = layout.shortcuts.last() {
            write_text(&mut row, usize::from(last.x + last.width - task.x), TASK_SEPARATOR);
        }
        for (id, rect) in &layout.buttons {
            if let Some(win) = self.registry.get(*id) {
                let text = task_button_text(tr(self.lang, id.app.title_key()), win.minimized);
                write_text(&mut row, usize::from(rect.x - task.x), &text);
            }
        }
        write_text(
            &mut row,
            usize::from(layout.clock.x - task.x),
            &format!(" {} ", self.clock),
        );
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                row.into_iter().collect::<String>(),
                sel_style(),
            ))),
            task,
        );
    }
}

// ── Event loop ────────────────────────────────────────────────────────────────

pub fn desktop_mode(terminal: &mut Term, lang: Language) -> Result<()> {
    let _ = terminal.hide_cursor();
    let _mouse = MouseCapture::enable()?;
    let size = terminal.size()?;
    let mut state = DesktopState::new(
        lang,
        Viewport {
            width: i32::from(size.width),
            height: i32::from(size.height),
        },
    );
    tracing::info!(width = size.width, height = size.height, "desktop started");
    let result = run_desktop_loop(terminal, &mut state);
    let _ = terminal.show_cursor();
    result
}

fn run_desktop_loop(terminal: &mut Term, state: &mut DesktopState) -> Result<()> {
    let mut clock = Ticker::new(CLOCK_PERIOD);
    loop {
        terminal.draw(|f| state.draw(f))?;

        if event::poll(Duration::from_millis(50))? {
            let now = Instant::now();
            let flow = match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => state.handle_key(key, now),
                Event::Mouse(mouse) => state.handle_mouse(mouse, now),
                Event::Resize(width, height) => {
                    state.resize(width, height);
                    Flow::Continue
                }
                _ => Flow::Continue,
            };
            if flow == Flow::Quit {
                tracing::info!("desktop closed");
                return Ok(());
            }
        }

        if clock.poll() {
            state.tick(Instant::now());
        }
    }
}
