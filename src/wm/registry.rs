//! Open windows, their geometry and their stacking order.
//!
//! Every operation addressed to an unknown window id is a no-op. Stacking is
//! a strict total order: `focus` and `open` always take the current maximum
//! z-index across all records and add one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::ops::Range;
use tracing::debug;

use crate::apps::AppId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId {
    pub app: AppId,
    pub serial: u64,
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.app.key(), self.serial)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Size of the whole drawing surface, taskbar included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

/// Unit-dependent sizes used by the registry and the window chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLimits {
    pub min_width: i32,
    pub min_height: i32,
    pub default_width: i32,
    pub default_height: i32,
    /// Strip kept free for the taskbar when maximizing.
    pub taskbar_height: i32,
    pub spawn_x: Range<i32>,
    pub spawn_y: Range<i32>,
}

impl WindowLimits {
    /// Browser-style pixel units.
    pub const PIXELS: WindowLimits = WindowLimits {
        min_width: 300,
        min_height: 200,
        default_width: 800,
        default_height: 600,
        taskbar_height: 60,
        spawn_x: 100..300,
        spawn_y: 100..200,
    };

    /// Terminal cell units.
    pub const CELLS: WindowLimits = WindowLimits {
        min_width: 30,
        min_height: 8,
        default_width: 64,
        default_height: 18,
        taskbar_height: 1,
        spawn_x: 16..32,
        spawn_y: 1..6,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRecord {
    pub id: WindowId,
    pub geometry: Geometry,
    pub minimized: bool,
    pub maximized: bool,
    /// Geometry to return to; only present while maximized.
    pub restore: Option<Geometry>,
    pub z_index: u64,
}

impl WindowRecord {
    pub fn app(&self) -> AppId {
        self.id.app
    }

    pub fn is_visible(&self) -> bool {
        !self.minimized
    }
}

pub struct WindowRegistry {
    windows: Vec<WindowRecord>,
    limits: WindowLimits,
    viewport: Viewport,
    next_serial: u64,
    rng: StdRng,
}

impl WindowRegistry {
    pub fn new(limits: WindowLimits, viewport: Viewport) -> Self {
        Self::with_rng(limits, viewport, StdRng::from_entropy())
    }

    pub fn with_seed(limits: WindowLimits, viewport: Viewport, seed: u64) -> Self {
        Self::with_rng(limits, viewport, StdRng::seed_from_u64(seed))
    }

    fn with_rng(limits: WindowLimits, viewport: Viewport, rng: StdRng) -> Self {
        Self {
            windows: Vec::new(),
            limits,
            viewport,
            next_serial: 1,
            rng,
        }
    }

    pub fn limits(&self) -> &WindowLimits {
        &self.limits
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, id: WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id == id)
    }

    fn get_mut(&mut self, id: WindowId) -> Option<&mut WindowRecord> {
        let found = self.windows.iter_mut().find(|w| w.id == id);
        if found.is_none() {
            debug!(window = %id, "ignoring operation on unknown window");
        }
        found
    }

    pub fn find_by_app(&self, app: AppId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id.app == app)
    }

    /// Records in the order they were opened, for the taskbar.
    pub fn taskbar_entries(&self) -> &[WindowRecord] {
        &self.windows
    }

    /// Records from back to front.
    pub fn iter_by_z(&self) -> impl Iterator<Item = &WindowRecord> {
        let mut sorted: Vec<&WindowRecord> = self.windows.iter().collect();
        sorted.sort_by_key(|w| w.z_index);
        sorted.into_iter()
    }

    /// Frontmost window that is not minimized.
    pub fn focused(&self) -> Option<&WindowRecord> {
        self.windows
            .iter()
            .filter(|w| w.is_visible())
            .max_by_key(|w| w.z_index)
    }

    /// Frontmost visible window under the point.
    pub fn window_at(&self, x: i32, y: i32) -> Option<&WindowRecord> {
        self.windows
            .iter()
            .filter(|w| w.is_visible() && w.geometry.contains(x, y))
            .max_by_key(|w| w.z_index)
    }

    fn next_z(&self) -> u64 {
        self.windows.iter().map(|w| w.z_index).max().unwrap_or(0) + 1
    }

    /// Open `app`, or surface its existing window.
    pub fn open(&mut self, app: AppId) -> WindowId {
        if let Some(id) = self.find_by_app(app).map(|w| w.id) {
            self.unminimize(id);
            self.focus(id);
            return id;
        }

        let x = self.rng.gen_range(self.limits.spawn_x.clone());
        let y = self.rng.gen_range(self.limits.spawn_y.clone());
        let id = WindowId {
            app,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        let z_index = self.next_z();
        self.windows.push(WindowRecord {
            id,
            geometry: Geometry {
                x,
                y,
                width: self.limits.default_width,
                height: self.limits.default_height,
            },
            minimized: false,
            maximized: false,
            restore: None,
            z_index,
        });
        debug!(window = %id, z_index, "window opened");
        id
    }

    pub fn close(&mut self, id: WindowId) {
        let before = self.windows.len();
        self.windows.retain(|w| w.id != id);
        if self.windows.len() == before {
            debug!(window = %id, "close on unknown window");
        } else {
            debug!(window = %id, "window closed");
        }
    }

    pub fn minimize(&mut self, id: WindowId) {
        if let Some(win) = self.get_mut(id) {
            win.minimized = true;
        }
    }

    pub fn unminimize(&mut self, id: WindowId) {
        if let Some(win) = self.get_mut(id) {
            win.minimized = false;
        }
    }

    pub fn toggle_minimized(&mut self, id: WindowId) {
        if let Some(win) = self.get_mut(id) {
            win.minimized = !win.minimized;
        }
    }

    pub fn toggle_maximize(&mut self, id: WindowId) {
        let filled = self.maximized_geometry();
        let Some(win) = self.get_mut(id) else {
            return;
        };
        if win.maximized {
            win.maximized = false;
            if let Some(prev) = win.restore.take() {
                win.geometry = prev;
            }
        } else {
            if win.restore.is_none() {
                win.restore = Some(win.geometry);
            }
            win.maximized = true;
            win.geometry = filled;
        }
    }

    pub fn update_position(&mut self, id: WindowId, x: i32, y: i32) {
        if let Some(win) = self.get_mut(id) {
            win.geometry.x = x;
            win.geometry.y = y;
        }
    }

    pub fn update_size(&mut self, id: WindowId, width: i32, height: i32) {
        if let Some(win) = self.get_mut(id) {
            win.geometry.width = width;
            win.geometry.height = height;
        }
    }

    pub fn focus(&mut self, id: WindowId) {
        let z_index = self.next_z();
        if let Some(win) = self.get_mut(id) {
            win.z_index = z_index;
        }
    }

    /// Taskbar click: bring a minimized window back, then raise it.
    pub fn activate_from_taskbar(&mut self, id: WindowId) {
        self.unminimize(id);
        self.focus(id);
    }

    /// Track a new surface size; maximized windows are refitted to it.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let filled = self.maximized_geometry();
        for win in self.windows.iter_mut().filter(|w| w.maximized) {
            win.geometry = filled;
        }
    }

    fn maximized_geometry(&self) -> Geometry {
        Geometry {
            x: 0,
            y: 0,
            width: self.viewport.width,
            height: (self.viewport.height - self.limits.taskbar_height).max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    const VIEW: Viewport = Viewport {
        width: 1920,
        height: 1080,
    };

    fn registry() -> WindowRegistry {
        WindowRegistry::with_seed(WindowLimits::PIXELS, VIEW, 7)
    }

    fn assert_distinct_z(reg: &WindowRegistry) {
        let zs: HashSet<u64> = reg.taskbar_entries().iter().map(|w| w.z_index).collect();
        assert_eq!(zs.len(), reg.len());
    }

    #[test]
    fn new_window_uses_defaults_and_spawn_range() {
        let mut reg = registry();
        let id = reg.open(AppId::Terminal);
        let win = reg.get(id).unwrap();
        assert_eq!(win.geometry.width, 800);
        assert_eq!(win.geometry.height, 600);
        assert!((100..300).contains(&win.geometry.x));
        assert!((100..200).contains(&win.geometry.y));
        assert!(!win.minimized && !win.maximized);
        assert_eq!(win.restore, None);
    }

    #[test]
    fn reopening_surfaces_existing_window() {
        let mut reg = registry();
        let term = reg.open(AppId::Terminal);
        let notes = reg.open(AppId::Notepad);
        reg.minimize(term);
        assert_eq!(reg.focused().map(|w| w.id), Some(notes));

        let again = reg.open(AppId::Terminal);
        assert_eq!(again, term);
        assert_eq!(reg.len(), 2);
        let win = reg.get(term).unwrap();
        assert!(!win.minimized);
        assert_eq!(reg.focused().map(|w| w.id), Some(term));
    }

    #[test]
    fn focus_takes_fresh_maximum_after_close() {
        let mut reg = registry();
        let a = reg.open(AppId::Terminal);
        let b = reg.open(AppId::Notepad);
        let c = reg.open(AppId::Settings);
        reg.close(c);
        reg.focus(a);
        assert_eq!(reg.get(a).unwrap().z_index, 3);
        let d = reg.open(AppId::FileManager);
        assert_eq!(reg.get(d).unwrap().z_index, 4);
        assert!(reg.get(b).unwrap().z_index < reg.get(a).unwrap().z_index);
        assert_distinct_z(&reg);
    }

    #[test]
    fn double_maximize_restores_exact_geometry() {
        let mut reg = registry();
        let id = reg.open(AppId::FileManager);
        reg.update_position(id, 37, 81);
        reg.update_size(id, 512, 333);
        let before = reg.get(id).unwrap().geometry;

        reg.toggle_maximize(id);
        let max = reg.get(id).unwrap();
        assert!(max.maximized);
        assert_eq!(
            max.geometry,
            Geometry {
                x: 0,
                y: 0,
                width: 1920,
                height: 1020
            }
        );
        assert_eq!(max.restore, Some(before));

        reg.toggle_maximize(id);
        let restored = reg.get(id).unwrap();
        assert!(!restored.maximized);
        assert_eq!(restored.geometry, before);
        assert_eq!(restored.restore, None);
    }

    #[test]
    fn minimize_leaves_geometry_and_z_alone() {
        let mut reg = registry();
        let id = reg.open(AppId::Notepad);
        let before = reg.get(id).unwrap().clone();
        reg.minimize(id);
        let after = reg.get(id).unwrap();
        assert!(after.minimized);
        assert_eq!(after.geometry, before.geometry);
        assert_eq!(after.z_index, before.z_index);
        assert!(reg.focused().is_none());
        assert_eq!(reg.taskbar_entries().len(), 1);
        reg.activate_from_taskbar(id);
        assert!(!reg.get(id).unwrap().minimized);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut reg = registry();
        let id = reg.open(AppId::Terminal);
        reg.close(id);
        reg.close(id);
        reg.focus(id);
        reg.minimize(id);
        reg.toggle_maximize(id);
        reg.update_position(id, 1, 1);
        reg.update_size(id, 1, 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn viewport_change_refits_maximized_windows() {
        let mut reg = registry();
        let id = reg.open(AppId::Settings);
        reg.toggle_maximize(id);
        reg.set_viewport(Viewport {
            width: 1000,
            height: 700,
        });
        assert_eq!(reg.get(id).unwrap().geometry.width, 1000);
        assert_eq!(reg.get(id).unwrap().geometry.height, 640);
    }

    #[test]
    fn window_at_prefers_frontmost() {
        let mut reg = registry();
        let a = reg.open(AppId::Terminal);
        let b = reg.open(AppId::Notepad);
        reg.update_position(a, 0, 0);
        reg.update_position(b, 0, 0);
        assert_eq!(reg.window_at(10, 10).map(|w| w.id), Some(b));
        reg.focus(a);
        assert_eq!(reg.window_at(10, 10).map(|w| w.id), Some(a));
        reg.minimize(a);
        assert_eq!(reg.window_at(10, 10).map(|w| w.id), Some(b));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Open(usize),
        Close(usize),
        Focus(usize),
        Minimize(usize),
        Maximize(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize).prop_map(Op::Open),
            (0..4usize).prop_map(Op::Close),
            (0..4usize).prop_map(Op::Focus),
            (0..4usize).prop_map(Op::Minimize),
            (0..4usize).prop_map(Op::Maximize),
        ]
    }

    proptest! {
        #[test]
        fn z_order_stays_strict_and_one_window_per_app(ops in prop::collection::vec(op(), 0..64)) {
            let mut reg = registry();
            for op in ops {
                let target = |idx: usize, reg: &WindowRegistry| {
                    reg.find_by_app(AppId::ALL[idx]).map(|w| w.id)
                };
                match op {
                    Op::Open(idx) => {
                        let before = reg.len();
                        let existed = reg.find_by_app(AppId::ALL[idx]).is_some();
                        reg.open(AppId::ALL[idx]);
                        prop_assert_eq!(reg.len(), if existed { before } else { before + 1 });
                    }
                    Op::Close(idx) => if let Some(id) = target(idx, &reg) { reg.close(id) },
                    Op::Focus(idx) => if let Some(id) = target(idx, &reg) { reg.focus(id) },
                    Op::Minimize(idx) => if let Some(id) = target(idx, &reg) { reg.minimize(id) },
                    Op::Maximize(idx) => if let Some(id) = target(idx, &reg) { reg.toggle_maximize(id) },
                }
                let zs: HashSet<u64> = reg.taskbar_entries().iter().map(|w| w.z_index).collect();
                prop_assert_eq!(zs.len(), reg.len());
                let apps: HashSet<AppId> = reg.taskbar_entries().iter().map(|w| w.app()).collect();
                prop_assert_eq!(apps.len(), reg.len());
            }
        }

        #[test]
        fn maximize_twice_is_identity(x in -50i32..2000, y in -50i32..1000, w in 300i32..1500, h in 200i32..900) {
            let mut reg = registry();
            let id = reg.open(AppId::Notepad);
            reg.update_position(id, x, y);
            reg.update_size(id, w, h);
            let before = reg.get(id).map(|r| r.geometry);
            reg.toggle_maximize(id);
            reg.toggle_maximize(id);
            prop_assert_eq!(reg.get(id).map(|r| r.geometry), before);
        }
    }
}
