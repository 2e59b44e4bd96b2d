//! Pointer interaction with a window frame: title-bar drags and corner resizes.
//!
//! The chrome never stores geometry of its own. Each pointer move is turned
//! into a position or size request against the registry right away.

use crate::wm::registry::{WindowId, WindowRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChromeState {
    #[default]
    Idle,
    Dragging {
        window: WindowId,
        offset_x: i32,
        offset_y: i32,
    },
    Resizing {
        window: WindowId,
        start_x: i32,
        start_y: i32,
        start_width: i32,
        start_height: i32,
    },
}

#[derive(Debug, Default)]
pub struct Chrome {
    state: ChromeState,
}

impl Chrome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ChromeState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, ChromeState::Idle)
    }

    pub fn press_title(&mut self, registry: &mut WindowRegistry, window: WindowId, x: i32, y: i32) {
        let Some(geometry) = registry.get(window).map(|w| w.geometry) else {
            return;
        };
        registry.focus(window);
        self.state = ChromeState::Dragging {
            window,
            offset_x: x - geometry.x,
            offset_y: y - geometry.y,
        };
    }

    pub fn press_resize_handle(
        &mut self,
        registry: &mut WindowRegistry,
        window: WindowId,
        x: i32,
        y: i32,
    ) {
        let Some(geometry) = registry.get(window).map(|w| w.geometry) else {
            return;
        };
        registry.focus(window);
        self.state = ChromeState::Resizing {
            window,
            start_x: x,
            start_y: y,
            start_width: geometry.width,
            start_height: geometry.height,
        };
    }

    /// Returns true when the move was consumed by an active drag or resize.
    pub fn pointer_move(&mut self, registry: &mut WindowRegistry, x: i32, y: i32) -> bool {
        match self.state {
            ChromeState::Idle => false,
            ChromeState::Dragging {
                window,
                offset_x,
                offset_y,
            } => {
                registry.update_position(window, (x - offset_x).max(0), (y - offset_y).max(0));
                true
            }
            ChromeState::Resizing {
                window,
                start_x,
                start_y,
                start_width,
                start_height,
            } => {
                let limits = registry.limits();
                let width = (start_width + (x - start_x)).max(limits.min_width);
                let height = (start_height + (y - start_y)).max(limits.min_height);
                registry.update_size(window, width, height);
                true
            }
        }
    }

    /// Pointer released anywhere. Returns true when a grab was active.
    pub fn release(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = ChromeState::Idle;
        was_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::AppId;
    use crate::wm::registry::{Viewport, WindowLimits};
    use proptest::prelude::*;

    fn setup() -> (WindowRegistry, WindowId) {
        let mut reg = WindowRegistry::with_seed(
            WindowLimits::PIXELS,
            Viewport {
                width: 1600,
                height: 900,
            },
            3,
        );
        let id = reg.open(AppId::Terminal);
        reg.update_position(id, 200, 150);
        (reg, id)
    }

    #[test]
    fn drag_follows_pointer_minus_offset() {
        let (mut reg, id) = setup();
        let mut chrome = Chrome::new();
        chrome.press_title(&mut reg, id, 220, 160);
        assert!(chrome.pointer_move(&mut reg, 320, 260));
        let g = reg.get(id).unwrap().geometry;
        assert_eq!((g.x, g.y), (300, 250));
        assert!(chrome.release());
        assert!(!chrome.pointer_move(&mut reg, 900, 900));
        assert_eq!(reg.get(id).unwrap().geometry.x, 300);
    }

    #[test]
    fn drag_clamps_at_top_left() {
        let (mut reg, id) = setup();
        let mut chrome = Chrome::new();
        chrome.press_title(&mut reg, id, 250, 170);
        chrome.pointer_move(&mut reg, 10, 5);
        let g = reg.get(id).unwrap().geometry;
        assert_eq!((g.x, g.y), (0, 0));
    }

    #[test]
    fn press_title_raises_window() {
        let (mut reg, id) = setup();
        let other = reg.open(AppId::Notepad);
        assert_eq!(reg.focused().map(|w| w.id), Some(other));
        Chrome::new().press_title(&mut reg, id, 201, 151);
        assert_eq!(reg.focused().map(|w| w.id), Some(id));
    }

    #[test]
    fn resize_adds_delta_with_floor() {
        let (mut reg, id) = setup();
        let mut chrome = Chrome::new();
        chrome.press_resize_handle(&mut reg, id, 1000, 750);
        chrome.pointer_move(&mut reg, 1100, 700);
        let g = reg.get(id).unwrap().geometry;
        assert_eq!((g.width, g.height), (900, 550));
        chrome.pointer_move(&mut reg, 0, 0);
        let g = reg.get(id).unwrap().geometry;
        assert_eq!((g.width, g.height), (300, 200));
        chrome.release();
        assert_eq!(chrome.state(), ChromeState::Idle);
    }

    #[test]
    fn moves_after_close_are_harmless() {
        let (mut reg, id) = setup();
        let mut chrome = Chrome::new();
        chrome.press_title(&mut reg, id, 210, 160);
        reg.close(id);
        assert!(chrome.pointer_move(&mut reg, 400, 400));
        assert!(reg.is_empty());
    }

    #[test]
    fn press_on_unknown_window_stays_idle() {
        let (mut reg, id) = setup();
        reg.close(id);
        let mut chrome = Chrome::new();
        chrome.press_title(&mut reg, id, 0, 0);
        assert!(!chrome.is_active());
    }

    proptest! {
        #[test]
        fn drag_never_negative(px in -2000i32..2000, py in -2000i32..2000, grab_x in 0i32..800, grab_y in 0i32..40) {
            let (mut reg, id) = setup();
            let mut chrome = Chrome::new();
            chrome.press_title(&mut reg, id, 200 + grab_x, 150 + grab_y);
            chrome.pointer_move(&mut reg, px, py);
            let g = reg.get(id).unwrap().geometry;
            prop_assert!(g.x >= 0 && g.y >= 0);
        }

        #[test]
        fn resize_never_below_minimum(px in -3000i32..3000, py in -3000i32..3000) {
            let (mut reg, id) = setup();
            let mut chrome = Chrome::new();
            chrome.press_resize_handle(&mut reg, id, 999, 749);
            chrome.pointer_move(&mut reg, px, py);
            let g = reg.get(id).unwrap().geometry;
            prop_assert!(g.width >= 300 && g.height >= 200);
        }
    }
}
