//! FutureOS: a pretend desktop with overlapping windows, a taskbar and four
//! toy apps, drawn in the terminal.

pub mod apps;
pub mod config;
pub mod desktop;
pub mod i18n;
pub mod setup;
pub mod shell;
pub mod ui;
pub mod vfs;
pub mod wm;
