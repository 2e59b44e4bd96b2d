pub mod chrome;
pub mod registry;

pub use chrome::{Chrome, ChromeState};
pub use registry::{Geometry, Viewport, WindowId, WindowLimits, WindowRecord, WindowRegistry};
