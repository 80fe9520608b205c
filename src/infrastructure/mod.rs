//! Infrastructure layer
//!
//! Owns the scarce resource (the browser page) and only exposes capabilities.

pub mod js_executor;
pub mod surface;

pub use js_executor::JsExecutor;
pub use surface::{Key, Locator, UiSurface};
