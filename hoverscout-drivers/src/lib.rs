//! Driver layer for browser automation.
//!
//! This crate exposes the WebDriver client wrapper and page/pointer helpers
//! that the exploration core uses to drive an unfamiliar page.
//!
//! - [`scout_browser::driver::ScoutDriver`]: WebDriver session wrapper
//! - [`scout_browser::page::ScoutPage`]: script execution and DOM read-back
//! - [`scout_browser::pointer::PointerEngine`]: humanised pointer movement
pub mod scout_browser;
