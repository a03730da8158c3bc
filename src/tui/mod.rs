//! TUI (Terminal User Interface) module for speedcheck.
//!
//! Live progress bars for a running speed test: the indicator model, the
//! renderer that draws it and the elapsed-time ticker.

pub mod display_mode;
pub mod indicator;
pub mod renderer;
pub mod ticker;

pub use display_mode::DisplayMode;
pub use renderer::ProgressRenderer;
pub use ticker::{ElapsedCounter, Ticker};
