//! Display mode detection.
//!
//! Live progress bars need a terminal; when stdout is redirected the run
//! stays headless and only the header and results are printed.

/// The display mode for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Live progress bars
    Tui,
    /// No progress bars, plain text output only
    Silent,
}

impl DisplayMode {
    /// Determine display mode from terminal capabilities.
    ///
    /// # Arguments
    /// * `is_tty` - Whether stdout is a TTY (interactive terminal)
    pub fn detect(is_tty: bool) -> Self {
        if is_tty {
            DisplayMode::Tui
        } else {
            DisplayMode::Silent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tty_returns_tui_mode() {
        assert_eq!(DisplayMode::detect(true), DisplayMode::Tui);
    }

    #[test]
    fn test_non_tty_returns_silent_mode() {
        assert_eq!(DisplayMode::detect(false), DisplayMode::Silent);
    }
}
