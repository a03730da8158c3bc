//! Progress bar rendering using ratatui.
//!
//! Bars live in a small inline viewport below the cursor, one line per
//! indicator:
//!
//! ```text
//! PING : [████████████████████░░░░░░░░░░░░░░░░░░░░] 10ms
//! ```

use std::io::{self, Write};

use log::{debug, warn};
use ratatui::{
    backend::Backend,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame, Terminal, TerminalOptions, Viewport,
};

use super::indicator::{Indicator, IndicatorKey, IndicatorSet};
use crate::units::{to_megabits, whole};

/// Lines reserved for the bars, one per indicator key.
pub const VIEWPORT_HEIGHT: u16 = IndicatorKey::ALL.len() as u16;

/// Bar width in cells.
pub const BAR_WIDTH: usize = 40;

/// Bar width used on narrow terminals.
pub const NARROW_BAR_WIDTH: usize = 20;

/// Narrow mode threshold in columns.
const NARROW_MODE_THRESHOLD: u16 = 60;

const FILLED_CELL: &str = "\u{2588}";
const EMPTY_CELL: &str = "\u{2591}";

/// Creates the backend for a new rendering context.
pub type BackendFactory<B> = Box<dyn FnMut() -> io::Result<B>>;

/// Check if narrow bars should be used based on terminal width.
pub fn is_narrow(width: u16) -> bool {
    width < NARROW_MODE_THRESHOLD
}

/// Bar width for a terminal `width` columns wide.
pub fn bar_width(width: u16) -> usize {
    if is_narrow(width) {
        NARROW_BAR_WIDTH
    } else {
        BAR_WIDTH
    }
}

/// Build the `LABEL : [bar] result` line for one indicator.
pub fn indicator_line(
    key: IndicatorKey,
    indicator: &Indicator,
    width: usize,
) -> Line<'static> {
    let filled = indicator.filled_cells(width);

    let result_style = match key {
        IndicatorKey::Overall => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(Color::Cyan),
    };

    Line::from(vec![
        Span::styled(
            key.label(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" : ["),
        Span::raw(FILLED_CELL.repeat(filled)),
        Span::styled(
            EMPTY_CELL.repeat(width - filled),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("] "),
        Span::styled(indicator.result().to_string(), result_style),
    ])
}

/// Render every indicator, in display order, into the frame.
pub fn render_indicators(frame: &mut Frame, indicators: &IndicatorSet) {
    let area = frame.area();
    let width = bar_width(area.width);

    let lines: Vec<Line> = indicators
        .iter()
        .map(|(key, indicator)| indicator_line(key, indicator, width))
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

/// Owns the indicators of a run and the terminal context they are drawn
/// into.
///
/// A renderer without a backend factory is headless: it keeps the same
/// indicator state but draws nothing.
pub struct ProgressRenderer<B: Backend> {
    /// Creates a backend on `open`; `None` for headless renderers
    factory: Option<BackendFactory<B>>,
    /// Root rendering context, present while open
    terminal: Option<Terminal<B>>,
    /// Whether `open` has been called since the last `close`
    open: bool,
    /// Indicators created so far
    indicators: IndicatorSet,
}

impl<B: Backend> ProgressRenderer<B> {
    /// Create a renderer that draws into backends made by `factory`.
    pub fn new(factory: impl FnMut() -> io::Result<B> + 'static) -> Self {
        Self {
            factory: Some(Box::new(factory)),
            terminal: None,
            open: false,
            indicators: IndicatorSet::new(),
        }
    }

    /// Create a renderer that tracks indicators without drawing.
    pub fn headless() -> Self {
        Self {
            factory: None,
            terminal: None,
            open: false,
            indicators: IndicatorSet::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    /// Create the rendering context, closing an existing one first.
    ///
    /// The cursor stays hidden until `close`. If the terminal cannot be set
    /// up the renderer is still opened, headless, so indicators keep
    /// tracking the run and text still reaches stdout.
    pub fn open(&mut self) -> io::Result<()> {
        if self.open {
            debug!("Progress display already open, reopening");
            self.close()?;
        }

        if let Some(factory) = self.factory.as_mut() {
            match Self::attach(factory) {
                Ok(terminal) => self.terminal = Some(terminal),
                Err(e) => warn!("Progress bars unavailable, continuing without them: {}", e),
            }
        }

        self.open = true;
        Ok(())
    }

    fn attach(factory: &mut BackendFactory<B>) -> io::Result<Terminal<B>> {
        let backend = factory()?;
        let mut terminal = Terminal::with_options(
            backend,
            TerminalOptions { viewport: Viewport::Inline(VIEWPORT_HEIGHT) },
        )?;
        terminal.hide_cursor()?;

        Ok(terminal)
    }

    /// Get the indicator for `key`, creating it at 0% on first use.
    pub fn ensure_indicator(&mut self, key: IndicatorKey) -> &mut Indicator {
        self.indicators.get_or_create(key)
    }

    pub fn update_ping(&mut self, fraction: f64, latency_ms: f64) {
        self.update(
            IndicatorKey::Ping,
            Some(fraction),
            Some(format!("{}ms", whole(latency_ms))),
        );
    }

    pub fn update_download(&mut self, fraction: f64, bandwidth: f64) {
        self.update(
            IndicatorKey::Download,
            Some(fraction),
            Some(format!("{}Mbps", to_megabits(bandwidth))),
        );
    }

    pub fn update_upload(&mut self, fraction: f64, bandwidth: f64) {
        self.update(
            IndicatorKey::Upload,
            Some(fraction),
            Some(format!("{}Mbps", to_megabits(bandwidth))),
        );
    }

    /// Update the overall line. Either part may be left unchanged.
    pub fn update_overall(
        &mut self,
        fraction: Option<f64>,
        elapsed_secs: Option<u64>,
    ) {
        self.update(
            IndicatorKey::Overall,
            fraction,
            elapsed_secs.map(|secs| format!("{}secs", secs)),
        );
    }

    fn update(
        &mut self,
        key: IndicatorKey,
        fraction: Option<f64>,
        result: Option<String>,
    ) {
        if !self.open {
            debug!("Ignoring {} update, progress display is closed", key.label());
            return;
        }

        let indicator = self.ensure_indicator(key);
        if let Some(fraction) = fraction {
            indicator.set_fraction(fraction);
        }
        if let Some(result) = result {
            indicator.set_result(result);
        }

        self.redraw();
    }

    /// Print text above the bars, or to stdout when nothing is drawn.
    pub fn print_above(&mut self, text: &str) -> io::Result<()> {
        let Some(terminal) = self.terminal.as_mut() else {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", text)?;
            return stdout.flush();
        };

        let lines: Vec<Line> =
            text.split('\n').map(|line| Line::from(line.to_string())).collect();
        let height = lines.len() as u16;

        terminal.insert_before(height, |buf| {
            Paragraph::new(lines).render(buf.area, buf);
        })?;

        self.redraw();
        Ok(())
    }

    fn redraw(&mut self) {
        let Some(terminal) = self.terminal.as_mut() else { return };
        let indicators = &self.indicators;

        if let Err(e) =
            terminal.draw(|frame| render_indicators(frame, indicators))
        {
            warn!("Failed to draw progress: {}", e);
        }
    }

    /// Tear down the rendering context and forget all indicators.
    ///
    /// The last frame stays on screen and the cursor is parked on its
    /// bottom line. Closing a renderer that was never opened does nothing.
    pub fn close(&mut self) -> io::Result<()> {
        self.indicators.clear();
        self.open = false;

        let Some(mut terminal) = self.terminal.take() else {
            return Ok(());
        };

        let area = terminal.get_frame().area();
        terminal.set_cursor_position((0, area.bottom().saturating_sub(1)))?;
        terminal.show_cursor()?;

        Ok(())
    }

    #[cfg(test)]
    pub fn terminal(&self) -> Option<&Terminal<B>> {
        self.terminal.as_ref()
    }
}

impl<B: Backend> Drop for ProgressRenderer<B> {
    /// Restore the cursor even if `close` is never called explicitly.
    fn drop(&mut self) {
        let _ = self.close();
    }
}
