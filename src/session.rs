//! Per-run display state and event dispatch.
//!
//! A [`RunSession`] owns everything one measurement run mutates: the
//! progress renderer, the elapsed-time ticker and its counter. The
//! orchestrator feeds it progress events and ticks from a single task.

use log::{debug, warn};
use ratatui::backend::Backend;

use crate::measurement::{ProgressEvent, ProgressKind};
use crate::results::format_header;
use crate::tui::{ElapsedCounter, ProgressRenderer, Ticker};

/// State of one measurement run's progress display.
pub struct RunSession<B: Backend> {
    /// Progress bars
    renderer: ProgressRenderer<B>,
    /// Drives the elapsed-time label
    ticker: Ticker,
    /// Seconds counted so far
    elapsed: ElapsedCounter,
}

impl<B: Backend> RunSession<B> {
    pub fn new(renderer: ProgressRenderer<B>, ticker: Ticker) -> Self {
        Self { renderer, ticker, elapsed: ElapsedCounter::default() }
    }

    pub fn renderer(&self) -> &ProgressRenderer<B> {
        &self.renderer
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed.get()
    }

    /// Route one progress event to the display.
    ///
    /// The overall line is updated after every event, whatever its phase.
    pub fn on_event(&mut self, event: &ProgressEvent) {
        match &event.kind {
            ProgressKind::TestStart(start) => {
                if let Err(e) = self.renderer.open() {
                    warn!("Failed to open progress display: {}", e);
                }
                self.ticker.start();
                if let Err(e) = self.renderer.print_above(&format_header(start)) {
                    warn!("Failed to print test information: {}", e);
                }
            }
            ProgressKind::Ping { fraction, latency_ms } => {
                self.renderer.update_ping(*fraction, *latency_ms);
            }
            ProgressKind::Download { fraction, bandwidth } => {
                self.renderer.update_download(*fraction, *bandwidth);
            }
            ProgressKind::Upload { fraction, bandwidth } => {
                self.renderer.update_upload(*fraction, *bandwidth);
            }
        }

        self.renderer.update_overall(Some(event.overall), None);
    }

    /// Wait for the next ticker firing. Never completes while idle.
    pub async fn tick(&mut self) {
        self.ticker.tick().await
    }

    /// Push the elapsed time to the overall line, then count one second.
    pub fn on_tick(&mut self) {
        self.renderer.update_overall(None, Some(self.elapsed.get()));
        self.elapsed.increment();
    }

    /// Stop the ticker, tear down the display and reset the counter.
    ///
    /// Returns the seconds counted during the run.
    pub fn finish(&mut self) -> u64 {
        self.ticker.stop();
        if let Err(e) = self.renderer.close() {
            warn!("Failed to close progress display: {}", e);
        }

        let elapsed = self.elapsed.get();
        self.elapsed.reset();
        debug!("Run finished after {} seconds", elapsed);

        elapsed
    }
}
