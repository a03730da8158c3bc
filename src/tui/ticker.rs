//! Elapsed-time ticker.
//!
//! A repeating timer that drives the "PROGRESS" line's seconds counter
//! while a run is displayed.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Ticker period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Seconds elapsed in the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElapsedCounter(u64);

impl ElapsedCounter {
    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn increment(&mut self) {
        self.0 += 1;
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Whether the ticker currently fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerState {
    Idle,
    Running,
}

/// Repeating timer with at most one active schedule.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    interval: Option<Interval>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self { period, interval: None }
    }

    /// Start firing every period, first firing one period from now.
    ///
    /// A running schedule is stopped first.
    pub fn start(&mut self) {
        self.stop();

        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    /// Stop firing. Stopping an idle ticker does nothing.
    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn state(&self) -> TickerState {
        if self.interval.is_some() {
            TickerState::Running
        } else {
            TickerState::Idle
        }
    }

    /// Wait for the next firing. Never completes while idle.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, sleep_until};

    /// Count firings until `deadline`.
    async fn count_ticks(ticker: &mut Ticker, deadline: Instant) -> u64 {
        let mut counter = ElapsedCounter::default();
        let deadline = sleep_until(deadline);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => break,
                _ = ticker.tick() => counter.increment(),
            }
        }

        counter.get()
    }

    #[test]
    fn test_counter() {
        let mut counter = ElapsedCounter::default();
        counter.increment();
        counter.increment();
        assert_eq!(counter.get(), 2);
        counter.reset();
        assert_eq!(counter.get(), 0);
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut ticker = Ticker::default();
        assert_eq!(ticker.state(), TickerState::Idle);

        ticker.start();
        assert_eq!(ticker.state(), TickerState::Running);

        ticker.stop();
        assert_eq!(ticker.state(), TickerState::Idle);

        // Stopping twice is fine
        ticker.stop();
        assert_eq!(ticker.state(), TickerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_second() {
        let mut ticker = Ticker::default();
        ticker.start();

        let ticks = count_ticks(&mut ticker, Instant::now() + Duration::from_millis(5500)).await;

        assert_eq!(ticks, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_does_not_double_rate() {
        let mut ticker = Ticker::default();
        ticker.start();
        ticker.start();

        let ticks = count_ticks(&mut ticker, Instant::now() + Duration::from_millis(3500)).await;

        assert_eq!(ticks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_schedule() {
        let mut ticker = Ticker::default();
        ticker.start();
        advance(Duration::from_millis(900)).await;

        // First firing is a full period after the restart, not 100ms later
        ticker.start();
        let ticks = count_ticks(&mut ticker, Instant::now() + Duration::from_millis(999)).await;

        assert_eq!(ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_ticker_never_fires() {
        let mut ticker = Ticker::default();
        ticker.start();
        ticker.stop();

        let ticks = count_ticks(&mut ticker, Instant::now() + Duration::from_secs(10)).await;

        assert_eq!(ticks, 0);
    }
}
