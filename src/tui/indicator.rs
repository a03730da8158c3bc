//! Indicator keys and the lazily populated indicator set.

use std::collections::BTreeMap;

/// The progress lines the renderer can show, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndicatorKey {
    /// Latency phase
    Ping,
    /// Download phase
    Download,
    /// Upload phase
    Upload,
    /// Whole run, labelled with elapsed time
    Overall,
}

impl IndicatorKey {
    pub const ALL: [IndicatorKey; 4] = [
        IndicatorKey::Ping,
        IndicatorKey::Download,
        IndicatorKey::Upload,
        IndicatorKey::Overall,
    ];

    /// Label printed in front of the bar.
    pub fn label(self) -> &'static str {
        match self {
            IndicatorKey::Ping => "PING",
            IndicatorKey::Download => "DOWNLOAD",
            IndicatorKey::Upload => "UPLOAD",
            IndicatorKey::Overall => "PROGRESS",
        }
    }

    /// Result text shown before the first measurement arrives.
    pub fn zero_result(self) -> &'static str {
        match self {
            IndicatorKey::Ping => "0ms",
            IndicatorKey::Download | IndicatorKey::Upload => "0Mbps",
            IndicatorKey::Overall => "0secs",
        }
    }
}

/// State of a single progress line.
#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    fraction: f64,
    result: String,
}

impl Indicator {
    /// A fresh indicator at 0% with the key's zero label.
    pub fn new(key: IndicatorKey) -> Self {
        Self { fraction: 0.0, result: key.zero_result().to_string() }
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    /// Set completion, clamped to [0, 1]. Non-finite input reads as 0.
    pub fn set_fraction(&mut self, fraction: f64) {
        self.fraction =
            if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    }

    pub fn set_result(&mut self, result: impl Into<String>) {
        self.result = result.into();
    }

    /// Number of filled cells in a bar `width` cells wide.
    pub fn filled_cells(&self, width: usize) -> usize {
        ((self.fraction * width as f64).round() as usize).min(width)
    }
}

/// Indicators created so far in the current run.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    indicators: BTreeMap<IndicatorKey, Indicator>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the indicator for `key`, creating it on first use.
    pub fn get_or_create(&mut self, key: IndicatorKey) -> &mut Indicator {
        self.indicators.entry(key).or_insert_with(|| Indicator::new(key))
    }

    pub fn get(&self, key: IndicatorKey) -> Option<&Indicator> {
        self.indicators.get(&key)
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn clear(&mut self) {
        self.indicators.clear();
    }

    /// Indicators in display order.
    pub fn iter(&self) -> impl Iterator<Item = (IndicatorKey, &Indicator)> {
        self.indicators.iter().map(|(key, indicator)| (*key, indicator))
    }
}
