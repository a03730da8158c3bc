//! Measurement collaborator contract.
//!
//! The network measurement itself is done by an external engine. This
//! module defines what the engine hands back: a stream of
//! [`ProgressEvent`]s followed by exactly one [`RunResult`] or error.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::errors::MeasurementError;

pub mod speedtest;
pub(crate) mod wire;

pub use speedtest::SpeedtestCli;

/// Identity of the test, announced once when the engine starts measuring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestStart {
    /// ISP name
    pub isp: String,
    /// Public IP address of the client
    pub external_ip: String,
    /// Server city
    pub server_location: String,
    /// Server country
    pub server_country: String,
    /// Server sponsor name
    pub server_name: String,
    /// Server host name
    pub server_host: String,
}

/// Phase-specific payload of a progress notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressKind {
    /// The engine picked a server and is starting.
    TestStart(TestStart),
    /// Latency probing.
    Ping {
        /// Phase completion in [0, 1]
        fraction: f64,
        /// Current latency in milliseconds
        latency_ms: f64,
    },
    /// Download saturation.
    Download {
        /// Phase completion in [0, 1]
        fraction: f64,
        /// Current bandwidth in bytes per second
        bandwidth: f64,
    },
    /// Upload saturation.
    Upload {
        /// Phase completion in [0, 1]
        fraction: f64,
        /// Current bandwidth in bytes per second
        bandwidth: f64,
    },
}

/// A progress notification from the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// What happened
    pub kind: ProgressKind,
    /// Overall completion of the whole run in [0, 1]
    pub overall: f64,
}

impl ProgressEvent {
    pub fn new(kind: ProgressKind, overall: f64) -> Self {
        Self { kind, overall }
    }
}

/// Final values of a successful run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    /// Idle latency in milliseconds
    pub latency_ms: f64,
    /// Jitter in milliseconds
    pub jitter_ms: f64,
    /// Download bandwidth in bytes per second
    pub download_bandwidth: f64,
    /// Upload bandwidth in bytes per second
    pub upload_bandwidth: f64,
    /// Packet loss in percent
    pub packet_loss: f64,
    /// Shareable result page, when the engine published one
    pub url: Option<String>,
}

/// Sending half of the progress channel handed to a provider.
pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

/// Configuration passed to the measurement engine.
#[derive(Debug, Clone)]
pub struct MeasurementConfig {
    /// Accept the GDPR notice without prompting.
    /// Default: true
    pub accept_gdpr: bool,

    /// Accept the engine license without prompting.
    /// Default: true
    pub accept_license: bool,

    /// Engine executable, resolved through PATH when relative.
    /// Default: `speedtest`
    pub binary: PathBuf,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            accept_gdpr: true,
            accept_license: true,
            binary: PathBuf::from("speedtest"),
        }
    }
}

/// Something that can run one speed test.
///
/// Implementations send zero or more progress events on `progress` and
/// then resolve exactly once. Events are always sent before the future
/// resolves.
pub trait MeasurementProvider {
    async fn run(
        &self,
        config: &MeasurementConfig,
        progress: ProgressSender,
    ) -> Result<RunResult, MeasurementError>;
}
