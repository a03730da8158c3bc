//! Text blocks printed around the live progress display.
//!
//! The header identifies the test once the engine has picked a server; the
//! summary is printed after the bars are torn down.

use std::fmt;

use crate::measurement::{RunResult, TestStart};
use crate::units::{to_megabits, whole};

/// Format the test identity header.
///
/// Ends with a newline so a blank line separates it from the bars.
pub fn format_header(start: &TestStart) -> String {
    format!(
        "TEST INFORMATION\nISP: {}\nPublic IP: {}\nServer: {}, {}\n",
        start.isp, start.external_ip, start.server_location, start.server_country
    )
}

/// Final values of a completed run, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Latency in milliseconds
    pub latency_ms: f64,
    /// Jitter in milliseconds
    pub jitter_ms: f64,
    /// Download bandwidth in bytes per second
    pub download_bandwidth: f64,
    /// Upload bandwidth in bytes per second
    pub upload_bandwidth: f64,
    /// Packet loss in percent
    pub packet_loss: f64,
    /// Seconds counted by the ticker during the run
    pub elapsed_secs: u64,
}

impl Summary {
    /// Create a Summary from the engine result and the elapsed time.
    pub fn new(result: &RunResult, elapsed_secs: u64) -> Self {
        Self {
            latency_ms: result.latency_ms,
            jitter_ms: result.jitter_ms,
            download_bandwidth: result.download_bandwidth,
            upload_bandwidth: result.upload_bandwidth,
            packet_loss: result.packet_loss,
            elapsed_secs,
        }
    }
}

impl fmt::Display for Summary {
    /// Renders the results block, starting with a blank line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "RESULTS")?;
        writeln!(f, "Latency: {}ms", whole(self.latency_ms))?;
        writeln!(f, "Jitter: {}ms", whole(self.jitter_ms))?;
        writeln!(f, "Download: {}Mbps", to_megabits(self.download_bandwidth))?;
        writeln!(f, "Upload: {}Mbps", to_megabits(self.upload_bandwidth))?;
        writeln!(f, "Packet Loss: {}%", whole(self.packet_loss))?;
        write!(f, "Elapsed Time: {}secs", self.elapsed_secs)
    }
}
