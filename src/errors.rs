//! Error types for the speed test run.
//!
//! Every failure surfaces as a [`MeasurementError`]: the external
//! measurement engine could not produce a result. The variants only record
//! why, so the top level can pick a suggestion and an exit code.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for the application.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// The measurement failed for any reason.
    pub const MEASUREMENT_FAILED: i32 = 1;
    /// The user interrupted the run (Ctrl-C).
    pub const INTERRUPTED: i32 = 130;
}

/// Why a measurement run failed.
#[derive(Debug)]
pub enum MeasurementError {
    /// The engine license was not accepted, so the engine is never started.
    LicenseNotAccepted,
    /// The engine binary could not be started.
    Spawn {
        /// Binary we tried to execute
        binary: PathBuf,
        /// Underlying spawn error
        source: io::Error,
    },
    /// Reading the engine output failed.
    Io(io::Error),
    /// The engine reported an error on its event stream.
    Reported(String),
    /// The engine exited unsuccessfully.
    Exited {
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Whatever the engine wrote to stderr
        stderr: String,
    },
    /// The engine finished without emitting a result.
    MissingResult,
    /// The run was cancelled from the terminal.
    Interrupted,
}

impl MeasurementError {
    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            MeasurementError::Interrupted => exit_codes::INTERRUPTED,
            _ => exit_codes::MEASUREMENT_FAILED,
        }
    }

    /// Get a suggestion for how to resolve the error, if there is one.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            MeasurementError::LicenseNotAccepted => Some(
                "The speedtest license must be accepted before a test can run.",
            ),
            MeasurementError::Spawn { source, .. }
                if source.kind() == io::ErrorKind::NotFound =>
            {
                Some(
                    "Install the Ookla speedtest CLI and make sure `speedtest` is on your PATH.",
                )
            }
            MeasurementError::Spawn { .. } => {
                Some("Check that the speedtest binary is executable.")
            }
            MeasurementError::Reported(_) | MeasurementError::Exited { .. } => {
                Some("Check your internet connection and try again.")
            }
            _ => None,
        }
    }
}

impl fmt::Display for MeasurementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementError::LicenseNotAccepted => {
                write!(f, "speedtest license was not accepted")
            }
            MeasurementError::Spawn { binary, source } => {
                write!(f, "failed to start {}: {}", binary.display(), source)
            }
            MeasurementError::Io(source) => {
                write!(f, "failed to read speedtest output: {}", source)
            }
            MeasurementError::Reported(message) => {
                write!(f, "speedtest reported an error: {}", message)
            }
            MeasurementError::Exited { code, stderr } => {
                match code {
                    Some(code) => write!(f, "speedtest exited with status {}", code)?,
                    None => write!(f, "speedtest was terminated by a signal")?,
                }
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            MeasurementError::MissingResult => {
                write!(f, "speedtest finished without reporting a result")
            }
            MeasurementError::Interrupted => write!(f, "speed test interrupted"),
        }
    }
}

impl Error for MeasurementError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MeasurementError::Spawn { source, .. } => Some(source),
            MeasurementError::Io(source) => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for MeasurementError {
    fn from(error: io::Error) -> Self {
        MeasurementError::Io(error)
    }
}

/// Format an error for user display.
///
/// Includes the error message and, when available, a suggestion.
pub fn format_error_for_display(error: &MeasurementError) -> String {
    let mut output = format!("Error: {}", error);

    if let Some(suggestion) = error.suggestion() {
        output.push_str(&format!("\n\nSuggestion: {}", suggestion));
    }

    output
}
