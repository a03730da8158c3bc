//! Measurement provider backed by the Ookla `speedtest` CLI.
//!
//! The engine is launched with JSON-lines output and progress enabled;
//! each stdout line is decoded into a progress event, and the final
//! `result` line becomes the [`RunResult`].

use std::process::Stdio;

use log::{debug, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;

use super::wire::{overall_fraction, parse_line, Message};
use super::{
    MeasurementConfig, MeasurementProvider, ProgressEvent, ProgressKind,
    ProgressSender, RunResult,
};
use crate::errors::MeasurementError;

/// Runs the Ookla speedtest CLI as a child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedtestCli;

impl SpeedtestCli {
    /// Command-line arguments for the engine.
    pub fn arguments(config: &MeasurementConfig) -> Vec<&'static str> {
        let mut args = Vec::with_capacity(4);

        if config.accept_license {
            args.push("--accept-license");
        }
        if config.accept_gdpr {
            args.push("--accept-gdpr");
        }
        args.push("--format=jsonl");
        args.push("--progress=yes");

        args
    }
}

impl MeasurementProvider for SpeedtestCli {
    async fn run(
        &self,
        config: &MeasurementConfig,
        progress: ProgressSender,
    ) -> Result<RunResult, MeasurementError> {
        // Without the flag the engine blocks on an interactive prompt.
        if !config.accept_license {
            return Err(MeasurementError::LicenseNotAccepted);
        }

        let args = Self::arguments(config);
        info!("Starting {} {}", config.binary.display(), args.join(" "));

        let mut child = Command::new(&config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MeasurementError::Spawn {
                binary: config.binary.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            MeasurementError::Io(std::io::Error::other("missing speedtest stdout"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            MeasurementError::Io(std::io::Error::other("missing speedtest stderr"))
        })?;

        let (outcome, stderr) = tokio::join!(
            read_events(BufReader::new(stdout), &progress),
            read_to_string(stderr)
        );
        let outcome = outcome?;
        let status = child.wait().await?;
        debug!("speedtest exited with {}", status);

        if let Some(message) = outcome.error {
            return Err(MeasurementError::Reported(message));
        }
        if !status.success() {
            return Err(MeasurementError::Exited { code: status.code(), stderr });
        }

        let result = outcome.result.ok_or(MeasurementError::MissingResult)?;
        if let Some(ref url) = result.url {
            info!("Result published at {}", url);
        }

        Ok(result)
    }
}

/// What the engine's stdout stream amounted to.
#[derive(Debug, Default)]
pub(crate) struct StreamOutcome {
    /// The final result line, if one arrived
    pub result: Option<RunResult>,
    /// The first error reported by the engine
    pub error: Option<String>,
}

/// Decode engine output line by line, forwarding progress as it arrives.
pub(crate) async fn read_events<R>(
    mut reader: R,
    progress: &ProgressSender,
) -> std::io::Result<StreamOutcome>
where
    R: AsyncBufRead + Unpin,
{
    let mut outcome = StreamOutcome::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        // Invalid UTF-8 only spoils its own line; serde rejects it below
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(Message::Progress(kind)) => {
                if let ProgressKind::TestStart(ref start) = kind {
                    info!(
                        "Testing against {} ({}) via {}",
                        start.server_name, start.server_host, start.isp
                    );
                }
                let overall = overall_fraction(&kind);
                if progress.send(ProgressEvent::new(kind, overall)).is_err() {
                    debug!("Progress receiver dropped, discarding event");
                }
            }
            Ok(Message::Result(result)) => outcome.result = Some(result),
            Ok(Message::Error(message)) => {
                warn!("speedtest reported: {}", message);
                outcome.error.get_or_insert(message);
            }
            Ok(Message::Ignored) => debug!("Ignoring speedtest line: {}", line),
            Err(e) => warn!("Skipping unreadable speedtest line ({}): {}", e, line),
        }
    }

    Ok(outcome)
}

async fn read_to_string<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut buf = String::new();
    if let Err(e) = reader.read_to_string(&mut buf).await {
        debug!("Failed to read speedtest stderr: {}", e);
    }
    buf
}
