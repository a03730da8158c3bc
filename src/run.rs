//! Drives a single measurement run.

use log::{debug, info};
use ratatui::backend::Backend;
use tokio::sync::mpsc;

use crate::errors::MeasurementError;
use crate::measurement::{MeasurementConfig, MeasurementProvider};
use crate::results::Summary;
use crate::session::RunSession;

/// Run one speed test and return its summary.
///
/// Progress events are handled as they arrive, ahead of ticker firings,
/// and all events are handled before the terminal result. On success the
/// display is torn down before the summary is built; on failure it is torn
/// down as well and the error is returned unchanged.
pub async fn run_speed_test<P, B>(
    provider: &P,
    config: &MeasurementConfig,
    session: &mut RunSession<B>,
) -> Result<Summary, MeasurementError>
where
    P: MeasurementProvider,
    B: Backend,
{
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();

    let measurement = provider.run(config, progress_tx);
    tokio::pin!(measurement);

    let outcome = loop {
        tokio::select! {
            biased;
            Some(event) = progress_rx.recv() => session.on_event(&event),
            _ = session.tick() => session.on_tick(),
            outcome = &mut measurement => break outcome,
        }
    };

    // The provider may have queued events right before resolving
    while let Ok(event) = progress_rx.try_recv() {
        session.on_event(&event);
    }

    match outcome {
        Ok(result) => {
            let elapsed = session.finish();
            info!("Speed test complete after {} seconds", elapsed);
            Ok(Summary::new(&result, elapsed))
        }
        Err(error) => {
            debug!("Speed test failed: {:?}", error);
            session.finish();
            Err(error)
        }
    }
}
