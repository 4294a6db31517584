use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::engine::RunCanceller;
use crate::shutdown::{ShutdownReceiver, wait_for_shutdown};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Cancels the run on Ctrl+C (or SIGTERM on unix). Exits quietly once
/// `done_rx` fires.
pub(crate) fn setup_signal_canceller(
    canceller: RunCanceller,
    mut done_rx: ShutdownReceiver,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        let terminated = async {
            if let Some(signal) = term_signal.as_mut() {
                signal.recv().await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        #[cfg(not(unix))]
        let terminated = std::future::pending::<()>();

        tokio::select! {
            () = wait_for_shutdown(&mut done_rx) => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    warn!("Failed to listen for Ctrl+C: {}", err);
                    return;
                }
                info!("Interrupted; stopping workers.");
                canceller.cancel();
            }
            () = terminated => {
                info!("Terminated; stopping workers.");
                canceller.cancel();
            }
        }
    })
}
