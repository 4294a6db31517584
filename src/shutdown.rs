use std::sync::Arc;

use tokio::sync::watch;

/// Run-wide stop signal. `true` once cancellation or fail-fast escalation fired.
pub type ShutdownSender = Arc<watch::Sender<bool>>;
pub type ShutdownReceiver = watch::Receiver<bool>;

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    (Arc::new(shutdown_tx), shutdown_rx)
}

/// Fires the signal; repeated calls are no-ops.
pub fn trigger_shutdown(shutdown_tx: &ShutdownSender) {
    shutdown_tx.send_if_modified(|stopped| {
        if *stopped {
            false
        } else {
            *stopped = true;
            true
        }
    });
}

#[must_use]
pub fn is_shutdown(shutdown_rx: &ShutdownReceiver) -> bool {
    *shutdown_rx.borrow()
}

/// Resolves once the signal has fired. Never resolves if the sender is gone
/// without firing, since nothing can cancel the run anymore.
pub async fn wait_for_shutdown(shutdown_rx: &mut ShutdownReceiver) {
    if shutdown_rx.wait_for(|stopped| *stopped).await.is_err() {
        std::future::pending::<()>().await;
    }
}
