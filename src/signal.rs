//! Log-reopen signal handling.
//!
//! `SIGUSR1` asks the process to reopen its log file, the usual contract
//! with logrotate-style tools. Nothing else is handled: the listeners run
//! until the process exits.

use crate::logging::LogSink;

/// Reopens `sink` every time `SIGUSR1` arrives, for the life of the process.
///
/// **BEWARE:** registering the handler is permanent and process-wide; call
/// this from the binary's entry point, not from library code.
///
/// # Panics
///
/// Panics if the signal handler cannot be registered.
pub async fn reopen_logs_on_signal(sink: LogSink) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        use tracing::{error, info};

        let mut usr1 = signal(SignalKind::user_defined1()).expect("failed to install SIGUSR1 handler");
        while usr1.recv().await.is_some() {
            info!("got SIGUSR1");
            if let Err(e) = sink.reopen() {
                error!("reopening log file: {e}");
            }
        }
    }

    // No SIGUSR1 outside unix.
    #[cfg(not(unix))]
    {
        drop(sink);
        std::future::pending::<()>().await;
    }
}
