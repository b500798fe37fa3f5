//! Ctrl+C / SIGTERM handling that leaves the connection to the caller.

use tokio::signal;
use tracing::warn;

use crate::error::AppError;

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Run `body` until it finishes or `signal` fires.
///
/// On a signal the body is dropped and `AppError::Interrupted` comes back,
/// so the caller still holds its connection and can close it.
pub async fn until_shutdown<T, E, F, S>(body: F, signal: S) -> Result<T, AppError>
where
    F: Future<Output = Result<T, E>>,
    S: Future<Output = ()>,
    E: Into<AppError>,
{
    tokio::select! {
        biased;
        result = body => result.map_err(Into::into),
        _ = signal => {
            warn!("shutdown signal received, stopping");
            Err(AppError::Interrupted)
        }
    }
}
