// Server loop module
// Accepts connections until a shutdown signal arrives, then drains

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Accept connections until `shutdown` resolves.
///
/// After shutdown the listener is closed and open connections get up to
/// `performance.connection_timeout` seconds to finish before the cache is
/// released.
pub async fn serve_until<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = &'static str>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            signal = &mut shutdown => {
                logger::log_shutdown(signal);
                break;
            }
        }
    }

    drop(listener);
    drain(&state).await;
    state.cache.clear();
    logger::log_shutdown_complete();
}

/// Wait for in-flight connections to finish, bounded by the connection timeout
async fn drain(state: &AppState) {
    let deadline =
        Instant::now() + Duration::from_secs(state.config.performance.connection_timeout);

    while state.open_connections.load(Ordering::Acquire) > 0 && Instant::now() < deadline {
        tokio::time::sleep(DRAIN_POLL).await;
    }

    let remaining = state.open_connections.load(Ordering::Acquire);
    if remaining > 0 {
        logger::log_warning(&format!(
            "{remaining} connections still open at shutdown"
        ));
    }
}
