// Server loop module
// Accepts connections until shutdown, then drains in-flight connections

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::accept_connection;
use super::signal::ShutdownSignal;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(25);
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Accept connections on `listener` until `shutdown` fires.
///
/// Connection tasks are spawned with `spawn_local`, so this must run inside
/// a `tokio::task::LocalSet`. After shutdown the listener is closed, open
/// connections are asked to finish, and the loop waits up to
/// `server.shutdown_timeout` seconds for them.
pub async fn serve(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<ShutdownSignal>) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let (closing_tx, closing_rx) = watch::channel(false);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            &closing_rx,
                        );
                    }
                    Err(e) => {
                        // e.g. EMFILE
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }

            () = shutdown.wait() => break,
        }
    }

    drop(listener);
    let _ = closing_tx.send(true);

    let grace = Duration::from_secs(state.config.server.shutdown_timeout);
    let remaining = wait_for_drain(&active_connections, grace).await;
    logger::log_shutdown_complete(remaining);
}

/// Wait until no connections remain or `grace` elapses; returns the count left
async fn wait_for_drain(active_connections: &AtomicUsize, grace: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + grace;
    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 || tokio::time::Instant::now() >= deadline {
            return remaining;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
