// Server module entry point
// Binds the listener, installs signal handlers and runs the accept loop

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the file is mounted as `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

use std::sync::Arc;

use crate::config::AppState;
use crate::error::StartupError;
use crate::logger;

// Re-export commonly used items
pub use listener::create_listener;
pub use server_loop::serve;
pub use signal::ShutdownSignal;

/// Bind the configured address and serve until SIGINT/SIGTERM
///
/// Returns `Ok(())` after a clean shutdown; bind and signal registration
/// failures are startup errors.
pub async fn run(state: Arc<AppState>) -> Result<(), StartupError> {
    let addr = state.config.socket_addr()?;
    let listener = create_listener(addr, state.config.server.backlog)
        .map_err(|source| StartupError::Bind { addr, source })?;

    logger::log_server_start(&listener.local_addr()?, &state);

    let shutdown = Arc::new(ShutdownSignal::new());
    signal::start_signal_handler(Arc::clone(&shutdown))?;

    let local = tokio::task::LocalSet::new();
    local.run_until(serve(listener, state, shutdown)).await;
    Ok(())
}
