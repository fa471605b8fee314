// Server loop module
// Accepts connections until the shutdown signal fires, then drains them

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// Run the accept loop on `listener`
///
/// Must be called inside a `tokio::task::LocalSet`; connections are served
/// on local tasks. Once `state.shutdown_signal` is notified the listener is
/// closed and open connections are drained: requests already in progress are
/// answered, idle connections are closed. Returns when every connection has
/// finished or `performance.shutdown_timeout` elapses, whichever comes first.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Arc::clone(&state.shutdown_signal);
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections, &mut connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            // Reap finished connection tasks
            Some(_) = connections.join_next(), if !connections.is_empty() => {}

            () = shutdown.notified() => break,
        }
    }

    drop(listener);
    state.drain.send_replace(true);

    let grace = Duration::from_secs(state.config.performance.shutdown_timeout);
    logger::log_shutdown(connections.len(), grace);

    let drained = tokio::time::timeout(grace, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_ok() {
        logger::log_shutdown_complete();
    } else {
        logger::log_warning(&format!(
            "Shutdown timeout reached, aborting {} connection(s)",
            connections.len()
        ));
        connections.shutdown().await;
    }

    Ok(())
}
