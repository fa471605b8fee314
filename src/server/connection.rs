// Connection handling module
// Accepts a single TCP connection and serves it over HTTP/1.1

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::task::JoinSet;
use tokio::time::Instant;

use super::activity::{ConnActivity, TrackedStream};
use crate::config;
use crate::handler;
use crate::logger;

/// How often a draining connection re-checks whether its request finished
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
/// * `connections` - Tasks of the open connections, awaited on shutdown
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<config::AppState>,
    conn_counter: &Arc<AtomicUsize>,
    connections: &mut JoinSet<()>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.access_log_enabled() {
        logger::log_connection_accepted(&peer_addr);
    }

    if let Err(e) = stream.set_nodelay(true) {
        logger::log_warning(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        connections,
    );
}

/// Handle a single connection in a spawned local task.
///
/// This function:
/// 1. Wraps the TCP stream so request/response activity is tracked
/// 2. Configures HTTP/1.1 settings (keep-alive, header read timeout)
/// 3. Serves the connection with the request handler
/// 4. Closes it once idle longer than `keep_alive_timeout`, or once the
///    worker drains and no request is in progress
/// 5. Decrements connection counter when done
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<config::AppState>,
    conn_counter: Arc<AtomicUsize>,
    connections: &mut JoinSet<()>,
) {
    let mut drain = state.drain.subscribe();
    let keep_alive = Duration::from_secs(state.config.performance.keep_alive_timeout);
    let header_timeout = Duration::from_secs(state.config.performance.read_timeout);

    connections.spawn_local(async move {
        let activity = ConnActivity::new();
        let io = TokioIo::new(TrackedStream::new(stream, Rc::clone(&activity)));

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(header_timeout)
            .keep_alive(!keep_alive.is_zero());

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, peer_addr, Arc::clone(&state))),
        );
        let mut conn = std::pin::pin!(conn);

        let mut draining = *drain.borrow_and_update();
        let mut closing = false;

        let result = loop {
            if draining && !closing && !activity.is_pending() {
                logger::log_connection_closed(&peer_addr, "worker shutting down");
                conn.as_mut().graceful_shutdown();
                closing = true;
            }

            let idle_at = activity.idle_deadline(keep_alive);
            tokio::select! {
                result = conn.as_mut() => break result,

                changed = drain.changed(), if !draining => {
                    // A dropped sender means the worker is going away too
                    draining = changed.is_err() || *drain.borrow_and_update();
                }

                () = tokio::time::sleep_until(idle_at), if !closing && !keep_alive.is_zero() => {
                    if !activity.is_pending() && Instant::now() >= activity.idle_deadline(keep_alive) {
                        logger::log_connection_closed(&peer_addr, "keep-alive timeout");
                        conn.as_mut().graceful_shutdown();
                        closing = true;
                    }
                }

                () = tokio::time::sleep(DRAIN_POLL_INTERVAL), if draining && !closing => {}
            }
        };

        match result {
            Ok(()) => {}
            Err(err) if err.is_timeout() => {
                if activity.is_pending() {
                    logger::log_warning(&format!(
                        "Connection from {peer_addr} did not finish request headers within {} seconds",
                        header_timeout.as_secs()
                    ));
                } else {
                    logger::log_connection_closed(&peer_addr, "no request within read timeout");
                }
            }
            Err(err) => logger::log_connection_error(&err),
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
