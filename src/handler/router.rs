//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: route resolution, method
//! filtering, function dispatch and access logging.

use crate::config::AppState;
use crate::function;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::RouteMatch;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    Ok(dispatch(&req, peer_addr, &state))
}

/// Resolve, run and log one request
pub fn dispatch<B>(req: &Request<B>, peer_addr: SocketAddr, state: &AppState) -> Response<Full<Bytes>> {
    let started = Instant::now();
    let access_log = state.access_log_enabled();
    if access_log {
        logger::log_request(req.method(), req.uri());
    }

    let response = match state.routes.resolve(req.method(), req.uri().path()) {
        RouteMatch::Handler => function::hello_world(req),
        RouteMatch::MethodNotAllowed(binding) => {
            logger::log_warning(&format!(
                "Method not allowed: {} {}",
                req.method(),
                req.uri().path()
            ));
            http::build_405_response(&binding.allow_header())
        }
        RouteMatch::NotFound => http::build_404_response(),
    };

    if access_log {
        let mut entry = AccessLogEntry::from_request(req, peer_addr);
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    response
}
