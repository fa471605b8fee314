// Application state module
// Shared runtime state handed to every connection task

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};

use super::types::Config;
use crate::function::{self, FunctionBinding};
use crate::routing::RouteTable;

/// Application state
pub struct AppState {
    pub config: Config,
    pub routes: RouteTable,
    pub shutdown_signal: Arc<Notify>,
    /// Flips to `true` when open connections should finish and close
    pub drain: watch::Sender<bool>,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_binding(config, function::hello_world_binding())
    }

    /// Create state routing `binding` under the configured prefix
    pub fn with_binding(config: &Config, binding: FunctionBinding) -> Self {
        Self {
            config: config.clone(),
            routes: RouteTable::new(&config.function.route_prefix, binding),
            shutdown_signal: Arc::new(Notify::new()),
            drain: watch::channel(false).0,
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
        }
    }

    pub fn access_log_enabled(&self) -> bool {
        self.cached_access_log.load(Ordering::Relaxed)
    }
}
