//! Logger module
//!
//! Provides logging utilities for the function worker including:
//! - Worker lifecycle logging
//! - Function invocation logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::LogLevel;

use crate::config::Config;
use crate::routing::RouteTable;
use chrono::Local;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config
        .logging
        .level
        .parse::<LogLevel>()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: LogLevel) -> bool {
    writer::get().map_or(level <= LogLevel::Info, |w| w.enabled(level))
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write a leveled line: warnings and errors to the error log, the rest to the info log
fn emit(level: LogLevel, message: &str) {
    #[cfg(test)]
    capture::record(level, message);

    let line = leveled(level, message);
    if level <= LogLevel::Warn {
        write_error(&line);
    } else {
        write_info(&line);
    }
}

/// Prefix a message with timestamp and level
fn leveled(level: LogLevel, message: &str) -> String {
    format!(
        "{} [{}] {message}",
        Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"),
        level.as_str()
    )
}

pub fn log_server_start(addr: &SocketAddr, routes: &RouteTable, config: &Config) {
    if !enabled(LogLevel::Info) {
        return;
    }
    write_info("======================================");
    write_info("Function worker started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    let binding = routes.binding();
    write_info(&format!(
        "Function: {} [{}] ({}) -> http://{addr}{}",
        binding.name,
        binding.allow_header(),
        binding.auth_level.as_str(),
        routes.path()
    ));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_shutdown(open_connections: usize, grace: std::time::Duration) {
    if enabled(LogLevel::Info) {
        write_info(&format!(
            "[Shutdown] Listener closed, waiting up to {}s for {open_connections} connection(s)",
            grace.as_secs()
        ));
    }
}

pub fn log_shutdown_complete() {
    if enabled(LogLevel::Info) {
        write_info("[Shutdown] All connections finished");
    }
}

/// Informational message emitted from inside a function
pub fn log_function_info(category: &str, message: &str) {
    if enabled(LogLevel::Info) {
        emit(LogLevel::Info, &format!("[{category}] {message}"));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    if enabled(LogLevel::Debug) {
        write_info(&format!("[Connection] Accepted from: {peer_addr}"));
    }
}

pub fn log_connection_closed(peer_addr: &SocketAddr, reason: &str) {
    if enabled(LogLevel::Debug) {
        write_info(&format!("[Connection] Closing {peer_addr}: {reason}"));
    }
}

pub fn log_request(method: &hyper::Method, uri: &hyper::Uri) {
    if enabled(LogLevel::Debug) {
        write_info(&format!("[Request] {method} {uri}"));
    }
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    emit(LogLevel::Error, message);
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        emit(LogLevel::Warn, message);
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

/// Thread-local record of the leveled entries emitted by code under test
#[cfg(test)]
pub mod capture {
    use super::LogLevel;
    use std::cell::RefCell;

    thread_local! {
        static ENTRIES: RefCell<Option<Vec<(LogLevel, String)>>> = const { RefCell::new(None) };
    }

    /// Run `f` and return the entries it emitted on this thread
    pub fn collect(f: impl FnOnce()) -> Vec<(LogLevel, String)> {
        ENTRIES.with(|entries| *entries.borrow_mut() = Some(Vec::new()));
        f();
        ENTRIES.with(|entries| entries.borrow_mut().take().unwrap_or_default())
    }

    pub(super) fn record(level: LogLevel, message: &str) {
        ENTRIES.with(|entries| {
            if let Some(entries) = entries.borrow_mut().as_mut() {
                entries.push((level, message.to_string()));
            }
        });
    }
}
