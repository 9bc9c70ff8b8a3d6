//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Precompression and cache events
//! - Error and warning logging

mod format;
pub mod writer;

pub use format::{AccessLogEntry, AccessLogFormat};

use crate::compression::CompressionReport;
use crate::config::Config;
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
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

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("SPA server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Serving: {}", config.files.directory.display()));
    write_info(&format!(
        "SPA mode: {}",
        if config.files.spa_mode { "on" } else { "off" }
    ));
    if config.cache.enabled {
        write_info(&format!(
            "Response cache: {} bytes",
            config.cache.byte_budget
        ));
    } else {
        write_info("Response cache: disabled");
    }
    if config.auth.basic_auth.is_some() {
        write_info("Basic auth: enabled");
    }
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

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_rejected(peer_addr: &SocketAddr, limit: u64) {
    log_warning(&format!(
        "[Connection] Rejected {peer_addr}: {limit} connections already open"
    ));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_connection_timeout(peer_addr: &SocketAddr) {
    log_warning(&format!("[Connection] Timed out: {peer_addr}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &AccessLogFormat) {
    write_access(&entry.format(format));
}

pub fn log_compression(sidecar: &Path, original: usize, compressed: usize) {
    write_info(&format!(
        "[Compress] {} ({original} -> {compressed} bytes)",
        sidecar.display()
    ));
}

pub fn log_compression_done(report: &CompressionReport) {
    write_info(&format!(
        "[Compress] {} files scanned, {} sidecars written, {} up to date, {} below threshold",
        report.files, report.written, report.fresh, report.below_threshold
    ));
}

pub fn log_cache_eviction(entries: u64, budget: u64) {
    write_info(&format!(
        "[Cache] Evicted {entries} entries to stay within {budget} bytes"
    ));
}

pub fn log_cache_oversize(path: &str, size: u64, budget: u64) {
    log_warning(&format!(
        "[Cache] {path} ({size} bytes) exceeds the {budget} byte budget, serving uncached"
    ));
}

pub fn log_shutdown(signal: &str) {
    write_info(&format!("\n[Shutdown] {signal} received, stopping listener"));
}

pub fn log_shutdown_complete() {
    write_info("[Shutdown] Server stopped");
}
