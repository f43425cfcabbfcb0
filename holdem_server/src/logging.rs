//! Logging setup for the server binary.

use log::{info, warn};
use std::net::SocketAddr;

/// Initialize `env_logger`. `RUST_LOG` controls filtering and defaults
/// to `info`.
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();
}

/// Log a connection lifecycle event
pub fn log_connection_event(addr: SocketAddr, player: Option<&str>, message: &str) {
    match player {
        Some(player) => info!("{addr} ({player}): {message}"),
        None => info!("{addr}: {message}"),
    }
}

/// Log a line from a client that couldn't be used
pub fn log_bad_line(addr: SocketAddr, line: &str, reason: &str) {
    warn!("{addr}: dropped {line:?}: {reason}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_helpers_without_logger() {
        // Just ensure it doesn't panic
        let addr: SocketAddr = "127.0.0.1:6969".parse().unwrap();
        log_connection_event(addr, Some("alice"), "seated");
        log_connection_event(addr, None, "connected");
        log_bad_line(addr, "HELLO", "unknown command");
    }
}
