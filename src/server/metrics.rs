//! Server metrics collection.
//!
//! Aggregate counters only. Nothing about message content or peers is kept.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Server metrics collector.
pub struct ServerMetrics {
    /// Server start time
    start_time: Instant,
    /// Total connections accepted
    total_connections: AtomicU64,
    /// Connections that passed authentication
    authenticated_sessions: AtomicU64,
    /// Connections that failed authentication
    auth_failures: AtomicU64,
    /// Sessions that ended with an I/O error
    session_errors: AtomicU64,
}

impl ServerMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_connections: AtomicU64::new(0),
            authenticated_sessions: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),
            session_errors: AtomicU64::new(0),
        }
    }

    /// Count an accepted connection.
    pub fn increment_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a successful authentication.
    pub fn increment_authenticated(&self) {
        self.authenticated_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failed authentication.
    pub fn increment_auth_failures(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a session that ended with an error.
    pub fn increment_session_errors(&self) {
        self.session_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get total connections.
    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// Get authenticated sessions.
    pub fn authenticated_sessions(&self) -> u64 {
        self.authenticated_sessions.load(Ordering::Relaxed)
    }

    /// Get authentication failures.
    pub fn auth_failures(&self) -> u64 {
        self.auth_failures.load(Ordering::Relaxed)
    }

    /// Get session errors.
    pub fn session_errors(&self) -> u64 {
        self.session_errors.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            total_connections: self.total_connections(),
            authenticated_sessions: self.authenticated_sessions(),
            auth_failures: self.auth_failures(),
            session_errors: self.session_errors(),
        }
    }
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of all metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Seconds since the server started
    pub uptime_secs: u64,
    /// Connections accepted
    pub total_connections: u64,
    /// Connections that authenticated
    pub authenticated_sessions: u64,
    /// Connections that failed authentication
    pub auth_failures: u64,
    /// Sessions ended by an error
    pub session_errors: u64,
}

impl MetricsSnapshot {
    /// Fraction of connections that authenticated.
    pub fn auth_rate(&self) -> f64 {
        if self.total_connections == 0 {
            0.0
        } else {
            self.authenticated_sessions as f64 / self.total_connections as f64
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uptime {}s, {} connections, {} authenticated, {} auth failures, {} errors",
            self.uptime_secs,
            self.total_connections,
            self.authenticated_sessions,
            self.auth_failures,
            self.session_errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = ServerMetrics::new();
        assert_eq!(metrics.total_connections(), 0);
        assert_eq!(metrics.authenticated_sessions(), 0);
        assert_eq!(metrics.auth_failures(), 0);
    }

    #[test]
    fn test_snapshot() {
        let metrics = ServerMetrics::new();

        metrics.increment_connections();
        metrics.increment_connections();
        metrics.increment_auth_failures();
        metrics.increment_connections();
        metrics.increment_authenticated();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_connections, 3);
        assert_eq!(snapshot.authenticated_sessions, 1);
        assert_eq!(snapshot.auth_failures, 1);
        assert_eq!(snapshot.session_errors, 0);
        assert!((snapshot.auth_rate() - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_auth_rate_without_connections() {
        assert_eq!(ServerMetrics::new().snapshot().auth_rate(), 0.0);
    }

    #[test]
    fn test_snapshot_display() {
        let metrics = ServerMetrics::new();
        metrics.increment_connections();
        metrics.increment_session_errors();

        let text = metrics.snapshot().to_string();
        assert!(text.contains("1 connections"));
        assert!(text.contains("1 errors"));
    }
}
