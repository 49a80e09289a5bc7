//! Metrics collection module
//!
//! Tracks per-operation call counts, failures, timeouts and response times
//! for the lifetime of the process.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Response times kept per operation
const WINDOW: usize = 100;

/// How a call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    Timeout,
}

#[derive(Debug, Default)]
struct Counters {
    calls: u64,
    failures: u64,
    timeouts: u64,
    response_times: VecDeque<u64>,
}

/// Process-wide metrics collector, owned by the application state
pub struct Metrics {
    /// Total calls across all operations
    total_calls: AtomicU64,
    operations: RwLock<HashMap<String, Counters>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_calls: AtomicU64::new(0),
            operations: RwLock::new(HashMap::new()),
        }
    }

    /// Record one finished call of `operation`
    pub fn record(&self, operation: &str, elapsed: Duration, outcome: Outcome) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);

        let mut operations = self.operations.write().unwrap_or_else(|e| e.into_inner());
        let counters = operations.entry(operation.to_string()).or_default();
        counters.calls += 1;
        match outcome {
            Outcome::Success => {}
            Outcome::Failure => counters.failures += 1,
            Outcome::Timeout => counters.timeouts += 1,
        }

        if counters.response_times.len() >= WINDOW {
            counters.response_times.pop_front();
        }
        counters.response_times.push_back(elapsed.as_millis() as u64);
    }

    /// Get total calls
    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::Relaxed)
    }

    /// Get statistics for one operation
    pub fn operation_stats(&self, operation: &str) -> Option<OperationStats> {
        let operations = self.operations.read().unwrap_or_else(|e| e.into_inner());
        operations.get(operation).map(OperationStats::from)
    }

    /// Get statistics for all operations, sorted by name
    pub fn snapshot(&self) -> MetricsSnapshot {
        let operations = self.operations.read().unwrap_or_else(|e| e.into_inner());
        MetricsSnapshot {
            total_calls: self.total_calls(),
            operations: operations
                .iter()
                .map(|(name, counters)| (name.clone(), OperationStats::from(counters)))
                .collect(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for a single operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationStats {
    pub calls: u64,
    pub failures: u64,
    pub timeouts: u64,
    /// Mean of the recent response times, in ms
    pub avg_response_time: Option<u64>,
    /// Percentage of calls that succeeded
    pub reliability: f64,
}

impl From<&Counters> for OperationStats {
    fn from(counters: &Counters) -> Self {
        let avg_response_time = if counters.response_times.is_empty() {
            None
        } else {
            Some(counters.response_times.iter().sum::<u64>() / counters.response_times.len() as u64)
        };

        let reliability = if counters.calls == 0 {
            100.0
        } else {
            let ok = counters.calls - counters.failures - counters.timeouts;
            (ok as f64 / counters.calls as f64) * 100.0
        };

        Self {
            calls: counters.calls,
            failures: counters.failures,
            timeouts: counters.timeouts,
            avg_response_time,
            reliability,
        }
    }
}

/// All statistics at one point in time
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_calls: u64,
    pub operations: BTreeMap<String, OperationStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.record("search", Duration::from_millis(100), Outcome::Success);
        metrics.record("search", Duration::from_millis(300), Outcome::Failure);
        metrics.record("search", Duration::from_millis(200), Outcome::Timeout);
        metrics.record("get_result_count", Duration::from_millis(10), Outcome::Success);

        assert_eq!(metrics.total_calls(), 4);

        let search = metrics.operation_stats("search").unwrap();
        assert_eq!(search.calls, 3);
        assert_eq!(search.failures, 1);
        assert_eq!(search.timeouts, 1);
        assert_eq!(search.avg_response_time, Some(200));
        assert!((search.reliability - 100.0 / 3.0).abs() < 1e-9);

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot.operations.keys().collect::<Vec<_>>(),
            vec!["get_result_count", "search"]
        );
        assert!(metrics.operation_stats("version").is_none());
    }

    #[test]
    fn test_response_time_window() {
        let metrics = Metrics::new();
        for _ in 0..WINDOW {
            metrics.record("search", Duration::from_millis(1000), Outcome::Success);
        }
        for _ in 0..WINDOW {
            metrics.record("search", Duration::from_millis(10), Outcome::Success);
        }
        let stats = metrics.operation_stats("search").unwrap();
        assert_eq!(stats.calls, 2 * WINDOW as u64);
        assert_eq!(stats.avg_response_time, Some(10));
    }
}
