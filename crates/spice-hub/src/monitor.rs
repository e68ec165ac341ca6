//! # Query Monitor
//!
//! Wraps each service operation, recording its duration and outcome.
//! Keeps per-operation statistics and a bounded ring of recent slow
//! operations, and renders both as JSON or Prometheus text.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::Write as _;
use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::SpiceResult;

pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(100);
pub const DEFAULT_SLOW_CAPACITY: usize = 100;

#[derive(Debug, Clone, Default)]
struct OperationStats {
    count: u64,
    errors: u64,
    total: Duration,
    min: Option<Duration>,
    max: Duration,
}

impl OperationStats {
    fn record(&mut self, elapsed: Duration, success: bool) {
        self.count += 1;
        if !success {
            self.errors += 1;
        }
        self.total += elapsed;
        self.min = Some(self.min.map_or(elapsed, |min| min.min(elapsed)));
        self.max = self.max.max(elapsed);
    }

    fn summarize(&self) -> OperationSummary {
        let avg = if self.count == 0 {
            0.0
        } else {
            round2(self.total.as_secs_f64() * 1000.0 / self.count as f64)
        };
        OperationSummary {
            count: self.count,
            errors: self.errors,
            avg_time_ms: avg,
            min_time_ms: millis(self.min.unwrap_or_default()),
            max_time_ms: millis(self.max),
            total_time_ms: millis(self.total),
            error_rate: if self.count == 0 {
                0.0
            } else {
                round2(self.errors as f64 / self.count as f64 * 100.0)
            },
        }
    }
}

/// Statistics for one operation. Times are milliseconds, rounded to two
/// decimals; `error_rate` is a percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSummary {
    pub count: u64,
    pub errors: u64,
    pub avg_time_ms: f64,
    pub min_time_ms: f64,
    pub max_time_ms: f64,
    pub total_time_ms: f64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowQuery {
    pub query: String,
    pub time_ms: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total_queries: u64,
    pub slow_queries_count: usize,
    pub slow_threshold_ms: f64,
    pub query_stats: BTreeMap<String, OperationSummary>,
}

#[derive(Default)]
struct MonitorState {
    operations: BTreeMap<&'static str, OperationStats>,
    total: u64,
    slow: VecDeque<SlowQuery>,
}

pub struct QueryMonitor {
    slow_threshold: Duration,
    slow_capacity: usize,
    state: Mutex<MonitorState>,
}

impl QueryMonitor {
    pub fn new(slow_threshold: Duration, slow_capacity: usize) -> Self {
        Self {
            slow_threshold,
            slow_capacity,
            state: Mutex::new(MonitorState::default()),
        }
    }

    /// Run `operation`, recording how long it took and whether it failed.
    pub async fn track<T, F>(&self, name: &'static str, operation: F) -> SpiceResult<T>
    where
        F: Future<Output = SpiceResult<T>>,
    {
        let start = Instant::now();
        let result = operation.await;
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => tracing::debug!(operation = name, elapsed_ms = millis(elapsed), "ok"),
            Err(e) => tracing::error!(
                operation = name,
                elapsed_ms = millis(elapsed),
                error = %e,
                "Operation failed"
            ),
        }
        self.record(name, elapsed, result.is_ok()).await;
        result
    }

    pub async fn record(&self, name: &'static str, elapsed: Duration, success: bool) {
        let mut state = self.state.lock().await;
        state.operations.entry(name).or_default().record(elapsed, success);
        state.total += 1;

        if success && elapsed > self.slow_threshold {
            tracing::warn!(
                operation = name,
                elapsed_ms = millis(elapsed),
                "Slow operation detected"
            );
            if self.slow_capacity > 0 {
                if state.slow.len() == self.slow_capacity {
                    state.slow.pop_front();
                }
                state.slow.push_back(SlowQuery {
                    query: name.to_string(),
                    time_ms: millis(elapsed),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    pub async fn summary(&self) -> PerformanceSummary {
        let state = self.state.lock().await;
        PerformanceSummary {
            total_queries: state.total,
            slow_queries_count: state.slow.len(),
            slow_threshold_ms: millis(self.slow_threshold),
            query_stats: state
                .operations
                .iter()
                .map(|(name, stats)| (name.to_string(), stats.summarize()))
                .collect(),
        }
    }

    /// Recent slow operations, oldest first.
    pub async fn slow_queries(&self) -> Vec<SlowQuery> {
        self.state.lock().await.slow.iter().cloned().collect()
    }

    pub async fn reset(&self) {
        *self.state.lock().await = MonitorState::default();
        tracing::info!("Performance statistics reset");
    }
}

impl Default for QueryMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_THRESHOLD, DEFAULT_SLOW_CAPACITY)
    }
}

/// Prometheus text exposition of a summary.
pub fn render_prometheus(summary: &PerformanceSummary) -> String {
    let mut body = String::new();

    body.push_str("# HELP spice_queries_total Total number of monitored operations\n");
    body.push_str("# TYPE spice_queries_total counter\n");
    let _ = writeln!(body, "spice_queries_total {}", summary.total_queries);

    body.push_str("# HELP spice_slow_queries Slow operations currently retained\n");
    body.push_str("# TYPE spice_slow_queries gauge\n");
    let _ = writeln!(body, "spice_slow_queries {}", summary.slow_queries_count);

    let families: [(&str, &str, &str, fn(&OperationSummary) -> f64); 4] = [
        ("spice_operation_count", "counter", "Calls per operation", |s| s.count as f64),
        ("spice_operation_errors", "counter", "Failed calls per operation", |s| s.errors as f64),
        ("spice_operation_avg_ms", "gauge", "Mean duration per operation", |s| s.avg_time_ms),
        ("spice_operation_max_ms", "gauge", "Longest duration per operation", |s| s.max_time_ms),
    ];
    for (metric, kind, help, value) in families {
        let _ = writeln!(body, "# HELP {metric} {help}");
        let _ = writeln!(body, "# TYPE {metric} {kind}");
        for (operation, stats) in &summary.query_stats {
            let _ = writeln!(body, "{metric}{{operation=\"{operation}\"}} {}", value(stats));
        }
    }

    body
}

fn millis(d: Duration) -> f64 {
    round2(d.as_secs_f64() * 1000.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
