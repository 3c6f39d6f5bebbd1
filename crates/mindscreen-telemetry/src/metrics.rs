//! Metrics collection and reporting

use mindscreen_core::{AnalysisResult, RiskLevel};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector for Mindscreen screening activity
///
/// Cloning shares the underlying counters. Every record is also forwarded to
/// the `metrics` facade so an installed recorder sees the same events.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    processed_messages: AtomicU64,
    alerts_generated: AtomicU64,
    low_risk: AtomicU64,
    medium_risk: AtomicU64,
    high_risk: AtomicU64,
    cluster_assisted: AtomicU64,
    fallback_responses: AtomicU64,
    completion_failures: AtomicU64,
    total_latency_us: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                processed_messages: AtomicU64::new(0),
                alerts_generated: AtomicU64::new(0),
                low_risk: AtomicU64::new(0),
                medium_risk: AtomicU64::new(0),
                high_risk: AtomicU64::new(0),
                cluster_assisted: AtomicU64::new(0),
                fallback_responses: AtomicU64::new(0),
                completion_failures: AtomicU64::new(0),
                total_latency_us: AtomicU64::new(0),
            }),
        }
    }

    /// Record one completed analysis
    pub fn record_analysis(&self, result: &AnalysisResult) {
        self.inner.processed_messages.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("mindscreen_messages_total", "risk_level" => result.risk_level.as_str())
            .increment(1);

        let bucket = match result.risk_level {
            RiskLevel::Low => &self.inner.low_risk,
            RiskLevel::Medium => &self.inner.medium_risk,
            RiskLevel::High => &self.inner.high_risk,
        };
        bucket.fetch_add(1, Ordering::Relaxed);

        if result.risk_level == RiskLevel::High {
            self.inner.alerts_generated.fetch_add(1, Ordering::Relaxed);
            ::metrics::counter!("mindscreen_alerts_total").increment(1);
        }

        if result.cluster_assignment.is_some() {
            self.inner.cluster_assisted.fetch_add(1, Ordering::Relaxed);
        }

        self.record_latency(result.latency_us);
    }

    /// Record analysis latency
    pub fn record_latency(&self, latency_us: u64) {
        self.inner
            .total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
        ::metrics::histogram!("mindscreen_analysis_latency_us").record(latency_us as f64);
    }

    /// Record a response served from the fallback table
    pub fn record_fallback(&self) {
        self.inner.fallback_responses.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("mindscreen_fallback_responses_total").increment(1);
    }

    /// Record a failed or timed-out completion call
    pub fn record_completion_failure(&self) {
        self.inner.completion_failures.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("mindscreen_completion_failures_total").increment(1);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            processed_messages: self.inner.processed_messages.load(Ordering::Relaxed),
            alerts_generated: self.inner.alerts_generated.load(Ordering::Relaxed),
            low_risk: self.inner.low_risk.load(Ordering::Relaxed),
            medium_risk: self.inner.medium_risk.load(Ordering::Relaxed),
            high_risk: self.inner.high_risk.load(Ordering::Relaxed),
            cluster_assisted: self.inner.cluster_assisted.load(Ordering::Relaxed),
            fallback_responses: self.inner.fallback_responses.load(Ordering::Relaxed),
            completion_failures: self.inner.completion_failures.load(Ordering::Relaxed),
            total_latency_us: self.inner.total_latency_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub processed_messages: u64,
    pub alerts_generated: u64,
    pub low_risk: u64,
    pub medium_risk: u64,
    pub high_risk: u64,
    pub cluster_assisted: u64,
    pub fallback_responses: u64,
    pub completion_failures: u64,
    pub total_latency_us: u64,
}

impl MetricsSnapshot {
    /// Calculate average analysis latency per message
    pub fn avg_latency_us(&self) -> u64 {
        if self.processed_messages == 0 {
            0
        } else {
            self.total_latency_us / self.processed_messages
        }
    }

    /// Share of messages that raised a high-risk alert
    pub fn alert_rate(&self) -> f64 {
        if self.processed_messages == 0 {
            0.0
        } else {
            self.alerts_generated as f64 / self.processed_messages as f64
        }
    }

    /// Share of messages answered from the fallback table
    pub fn fallback_rate(&self) -> f64 {
        if self.processed_messages == 0 {
            0.0
        } else {
            self.fallback_responses as f64 / self.processed_messages as f64
        }
    }

    /// Count for one risk level
    pub fn risk_count(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::Low => self.low_risk,
            RiskLevel::Medium => self.medium_risk,
            RiskLevel::High => self.high_risk,
        }
    }
}
