//! Mindscreen Telemetry
//!
//! Metrics and session analytics for Mindscreen.
//!
//! Provides:
//! - Process-wide counters for analyses, alerts and fallback responses
//! - Per-user profiles with sentiment history and PHQ-9 trajectory
//! - Session summaries (average risk, dominant sentiment, key topics)

pub mod metrics;
pub mod session;
pub mod topics;

pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use session::{Session, SessionMessage, SessionSummary, TrajectoryTrend, UserProfile};
pub use topics::TopicTable;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::MetricsCollector;
    pub use crate::session::{Session, SessionSummary, UserProfile};
    pub use crate::topics::TopicTable;
}
