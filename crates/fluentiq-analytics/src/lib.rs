//! Analytics, comparison, and reporting for fluentiq sessions.
//!
//! Computes cross-session averages, paired comparison vectors, the overall
//! trend series, and plain-text/markdown views of sessions and results.

pub mod aggregations;
pub mod compare;
pub mod reports;
pub mod views;

pub use aggregations::{overall_trend, summarize, TrendPoint};
pub use compare::{compare, metric_vector, ComparisonEntry, ComparisonVector};
pub use reports::ReportGenerator;
pub use views::{ResultView, SummaryItem};
