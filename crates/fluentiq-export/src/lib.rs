//! Export engine for fluentiq.
//!
//! Turns the session snapshot, single analysis results, and rendered chart
//! surfaces into downloadable artifacts. Nothing here mutates the store or
//! talks to the remote service.

pub mod artifact;
pub mod charts;
pub mod structured;
pub mod tabular;

pub use artifact::Artifact;
pub use charts::{export_charts, ChartExport, ChartSurface, RasterChart};
pub use structured::{export_one, export_result};
pub use tabular::export_all;
