pub mod analysis;
pub mod config;
pub mod error;
pub mod session;
pub mod slot;
pub mod types;

pub use analysis::{AnalysisPayload, AnalysisResult};
pub use config::AppConfig;
pub use error::{FluentError, UploadError};
pub use session::{Metrics, Session, SessionStore};
pub use slot::LastResultSlot;
pub use types::{absent_as_zero, MetricLabel, SummaryStats};
