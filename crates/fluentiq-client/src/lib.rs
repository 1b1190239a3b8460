//! Client side of the analysis service.
//!
//! Submits recorded samples with a single fused progress signal and fetches
//! the stored session history.

pub mod driver;
pub mod history;
pub mod transport;
pub mod upload;

pub use driver::{progress_channel, UploadDriver};
pub use history::HistoryClient;
pub use transport::{HttpTransport, RawResponse, Transport, TransportProgress, UploadPayload, UploadRequest};
pub use upload::{AnalysisResponse, ProgressUpdate, UploadJob, UploadPhase};
