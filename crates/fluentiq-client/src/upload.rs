//! Upload progress state machine.
//!
//! Fuses the measurable byte transfer and the opaque server-side analysis
//! into one 0-100 percentage:
//!
//! ```text
//! Idle -> Uploading (0..=80, byte counters) -> AwaitingResult (80..=96, ticker)
//!      -> Succeeded (100) | Failed
//! ```
//!
//! All methods are synchronous and return the update to publish, if any.
//! Events that arrive after a terminal state are ignored.

use crate::transport::{RawResponse, TransportProgress, UploadPayload};
use fluentiq_core::config::UploadConfig;
use fluentiq_core::{AnalysisPayload, UploadError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    Uploading,
    AwaitingResult,
    Succeeded,
    Failed,
}

impl UploadPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadPhase::Succeeded | UploadPhase::Failed)
    }
}

/// One published point of the progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub label: String,
    pub phase: UploadPhase,
}

/// A decoded analysis together with the document it was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResponse {
    pub payload: AnalysisPayload,
    /// Response JSON exactly as the server sent it.
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone)]
enum JobState {
    Idle,
    Uploading,
    AwaitingResult,
    Succeeded(AnalysisResponse),
    Failed(UploadError),
}

/// One in-flight submission.
#[derive(Debug, Clone)]
pub struct UploadJob {
    payload: UploadPayload,
    policy: UploadConfig,
    state: JobState,
    percent: u8,
    label: String,
}

impl UploadJob {
    pub fn new(payload: UploadPayload, policy: UploadConfig) -> Self {
        Self {
            payload,
            policy,
            state: JobState::Idle,
            percent: 0,
            label: String::new(),
        }
    }

    pub fn payload(&self) -> &UploadPayload {
        &self.payload
    }

    pub fn policy(&self) -> &UploadConfig {
        &self.policy
    }

    pub fn phase(&self) -> UploadPhase {
        match self.state {
            JobState::Idle => UploadPhase::Idle,
            JobState::Uploading => UploadPhase::Uploading,
            JobState::AwaitingResult => UploadPhase::AwaitingResult,
            JobState::Succeeded(_) => UploadPhase::Succeeded,
            JobState::Failed(_) => UploadPhase::Failed,
        }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }

    /// Decoded response, present only once succeeded.
    pub fn result(&self) -> Option<&AnalysisPayload> {
        match &self.state {
            JobState::Succeeded(response) => Some(&response.payload),
            _ => None,
        }
    }

    /// Decoded response plus the raw document, present only once succeeded.
    pub fn response(&self) -> Option<&AnalysisResponse> {
        match &self.state {
            JobState::Succeeded(response) => Some(response),
            _ => None,
        }
    }

    /// Failure cause, present only once failed.
    pub fn error(&self) -> Option<&UploadError> {
        match &self.state {
            JobState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Terminal outcome. `None` while the job is still running.
    pub fn into_outcome(self) -> Option<Result<AnalysisResponse, UploadError>> {
        match self.state {
            JobState::Succeeded(response) => Some(Ok(response)),
            JobState::Failed(err) => Some(Err(err)),
            _ => None,
        }
    }

    /// Clear local state back to Idle. Does not abort a request that was
    /// already sent.
    pub fn reset(&mut self) {
        self.state = JobState::Idle;
        self.percent = 0;
        self.label.clear();
    }

    /// Idle -> Uploading.
    pub fn start(&mut self) -> Option<ProgressUpdate> {
        if !matches!(self.state, JobState::Idle) {
            return None;
        }
        self.state = JobState::Uploading;
        Some(self.publish(0, "Preparing…".into()))
    }

    pub fn on_transport(&mut self, progress: TransportProgress) -> Option<ProgressUpdate> {
        match progress {
            TransportProgress::Bytes { loaded, total } => self.on_bytes(loaded, total),
            TransportProgress::Sent => self.on_sent(),
        }
    }

    /// Byte counters drive the upload band. Without a usable total a fixed
    /// placeholder is shown instead of a fabricated ramp.
    pub fn on_bytes(&mut self, loaded: u64, total: Option<u64>) -> Option<ProgressUpdate> {
        if !matches!(self.state, JobState::Uploading) {
            return None;
        }
        let ceiling = self.policy.upload_ceiling;
        match total {
            Some(total) if total > 0 => {
                let loaded = loaded.min(total);
                let percent = (loaded * u64::from(ceiling) / total) as u8;
                let shown = percent.max(self.percent);
                Some(self.publish(percent, format!("Uploading {}%", shown)))
            }
            _ => {
                let placeholder = self.policy.unknown_length_percent;
                Some(self.publish(placeholder, "Uploading…".into()))
            }
        }
    }

    /// Uploading -> AwaitingResult once every byte is on the wire.
    pub fn on_sent(&mut self) -> Option<ProgressUpdate> {
        if !matches!(self.state, JobState::Uploading) {
            return None;
        }
        self.state = JobState::AwaitingResult;
        let ceiling = self.policy.upload_ceiling;
        Some(self.publish(ceiling, "Analyzing…".into()))
    }

    /// Heuristic liveness tick. Capped at the tick ceiling; carries no
    /// information about real completion time.
    pub fn on_tick(&mut self) -> Option<ProgressUpdate> {
        if !matches!(self.state, JobState::AwaitingResult) {
            return None;
        }
        let ceiling = self.policy.tick_ceiling;
        if self.percent >= ceiling {
            return None;
        }
        let next = self.percent.saturating_add(self.policy.tick_step).min(ceiling);
        Some(self.publish(next, "Analyzing…".into()))
    }

    /// Terminal response. Success needs both a 2xx status and a decodable
    /// body.
    pub fn on_response(&mut self, response: RawResponse) -> Option<ProgressUpdate> {
        if !self.is_running() {
            return None;
        }
        if !response.is_success() {
            return self.on_failure(UploadError::Server {
                status: response.status,
                status_text: response.status_text,
            });
        }
        match AnalysisPayload::decode_with_raw(&response.body) {
            Ok((payload, raw)) => {
                self.state = JobState::Succeeded(AnalysisResponse { payload, raw });
                tracing::debug!("Upload job succeeded");
                Some(self.publish(100, "Processing finished".into()))
            }
            Err(err) => self.on_failure(err),
        }
    }

    /// Network failure, timeout, or a rejected response.
    pub fn on_failure(&mut self, err: UploadError) -> Option<ProgressUpdate> {
        if !self.is_running() {
            return None;
        }
        tracing::warn!("Upload job failed: {}", err);
        let label = format!("Analysis failed: {}", err);
        self.state = JobState::Failed(err);
        let percent = self.percent;
        Some(self.publish(percent, label))
    }

    fn is_running(&self) -> bool {
        matches!(self.state, JobState::Uploading | JobState::AwaitingResult)
    }

    /// Record and return an update. The percentage never moves backwards;
    /// 100 is reserved for success.
    fn publish(&mut self, candidate: u8, label: String) -> ProgressUpdate {
        let mut percent = candidate.max(self.percent);
        if !matches!(self.state, JobState::Succeeded(_)) {
            percent = percent.min(99);
        }
        self.percent = percent;
        self.label = label.clone();
        ProgressUpdate {
            percent,
            label,
            phase: self.phase(),
        }
    }
}
