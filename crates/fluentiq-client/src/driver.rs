//! Async driver for [`UploadJob`].
//!
//! Two event sources feed one job on one task: the transport's byte
//! progress and, once the body is sent, a fixed-interval heuristic ticker.
//! The terminal transport event (or the result timeout) cancels the ticker
//! before anything else is applied, so no tick can land after it.

use crate::transport::{Transport, UploadRequest};
use crate::upload::{AnalysisResponse, ProgressUpdate, UploadJob, UploadPhase};
use fluentiq_core::error::FluentError;
use fluentiq_core::UploadError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_stream::wrappers::UnboundedReceiverStream;

pub type ProgressSink = mpsc::UnboundedSender<ProgressUpdate>;

/// A sink for [`UploadDriver::run`] plus the stream a UI listens on.
pub fn progress_channel() -> (ProgressSink, UnboundedReceiverStream<ProgressUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, UnboundedReceiverStream::new(rx))
}

/// Scoped handle on the heuristic ticker. Pending forever while not running.
struct HeuristicTicker {
    period: Duration,
    interval: Option<Interval>,
}

impl HeuristicTicker {
    fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Starts at most once; a running ticker keeps its schedule.
    fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Returns whether a running ticker was actually stopped.
    fn cancel(&mut self) -> bool {
        self.interval.take().is_some()
    }

    async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// Runs upload jobs against a transport and an endpoint.
pub struct UploadDriver {
    transport: Arc<dyn Transport>,
    endpoint: String,
    field_name: String,
}

impl UploadDriver {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            field_name: "file".into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Drive `job` to a terminal state, publishing every update to `sink`.
    ///
    /// The job must be Idle; anything else is returned untouched. There is
    /// no retry: a failed job stays failed.
    pub async fn run(&self, mut job: UploadJob, sink: &ProgressSink) -> UploadJob {
        let publish = |update: Option<ProgressUpdate>| {
            if let Some(update) = update {
                tracing::debug!("upload {:?} {}% {}", update.phase, update.percent, update.label);
                let _ = sink.send(update);
            }
        };

        let Some(first) = job.start() else {
            tracing::warn!("Upload job is {:?}, not Idle; not submitting", job.phase());
            return job;
        };
        publish(Some(first));

        let request = UploadRequest {
            url: self.endpoint.clone(),
            field_name: self.field_name.clone(),
            payload: job.payload().clone(),
        };
        let policy = job.policy().clone();
        let result_timeout = policy.result_timeout();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let send = self.transport.send(request, tx);
        tokio::pin!(send);

        let mut ticker = HeuristicTicker::new(policy.tick_interval());
        let deadline = tokio::time::sleep(result_timeout.unwrap_or_default());
        tokio::pin!(deadline);
        let mut deadline_armed = false;
        let mut progress_open = true;

        loop {
            tokio::select! {
                biased;

                outcome = &mut send => {
                    let cancelled = ticker.cancel();
                    tracing::debug!("Terminal transport event (ticker cancelled: {})", cancelled);
                    match outcome {
                        Ok(response) => publish(job.on_response(response)),
                        Err(err) => publish(job.on_failure(err)),
                    }
                    break;
                }
                progress = rx.recv(), if progress_open => match progress {
                    Some(progress) => {
                        publish(job.on_transport(progress));
                        if job.phase() == UploadPhase::AwaitingResult && !ticker.is_running() {
                            ticker.start();
                            if let Some(timeout) = result_timeout {
                                deadline.as_mut().reset(Instant::now() + timeout);
                                deadline_armed = true;
                            }
                        }
                    }
                    None => progress_open = false,
                },
                () = &mut deadline, if deadline_armed => {
                    ticker.cancel();
                    let timeout = result_timeout.unwrap_or_default();
                    publish(job.on_failure(UploadError::Timeout(timeout)));
                    break;
                }
                () = ticker.tick() => publish(job.on_tick()),
            }
        }

        job
    }

    /// Run a fresh job and hand back its outcome. A job that was already
    /// started is refused without touching the transport.
    pub async fn submit(
        &self,
        job: UploadJob,
        sink: &ProgressSink,
    ) -> fluentiq_core::error::Result<AnalysisResponse> {
        let phase = job.phase();
        if phase != UploadPhase::Idle {
            return Err(FluentError::JobNotIdle(format!("{:?}", phase)));
        }
        let job = self.run(job, sink).await;
        let phase = job.phase();
        match job.into_outcome() {
            Some(outcome) => Ok(outcome?),
            None => Err(FluentError::JobNotIdle(format!("{:?}", phase))),
        }
    }
}
