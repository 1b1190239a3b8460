use fluentiq_analytics::{compare, overall_trend, summarize, ReportGenerator, ResultView};
use fluentiq_client::{progress_channel, HistoryClient, HttpTransport, UploadDriver, UploadJob, UploadPayload};
use fluentiq_core::error::Result;
use fluentiq_core::{AnalysisPayload, AppConfig, FluentError, LastResultSlot, SessionStore};
use fluentiq_export::{export_all, export_charts, export_one, export_result, ChartSurface, RasterChart};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

/// Shared state behind the one-shot commands and the shell.
pub struct App {
    pub config: AppConfig,
    history: HistoryClient,
    store: SessionStore,
    slot: LastResultSlot,
    overall_chart: RasterChart,
    radar_chart: RasterChart,
}

/// Print lookup failures as a notice and carry on; anything else is an error.
pub fn notice<T>(result: Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_notice() => {
            println!("\x1b[0;33mNotice: {}\x1b[0m", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let history = HistoryClient::new(&config.api)?;
        let slot = LastResultSlot::new(&config.data_dir());
        Ok(Self {
            config,
            history,
            store: SessionStore::new(),
            slot,
            overall_chart: RasterChart::overall(),
            radar_chart: RasterChart::radar(),
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn output_dir(&self) -> PathBuf {
        self.config.export.output_dir()
    }

    /// Replace the snapshot with the remote history and redraw the trend.
    pub async fn load(&mut self) -> Result<usize> {
        let sessions = self.history.fetch_all().await?;
        self.store.load(sessions);
        self.overall_chart.render_line(&overall_trend(self.store.sessions()));
        // A comparison drawn from the previous snapshot no longer applies.
        self.radar_chart.clear();
        Ok(self.store.len())
    }

    pub fn history_report(&self) -> String {
        ReportGenerator::history_report(self.store.sessions())
    }

    pub fn show(&self, id: Option<i64>) -> Result<String> {
        let session = self.store.select(id)?;
        Ok(ReportGenerator::session_detail(session))
    }

    /// Comparison table; also draws the comparison radar.
    pub fn compare(&mut self, a: i64, b: i64) -> Result<String> {
        let vector = compare(&self.store, a, b)?;
        self.radar_chart.render_comparison(&vector);
        Ok(ReportGenerator::comparison_table(&vector))
    }

    pub async fn summary(&self, remote: bool) -> Result<String> {
        let stats = if remote {
            self.history.fetch_summary().await?
        } else {
            summarize(self.store.sessions())
        };
        let mut out = ReportGenerator::summary_cards(&stats);
        if let Some(total) = stats.total_sessions {
            out.push_str(&format!("\nSessions: {}\n", total));
        }
        Ok(out)
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        export_all(&self.store, &self.config.export.product)?.write_to(&self.output_dir())
    }

    pub fn export_json(&self, id: Option<i64>) -> Result<PathBuf> {
        export_one(&self.store, id)?.write_to(&self.output_dir())
    }

    /// PNGs of the trend and comparison charts, plus notes for the skipped.
    pub fn export_charts(&self) -> Result<(Vec<PathBuf>, Vec<String>)> {
        let surfaces: [&dyn ChartSurface; 2] = [&self.overall_chart, &self.radar_chart];
        write_charts(&surfaces, &self.output_dir())
    }

    /// Upload a recording with a live progress line and keep the result.
    pub async fn analyze(&self, path: &Path) -> Result<AnalysisPayload> {
        let payload = UploadPayload::from_path(path)?;
        tracing::info!("Uploading {} ({} bytes)", payload.file_name, payload.len());

        let transport = Arc::new(HttpTransport::new(self.config.upload.chunk_size)?);
        let driver = UploadDriver::new(transport, self.history.analyze_url(&self.config.api.asset_kind));
        let job = UploadJob::new(payload, self.config.upload.clone());

        let (sink, mut updates) = progress_channel();
        let printer = tokio::spawn(async move {
            while let Some(update) = updates.next().await {
                print!("\r\x1b[2K{:>3}%  {}", update.percent, update.label);
                let _ = std::io::stdout().flush();
            }
            println!();
        });

        let outcome = driver.submit(job, &sink).await;
        drop(sink);
        join_printer(printer).await;

        let response = outcome?;
        self.slot.store(&response.raw)?;
        Ok(response.payload)
    }

    pub fn last_result(&self) -> Result<Option<(serde_json::Value, AnalysisPayload)>> {
        let Some(raw) = self.slot.load()? else {
            return Ok(None);
        };
        let payload = serde_json::from_value(raw.clone())?;
        Ok(Some((raw, payload)))
    }

    /// JSON of the last result plus its score charts.
    pub fn export_last_result(&self) -> Result<(Vec<PathBuf>, Vec<String>)> {
        let Some((raw, payload)) = self.last_result()? else {
            return Err(FluentError::EmptySelection);
        };
        let dir = self.output_dir();
        let mut written = vec![export_result(&raw, &self.config.export.product)?.write_to(&dir)?];

        let mut radar = RasterChart::new("result_radar_chart", 480, 480);
        let mut bars = RasterChart::bars();
        if let AnalysisPayload::Analysis(result) = &payload {
            let view = ResultView::from_result(result);
            let values: Vec<f64> = view.radar.iter().map(|(_, v)| *v).collect();
            radar.render_radar(values.len(), &[values]);
            bars.render_bars(&view.bars);
        }
        let (charts, notes) = write_charts(&[&radar, &bars], &dir)?;
        written.extend(charts);
        Ok((written, notes))
    }
}

/// Text view of an upload result.
pub fn render_payload(payload: &AnalysisPayload) -> String {
    match payload {
        AnalysisPayload::Analysis(result) => ReportGenerator::result_report(&ResultView::from_result(result)),
        AnalysisPayload::Session(session) => ReportGenerator::session_detail(session),
    }
}

/// Wait for the progress line task. A printer that died only costs the
/// display, so the failure is logged rather than returned.
async fn join_printer(printer: JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Progress printer stopped: {}", e);
            false
        }
    }
}

fn write_charts(surfaces: &[&dyn ChartSurface], dir: &Path) -> Result<(Vec<PathBuf>, Vec<String>)> {
    let export = export_charts(surfaces)?;
    let paths = export
        .artifacts
        .iter()
        .map(|artifact| artifact.write_to(dir))
        .collect::<Result<Vec<_>>>()?;
    Ok((paths, export.notes))
}
