//! Display-ready view of a single analysis result.

use fluentiq_core::analysis::AnalysisResult;
use fluentiq_core::types::{absent_as_zero, round_for_display};
use fluentiq_core::MetricLabel;
use serde::Serialize;

/// Headline score card; `value` is `None` when the score is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryItem {
    pub label: &'static str,
    pub value: Option<f64>,
}

impl SummaryItem {
    pub fn display(&self) -> String {
        self.value.map(format_score).unwrap_or_else(|| "-".into())
    }
}

/// Format a score without a trailing `.0` for whole numbers.
pub fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub summary: Vec<SummaryItem>,
    /// Radar chart values on the canonical axes.
    pub radar: Vec<(MetricLabel, f64)>,
    /// Horizontal bar chart of the text-derived components.
    pub bars: Vec<(MetricLabel, f64)>,
    pub transcript: String,
    pub highlights: Vec<String>,
    pub duration_seconds: Option<f64>,
}

impl ResultView {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let fused = &result.fused;
        let video = fused.video.clone().unwrap_or_default();

        let summary = vec![
            SummaryItem { label: "Overall", value: fused.overall },
            SummaryItem { label: "Fluency", value: fused.fluency },
            SummaryItem { label: "Grammar", value: fused.grammar },
            SummaryItem { label: "Posture", value: video.posture },
            SummaryItem { label: "Gaze", value: video.gaze },
        ];

        let readability = round_for_display(absent_as_zero(fused.readability)) as f64;
        let radar = vec![
            (MetricLabel::Fluency, absent_as_zero(fused.fluency)),
            (MetricLabel::Grammar, absent_as_zero(fused.grammar)),
            (MetricLabel::Coherence, absent_as_zero(fused.coherence)),
            (MetricLabel::Readability, readability),
            (MetricLabel::Posture, absent_as_zero(video.posture)),
            (MetricLabel::Gaze, absent_as_zero(video.gaze)),
            (MetricLabel::Overall, absent_as_zero(fused.overall)),
        ];
        let bars = radar[..4].to_vec();

        Self {
            summary,
            radar,
            bars,
            transcript: result.transcript().to_string(),
            highlights: result.highlights(),
            duration_seconds: result.duration_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluentiq_core::AnalysisPayload;

    fn result(json: &str) -> AnalysisResult {
        match AnalysisPayload::decode(json.as_bytes()).unwrap() {
            AnalysisPayload::Analysis(r) => *r,
            AnalysisPayload::Session(_) => panic!("expected analysis"),
        }
    }

    #[test]
    fn test_summary_shows_dash_for_absent() {
        let view = ResultView::from_result(&result(r#"{"fused": {"overall": 77, "fluency": 70.5}}"#));
        let shown: Vec<String> = view.summary.iter().map(|i| i.display()).collect();
        assert_eq!(shown, vec!["77", "70.5", "-", "-", "-"]);
    }

    #[test]
    fn test_radar_rounds_readability_and_zeroes_absent() {
        let view = ResultView::from_result(&result(
            r#"{"fused": {"fluency": 78, "grammar": 90, "coherence": 65, "readability": 71.6, "overall": 77,
                           "video": {"posture": 82, "gaze": 55}}}"#,
        ));
        let values: Vec<f64> = view.radar.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![78.0, 90.0, 65.0, 72.0, 82.0, 55.0, 77.0]);
        assert_eq!(view.bars.len(), 4);
        assert_eq!(view.bars[3], (MetricLabel::Readability, 72.0));
    }

    #[test]
    fn test_view_without_video_plots_zero() {
        let view = ResultView::from_result(&result(r#"{"fused": {"overall": 60}}"#));
        assert_eq!(view.radar[4], (MetricLabel::Posture, 0.0));
        assert_eq!(view.radar[5], (MetricLabel::Gaze, 0.0));
        assert!(view.highlights.is_empty());
        assert_eq!(view.duration_seconds, None);
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(80.0), "80");
        assert_eq!(format_score(55.44), "55.4");
    }
}
