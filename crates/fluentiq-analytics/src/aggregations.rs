//! Cross-session aggregates.
//!
//! Absent metrics are excluded from both numerator and denominator. The
//! stored averages keep full precision; rounding happens at presentation.

use chrono::{DateTime, Utc};
use fluentiq_core::types::absent_as_zero;
use fluentiq_core::{Metrics, Session, SummaryStats};
use serde::{Deserialize, Serialize};

/// Running mean over the sessions that carry a metric.
#[derive(Debug, Clone, Copy, Default)]
struct MeanAccumulator {
    sum: f64,
    count: u32,
}

impl MeanAccumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// `None` when nothing contributed.
    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Mean of one metric over the sessions where it is present.
pub fn average<F>(sessions: &[Session], metric: F) -> Option<f64>
where
    F: Fn(&Metrics) -> Option<f64>,
{
    let mut acc = MeanAccumulator::default();
    for session in sessions {
        acc.push(metric(&session.metrics));
    }
    acc.mean()
}

/// Averages over the full snapshot.
pub fn summarize(sessions: &[Session]) -> SummaryStats {
    let mut fluency = MeanAccumulator::default();
    let mut grammar = MeanAccumulator::default();
    let mut posture = MeanAccumulator::default();
    let mut overall = MeanAccumulator::default();

    for session in sessions {
        let m = &session.metrics;
        fluency.push(m.fluency);
        grammar.push(m.grammar);
        posture.push(m.posture);
        overall.push(m.overall);
    }

    tracing::debug!(
        "Summarized {} sessions ({} with overall score)",
        sessions.len(),
        overall.count
    );

    SummaryStats {
        avg_fluency: fluency.mean(),
        avg_grammar: grammar.mean(),
        avg_posture: posture.mean(),
        avg_overall: overall.mean(),
        total_sessions: Some(sessions.len() as u64),
    }
}

/// One point of the overall-score trend chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub session_id: i64,
    pub timestamp: DateTime<Utc>,
    /// Overall score on the fixed 0-100 axis; absent plots as 0.
    pub value: f64,
}

/// Overall scores oldest first. The snapshot arrives newest first, so the
/// order is reversed rather than re-sorted.
pub fn overall_trend(sessions: &[Session]) -> Vec<TrendPoint> {
    sessions
        .iter()
        .rev()
        .map(|s| TrendPoint {
            session_id: s.id,
            timestamp: s.timestamp,
            value: absent_as_zero(s.metrics.overall),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(id: i64, metrics: Metrics) -> Session {
        Session::new(id, Utc.with_ymd_and_hms(2024, 3, id as u32, 9, 0, 0).unwrap())
            .with_metrics(metrics)
    }

    #[test]
    fn test_summarize_empty_has_no_data() {
        let stats = summarize(&[]);
        assert_eq!(stats.avg_fluency, None);
        assert_eq!(stats.avg_grammar, None);
        assert_eq!(stats.avg_posture, None);
        assert_eq!(stats.avg_overall, None);
        assert_eq!(stats.total_sessions, Some(0));
        assert!(stats.cards().iter().all(|(_, v)| *v == 0));
    }

    #[test]
    fn test_absent_values_do_not_count_as_zero() {
        let sessions = vec![
            session(
                1,
                Metrics {
                    overall: Some(80.0),
                    fluency: Some(70.0),
                    ..Default::default()
                },
            ),
            session(
                2,
                Metrics {
                    overall: Some(90.0),
                    fluency: None,
                    ..Default::default()
                },
            ),
        ];
        let stats = summarize(&sessions);
        assert_eq!(stats.avg_overall, Some(85.0));
        assert_eq!(stats.avg_fluency, Some(70.0));
        assert_eq!(stats.avg_posture, None);
    }

    #[test]
    fn test_true_zero_still_counts() {
        let sessions = vec![
            session(1, Metrics { grammar: Some(0.0), ..Default::default() }),
            session(2, Metrics { grammar: Some(50.0), ..Default::default() }),
        ];
        assert_eq!(summarize(&sessions).avg_grammar, Some(25.0));
    }

    #[test]
    fn test_averages_keep_precision() {
        let sessions = vec![
            session(1, Metrics { overall: Some(70.0), ..Default::default() }),
            session(2, Metrics { overall: Some(71.0), ..Default::default() }),
            session(3, Metrics { overall: Some(71.0), ..Default::default() }),
        ];
        let avg = summarize(&sessions).avg_overall.unwrap();
        assert!((avg - 70.666_666).abs() < 1e-3);
    }

    #[test]
    fn test_average_of_any_metric() {
        let sessions = vec![
            session(1, Metrics { word_count: Some(120.0), ..Default::default() }),
            session(2, Metrics::default()),
        ];
        assert_eq!(average(&sessions, |m| m.word_count), Some(120.0));
        assert_eq!(average(&sessions, |m| m.gaze), None);
    }

    #[test]
    fn test_overall_trend_is_oldest_first() {
        let sessions = vec![
            session(3, Metrics { overall: Some(90.0), ..Default::default() }),
            session(2, Metrics::default()),
            session(1, Metrics { overall: Some(60.0), ..Default::default() }),
        ];
        let trend = overall_trend(&sessions);
        let ids: Vec<i64> = trend.iter().map(|p| p.session_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let values: Vec<f64> = trend.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![60.0, 0.0, 90.0]);
    }
}
