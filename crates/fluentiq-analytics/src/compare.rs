use fluentiq_core::error::Result;
use fluentiq_core::types::absent_as_zero;
use fluentiq_core::{MetricLabel, Session, SessionStore};
use serde::{Deserialize, Serialize};

/// One axis of a two-session comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub label: MetricLabel,
    pub a: f64,
    pub b: f64,
}

/// Paired metric values for side-by-side radar charting.
///
/// Absent scores are plotted as 0 so both series share one 0-100 axis.
/// This is lossy: in the vector an absent score cannot be told apart from
/// a measured 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonVector {
    pub session_a: i64,
    pub session_b: i64,
    pub entries: Vec<ComparisonEntry>,
}

impl ComparisonVector {
    pub fn labels(&self) -> Vec<MetricLabel> {
        self.entries.iter().map(|e| e.label).collect()
    }

    pub fn series_a(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.a).collect()
    }

    pub fn series_b(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.b).collect()
    }

    pub fn get(&self, label: MetricLabel) -> Option<&ComparisonEntry> {
        self.entries.iter().find(|e| e.label == label)
    }
}

/// A session's canonical-axis values, absent plotted as 0.
pub fn metric_vector(session: &Session) -> Vec<(MetricLabel, f64)> {
    MetricLabel::ALL
        .iter()
        .map(|label| (*label, absent_as_zero(label.value_in(&session.metrics))))
        .collect()
}

/// Compare two sessions of the current snapshot.
pub fn compare(store: &SessionStore, id_a: i64, id_b: i64) -> Result<ComparisonVector> {
    let a = store.get(id_a)?;
    let b = store.get(id_b)?;

    let entries = metric_vector(a)
        .into_iter()
        .zip(metric_vector(b))
        .map(|((label, a), (_, b))| ComparisonEntry { label, a, b })
        .collect();

    Ok(ComparisonVector {
        session_a: id_a,
        session_b: id_b,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fluentiq_core::{FluentError, Metrics};

    fn store() -> SessionStore {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        SessionStore::from_snapshot(vec![
            Session::new(2, ts).with_metrics(Metrics {
                overall: Some(90.0),
                fluency: None,
                gaze: Some(0.0),
                ..Default::default()
            }),
            Session::new(1, ts).with_metrics(Metrics {
                overall: Some(80.0),
                fluency: Some(70.0),
                ..Default::default()
            }),
        ])
    }

    #[test]
    fn test_absent_becomes_zero_in_pair() {
        let vector = compare(&store(), 1, 2).unwrap();
        let fluency = vector.get(MetricLabel::Fluency).unwrap();
        assert_eq!((fluency.a, fluency.b), (70.0, 0.0));
        let overall = vector.get(MetricLabel::Overall).unwrap();
        assert_eq!((overall.a, overall.b), (80.0, 90.0));
    }

    #[test]
    fn test_label_order_independent_of_argument_order() {
        let store = store();
        let ab = compare(&store, 1, 2).unwrap();
        let ba = compare(&store, 2, 1).unwrap();
        assert_eq!(ab.labels(), MetricLabel::ALL.to_vec());
        assert_eq!(ab.labels(), ba.labels());
        assert_eq!(ab.series_a(), ba.series_b());
        assert_eq!(ab.series_b(), ba.series_a());
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let store = store();
        assert!(matches!(compare(&store, 42, 2), Err(FluentError::NotFound(42))));
        assert!(matches!(compare(&store, 1, 43), Err(FluentError::NotFound(43))));
    }

    #[test]
    fn test_compare_session_with_itself() {
        let vector = compare(&store(), 1, 1).unwrap();
        assert_eq!(vector.series_a(), vector.series_b());
    }

    #[test]
    fn test_metric_vector_covers_seven_axes() {
        let store = store();
        let vector = metric_vector(store.get(2).unwrap());
        assert_eq!(vector.len(), 7);
        assert_eq!(vector[5], (MetricLabel::Gaze, 0.0));
        assert_eq!(vector[6], (MetricLabel::Overall, 90.0));
    }
}
