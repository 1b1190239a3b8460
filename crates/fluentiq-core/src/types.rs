use crate::session::Metrics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven canonical score axes shown on comparison and result charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricLabel {
    Fluency,
    Grammar,
    Coherence,
    Readability,
    Posture,
    Gaze,
    Overall,
}

impl MetricLabel {
    /// Fixed chart ordering. Never depends on the sessions being charted.
    pub const ALL: [MetricLabel; 7] = [
        MetricLabel::Fluency,
        MetricLabel::Grammar,
        MetricLabel::Coherence,
        MetricLabel::Readability,
        MetricLabel::Posture,
        MetricLabel::Gaze,
        MetricLabel::Overall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricLabel::Fluency => "Fluency",
            MetricLabel::Grammar => "Grammar",
            MetricLabel::Coherence => "Coherence",
            MetricLabel::Readability => "Readability",
            MetricLabel::Posture => "Posture",
            MetricLabel::Gaze => "Gaze",
            MetricLabel::Overall => "Overall",
        }
    }

    /// Raw metric value for this axis, absent when it was never computed.
    pub fn value_in(&self, metrics: &Metrics) -> Option<f64> {
        match self {
            MetricLabel::Fluency => metrics.fluency,
            MetricLabel::Grammar => metrics.grammar,
            MetricLabel::Coherence => metrics.coherence,
            MetricLabel::Readability => metrics.readability,
            MetricLabel::Posture => metrics.posture,
            MetricLabel::Gaze => metrics.gaze,
            MetricLabel::Overall => metrics.overall,
        }
    }
}

impl fmt::Display for MetricLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-boundary substitution of an absent score by 0.
///
/// Lossy: an absent score and a measured 0 become indistinguishable. Only
/// call this where a value is about to be drawn or printed on a fixed
/// 0-100 axis, never when storing or aggregating.
pub fn absent_as_zero(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

/// Round a score for presentation.
pub fn round_for_display(value: f64) -> i64 {
    value.round() as i64
}

/// Cross-session averages. Each average is `None` when no session carried
/// the metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub avg_fluency: Option<f64>,
    pub avg_grammar: Option<f64>,
    pub avg_posture: Option<f64>,
    pub avg_overall: Option<f64>,
    /// Number of sessions in the snapshot the averages were taken over.
    #[serde(default)]
    pub total_sessions: Option<u64>,
}

impl SummaryStats {
    /// Summary cards as `(label, rounded value)`.
    ///
    /// A missing average renders as 0, which here means "no data", not a
    /// measured zero.
    pub fn cards(&self) -> [(&'static str, i64); 4] {
        let card = |v: Option<f64>| round_for_display(absent_as_zero(v));
        [
            ("Avg Fluency", card(self.avg_fluency)),
            ("Avg Grammar", card(self.avg_grammar)),
            ("Avg Posture", card(self.avg_posture)),
            ("Avg Overall", card(self.avg_overall)),
        ]
    }

    pub fn has_data(&self) -> bool {
        self.avg_fluency.is_some()
            || self.avg_grammar.is_some()
            || self.avg_posture.is_some()
            || self.avg_overall.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_order_is_fixed() {
        let names: Vec<&str> = MetricLabel::ALL.iter().map(|l| l.as_str()).collect();
        assert_eq!(
            names,
            vec!["Fluency", "Grammar", "Coherence", "Readability", "Posture", "Gaze", "Overall"]
        );
    }

    #[test]
    fn test_cards_fall_back_to_zero_without_data() {
        let stats = SummaryStats::default();
        assert!(!stats.has_data());
        for (_, value) in stats.cards() {
            assert_eq!(value, 0);
        }
    }

    #[test]
    fn test_cards_round_only_at_presentation() {
        let stats = SummaryStats {
            avg_fluency: Some(72.5),
            avg_overall: Some(84.4),
            ..Default::default()
        };
        assert_eq!(stats.avg_fluency, Some(72.5));
        let cards = stats.cards();
        assert_eq!(cards[0], ("Avg Fluency", 73));
        assert_eq!(cards[3], ("Avg Overall", 84));
    }

    #[test]
    fn test_server_summary_decodes_nulls() {
        let json = r#"{"avg_fluency":null,"avg_grammar":61.0,"avg_posture":null,"avg_overall":70.5,"total_sessions":3}"#;
        let stats: SummaryStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.avg_fluency, None);
        assert_eq!(stats.avg_grammar, Some(61.0));
        assert_eq!(stats.total_sessions, Some(3));
    }
}
