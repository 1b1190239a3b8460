//! Markdown views of sessions, summaries, comparisons and results.

use crate::aggregations::{overall_trend, summarize};
use crate::compare::ComparisonVector;
use crate::views::{format_score, ResultView};
use chrono::Local;
use fluentiq_core::{Session, SummaryStats};

/// Characters of transcript shown in a session detail.
pub const TRANSCRIPT_EXCERPT_CHARS: usize = 800;

const PRACTICE_PLAN: [&str; 4] = [
    "Week 1: Focus on fluency. Record 1-minute speeches and remove fillers.",
    "Week 2: Grammar & phrasing. Revise scripts and practice slowed articulation.",
    "Week 3: Non-verbal. Practice posture & eye-contact with webcam recording.",
    "Week 4: Combine and rehearse complete talk; use peer feedback.",
];

fn cell(value: Option<f64>) -> String {
    value.map(format_score).unwrap_or_else(|| "-".into())
}

fn local_time(session: &Session) -> String {
    session
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Truncate on a character boundary.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Report generator for session history and analysis results.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Summary cards, one bullet per average.
    pub fn summary_cards(stats: &SummaryStats) -> String {
        let mut out = String::new();
        for (label, value) in stats.cards() {
            out.push_str(&format!("- **{}:** {}\n", label, value));
        }
        if !stats.has_data() {
            out.push_str("\n_No scored sessions yet._\n");
        }
        out
    }

    /// Sessions table in snapshot order.
    pub fn history_table(sessions: &[Session]) -> String {
        let mut out = String::new();
        out.push_str("| ID | Recorded | Overall | Fluency | Grammar | Posture |\n");
        out.push_str("|----|----------|---------|---------|---------|---------|\n");
        for s in sessions {
            let m = &s.metrics;
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                s.id,
                local_time(s),
                cell(m.overall),
                cell(m.fluency),
                cell(m.grammar),
                cell(m.posture),
            ));
        }
        out
    }

    /// Full history page: averages, overall trend, sessions table.
    pub fn history_report(sessions: &[Session]) -> String {
        let mut report = String::new();
        report.push_str("# Session History\n\n");

        if sessions.is_empty() {
            report.push_str("No sessions recorded yet.\n");
            return report;
        }

        report.push_str("## Averages\n\n");
        report.push_str(&Self::summary_cards(&summarize(sessions)));
        report.push('\n');

        report.push_str("## Overall Trend\n\n");
        let trend: Vec<String> = overall_trend(sessions)
            .iter()
            .map(|p| format_score(p.value))
            .collect();
        report.push_str(&format!("{}\n\n", trend.join(" → ")));

        report.push_str("## Sessions\n\n");
        report.push_str(&Self::history_table(sessions));
        report
    }

    /// Detail panel for one session.
    pub fn session_detail(session: &Session) -> String {
        let m = &session.metrics;
        let mut out = format!("# Session {}\n\n", session.id);
        let blocks = [
            ("Overall", cell(m.overall)),
            ("Fluency", cell(m.fluency)),
            ("Grammar", cell(m.grammar)),
            ("Coherence", cell(m.coherence)),
            ("Readability", cell(m.readability)),
            ("Posture", cell(m.posture)),
            ("Gaze (%)", cell(m.gaze)),
            ("Timestamp", local_time(session)),
        ];
        for (k, v) in blocks {
            out.push_str(&format!("- **{}:** {}\n", k, v));
        }

        out.push_str("\n## Transcript\n\n");
        let text = excerpt(&session.transcript, TRANSCRIPT_EXCERPT_CHARS);
        if text.is_empty() {
            out.push_str("_(empty)_\n");
        } else {
            out.push_str(text);
            if text.len() < session.transcript.len() {
                out.push('…');
            }
            out.push('\n');
        }
        out
    }

    pub fn comparison_table(vector: &ComparisonVector) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "| Metric | Session {} | Session {} |\n",
            vector.session_a, vector.session_b
        ));
        out.push_str("|--------|-----------|-----------|\n");
        for entry in &vector.entries {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                entry.label,
                format_score(entry.a),
                format_score(entry.b)
            ));
        }
        out.push_str("\n_Absent scores are shown as 0._\n");
        out
    }

    /// Results page for a single analysis.
    pub fn result_report(view: &ResultView) -> String {
        let mut report = String::from("# Analysis Result\n\n");

        if let Some(duration) = view.duration_seconds {
            report.push_str(&format!("Duration: {}s\n\n", duration));
        }

        for item in &view.summary {
            report.push_str(&format!("- **{}:** {}\n", item.label, item.display()));
        }

        report.push_str("\n## Scores\n\n");
        for (label, value) in &view.radar {
            report.push_str(&format!("- {}: {}\n", label, format_score(*value)));
        }

        report.push_str("\n## Transcript\n\n");
        report.push_str(&view.transcript);
        report.push_str("\n\n");

        if !view.highlights.is_empty() {
            report.push_str("## Highlights\n\n");
            for h in &view.highlights {
                report.push_str(&format!("- {}\n", h));
            }
            report.push('\n');
        }

        report.push_str("## Suggested Practice Plan\n\n");
        for (i, step) in PRACTICE_PLAN.iter().enumerate() {
            report.push_str(&format!("{}. {}\n", i + 1, step));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use chrono::{TimeZone, Utc};
    use fluentiq_core::{AnalysisPayload, Metrics, SessionStore};

    fn sessions() -> Vec<Session> {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        vec![
            Session::new(2, ts)
                .with_transcript("Second take.")
                .with_metrics(Metrics {
                    overall: Some(90.0),
                    ..Default::default()
                }),
            Session::new(1, ts)
                .with_transcript("First take.")
                .with_metrics(Metrics {
                    overall: Some(80.0),
                    fluency: Some(70.0),
                    ..Default::default()
                }),
        ]
    }

    #[test]
    fn test_history_table_marks_absent_with_dash() {
        let table = ReportGenerator::history_table(&sessions());
        let rows: Vec<&str> = table.lines().skip(2).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("| 2 |"));
        assert!(rows[0].ends_with("| 90 | - | - | - |"));
        assert!(rows[1].ends_with("| 80 | 70 | - | - |"));
    }

    #[test]
    fn test_history_report_empty() {
        let report = ReportGenerator::history_report(&[]);
        assert!(report.contains("No sessions recorded yet."));
    }

    #[test]
    fn test_history_report_sections() {
        let report = ReportGenerator::history_report(&sessions());
        assert!(report.contains("- **Avg Overall:** 85"));
        assert!(report.contains("- **Avg Fluency:** 70"));
        assert!(report.contains("80 → 90"));
    }

    #[test]
    fn test_session_detail_truncates_transcript() {
        let long = "é".repeat(1000);
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let session = Session::new(5, ts).with_transcript(long);
        let detail = ReportGenerator::session_detail(&session);
        let expected = format!("{}…", "é".repeat(TRANSCRIPT_EXCERPT_CHARS));
        assert!(detail.contains(&expected));
        assert!(detail.contains("- **Gaze (%):** -"));
    }

    #[test]
    fn test_excerpt_short_text_untouched() {
        assert_eq!(excerpt("hello", 800), "hello");
        assert_eq!(excerpt("hello", 2), "he");
    }

    #[test]
    fn test_comparison_table() {
        let store = SessionStore::from_snapshot(sessions());
        let table = ReportGenerator::comparison_table(&compare(&store, 1, 2).unwrap());
        assert!(table.contains("| Fluency | 70 | 0 |"));
        assert!(table.contains("| Overall | 80 | 90 |"));
    }

    #[test]
    fn test_result_report_includes_highlights_and_plan() {
        let body = br#"{"transcript": "Thanks all.", "fused": {"overall": 77},
                       "text": {"highlights": {"suggestion1": "Slow down."}}}"#;
        let AnalysisPayload::Analysis(result) = AnalysisPayload::decode(body).unwrap() else {
            panic!("expected analysis");
        };
        let report = ReportGenerator::result_report(&ResultView::from_result(&result));
        assert!(report.contains("- **Overall:** 77"));
        assert!(report.contains("- Slow down."));
        assert!(report.contains("4. Week 4"));
        assert!(report.contains("Thanks all."));
    }
}
