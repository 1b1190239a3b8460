use crate::artifact::{file_stamp, Artifact, MIME_CSV};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use fluentiq_core::error::{FluentError, Result};
use fluentiq_core::{Metrics, Session, SessionStore};

/// Column order of the history CSV.
pub fn header() -> Vec<&'static str> {
    let mut columns = vec!["id", "timestamp"];
    columns.extend(Metrics::FIELD_NAMES);
    columns.push("transcript");
    columns
}

/// Always-quoted field with inner quotes doubled.
fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn row(session: &Session) -> Vec<String> {
    let mut fields = Vec::with_capacity(15);
    fields.push(session.id.to_string());
    fields.push(session.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    fields.extend(
        session
            .metrics
            .values()
            .iter()
            .map(|v| v.map(|n| n.to_string()).unwrap_or_default()),
    );
    fields.push(quoted(&session.transcript));
    fields
}

/// Serialize the whole snapshot, in store order, as CSV.
pub fn export_all(store: &SessionStore, product: &str) -> Result<Artifact> {
    export_all_at(store, product, Utc::now())
}

pub fn export_all_at(store: &SessionStore, product: &str, now: DateTime<Utc>) -> Result<Artifact> {
    if store.is_empty() {
        return Err(FluentError::EmptyCollection);
    }

    // The remaining columns are numbers or RFC 3339 stamps and never need
    // quoting; the transcript arrives pre-quoted.
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(header())?;
    for session in store.sessions() {
        wtr.write_record(row(session))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| FluentError::Io(e.into_error()))?;

    tracing::debug!("Serialized {} sessions to CSV", store.len());
    Ok(Artifact::new(
        format!("{}_history_{}.csv", product, file_stamp(now)),
        MIME_CSV,
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn store() -> SessionStore {
        let ts = Utc.with_ymd_and_hms(2024, 2, 28, 18, 0, 0).unwrap();
        SessionStore::from_snapshot(vec![
            Session::new(2, ts)
                .with_transcript(r#"She said "hi", then left"#)
                .with_metrics(Metrics {
                    overall: Some(90.0),
                    avg_sentence_length: Some(12.5),
                    ..Default::default()
                }),
            Session::new(1, ts).with_metrics(Metrics {
                overall: Some(80.0),
                fluency: Some(70.0),
                ..Default::default()
            }),
        ])
    }

    fn parse(bytes: &[u8]) -> Vec<csv::StringRecord> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes)
            .records()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_empty_store_is_empty_collection() {
        let err = export_all_at(&SessionStore::new(), "fluentiq", now()).unwrap_err();
        assert!(matches!(err, FluentError::EmptyCollection));
        assert!(err.is_notice());
    }

    #[test]
    fn test_header_has_fifteen_columns() {
        let columns = header();
        assert_eq!(columns.len(), 15);
        assert_eq!(columns[0], "id");
        assert_eq!(columns[2], "overall");
        assert_eq!(columns[14], "transcript");
    }

    #[test]
    fn test_filename_and_terminator() {
        let artifact = export_all_at(&store(), "fluentiq", now()).unwrap();
        assert_eq!(artifact.filename, "fluentiq_history_2024-03-01T09:30:00.csv");
        assert_eq!(artifact.mime, MIME_CSV);
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.ends_with('\n'));
        assert!(!text.contains('\r'));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_absent_metrics_are_empty_fields() {
        let artifact = export_all_at(&store(), "fluentiq", now()).unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        let last = text.lines().nth(2).unwrap();
        assert_eq!(last, "1,2024-02-28T18:00:00Z,80,70,,,,,,,,,,,\"\"");
    }

    #[test]
    fn test_transcript_with_quotes_reparses_exactly() {
        let artifact = export_all_at(&store(), "fluentiq", now()).unwrap();
        let records = parse(&artifact.bytes);
        assert_eq!(records.len(), 3);
        assert_eq!(&records[1][0], "2");
        assert_eq!(&records[1][2], "90");
        assert_eq!(&records[1][12], "12.5");
        assert_eq!(&records[1][14], r#"She said "hi", then left"#);
        assert_eq!(records[1].len(), 15);
    }

    #[test]
    fn test_multiline_transcript_stays_one_field() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 28, 18, 0, 0).unwrap();
        let store = SessionStore::from_snapshot(vec![
            Session::new(3, ts).with_transcript("line one\nline two, more")
        ]);
        let artifact = export_all_at(&store, "fluentiq", now()).unwrap();
        let records = parse(&artifact.bytes);
        assert_eq!(records.len(), 2);
        assert_eq!(&records[1][14], "line one\nline two, more");
    }
}
