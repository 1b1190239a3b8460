use crate::artifact::{file_stamp, Artifact, MIME_JSON};
use chrono::{DateTime, Utc};
use fluentiq_core::error::Result;
use fluentiq_core::SessionStore;

/// Pretty JSON of one session, absent metrics written as `null`.
pub fn export_one(store: &SessionStore, id: Option<i64>) -> Result<Artifact> {
    export_one_at(store, id, Utc::now())
}

pub fn export_one_at(store: &SessionStore, id: Option<i64>, now: DateTime<Utc>) -> Result<Artifact> {
    let session = store.select(id)?;
    let bytes = serde_json::to_vec_pretty(session)?;
    Ok(Artifact::new(
        format!("session_{}_{}.json", session.id, file_stamp(now)),
        MIME_JSON,
        bytes,
    ))
}

/// Pretty JSON of a raw analysis result, as it was received.
pub fn export_result(raw: &serde_json::Value, product: &str) -> Result<Artifact> {
    export_result_at(raw, product, Utc::now())
}

pub fn export_result_at(raw: &serde_json::Value, product: &str, now: DateTime<Utc>) -> Result<Artifact> {
    let bytes = serde_json::to_vec_pretty(raw)?;
    Ok(Artifact::new(
        format!("{}_session_{}.json", product, file_stamp(now)),
        MIME_JSON,
        bytes,
    ))
}
