//! Response bodies of `POST /analyze/<asset-kind>`.
//!
//! The endpoint answers either with a full multimodal analysis or with a
//! bare session row; [`AnalysisPayload`] accepts both.

use crate::error::UploadError;
use crate::session::{Metrics, Session};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioScores {
    pub wpm: Option<f64>,
    pub filler_count: Option<u32>,
    pub pause_ratio: Option<f64>,
    pub fluency_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioStats {
    pub word_count: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub total_pause_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioAnalysis {
    pub transcript: String,
    pub scores: AudioScores,
    pub stats: AudioStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextScores {
    pub grammar_score: Option<f64>,
    pub lexical_richness: Option<f64>,
    pub coherence_score: Option<f64>,
    pub readability_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStats {
    pub word_count: Option<f64>,
    pub sentence_count: Option<f64>,
    pub avg_sentence_length: Option<f64>,
    pub grammar_errors: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextAnalysis {
    pub transcript: String,
    pub scores: TextScores,
    pub stats: TextStats,
    /// Feedback annotations keyed by kind ("suggestion1", "example", ...).
    pub highlights: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusedVideo {
    pub posture: Option<f64>,
    pub gaze: Option<f64>,
    pub movement: Option<f64>,
}

/// Cross-modal scores combined into one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusedScores {
    pub fluency: Option<f64>,
    pub grammar: Option<f64>,
    pub coherence: Option<f64>,
    pub readability: Option<f64>,
    pub overall: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<FusedVideo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisStats {
    pub word_count: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub total_pause_seconds: Option<f64>,
    pub sentence_count: Option<f64>,
    pub avg_sentence_length: Option<f64>,
    pub grammar_errors: Option<f64>,
}

/// Full multimodal analysis of one uploaded sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub audio: Option<AudioAnalysis>,
    #[serde(default)]
    pub text: Option<TextAnalysis>,
    /// Raw video analysis, passed through untouched.
    #[serde(default)]
    pub video: Option<serde_json::Value>,
    pub fused: FusedScores,
    #[serde(default)]
    pub stats: AnalysisStats,
    #[serde(default)]
    pub notes: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AnalysisResult {
    /// Transcript, preferring the top-level field over the text analysis copy.
    pub fn transcript(&self) -> &str {
        if !self.transcript.is_empty() {
            return &self.transcript;
        }
        self.text.as_ref().map(|t| t.transcript.as_str()).unwrap_or("")
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.audio
            .as_ref()
            .and_then(|a| a.stats.duration_seconds)
            .or(self.stats.duration_seconds)
    }

    /// Highlight annotations rendered as plain strings.
    pub fn highlights(&self) -> Vec<String> {
        self.text
            .as_ref()
            .map(|t| {
                t.highlights
                    .values()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Flatten fused scores and stats into the session metric set.
    pub fn to_metrics(&self) -> Metrics {
        let video = self.fused.video.clone().unwrap_or_default();
        let audio_words = self.audio.as_ref().and_then(|a| a.stats.word_count);
        Metrics {
            overall: self.fused.overall,
            fluency: self.fused.fluency,
            grammar: self.fused.grammar,
            coherence: self.fused.coherence,
            readability: self.fused.readability,
            posture: video.posture,
            gaze: video.gaze,
            movement: video.movement,
            word_count: self.stats.word_count.or(audio_words),
            sentence_count: self.stats.sentence_count,
            avg_sentence_length: self.stats.avg_sentence_length,
            grammar_errors: self.stats.grammar_errors,
        }
    }
}

/// Decoded success body of an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisPayload {
    Analysis(Box<AnalysisResult>),
    Session(Session),
}

impl AnalysisPayload {
    /// Decode a success response body. Anything that is not one of the two
    /// accepted shapes is a decode failure.
    pub fn decode(body: &[u8]) -> Result<Self, UploadError> {
        Self::decode_with_raw(body).map(|(payload, _)| payload)
    }

    /// Decode a success body and keep the parsed document exactly as the
    /// server sent it, unmodelled fields and all.
    pub fn decode_with_raw(body: &[u8]) -> Result<(Self, serde_json::Value), UploadError> {
        let raw: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| UploadError::Decode(e.to_string()))?;
        let payload = Self::deserialize(&raw).map_err(|e| UploadError::Decode(e.to_string()))?;
        Ok((payload, raw))
    }

    pub fn transcript(&self) -> &str {
        match self {
            AnalysisPayload::Analysis(result) => result.transcript(),
            AnalysisPayload::Session(session) => &session.transcript,
        }
    }

    pub fn metrics(&self) -> Metrics {
        match self {
            AnalysisPayload::Analysis(result) => result.to_metrics(),
            AnalysisPayload::Session(session) => session.metrics.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "transcript": "So, first of all, thank you.",
        "audio": {
            "transcript": "So, first of all, thank you.",
            "scores": {"wpm": 132.0, "filler_count": 1, "pause_ratio": 0.1, "fluency_score": 78},
            "stats": {"word_count": 6, "duration_seconds": 4.2, "total_pause_seconds": 0.4}
        },
        "text": {
            "transcript": "So, first of all, thank you.",
            "scores": {"grammar_score": 90, "lexical_richness": 0.8, "coherence_score": 65, "readability_score": 71.3},
            "stats": {"word_count": 6, "sentence_count": 1, "avg_sentence_length": 6.0, "grammar_errors": 0},
            "highlights": {"suggestion1": "Reduce filler words."}
        },
        "video": null,
        "fused": {"fluency": 78, "grammar": 90, "coherence": 65, "readability": 71.3, "overall": 77},
        "stats": {"word_count": 6, "duration_seconds": 4.2, "total_pause_seconds": 0.4,
                  "sentence_count": 1, "avg_sentence_length": 6.0, "grammar_errors": 0},
        "notes": {"pipeline": "audio -> text -> video fusion"}
    }"#;

    #[test]
    fn test_decode_full_analysis() {
        let payload = AnalysisPayload::decode(FULL.as_bytes()).unwrap();
        let AnalysisPayload::Analysis(result) = payload else {
            panic!("expected analysis payload");
        };
        assert_eq!(result.fused.overall, Some(77.0));
        assert_eq!(result.duration_seconds(), Some(4.2));
        assert_eq!(result.highlights(), vec!["Reduce filler words.".to_string()]);
        let metrics = result.to_metrics();
        assert_eq!(metrics.fluency, Some(78.0));
        assert_eq!(metrics.posture, None);
        assert_eq!(metrics.sentence_count, Some(1.0));
    }

    #[test]
    fn test_decode_with_raw_keeps_document_verbatim() {
        let body = br#"{"transcript": "Hi", "audio": {"scores": {"wpm": 120, "tempo": "brisk"}},
                       "fused": {"overall": 77, "video": null}}"#;
        let (payload, raw) = AnalysisPayload::decode_with_raw(body).unwrap();
        assert!(matches!(payload, AnalysisPayload::Analysis(_)));
        let expected: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(raw, expected);
        assert_eq!(raw["audio"]["scores"]["wpm"], serde_json::json!(120));
        assert_eq!(raw["audio"]["scores"]["tempo"], "brisk");
        assert!(raw["fused"].as_object().unwrap().contains_key("video"));
        assert!(raw.get("notes").is_none());
    }

    #[test]
    fn test_decode_session_shape() {
        let body = br#"{"id": 12, "timestamp": "2024-05-01T09:00:00", "transcript": "hi", "overall": 60}"#;
        let payload = AnalysisPayload::decode(body).unwrap();
        assert!(matches!(payload, AnalysisPayload::Session(ref s) if s.id == 12));
        assert_eq!(payload.metrics().overall, Some(60.0));
    }

    #[test]
    fn test_decode_rejects_unknown_shape() {
        let err = AnalysisPayload::decode(br#"{"status": "ok"}"#).unwrap_err();
        assert!(matches!(err, UploadError::Decode(_)));
        let err = AnalysisPayload::decode(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, UploadError::Decode(_)));
    }

    #[test]
    fn test_transcript_falls_back_to_text_analysis() {
        let body = br#"{"fused": {}, "text": {"transcript": "from text"}}"#;
        let payload = AnalysisPayload::decode(body).unwrap();
        assert_eq!(payload.transcript(), "from text");
    }

    #[test]
    fn test_fused_video_scores_flow_into_metrics() {
        let body = br#"{"fused": {"overall": 70, "video": {"posture": 81, "gaze": 64, "movement": 50}}}"#;
        let metrics = AnalysisPayload::decode(body).unwrap().metrics();
        assert_eq!(metrics.posture, Some(81.0));
        assert_eq!(metrics.gaze, Some(64.0));
        assert_eq!(metrics.movement, Some(50.0));
    }
}
