use async_trait::async_trait;
use fluentiq_core::error::{FluentError, UploadError};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// The binary asset to submit. Opaque to everything but the transport.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Arc<[u8]>,
}

impl UploadPayload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk, guessing the mime type from its extension.
    pub fn from_path(path: &std::path::Path) -> Result<Self, FluentError> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        let mut payload = Self::new(file_name, bytes);
        if let Some(mime) = guess_mime(path) {
            payload = payload.with_mime(mime);
        }
        Ok(payload)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn guess_mime(path: &std::path::Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        _ => return None,
    };
    Some(mime)
}

/// One submission to the remote analysis endpoint.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub url: String,
    /// Multipart field carrying the file.
    pub field_name: String,
    pub payload: UploadPayload,
}

/// Byte-level progress reported while the body is on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportProgress {
    /// `total` is `None` when the transport cannot compute the body length.
    Bytes { loaded: u64, total: Option<u64> },
    /// The whole body has been handed to the connection.
    Sent,
}

pub type ProgressSender = mpsc::UnboundedSender<TransportProgress>;

/// Status line and body of the terminal response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Bytes-over-the-wire capability consumed by the upload state machine.
///
/// Implementations push progress through `progress` while sending and
/// resolve once with the terminal response or a network failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: UploadRequest,
        progress: ProgressSender,
    ) -> Result<RawResponse, UploadError>;
}

/// Multipart POST over reqwest, counting body bytes as they are pulled.
pub struct HttpTransport {
    client: reqwest::Client,
    chunk_size: usize,
}

impl HttpTransport {
    /// No overall request timeout: how long to wait for the analysis is the
    /// upload driver's decision.
    pub fn new(chunk_size: usize) -> Result<Self, FluentError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent("fluentiq/0.1")
            .build()?;
        Ok(Self {
            client,
            chunk_size: chunk_size.max(1),
        })
    }

    fn body_stream(
        &self,
        bytes: Arc<[u8]>,
        progress: ProgressSender,
    ) -> impl futures::Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + 'static {
        let total = bytes.len() as u64;
        let chunk_size = self.chunk_size;
        let offsets: Vec<usize> = (0..bytes.len()).step_by(chunk_size).collect();
        let mut loaded = 0u64;
        futures::stream::iter(offsets).map(move |start| {
            let end = (start + chunk_size).min(bytes.len());
            let chunk = bytes[start..end].to_vec();
            loaded += chunk.len() as u64;
            let _ = progress.send(TransportProgress::Bytes {
                loaded,
                total: Some(total),
            });
            if loaded == total {
                let _ = progress.send(TransportProgress::Sent);
            }
            Ok(chunk)
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: UploadRequest,
        progress: ProgressSender,
    ) -> Result<RawResponse, UploadError> {
        let payload = request.payload;
        let total = payload.bytes.len() as u64;
        if total == 0 {
            let _ = progress.send(TransportProgress::Bytes {
                loaded: 0,
                total: Some(0),
            });
            let _ = progress.send(TransportProgress::Sent);
        }

        let body = reqwest::Body::wrap_stream(self.body_stream(payload.bytes.clone(), progress));
        let mut part =
            reqwest::multipart::Part::stream_with_length(body, total).file_name(payload.file_name);
        if let Some(mime) = &payload.mime {
            part = part
                .mime_str(mime)
                .map_err(|e| UploadError::Network(format!("Invalid mime type '{}': {}", mime, e)))?;
        }
        let form = reqwest::multipart::Form::new().part(request.field_name, part);

        tracing::debug!("POST {} ({} bytes)", request.url, total);
        let response = self
            .client
            .post(&request.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| UploadError::Network(format!("Failed to read response body: {}", e)))?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body: body.to_vec(),
        })
    }
}
