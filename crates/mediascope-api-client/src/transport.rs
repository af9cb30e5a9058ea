//! Upload transport.
//!
//! [`Transport`] is the seam between the orchestrator and the network. The
//! HTTP implementation streams the file as a multipart body, reports progress
//! from the body stream, and enforces the deadline over the whole
//! request/response cycle. It never retries.

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::Either;
use futures::stream::{self, StreamExt};
use mediascope_core::{FileSource, ProgressReporter, TransportError, UploadRequest};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde_json::Value as JsonValue;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use crate::{analyze_path, ApiClient};

/// Size of each body chunk handed to the network layer.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one file and return the raw JSON payload of a successful response.
    ///
    /// Implementations must enforce `timeout` as a hard deadline, stop when
    /// `cancel` fires, report progress through `progress`, and never retry.
    async fn upload(
        &self,
        request: UploadRequest,
        timeout: Duration,
        progress: Arc<ProgressReporter>,
        cancel: CancellationToken,
    ) -> Result<JsonValue, TransportError>;
}

/// reqwest-backed transport for the `/image/analyze` and `/video/analyze` endpoints.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    api: ApiClient,
}

impl HttpTransport {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn endpoint(&self, request: &UploadRequest) -> String {
        self.api.build_url(analyze_path(request.kind))
    }

    async fn exchange(
        &self,
        url: &str,
        request: &UploadRequest,
        progress: Arc<ProgressReporter>,
    ) -> Result<JsonValue, TransportError> {
        let form = build_form(request, progress).await?;

        let response = self
            .api
            .client()
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Network(describe_error(&e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(describe_error(&e)))?;

        if !status.is_success() {
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonValue::Null);
        }

        serde_json::from_slice(&body).map_err(|e| {
            TransportError::InvalidResponse(format!("Failed to parse response as JSON: {}", e))
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn upload(
        &self,
        request: UploadRequest,
        timeout: Duration,
        progress: Arc<ProgressReporter>,
        cancel: CancellationToken,
    ) -> Result<JsonValue, TransportError> {
        let url = self.endpoint(&request);
        let started = Instant::now();

        tracing::debug!(
            url = %url,
            file = %request.file.name(),
            size = request.file.size(),
            timeout_ms = timeout.as_millis() as u64,
            "Sending analysis request"
        );

        // Dropping the exchange future aborts the in-flight request.
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(url = %url, "Upload cancelled");
                Err(TransportError::Aborted)
            }
            outcome = tokio::time::timeout(timeout, self.exchange(&url, &request, progress)) => {
                match outcome {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(
                            url = %url,
                            timeout_ms = timeout.as_millis() as u64,
                            "Analysis request exceeded its deadline"
                        );
                        Err(TransportError::Timeout { timeout })
                    }
                }
            }
        };

        tracing::debug!(
            url = %url,
            duration_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Analysis request finished"
        );

        result
    }
}

/// Multipart body: `file`, then `analysis_type` for videos.
async fn build_form(
    request: &UploadRequest,
    progress: Arc<ProgressReporter>,
) -> Result<Form, TransportError> {
    let file = &request.file;
    let total = file.size();

    let chunks = match file.source() {
        FileSource::Path(path) => {
            let handle = tokio::fs::File::open(path).await.map_err(|e| {
                TransportError::Network(format!("Failed to read {}: {}", path.display(), e))
            })?;
            Either::Left(ReaderStream::with_capacity(handle, UPLOAD_CHUNK_SIZE))
        }
        FileSource::Memory(data) => Either::Right(stream::iter(memory_chunks(data.clone()))),
    };

    let mut sent = 0u64;
    let body = chunks.map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.len() as u64;
            progress.bytes_sent(sent);
        }
        chunk
    });

    let part = Part::stream_with_length(Body::wrap_stream(body), total)
        .file_name(file.name().to_string())
        .mime_str(file.mime_type())
        .map_err(|e| {
            TransportError::Network(format!(
                "Invalid content type '{}': {}",
                file.mime_type(),
                e
            ))
        })?;

    let mut form = Form::new().part("file", part);
    if let Some(mode) = request.analysis_mode {
        form = form.text("analysis_type", mode.as_str());
    }

    Ok(form)
}

fn memory_chunks(data: Bytes) -> Vec<std::io::Result<Bytes>> {
    let mut chunks = Vec::with_capacity(data.len() / UPLOAD_CHUNK_SIZE + 1);
    let mut start = 0;
    while start < data.len() {
        let end = (start + UPLOAD_CHUNK_SIZE).min(data.len());
        chunks.push(Ok(data.slice(start..end)));
        start = end;
    }
    chunks
}

/// `detail` of an error body. Non-string details (e.g. validation arrays) are
/// rendered as JSON.
pub fn extract_detail(body: &[u8]) -> Option<String> {
    let value: JsonValue = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        JsonValue::Null => None,
        JsonValue::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}

/// reqwest's Display omits the cause chain; include it.
fn describe_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_chunks_cover_all_bytes() {
        let data = Bytes::from(vec![7u8; UPLOAD_CHUNK_SIZE * 2 + 10]);
        let chunks = memory_chunks(data);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.as_ref().unwrap().len()).collect();
        assert_eq!(sizes, vec![UPLOAD_CHUNK_SIZE, UPLOAD_CHUNK_SIZE, 10]);
    }

    #[test]
    fn test_memory_chunks_empty() {
        assert!(memory_chunks(Bytes::new()).is_empty());
    }

    #[test]
    fn test_extract_detail_string() {
        assert_eq!(
            extract_detail(br#"{"detail": "bad codec"}"#),
            Some("bad codec".to_string())
        );
    }

    #[test]
    fn test_extract_detail_structured() {
        let detail = extract_detail(br#"{"detail": [{"loc": ["file"], "msg": "required"}]}"#);
        assert!(detail.unwrap().contains("required"));
    }

    #[test]
    fn test_extract_detail_absent() {
        assert_eq!(extract_detail(br#"{"message": "nope"}"#), None);
        assert_eq!(extract_detail(br#"{"detail": null}"#), None);
        assert_eq!(extract_detail(b"<html>502 Bad Gateway</html>"), None);
        assert_eq!(extract_detail(b""), None);
    }
}
