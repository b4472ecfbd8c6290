use std::sync::Arc;

use serde_json::Value;
use worker_logging::worker_debug;

use crate::decode::decode_document;
use crate::error::JobError;
use crate::fetch::{content_type_accepted, FetchOutput, FetchSettings, Fetcher, ReqwestFetcher};

pub const HTML_CONTENT_TYPE: &str = "text/html";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Loads a job's source document from its location.
#[async_trait::async_trait]
pub trait SourceReader: Send + Sync {
    type Document: Send;

    async fn read(&self, location: &str) -> Result<Self::Document, JobError>;
}

/// Fetches `location` and accepts the response only if its content type starts
/// with one of `accepted` and its status is 2xx, checked in that order.
async fn read_accepted(
    fetcher: &dyn Fetcher,
    location: &str,
    accepted: &[&str],
) -> Result<FetchOutput, JobError> {
    let output = fetcher.fetch(location, accepted).await?;

    let actual = output.content_type.as_deref().unwrap_or_default();
    if !content_type_accepted(output.content_type.as_deref(), accepted) {
        return Err(JobError::ContentTypeMismatch {
            expected: accepted.join(", "),
            actual: if actual.is_empty() { "none".to_string() } else { actual.to_string() },
        });
    }

    if !output.is_success() {
        let body = String::from_utf8_lossy(&output.bytes).trim().to_string();
        let body = if body.is_empty() {
            format!("HTTP status {}", output.status)
        } else {
            body
        };
        worker_debug!("{} answered with status {}", location, output.status);
        return Err(JobError::ResultNotOk {
            status: output.status,
            body,
        });
    }

    Ok(output)
}

#[derive(Clone)]
pub struct HtmlReader {
    fetcher: Arc<dyn Fetcher>,
}

impl HtmlReader {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    pub fn with_settings(settings: FetchSettings) -> Self {
        Self::new(Arc::new(ReqwestFetcher::new(settings)))
    }
}

#[async_trait::async_trait]
impl SourceReader for HtmlReader {
    type Document = String;

    async fn read(&self, location: &str) -> Result<String, JobError> {
        let output = read_accepted(self.fetcher.as_ref(), location, &[HTML_CONTENT_TYPE]).await?;
        let decoded = decode_document(&output.bytes, output.content_type.as_deref())?;
        worker_debug!("decoded {} as {}", location, decoded.encoding_label);
        Ok(decoded.text)
    }
}

#[derive(Clone)]
pub struct JsonReader {
    fetcher: Arc<dyn Fetcher>,
}

impl JsonReader {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    pub fn with_settings(settings: FetchSettings) -> Self {
        Self::new(Arc::new(ReqwestFetcher::new(settings)))
    }
}

#[async_trait::async_trait]
impl SourceReader for JsonReader {
    type Document = Value;

    async fn read(&self, location: &str) -> Result<Value, JobError> {
        let output = read_accepted(self.fetcher.as_ref(), location, &[JSON_CONTENT_TYPE]).await?;
        Ok(serde_json::from_slice(&output.bytes)?)
    }
}
