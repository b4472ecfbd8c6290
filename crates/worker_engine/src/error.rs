use worker_model::{ErrorCode, WorkError, WorkId};

use crate::decode::DecodeError;
use crate::fetch::FetchError;

pub const HTML_LOOKUP_UNSUPPORTED: &str = "Only CSS selector is supported when consuming HTML";
pub const JSON_LOOKUP_UNSUPPORTED: &str = "Only JSONPATH is supported when consuming json";

/// Every way a single job execution can fail.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("{0}")]
    ElementNotFound(String),
    #[error("unhandled source type: {0}")]
    UnhandledSourceType(String),
    #[error("Content type returned does not match: expected one of [{expected}], got {actual}")]
    ContentTypeMismatch { expected: String, actual: String },
    #[error("Result not ok: {body}")]
    ResultNotOk { status: u16, body: String },
    #[error("{0}")]
    UnsupportedLookup(&'static str),
    #[error("invalid css selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("invalid json path `{path}`: {message}")]
    InvalidJsonPath { path: String, message: String },
    #[error("invalid match pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("template rendering failed: {0}")]
    Template(String),
    #[error("invalid source: {0}")]
    InvalidSource(String),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl JobError {
    pub fn code(&self) -> ErrorCode {
        match self {
            JobError::ElementNotFound(_) => ErrorCode::ElementNotFound,
            JobError::UnhandledSourceType(_) => ErrorCode::UnhandledSourceType,
            JobError::ContentTypeMismatch { .. } => ErrorCode::ContentTypeMismatch,
            JobError::ResultNotOk { .. } => ErrorCode::ResultNotOk,
            JobError::UnsupportedLookup(_)
            | JobError::InvalidSelector { .. }
            | JobError::InvalidJsonPath { .. }
            | JobError::InvalidPattern { .. }
            | JobError::Template(_)
            | JobError::InvalidSource(_)
            | JobError::Json(_)
            | JobError::Fetch(_)
            | JobError::Decode(_) => ErrorCode::Internal,
        }
    }

    /// Wraps the failure into the outbound shape, keyed by the originating job.
    pub fn into_work_error(self, id: Option<WorkId>) -> WorkError {
        WorkError::new(id, self.code(), self.to_string())
    }
}
