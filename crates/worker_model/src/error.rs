use std::fmt;

use serde::{Deserialize, Serialize};

use crate::WorkId;

/// Fixed failure taxonomy reported to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ElementNotFound,
    UnhandledSourceType,
    ContentTypeMismatch,
    ResultNotOk,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ErrorCode::ElementNotFound => "ELEMENT_NOT_FOUND",
            ErrorCode::UnhandledSourceType => "UNHANDLED_SOURCE_TYPE",
            ErrorCode::ContentTypeMismatch => "CONTENT_TYPE_MISMATCH",
            ErrorCode::ResultNotOk => "RESULT_NOT_OK",
            ErrorCode::Internal => "INTERNAL",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WorkId>,
    pub code: ErrorCode,
    pub message: String,
}

impl WorkError {
    pub fn new(id: Option<WorkId>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            id,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for WorkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} ({id}): {}", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}
