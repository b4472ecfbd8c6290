use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Part, WorkId};

/// A normalized result record. Field order is the canonical serialization
/// order used for hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ResultReport {
    pub fn description(text: impl Into<String>) -> Self {
        Self {
            description: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn get(&self, part: Part) -> Option<&str> {
        match part {
            Part::Title => self.title.as_deref(),
            Part::Description => self.description.as_deref(),
            Part::Image => self.image.as_deref(),
            Part::Url => self.url.as_deref(),
        }
    }

    pub fn set(&mut self, part: Part, value: Option<String>) {
        let slot = match part {
            Part::Title => &mut self.title,
            Part::Description => &mut self.description,
            Part::Image => &mut self.image,
            Part::Url => &mut self.url,
        };
        *slot = value;
    }

    /// True when no field carries a non-blank value.
    pub fn is_empty(&self) -> bool {
        Part::ALL
            .iter()
            .all(|part| self.get(*part).map_or(true, |value| value.trim().is_empty()))
    }
}

/// A sanitised record with its content fingerprint attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedReport {
    #[serde(flatten)]
    pub report: ResultReport,
    pub hash: String,
}

/// Outbound result of one job execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub id: WorkId,
    pub last_updated: DateTime<Utc>,
    pub data: Vec<HashedReport>,
}
