use std::fmt;

use serde::{Deserialize, Serialize};

pub type WorkId = String;

/// One of the four reported fields of a result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Title,
    Description,
    Image,
    Url,
}

impl Part {
    pub const ALL: [Part; 4] = [Part::Title, Part::Description, Part::Image, Part::Url];

    pub fn name(self) -> &'static str {
        match self {
            Part::Title => "title",
            Part::Description => "description",
            Part::Image => "image",
            Part::Url => "url",
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inbound job description. Immutable for the duration of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    pub id: WorkId,
    pub source: Source,
    #[serde(default)]
    pub consume: ConsumeSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub location: String,
    #[serde(rename = "type")]
    pub kind: SourceType,
}

/// Declared document kind. Unknown kinds are kept so the executor factory can
/// reject them with a proper error instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceType {
    Html,
    Json,
    Other(String),
}

impl From<String> for SourceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "html" => SourceType::Html,
            "json" => SourceType::Json,
            _ => SourceType::Other(value),
        }
    }
}

impl From<SourceType> for String {
    fn from(value: SourceType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Html => f.write_str("html"),
            SourceType::Json => f.write_str("json"),
            SourceType::Other(other) => f.write_str(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMode {
    Css,
    Xpath,
    Regex,
    Jsonpath,
    All,
}

impl fmt::Display for LookupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LookupMode::Css => "css",
            LookupMode::Xpath => "xpath",
            LookupMode::Regex => "regex",
            LookupMode::Jsonpath => "jsonpath",
            LookupMode::All => "all",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupSettings {
    pub mode: LookupMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl LookupSettings {
    pub fn new(mode: LookupMode, value: impl Into<String>) -> Self {
        Self {
            mode,
            value: Some(value.into()),
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(LookupMode::Css, value)
    }

    pub fn jsonpath(value: impl Into<String>) -> Self {
        Self::new(LookupMode::Jsonpath, value)
    }

    pub fn all() -> Self {
        Self {
            mode: LookupMode::All,
            value: None,
        }
    }

    /// The configured value, with an empty string treated as absent.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<ConsumeLookup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<ConsumeReportParts>,
}

impl ConsumeSpec {
    /// Every lookup the job declares, container first.
    pub fn lookups(&self) -> impl Iterator<Item = &LookupSettings> {
        let container = self.lookup.as_ref().map(|l| &l.container);
        let children = self.lookup.as_ref().and_then(|l| l.children.as_ref());
        let parts = self
            .parts
            .iter()
            .flat_map(|parts| Part::ALL.into_iter().filter_map(move |p| parts.get(p)));
        container.into_iter().chain(children).chain(parts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeLookup {
    pub container: LookupSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<LookupSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeReportParts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<LookupSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LookupSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<LookupSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<LookupSettings>,
}

impl ConsumeReportParts {
    pub fn get(&self, part: Part) -> Option<&LookupSettings> {
        match part {
            Part::Title => self.title.as_ref(),
            Part::Description => self.description.as_ref(),
            Part::Image => self.image.as_ref(),
            Part::Url => self.url.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<TextReporting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<TextReporting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<TextReporting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<TextReporting>,
}

impl ReportSpec {
    pub fn get(&self, part: Part) -> Option<&TextReporting> {
        match part {
            Part::Title => self.title.as_ref(),
            Part::Description => self.description.as_ref(),
            Part::Image => self.image.as_ref(),
            Part::Url => self.url.as_ref(),
        }
    }
}

/// Per-field rendering rule: a capture regex and a mustache-style template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextReporting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(
        default,
        rename = "match",
        skip_serializing_if = "Option::is_none"
    )]
    pub pattern: Option<String>,
}

impl TextReporting {
    pub fn template(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
            pattern: None,
        }
    }

    pub fn with_match(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}
