//! Worker engine: source readers, lookups, reporting and job execution.
mod consumer;
mod decode;
mod error;
mod executor;
mod factory;
mod fetch;
mod hash;
mod lookup;
mod properties;
mod reader;
mod reporter;
mod sanitise;
mod template;

pub use consumer::{Consumer, HtmlConsumer, JsonConsumer, DEFAULT_HTML_CONTAINER};
pub use decode::{decode_document, DecodeError, DecodedDocument};
pub use error::{JobError, HTML_LOOKUP_UNSUPPORTED, JSON_LOOKUP_UNSUPPORTED};
pub use executor::{HtmlJobExecutor, JobExecutor, JsonJobExecutor, SourceJobExecutor};
pub use factory::JobExecutorFactory;
pub use fetch::{FailureKind, FetchError, FetchOutput, FetchSettings, Fetcher, ReqwestFetcher};
pub use hash::ReportHasher;
pub use lookup::{HtmlLookup, JsonLookup, LookupEngine};
pub use properties::{attribute, read_properties, stringify, text_content, HtmlNode};
pub use reader::{HtmlReader, JsonReader, SourceReader, HTML_CONTENT_TYPE, JSON_CONTENT_TYPE};
pub use reporter::{HtmlReporter, JsonReporter, ReportUnit, Reporter};
pub use sanitise::{ReportSanitiser, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, MAX_URL_LENGTH};
pub use template::{HandlebarsRenderer, TemplateRenderer};
