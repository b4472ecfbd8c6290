use std::sync::Arc;

use scraper::Html;
use serde_json::Value;
use url::Url;
use worker_logging::worker_debug;
use worker_model::{ConsumeReportParts, ConsumeSpec, LookupSettings, Part, ResultReport, Work};

use crate::error::JobError;
use crate::lookup::{HtmlLookup, JsonLookup, LookupEngine};
use crate::properties::HtmlNode;
use crate::reporter::{HtmlReporter, JsonReporter, ReportUnit, Reporter};
use crate::template::{HandlebarsRenderer, TemplateRenderer};

/// Container used for HTML jobs that declare no lookup.
pub const DEFAULT_HTML_CONTAINER: &str = "body";

const CONTAINER_NOT_FOUND: &str = "Container not found.";

/// Resolves a job's elements inside a fetched document and reports on them.
pub trait Consumer {
    type Source: ?Sized;

    fn consume(&self, source: &Self::Source, work: &Work) -> Result<Vec<ResultReport>, JobError>;
}

fn validate_lookups<E>(engine: &impl LookupEngine<E>, consume: &ConsumeSpec) -> Result<(), JobError> {
    consume
        .lookups()
        .try_for_each(|settings| engine.validate(settings))
}

/// Resolves every declared part relative to its own content element.
fn build_units<E>(
    engine: &impl LookupEngine<E>,
    elements: Vec<E>,
    parts: Option<&ConsumeReportParts>,
) -> Result<Vec<ReportUnit<E>>, JobError> {
    elements
        .into_iter()
        .map(|element| {
            let mut unit = ReportUnit::new(element);
            if let Some(parts) = parts {
                for part in Part::ALL {
                    if let Some(settings) = parts.get(part) {
                        let found = engine.lookup_one(&unit.element, settings)?;
                        unit.set_part(part, found);
                    }
                }
            }
            Ok(unit)
        })
        .collect()
}

fn require_elements<E>(elements: Vec<E>, what: &str) -> Result<Vec<E>, JobError> {
    if elements.is_empty() {
        return Err(JobError::ElementNotFound(format!("{what} not found.")));
    }
    Ok(elements)
}

#[derive(Clone)]
pub struct HtmlConsumer {
    default_container: LookupSettings,
    renderer: Arc<dyn TemplateRenderer>,
}

impl HtmlConsumer {
    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            default_container: LookupSettings::css(DEFAULT_HTML_CONTAINER),
            renderer,
        }
    }

    pub fn with_default_container(mut self, container: LookupSettings) -> Self {
        self.default_container = container;
        self
    }

    fn content_elements<'a>(
        &self,
        root: HtmlNode<'a>,
        consume: &ConsumeSpec,
    ) -> Result<Vec<HtmlNode<'a>>, JobError> {
        let lookup = consume.lookup.as_ref();
        let container_lookup = lookup.map_or(&self.default_container, |l| &l.container);
        let container = HtmlLookup
            .lookup_one(&root, container_lookup)?
            .ok_or_else(|| JobError::ElementNotFound(CONTAINER_NOT_FOUND.to_string()))?;

        match lookup.and_then(|l| l.children.as_ref()) {
            Some(children) => require_elements(
                HtmlLookup.lookup_many(&container, children)?,
                "Children",
            ),
            None => Ok(vec![container]),
        }
    }
}

impl Default for HtmlConsumer {
    fn default() -> Self {
        Self::new(Arc::new(HandlebarsRenderer::new()))
    }
}

impl Consumer for HtmlConsumer {
    type Source = str;

    fn consume(&self, source: &str, work: &Work) -> Result<Vec<ResultReport>, JobError> {
        validate_lookups::<HtmlNode<'_>>(&HtmlLookup, &work.consume)?;

        let document = Html::parse_document(source);
        let elements = self.content_elements(document.tree.root(), &work.consume)?;
        worker_debug!("html consumer resolved {} content elements", elements.len());

        let units = build_units(&HtmlLookup, elements, work.consume.parts.as_ref())?;
        let base_url = Url::parse(&work.source.location).ok();
        HtmlReporter::new(self.renderer.clone())
            .with_base_url(base_url)
            .build_report(&units, work.report.as_ref())
    }
}

#[derive(Clone)]
pub struct JsonConsumer {
    reporter: JsonReporter,
}

impl JsonConsumer {
    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            reporter: JsonReporter::new(renderer),
        }
    }

    /// Containers in match order; a list source is searched item by item.
    fn containers(&self, source: &Value, consume: &ConsumeSpec) -> Result<Vec<Value>, JobError> {
        let lookup = consume.lookup.as_ref().map(|l| &l.container);
        let containers = match (source, lookup) {
            (Value::Array(items), Some(settings)) => {
                let mut found = Vec::new();
                for item in items {
                    found.extend(JsonLookup.lookup_many(item, settings)?);
                }
                found
            }
            (Value::Array(items), None) => items.clone(),
            (_, Some(settings)) => JsonLookup.lookup_many(source, settings)?,
            (_, None) => vec![source.clone()],
        };
        let containers = containers.into_iter().filter(|c| !c.is_null()).collect();
        require_elements(containers, "Container")
    }

    fn content_elements(&self, source: &Value, consume: &ConsumeSpec) -> Result<Vec<Value>, JobError> {
        let containers = self.containers(source, consume)?;
        match consume.lookup.as_ref().and_then(|l| l.children.as_ref()) {
            Some(children) => {
                let mut elements = Vec::new();
                for container in &containers {
                    elements.extend(JsonLookup.lookup_many(container, children)?);
                }
                require_elements(elements, "Children")
            }
            None => Ok(containers),
        }
    }
}

impl Default for JsonConsumer {
    fn default() -> Self {
        Self::new(Arc::new(HandlebarsRenderer::new()))
    }
}

impl Consumer for JsonConsumer {
    type Source = Value;

    fn consume(&self, source: &Value, work: &Work) -> Result<Vec<ResultReport>, JobError> {
        if !(source.is_object() || source.is_array()) {
            return Err(JobError::InvalidSource(
                "source needs to be an object or a list".to_string(),
            ));
        }
        validate_lookups::<Value>(&JsonLookup, &work.consume)?;

        let elements = self.content_elements(source, &work.consume)?;
        worker_debug!("json consumer resolved {} content elements", elements.len());

        let units = build_units(&JsonLookup, elements, work.consume.parts.as_ref())?;
        self.reporter.build_report(&units, work.report.as_ref())
    }
}
