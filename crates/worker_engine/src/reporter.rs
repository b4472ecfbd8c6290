//! Turns resolved report units into result records.
//!
//! Without a `ReportSpec` every unit yields at most a description (default
//! reporting). With one, each field is rendered on its own from the field's
//! reporting element: the unit's same-named part when it was resolved, the
//! content element otherwise.

use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};
use url::Url;
use worker_logging::worker_debug;
use worker_model::{Part, ReportSpec, ResultReport, TextReporting};

use crate::error::JobError;
use crate::properties::{attribute, read_properties, stringify, text_content, HtmlNode};
use crate::template::{HandlebarsRenderer, TemplateRenderer};

/// A content element paired with the sub-elements resolved for its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportUnit<E> {
    pub element: E,
    pub title: Option<E>,
    pub description: Option<E>,
    pub image: Option<E>,
    pub url: Option<E>,
}

impl<E> ReportUnit<E> {
    pub fn new(element: E) -> Self {
        Self {
            element,
            title: None,
            description: None,
            image: None,
            url: None,
        }
    }

    pub fn part(&self, part: Part) -> Option<&E> {
        match part {
            Part::Title => self.title.as_ref(),
            Part::Description => self.description.as_ref(),
            Part::Image => self.image.as_ref(),
            Part::Url => self.url.as_ref(),
        }
    }

    pub fn set_part(&mut self, part: Part, value: Option<E>) {
        let slot = match part {
            Part::Title => &mut self.title,
            Part::Description => &mut self.description,
            Part::Image => &mut self.image,
            Part::Url => &mut self.url,
        };
        *slot = value;
    }

    /// The element a field is reported from.
    pub fn reporting_element(&self, part: Part) -> &E {
        self.part(part).unwrap_or(&self.element)
    }
}

pub trait Reporter<E> {
    fn build_report(
        &self,
        units: &[ReportUnit<E>],
        report: Option<&ReportSpec>,
    ) -> Result<Vec<ResultReport>, JobError>;
}

/// Document-kind specific reads the shared reporting driver needs.
trait ElementReading<E> {
    /// Text the `match` pattern runs against; also the default description.
    fn text(&self, element: &E) -> String;

    fn properties(&self, element: &E) -> Map<String, Value>;

    /// Attribute value that short-circuits templating for `part`.
    fn fallback_attribute(&self, _element: &E, _part: Part) -> Option<String> {
        None
    }

    /// Field value when a rule carries no template.
    fn untemplated(&self, element: &E) -> String;

    /// Whether a default-mode description is worth a record.
    fn is_reportable(&self, text: &str) -> bool {
        !text.trim().is_empty()
    }
}

struct FieldRule<'r> {
    part: Part,
    rule: Option<&'r TextReporting>,
    pattern: Option<Regex>,
}

fn compile_rules(report: &ReportSpec) -> Result<Vec<FieldRule<'_>>, JobError> {
    Part::ALL
        .into_iter()
        .map(|part| {
            let rule = report.get(part);
            let pattern = rule
                .and_then(|r| r.pattern.as_deref())
                .map(|raw| {
                    Regex::new(raw).map_err(|source| JobError::InvalidPattern {
                        pattern: raw.to_string(),
                        source,
                    })
                })
                .transpose()?;
            Ok(FieldRule {
                part,
                rule,
                pattern,
            })
        })
        .collect()
}

fn captures(pattern: &Regex, text: &str) -> Map<String, Value> {
    let mut groups = Map::new();
    if let Some(caps) = pattern.captures(text) {
        for name in pattern.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                groups.insert(name.to_string(), Value::String(m.as_str().to_string()));
            }
        }
    }
    groups
}

fn build_default<E>(
    reader: &impl ElementReading<E>,
    units: &[ReportUnit<E>],
) -> Vec<ResultReport> {
    units
        .iter()
        .map(|unit| reader.text(unit.reporting_element(Part::Description)))
        .filter(|text| reader.is_reportable(text))
        .map(ResultReport::description)
        .collect()
}

fn build_templated<E>(
    reader: &impl ElementReading<E>,
    renderer: &dyn TemplateRenderer,
    units: &[ReportUnit<E>],
    report: &ReportSpec,
) -> Result<Vec<ResultReport>, JobError> {
    let rules = compile_rules(report)?;
    let mut records = Vec::with_capacity(units.len());

    for (index, unit) in units.iter().enumerate() {
        let mut record = ResultReport::default();
        for field in &rules {
            let element = unit.reporting_element(field.part);
            if let Some(value) = reader.fallback_attribute(element, field.part) {
                record.set(field.part, Some(value));
                continue;
            }
            let Some(rule) = field.rule else {
                continue;
            };

            let mut bag = reader.properties(element);
            if let Some(pattern) = &field.pattern {
                bag.extend(captures(pattern, &reader.text(element)));
            }

            let value = match rule.template.as_deref() {
                Some(template) => renderer.render(template, &bag)?,
                None => reader.untemplated(element),
            };
            record.set(field.part, Some(value));
        }

        if record.is_empty() {
            worker_debug!("dropping empty record for element #{}", index);
            continue;
        }
        records.push(record);
    }

    Ok(records)
}

/// Reporter for HTML nodes. Images and links prefer the element's own
/// `src`/`href` over any template.
#[derive(Clone)]
pub struct HtmlReporter {
    renderer: Arc<dyn TemplateRenderer>,
    base_url: Option<Url>,
}

impl HtmlReporter {
    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            renderer,
            base_url: None,
        }
    }

    /// Base used to resolve relative `link` properties.
    pub fn with_base_url(mut self, base_url: Option<Url>) -> Self {
        self.base_url = base_url;
        self
    }
}

impl Default for HtmlReporter {
    fn default() -> Self {
        Self::new(Arc::new(HandlebarsRenderer::new()))
    }
}

impl<'a> ElementReading<HtmlNode<'a>> for HtmlReporter {
    fn text(&self, element: &HtmlNode<'a>) -> String {
        text_content(*element)
    }

    fn properties(&self, element: &HtmlNode<'a>) -> Map<String, Value> {
        read_properties(*element, self.base_url.as_ref())
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect()
    }

    fn fallback_attribute(&self, element: &HtmlNode<'a>, part: Part) -> Option<String> {
        match part {
            Part::Image => attribute(*element, "src"),
            Part::Url => attribute(*element, "href"),
            Part::Title | Part::Description => None,
        }
    }

    fn untemplated(&self, _element: &HtmlNode<'a>) -> String {
        String::new()
    }
}

impl<'a> Reporter<HtmlNode<'a>> for HtmlReporter {
    fn build_report(
        &self,
        units: &[ReportUnit<HtmlNode<'a>>],
        report: Option<&ReportSpec>,
    ) -> Result<Vec<ResultReport>, JobError> {
        match report {
            Some(report) => build_templated(self, self.renderer.as_ref(), units, report),
            None => Ok(build_default(self, units)),
        }
    }
}

/// Reporter for JSON values. Templates see the element as `$`.
#[derive(Clone)]
pub struct JsonReporter {
    renderer: Arc<dyn TemplateRenderer>,
}

impl JsonReporter {
    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self { renderer }
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new(Arc::new(HandlebarsRenderer::new()))
    }
}

impl ElementReading<Value> for JsonReporter {
    fn text(&self, element: &Value) -> String {
        stringify(element)
    }

    fn properties(&self, element: &Value) -> Map<String, Value> {
        let mut bag = Map::new();
        bag.insert("$".to_string(), element.clone());
        bag.insert("$__string".to_string(), Value::String(stringify(element)));
        bag
    }

    fn untemplated(&self, element: &Value) -> String {
        stringify(element)
    }

    // Only the empty string is dropped; whitespace is a value here.
    fn is_reportable(&self, text: &str) -> bool {
        !text.is_empty()
    }
}

impl Reporter<Value> for JsonReporter {
    fn build_report(
        &self,
        units: &[ReportUnit<Value>],
        report: Option<&ReportSpec>,
    ) -> Result<Vec<ResultReport>, JobError> {
        match report {
            Some(report) => build_templated(self, self.renderer.as_ref(), units, report),
            None => Ok(build_default(self, units)),
        }
    }
}
