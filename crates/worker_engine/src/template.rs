use handlebars::{no_escape, Handlebars};
use serde_json::{Map, Value};

use crate::error::JobError;

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, properties: &Map<String, Value>) -> Result<String, JobError>;
}

/// Mustache-style rendering without HTML escaping; unknown placeholders
/// render as empty strings.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(no_escape);
        Self { registry }
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, template: &str, properties: &Map<String, Value>) -> Result<String, JobError> {
        self.registry
            .render_template(template, properties)
            .map_err(|err| JobError::Template(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test bags are objects"),
        }
    }

    #[test]
    fn renders_properties_without_escaping() {
        let renderer = HandlebarsRenderer::new();
        let out = renderer
            .render("{{foo}} & {{bar}}", &bag(json!({ "foo": "<b>X</b>", "bar": "Y" })))
            .unwrap();
        assert_eq!(out, "<b>X</b> & Y");
    }

    #[test]
    fn missing_placeholders_render_empty() {
        let renderer = HandlebarsRenderer::new();
        let out = renderer.render("a{{missing}}b", &Map::new()).unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn dollar_refers_to_the_json_element() {
        let renderer = HandlebarsRenderer::new();
        let out = renderer
            .render("http://someurl/{{$}}.png", &bag(json!({ "$": 42 })))
            .unwrap();
        assert_eq!(out, "http://someurl/42.png");
    }

    #[test]
    fn broken_template_is_an_error() {
        let renderer = HandlebarsRenderer::new();
        let err = renderer.render("{{#if}}", &Map::new()).unwrap_err();
        assert!(matches!(err, JobError::Template(_)));
    }
}
