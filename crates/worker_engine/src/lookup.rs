//! Selector resolution against HTML trees and JSON values.
//!
//! Single lookups hand back the bare match (or `None` when nothing matched);
//! multi lookups hand back every match in document order. A JSON single
//! lookup that matches several values yields them as one array value, so a
//! caller asking for one value never receives a one-element array.

use scraper::{ElementRef, Selector};
use serde_json::Value;
use serde_json_path::JsonPath;
use worker_model::{LookupMode, LookupSettings};

use crate::error::{JobError, HTML_LOOKUP_UNSUPPORTED, JSON_LOOKUP_UNSUPPORTED};
use crate::properties::HtmlNode;

/// Resolves lookup settings relative to a scope node of one document kind.
pub trait LookupEngine<E> {
    /// Rejects modes this document kind cannot evaluate.
    fn validate(&self, settings: &LookupSettings) -> Result<(), JobError>;

    fn lookup_one(&self, scope: &E, settings: &LookupSettings) -> Result<Option<E>, JobError>;

    fn lookup_many(&self, scope: &E, settings: &LookupSettings) -> Result<Vec<E>, JobError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlLookup;

impl HtmlLookup {
    fn selector(settings: &LookupSettings) -> Result<Selector, JobError> {
        let raw = settings.value().ok_or_else(|| JobError::InvalidSelector {
            selector: String::new(),
            message: "css lookup requires a selector value".to_string(),
        })?;
        parse_selector(raw)
    }
}

fn parse_selector(raw: &str) -> Result<Selector, JobError> {
    Selector::parse(raw).map_err(|err| JobError::InvalidSelector {
        selector: raw.to_string(),
        message: err.to_string(),
    })
}

/// Elements strictly below `scope` matching `selector`, in document order.
fn select<'a>(scope: HtmlNode<'a>, selector: &Selector) -> Vec<HtmlNode<'a>> {
    scope
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|element| selector.matches(element))
        .map(|element| *element)
        .collect()
}

impl<'a> LookupEngine<HtmlNode<'a>> for HtmlLookup {
    fn validate(&self, settings: &LookupSettings) -> Result<(), JobError> {
        match settings.mode {
            LookupMode::Css | LookupMode::All => Ok(()),
            LookupMode::Xpath | LookupMode::Regex | LookupMode::Jsonpath => {
                Err(JobError::UnsupportedLookup(HTML_LOOKUP_UNSUPPORTED))
            }
        }
    }

    fn lookup_one(
        &self,
        scope: &HtmlNode<'a>,
        settings: &LookupSettings,
    ) -> Result<Option<HtmlNode<'a>>, JobError> {
        self.validate(settings)?;
        match (settings.mode, settings.value()) {
            (LookupMode::All, None) => Ok(Some(*scope)),
            (LookupMode::All, Some(raw)) => {
                Ok(select(*scope, &parse_selector(raw)?).into_iter().next())
            }
            _ => Ok(select(*scope, &Self::selector(settings)?).into_iter().next()),
        }
    }

    fn lookup_many(
        &self,
        scope: &HtmlNode<'a>,
        settings: &LookupSettings,
    ) -> Result<Vec<HtmlNode<'a>>, JobError> {
        self.validate(settings)?;
        match (settings.mode, settings.value()) {
            (LookupMode::All, None) => Ok(scope.children().collect()),
            (LookupMode::All, Some(raw)) => Ok(select(*scope, &parse_selector(raw)?)
                .into_iter()
                .flat_map(|matched| matched.children())
                .collect()),
            _ => Ok(select(*scope, &Self::selector(settings)?)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLookup;

impl JsonLookup {
    fn query<'v>(scope: &'v Value, raw: &str) -> Result<Vec<&'v Value>, JobError> {
        let path = JsonPath::parse(raw).map_err(|err| JobError::InvalidJsonPath {
            path: raw.to_string(),
            message: err.to_string(),
        })?;
        Ok(path.query(scope).all())
    }

    fn path_value(settings: &LookupSettings) -> Result<&str, JobError> {
        settings.value().ok_or_else(|| JobError::InvalidJsonPath {
            path: String::new(),
            message: "jsonpath lookup requires a path value".to_string(),
        })
    }
}

/// Equivalent of the `$.*` wildcard: member values of an object, items of a list.
fn wildcard(value: &Value) -> Vec<Value> {
    match value {
        Value::Object(map) => map.values().cloned().collect(),
        Value::Array(items) => items.clone(),
        _ => Vec::new(),
    }
}

/// Matched lists contribute their items rather than themselves.
fn flatten(matches: Vec<&Value>) -> Vec<Value> {
    let mut flat = Vec::with_capacity(matches.len());
    for matched in matches {
        match matched {
            Value::Array(items) => flat.extend(items.iter().cloned()),
            other => flat.push(other.clone()),
        }
    }
    flat
}

impl LookupEngine<Value> for JsonLookup {
    fn validate(&self, settings: &LookupSettings) -> Result<(), JobError> {
        match settings.mode {
            LookupMode::Jsonpath | LookupMode::All => Ok(()),
            LookupMode::Css | LookupMode::Xpath | LookupMode::Regex => {
                Err(JobError::UnsupportedLookup(JSON_LOOKUP_UNSUPPORTED))
            }
        }
    }

    fn lookup_one(&self, scope: &Value, settings: &LookupSettings) -> Result<Option<Value>, JobError> {
        let mut matches = self.lookup_many(scope, settings)?;
        Ok(match matches.len() {
            0 => None,
            1 => matches.pop(),
            _ => Some(Value::Array(matches)),
        })
    }

    fn lookup_many(&self, scope: &Value, settings: &LookupSettings) -> Result<Vec<Value>, JobError> {
        self.validate(settings)?;
        match settings.mode {
            LookupMode::All => match settings.value() {
                None => Ok(wildcard(scope)),
                Some(raw) => Ok(Self::query(scope, raw)?
                    .into_iter()
                    .flat_map(wildcard)
                    .collect()),
            },
            _ => Ok(flatten(Self::query(scope, Self::path_value(settings)?)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;
    use serde_json::json;
    use worker_model::LookupMode;

    use crate::properties::text_content;

    const LIST: &str = r#"
        <div id="container"><ul class="items"><li>One</li><li>Two</li></ul></div>
        <div class="other"><p>Elsewhere</p></div>
    "#;

    #[test]
    fn css_single_returns_first_match() {
        let document = Html::parse_document(LIST);
        let root = document.tree.root();
        let found = HtmlLookup
            .lookup_one(&root, &LookupSettings::css("li"))
            .unwrap()
            .unwrap();
        assert_eq!(text_content(found), "One");
    }

    #[test]
    fn css_lookup_is_scoped_to_the_node() {
        let document = Html::parse_document(LIST);
        let root = document.tree.root();
        let container = HtmlLookup
            .lookup_one(&root, &LookupSettings::css("div#container"))
            .unwrap()
            .unwrap();
        let outside = HtmlLookup
            .lookup_one(&container, &LookupSettings::css("p"))
            .unwrap();
        assert!(outside.is_none());

        let items = HtmlLookup
            .lookup_many(&container, &LookupSettings::css("li"))
            .unwrap();
        let texts: Vec<String> = items.into_iter().map(text_content).collect();
        assert_eq!(texts, vec!["One", "Two"]);
    }

    #[test]
    fn all_mode_returns_child_nodes() {
        let document = Html::parse_document("<ul><li>a</li>text<li>b</li></ul>");
        let root = document.tree.root();
        let list = HtmlLookup
            .lookup_one(&root, &LookupSettings::css("ul"))
            .unwrap()
            .unwrap();
        let children = HtmlLookup.lookup_many(&list, &LookupSettings::all()).unwrap();
        let texts: Vec<String> = children.into_iter().map(text_content).collect();
        assert_eq!(texts, vec!["a", "text", "b"]);
    }

    #[test]
    fn all_mode_with_value_flattens_children_of_every_match() {
        let document =
            Html::parse_document("<ul><li>a</li><li>b</li></ul><ul><li>c</li></ul>");
        let root = document.tree.root();
        let children = HtmlLookup
            .lookup_many(&root, &LookupSettings::new(LookupMode::All, "ul"))
            .unwrap();
        let texts: Vec<String> = children.into_iter().map(text_content).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn html_rejects_xpath_and_regex() {
        let document = Html::parse_document(LIST);
        let root = document.tree.root();
        for mode in [LookupMode::Xpath, LookupMode::Regex, LookupMode::Jsonpath] {
            let err = HtmlLookup
                .lookup_one(&root, &LookupSettings::new(mode, "div#container"))
                .unwrap_err();
            assert_eq!(err.to_string(), HTML_LOOKUP_UNSUPPORTED);
        }
    }

    #[test]
    fn invalid_selector_is_reported() {
        let document = Html::parse_document(LIST);
        let root = document.tree.root();
        let err = HtmlLookup
            .lookup_many(&root, &LookupSettings::css("div[["))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidSelector { .. }));
    }

    #[test]
    fn json_single_match_is_bare() {
        let source = json!({ "container": { "title": "foo" } });
        let found = JsonLookup
            .lookup_one(&source, &LookupSettings::jsonpath("$.container.title"))
            .unwrap();
        assert_eq!(found, Some(json!("foo")));

        let missing = JsonLookup
            .lookup_one(&source, &LookupSettings::jsonpath("$.nothing"))
            .unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn json_multiple_matches_come_back_as_array() {
        let source = json!({ "a": { "id": 1 }, "b": { "id": 2 } });
        let found = JsonLookup
            .lookup_one(&source, &LookupSettings::jsonpath("$..id"))
            .unwrap();
        assert_eq!(found, Some(json!([1, 2])));
    }

    #[test]
    fn json_many_flattens_matched_lists() {
        let source = json!({ "container": { "children": [{ "title": "foo" }, { "title": "bar" }] } });
        let found = JsonLookup
            .lookup_many(&source, &LookupSettings::jsonpath("$.container.children"))
            .unwrap();
        assert_eq!(found, vec![json!({ "title": "foo" }), json!({ "title": "bar" })]);
    }

    #[test]
    fn json_all_mode_uses_wildcard() {
        let source = json!({ "container": { "children": { "x": 1, "y": 2 } } });
        let everything = JsonLookup.lookup_many(&source, &LookupSettings::all()).unwrap();
        assert_eq!(everything, vec![json!({ "children": { "x": 1, "y": 2 } })]);

        let nested = JsonLookup
            .lookup_many(
                &source,
                &LookupSettings::new(LookupMode::All, "$.container.children"),
            )
            .unwrap();
        assert_eq!(nested, vec![json!(1), json!(2)]);
    }

    #[test]
    fn json_rejects_non_path_modes() {
        let source = json!({ "foo": "bar" });
        for mode in [LookupMode::Css, LookupMode::Xpath, LookupMode::Regex] {
            let err = JsonLookup
                .lookup_many(&source, &LookupSettings::new(mode, "div#container"))
                .unwrap_err();
            assert_eq!(err.to_string(), JSON_LOOKUP_UNSUPPORTED);
        }
    }

    #[test]
    fn invalid_json_path_is_reported() {
        let source = json!({});
        let err = JsonLookup
            .lookup_many(&source, &LookupSettings::jsonpath("container["))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidJsonPath { .. }));
    }
}
