use std::collections::BTreeMap;

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::ElementRef;
use serde_json::Value;
use url::Url;

/// Any node of a parsed HTML tree: document, element or text.
pub type HtmlNode<'a> = NodeRef<'a, Node>;

/// Concatenated text of the node and everything below it.
pub fn text_content(node: HtmlNode<'_>) -> String {
    node.descendants()
        .filter_map(|n| n.value().as_text())
        .map(|text| &**text)
        .collect()
}

/// Readable properties of an HTML node: its non-empty attributes,
/// `textContent`, and `link` for anchors and images.
pub fn read_properties(node: HtmlNode<'_>, base_url: Option<&Url>) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    let element = ElementRef::wrap(node);

    if let Some(element) = element {
        for (name, value) in element.value().attrs() {
            if !value.is_empty() {
                properties.insert(name.to_string(), value.to_string());
            }
        }
    }

    let text = text_content(node);
    if !text.is_empty() {
        properties.insert("textContent".to_string(), text);
    }

    let link_attr = element.and_then(|el| match el.value().name() {
        "a" => el.value().attr("href"),
        "img" => el.value().attr("src"),
        _ => None,
    });
    if let Some(raw) = link_attr {
        properties.insert("link".to_string(), resolve_link(raw, base_url));
    }

    properties
}

/// The canonical attribute of an element, when it carries a non-empty one.
pub fn attribute(node: HtmlNode<'_>, name: &str) -> Option<String> {
    ElementRef::wrap(node)
        .and_then(|el| el.value().attr(name))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn resolve_link(raw: &str, base_url: Option<&Url>) -> String {
    let trimmed = raw.trim();
    Url::parse(trimmed)
        .ok()
        .or_else(|| base_url.and_then(|base| base.join(trimmed).ok()))
        .map(String::from)
        .unwrap_or_else(|| raw.to_string())
}

/// Text form of a JSON value: strings verbatim, `null` empty, anything else
/// as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
