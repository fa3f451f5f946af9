//! Dotted-path lookup into JSON documents
//!
//! `aggregateRating.ratingValue`, `offers.0.price` and `offers[0].price` are
//! all accepted. When a non-numeric segment meets an array, each element is
//! tried in order, which covers JSON-LD `@graph` lists and pages that emit
//! several objects in one script tag.

use serde_json::Value;

/// Split a path into segments, turning `a[0]` into `a`, `0`
fn segments(path: &str) -> Vec<&str> {
    path.split('.')
        .flat_map(|part| part.split(['[', ']']))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Look up `path` in `doc`
#[must_use]
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    walk(doc, &segments(path))
}

fn walk<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let Some((head, rest)) = path.split_first() else {
        return Some(value);
    };

    match value {
        Value::Object(map) => walk(map.get(*head)?, rest),
        Value::Array(items) => match head.parse::<usize>() {
            Ok(index) => walk(items.get(index)?, rest),
            Err(_) => items.iter().find_map(|item| walk(item, path)),
        },
        _ => None,
    }
}

/// Render a JSON value as extracted text
///
/// Strings come back unquoted; `null` counts as no match. Objects and
/// arrays are serialized so a following JSON indexer can parse them.
#[must_use]
pub fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// First non-empty match of any selector across `docs`
///
/// Selectors are tried in order; for each selector every document is tried
/// before moving to the next selector.
#[must_use]
pub fn first_match(docs: &[Value], selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        docs.iter()
            .filter_map(|doc| lookup(doc, selector).and_then(render))
            .find(|text| !text.trim().is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_segments_index_arrays() {
        let doc = json!({ "offers": [{ "price": "19.99" }, { "price": "24.00" }] });
        assert_eq!(lookup(&doc, "offers.1.price"), Some(&json!("24.00")));
        assert_eq!(lookup(&doc, "offers[0].price"), Some(&json!("19.99")));
    }

    #[test]
    fn graph_arrays_are_searched() {
        let doc = json!({ "@graph": [{ "@type": "Organization" }, { "aggregateRating": { "ratingValue": 4.5 } }] });
        assert_eq!(
            lookup(&doc, "@graph.aggregateRating.ratingValue").and_then(render),
            Some("4.5".to_string())
        );
    }

    #[test]
    fn first_selector_with_a_value_wins() {
        let docs = vec![json!({ "name": "Widget", "brand": null })];
        assert_eq!(first_match(&docs, &["brand", "missing", "name"]), Some("Widget".to_string()));
        assert_eq!(first_match(&docs, &["brand"]), None);
    }
}
