//! URL helpers shared by the extractor and the control channel.

use anyhow::Result;
use serde_json::Value;
use url::Url;

/// Check if a URL is an absolute http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // Skip data URLs, javascript URLs, and other non-http schemes
    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Interpret an extracted value as a navigation target
///
/// Absolute http(s) URLs are returned as-is. Values that look like a path
/// (`/foo`, `./foo`, `../foo`, `?q=1`) are resolved against `base`.
/// Anything else (markup, JSON, plain text) is not a link and yields `None`.
#[must_use]
pub fn resolve_link(value: &str, base: Option<&str>) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.contains(char::is_whitespace) {
        return None;
    }

    if is_valid_url(value) {
        return Some(value.to_string());
    }

    let looks_relative = value.starts_with('/')
        || value.starts_with("./")
        || value.starts_with("../")
        || value.starts_with('?');
    if !looks_relative {
        return None;
    }

    let base = Url::parse(base?).ok()?;
    let joined = base.join(value).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}

/// Merge `searchParams` from an indexer config into a URL's query string
///
/// Existing parameters with the same name are replaced. Strings are used
/// verbatim, numbers and booleans by their JSON text; nulls, arrays and
/// objects are skipped.
pub fn apply_search_params(url: &str, params: &serde_json::Map<String, Value>) -> Result<String> {
    if params.is_empty() {
        return Ok(url.to_string());
    }

    let mut parsed = Url::parse(url).map_err(|e| anyhow::anyhow!("Failed to parse URL: {e}"))?;

    let retained: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(name, _)| !params.contains_key(name.as_ref()))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    {
        let mut query = parsed.query_pairs_mut();
        query.clear();
        for (name, value) in &retained {
            query.append_pair(name, value);
        }
        for (name, value) in params {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            query.append_pair(name, &rendered);
        }
    }

    Ok(parsed.to_string())
}

/// Build the coordinator URL for one connection attempt
///
/// `<endpoint>/api/indexers/<token>/<session_id>`. A trailing slash on the
/// endpoint is tolerated.
#[must_use]
pub fn connection_url(endpoint: &str, token: &str, session_id: &str) -> String {
    format!(
        "{}/api/indexers/{}/{}",
        endpoint.trim_end_matches('/'),
        urlencoding::encode(token),
        session_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_links_against_page() {
        assert_eq!(
            resolve_link("/p/2", Some("https://shop.test/p/1")),
            Some("https://shop.test/p/2".to_string())
        );
        assert_eq!(resolve_link("/p/2", None), None);
        assert_eq!(resolve_link("<b>4.5</b>", Some("https://shop.test/")), None);
        assert_eq!(resolve_link("4.5", Some("https://shop.test/")), None);
    }

    #[test]
    fn search_params_replace_existing_values() {
        let params = serde_json::json!({ "currency": "USD", "page": 2 });
        let merged = apply_search_params(
            "https://shop.test/item?currency=EUR&ref=home",
            params.as_object().unwrap(),
        )
        .unwrap();
        assert_eq!(merged, "https://shop.test/item?ref=home&currency=USD&page=2");
    }

    #[test]
    fn connection_url_has_expected_shape() {
        assert_eq!(
            connection_url("ws://localhost:3000/", "tok", "abc"),
            "ws://localhost:3000/api/indexers/tok/abc"
        );
    }
}
