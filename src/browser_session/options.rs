//! Per-job context setup derived from indexer configs

use serde_json::{Map, Value};

use crate::indexer::Job;

/// Cookies and headers to install before the first navigation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextOptions {
    /// Job URL; cookies are scoped to it
    pub url: String,
    pub cookies: Vec<(String, String)>,
    pub headers: Map<String, Value>,
}

impl ContextOptions {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Merge the `cookie` and `requestHeaders` of every head indexer
    ///
    /// Later targets override earlier ones for the same cookie or header name.
    #[must_use]
    pub fn for_job(job: &Job) -> Self {
        let mut options = Self::new(job.url.clone());
        for target in job.data_to_index.iter() {
            let indexer = &target.indexer;
            if let Some(cookie) = indexer.cookie.as_deref() {
                for (name, value) in parse_cookie_header(cookie) {
                    options.set_cookie(name, value);
                }
            }
            if let Some(headers) = &indexer.request_headers {
                for (name, value) in headers {
                    options.headers.insert(name.clone(), value.clone());
                }
            }
        }
        options
    }

    pub fn set_cookie(&mut self, name: String, value: String) {
        match self.cookies.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.cookies.push((name, value)),
        }
    }

    /// Headers with string values only, as CDP expects
    #[must_use]
    pub fn header_strings(&self) -> Map<String, Value> {
        self.headers
            .iter()
            .filter_map(|(name, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((name.clone(), Value::String(rendered)))
            })
            .collect()
    }
}

/// Split `a=1; b=2` into name/value pairs, skipping malformed entries
#[must_use]
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::{IndexTarget, IndexType, IndexerConfig, Lane, OneOrMany};
    use serde_json::json;

    #[test]
    fn cookie_header_is_split_into_pairs() {
        assert_eq!(
            parse_cookie_header("session=abc; theme=dark;broken; =x"),
            vec![
                ("session".to_string(), "abc".to_string()),
                ("theme".to_string(), "dark".to_string()),
            ]
        );
    }

    #[test]
    fn options_merge_all_targets() {
        let mut first = IndexerConfig::new(IndexType::Css, ".price");
        first.cookie = Some("region=us".into());
        let mut second = IndexerConfig::new(IndexType::Css, ".stock");
        second.cookie = Some("region=eu; currency=EUR".into());
        second.request_headers = Some(json!({ "Accept-Language": "de", "X-Retry": 2 }).as_object().cloned().unwrap_or_default());

        let job = Job::new(
            "https://shop.test/p/1",
            OneOrMany::Many(vec![IndexTarget::new(first), IndexTarget::new(second)]),
            Lane::Bulk,
        );
        let options = ContextOptions::for_job(&job);

        assert_eq!(
            options.cookies,
            vec![
                ("region".to_string(), "eu".to_string()),
                ("currency".to_string(), "EUR".to_string()),
            ]
        );
        assert_eq!(options.header_strings().get("X-Retry"), Some(&json!("2")));
    }
}
