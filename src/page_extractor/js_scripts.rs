//! JavaScript evaluation scripts
//!
//! Scripts are built per call with the selector embedded as a JSON string
//! literal, so quotes in selectors cannot break out of the expression.
//! Every script returns an object; `{ error }` reports an invalid selector.

use once_cell::sync::Lazy;
use regex::Regex;

static ATTRIBUTE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<css>.*?[^\s@])\s*@(?P<attr>[A-Za-z_][\w:.-]*)$")
        .expect("Invalid attribute suffix regex")
});

/// Split `a.link@href` into the CSS part and the attribute to read
#[must_use]
pub fn split_attribute(selector: &str) -> (&str, Option<&str>) {
    match ATTRIBUTE_SUFFIX.captures(selector) {
        Some(caps) => match (caps.name("css"), caps.name("attr")) {
            // `a[href$='@x']` keeps its bracket intact
            (Some(css), Some(attr)) if !css.as_str().ends_with(['[', '=', '\'', '"']) => {
                (css.as_str(), Some(attr.as_str()))
            }
            _ => (selector, None),
        },
        None => (selector, None),
    }
}

fn literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Read the first element matching a CSS selector
#[must_use]
pub fn css_query_script(selector: &str) -> String {
    let (css, attr) = split_attribute(selector);
    let attr = attr.map_or_else(|| "null".to_string(), literal);
    format!(
        r#"
    (() => {{
        let el;
        try {{
            el = document.querySelector({css});
        }} catch (e) {{
            return {{ error: String(e && e.message || e) }};
        }}
        if (!el) {{
            return {{ found: false, value: null }};
        }}
        const attr = {attr};
        let value;
        if (attr) {{
            value = el.getAttribute(attr);
        }} else if (el.tagName === 'META') {{
            value = el.getAttribute('content');
        }} else if (el.tagName === 'SCRIPT' || el.tagName === 'STYLE') {{
            value = el.textContent;
        }} else if ('value' in el && ['INPUT', 'TEXTAREA', 'SELECT'].includes(el.tagName)) {{
            value = el.value;
        }} else {{
            value = el.innerText || el.textContent;
        }}
        return {{ found: true, value: value == null ? null : String(value) }};
    }})()
"#,
        css = literal(css),
    )
}

/// Read the first node or scalar produced by an XPath expression
#[must_use]
pub fn xpath_query_script(expression: &str) -> String {
    format!(
        r#"
    (() => {{
        let result;
        try {{
            result = document.evaluate({expr}, document, null, XPathResult.ANY_TYPE, null);
        }} catch (e) {{
            return {{ error: String(e && e.message || e) }};
        }}
        switch (result.resultType) {{
            case XPathResult.STRING_TYPE:
                return {{ found: true, value: result.stringValue }};
            case XPathResult.NUMBER_TYPE:
                return {{ found: true, value: String(result.numberValue) }};
            case XPathResult.BOOLEAN_TYPE:
                return {{ found: true, value: String(result.booleanValue) }};
        }}
        const node = result.iterateNext();
        if (!node) {{
            return {{ found: false, value: null }};
        }}
        let value;
        if (node.nodeType === Node.ATTRIBUTE_NODE) {{
            value = node.value;
        }} else if (node.nodeType === Node.ELEMENT_NODE && node.tagName === 'META') {{
            value = node.getAttribute('content');
        }} else {{
            value = node.innerText || node.textContent;
        }}
        return {{ found: true, value: value == null ? null : String(value) }};
    }})()
"#,
        expr = literal(expression),
    )
}

/// Collect the text of every element matching a CSS selector
#[must_use]
pub fn json_documents_script(selector: &str) -> String {
    format!(
        r#"
    (() => {{
        try {{
            const nodes = Array.from(document.querySelectorAll({css}));
            return {{ documents: nodes.map(node => node.textContent || '') }};
        }} catch (e) {{
            return {{ error: String(e && e.message || e) }};
        }}
    }})()
"#,
        css = literal(selector),
    )
}

/// Visible text of the document
pub const PAGE_TEXT_SCRIPT: &str = r#"
    (() => {
        const root = document.body || document.documentElement;
        return { text: root ? (root.innerText || root.textContent || '') : '' };
    })()
"#;

/// Document readiness check run after navigation
pub const READY_STATE_SCRIPT: &str = r#"
    (() => ({
        readyState: document.readyState,
        bodyExists: document.body !== null
    }))()
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_suffix_is_split_off() {
        assert_eq!(split_attribute("a.next@href"), ("a.next", Some("href")));
        assert_eq!(split_attribute("img.hero @data-src"), ("img.hero", Some("data-src")));
        assert_eq!(split_attribute("span.price"), ("span.price", None));
        assert_eq!(split_attribute("a[href$='@home']"), ("a[href$='@home']", None));
    }

    #[test]
    fn selectors_are_embedded_as_string_literals() {
        let script = css_query_script(r#"div[data-x="1"]"#);
        assert!(script.contains(r#"document.querySelector("div[data-x=\"1\"]")"#));
    }
}
