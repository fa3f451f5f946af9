//! Individual text transforms used by the selector pipeline

use crate::indexer::Replacement;

/// Apply literal replacements in listed order
///
/// Every occurrence of `search` is replaced. An empty `search` is a no-op
/// (it would otherwise interleave the replacement between every character).
#[must_use]
pub fn apply_replacements(text: &str, replacements: &[Replacement]) -> String {
    replacements
        .iter()
        .filter(|r| !r.search.is_empty())
        .fold(text.to_string(), |acc, r| {
            acc.replace(&r.search, r.replacement.as_deref().unwrap_or(""))
        })
}

/// Parsed form of a `slice` option: `"start"`, `"start,end"` or `"start:end"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRange {
    pub start: i64,
    pub end: Option<i64>,
}

impl SliceRange {
    /// Parse a slice spec; `None` if either bound is not an integer
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        let mut parts = spec.splitn(2, [',', ':']);
        let start_part = parts.next()?.trim();
        let start = if start_part.is_empty() {
            0
        } else {
            start_part.parse().ok()?
        };
        let end = match parts.next().map(str::trim) {
            None | Some("") => None,
            Some(end) => Some(end.parse().ok()?),
        };

        Some(Self { start, end })
    }

    /// Apply with JavaScript `String.prototype.slice` semantics over chars
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len() as i64;
        let clamp = |idx: i64| -> usize {
            let resolved = if idx < 0 { (len + idx).max(0) } else { idx.min(len) };
            resolved as usize
        };

        let from = clamp(self.start);
        let to = self.end.map_or(chars.len(), clamp);
        if from >= to {
            return String::new();
        }
        chars[from..to].iter().collect()
    }
}

/// Percent-decode; invalid sequences leave the input unchanged
#[must_use]
pub fn decode_url(text: &str) -> String {
    match urlencoding::decode(text) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Round a numeric string to `places` decimals
///
/// Values that do not parse as a finite number are returned unchanged.
/// Rounding is half away from zero.
#[must_use]
pub fn round_decimal(text: &str, places: u32) -> String {
    let Ok(value) = text.trim().parse::<f64>() else {
        return text.to_string();
    };
    if !value.is_finite() {
        return text.to_string();
    }

    let places = places.min(15);
    let factor = 10f64.powi(places as i32);
    let rounded = (value * factor).round() / factor;
    format!("{rounded:.prec$}", prec = places as usize)
}
