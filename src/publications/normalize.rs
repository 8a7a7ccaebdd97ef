use once_cell::sync::Lazy;
use regex::Regex;

use super::loader::Record;

static AUTHOR_SEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+and\s+").unwrap());

/// Collapse every whitespace run to one space and trim the ends.
pub fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Apply the exact-substring clean-up table, in order. Anything not listed passes through.
///
/// Runs once over the bibliography source, before TeX markup is interpreted.
pub fn de_tex(s: &str, table: &[(String, String)]) -> String {
    table
        .iter()
        .fold(s.to_string(), |acc, (from, to)| acc.replace(from.as_str(), to))
}

/// First candidate field with a non-empty value once whitespace is normalised.
pub fn pick(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| record.get(k))
        .map(normalize_space)
        .find(|v| !v.is_empty())
}

/// Turn "Family, Given" into "Given Family". Only the first comma splits.
pub fn reorder_name(token: &str) -> String {
    let token = token.trim();
    match token.split_once(',') {
        Some((family, given)) => format!("{} {}", given.trim(), family.trim())
            .trim()
            .to_string(),
        None => token.to_string(),
    }
}

/// Split a BibTeX author list on ` and ` and normalise each name.
pub fn split_authors(field: &str) -> Vec<String> {
    AUTHOR_SEP_RE
        .split(field)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(reorder_name)
        .collect()
}
