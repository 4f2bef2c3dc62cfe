use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::document::Document;

fn citation_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\[(\d+)\]").ok())
        .as_ref()
}

/// Citation numbers in order of first appearance, without duplicates.
pub fn extract_citations(answer: &str) -> Vec<usize> {
    let Some(pattern) = citation_pattern() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    pattern
        .captures_iter(answer)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<usize>().ok())
        .filter(|n| seen.insert(*n))
        .collect()
}

/// Maps `[n]` markers to the sources they cite. Markers pointing outside
/// `sources` (including `[0]`) are ignored.
pub fn resolve_citations<'a>(answer: &str, sources: &'a [Document]) -> Vec<(usize, &'a Document)> {
    extract_citations(answer)
        .into_iter()
        .filter_map(|n| {
            let doc = sources.get(n.checked_sub(1)?)?;
            Some((n, doc))
        })
        .collect()
}
