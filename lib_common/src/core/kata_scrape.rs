//! # Kata Scrape Extractor
//!
//! Pulls kata identifiers out of the rendered Codewars search page. A kata id
//! is a 24 character lowercase hex token and appears in links as
//! `/kata/<id>`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::kata_buffer::RefreshError;

/// Fewer distinct ids than this means the page layout probably changed.
pub const MIN_SCRAPE_YIELD: usize = 5;

static KATA_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/kata/([a-f0-9]{24})").expect("kata link pattern is valid"));

/// Every distinct kata id linked from `html`, in order of first appearance.
pub fn extract_kata_ids(html: &str) -> Vec<String> {
    unique_ids(
        KATA_LINK
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()),
    )
}

/// Like [`extract_kata_ids`] but fails closed when the page yields fewer than
/// [`MIN_SCRAPE_YIELD`] ids.
pub fn scrape_kata_ids(html: &str) -> Result<Vec<String>, RefreshError> {
    let ids = extract_kata_ids(html);
    if ids.len() < MIN_SCRAPE_YIELD {
        return Err(RefreshError::ParseYieldTooLow {
            found: ids.len(),
            min: MIN_SCRAPE_YIELD,
        });
    }
    Ok(ids)
}

/// Drops repeated ids, keeping the first occurrence of each.
pub(crate) fn unique_ids(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
