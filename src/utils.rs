use crate::consts::{framing, reqid};
use rand::Rng;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

/// One step into a decoded upstream structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep<'a> {
    Index(usize),
    Key(&'a str),
}

/// Walk `root` along `path`. Any unresolvable step (missing index or key,
/// scalar in the way, `null`) yields `None` instead of failing.
pub fn extract<'v>(root: &'v Value, path: &[PathStep<'_>]) -> Option<&'v Value> {
    let found = path.iter().try_fold(root, |current, step| match *step {
        PathStep::Index(i) => current.get(i),
        PathStep::Key(k) => current.get(k),
    })?;
    if found.is_null() { None } else { Some(found) }
}

/// Value of the first `"<name>":"<value>"` pair in the page, left escaped.
pub fn extract_token(page: &str, name: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r#""{}":"(.*?)""#, regex::escape(name))).ok()?;
    pattern
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Batch request id. Only multiples of the step are produced, not the full range.
pub fn generate_request_id() -> u32 {
    let k = rand::thread_rng().gen_range(1..=reqid::MAX_MULTIPLIER);
    reqid::BASE + k * reqid::STEP
}

pub fn strip_emphasis(text: &str) -> String {
    text.replace(framing::BOLD_OPEN, "").replace(framing::BOLD_CLOSE, "")
}

/// Drop repeated entries, keeping first occurrences in order
pub fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(items.len());
    items.into_iter().filter(|s| seen.insert(s.clone())).collect()
}
