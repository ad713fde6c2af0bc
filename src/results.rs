//! Normalizes the `results` payload of a completed search.
//!
//! The sourcing process has written two payload formats over time:
//!
//! * candidate objects: `{"candidates": [{"name": ..., "cv_url": ...}, ...]}`
//! * bare profile URLs: `{"profile_urls": ["https://...", ...]}`
//!
//! Candidate objects win; bare URLs are only consulted when no usable
//! candidate object was found. Malformed entries are skipped one by one.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ScoutError;
use crate::models::Candidate;

/// First non-empty wins.
const PROFILE_URL_KEYS: [&str; 3] = ["cv_url", "profile_url", "url"];
/// First array wins.
const PROFILE_LINK_KEYS: [&str; 2] = ["profile_links", "links"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultShape {
    CandidateObjects(Vec<Candidate>),
    BareUrls(Vec<Candidate>),
    Unrecognized,
}

impl ResultShape {
    pub fn kind(&self) -> &'static str {
        match self {
            ResultShape::CandidateObjects(_) => "candidates",
            ResultShape::BareUrls(_) => "profile_urls",
            ResultShape::Unrecognized => "unrecognized",
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        match self {
            ResultShape::CandidateObjects(c) | ResultShape::BareUrls(c) => c,
            ResultShape::Unrecognized => &[],
        }
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        match self {
            ResultShape::CandidateObjects(c) | ResultShape::BareUrls(c) => c,
            ResultShape::Unrecognized => Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.candidates().len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

pub fn default_candidate_name(position: usize) -> String {
    format!("Kandidat #{}", position)
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn owned_str(object: &Map<String, Value>, key: &str) -> Option<String> {
    non_empty_str(object, key).map(String::from)
}

fn profile_links(object: &Map<String, Value>) -> Vec<String> {
    let Some(links) = PROFILE_LINK_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))
    else {
        return Vec::new();
    };
    links
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn report_mismatch(shape: &'static str, index: usize, reason: String) {
    let err = ScoutError::ShapeMismatch {
        shape,
        index,
        reason,
    };
    warn!("{}, skipping", err);
}

fn candidate_objects(entries: &[Value]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let Some(object) = entry.as_object() else {
            report_mismatch("candidates", index, format!("expected object, got {}", kind_of(entry)));
            continue;
        };
        let position = candidates.len() + 1;
        candidates.push(Candidate {
            name: owned_str(object, "name").unwrap_or_else(|| default_candidate_name(position)),
            position: owned_str(object, "position"),
            location: owned_str(object, "location"),
            summary: owned_str(object, "summary"),
            profile_url: PROFILE_URL_KEYS
                .iter()
                .find_map(|key| owned_str(object, key)),
            profile_links: profile_links(object),
        });
    }
    candidates
}

fn bare_urls(entries: &[Value]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let Some(url) = entry.as_str() else {
            report_mismatch("profile_urls", index, format!("expected URL string, got {}", kind_of(entry)));
            continue;
        };
        // An empty URL still counts as a candidate, just without a link.
        candidates.push(Candidate {
            name: default_candidate_name(candidates.len() + 1),
            profile_url: (!url.is_empty()).then(|| url.to_string()),
            ..Default::default()
        });
    }
    candidates
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Only call this for completed searches; see `status::classify`.
pub fn normalize(results: Option<&Value>) -> ResultShape {
    let Some(payload) = results.and_then(Value::as_object) else {
        return ResultShape::Unrecognized;
    };

    if let Some(entries) = payload.get("candidates").and_then(Value::as_array) {
        let candidates = candidate_objects(entries);
        if !candidates.is_empty() {
            return ResultShape::CandidateObjects(candidates);
        }
    }

    if let Some(entries) = payload.get("profile_urls").and_then(Value::as_array) {
        let candidates = bare_urls(entries);
        if !candidates.is_empty() {
            return ResultShape::BareUrls(candidates);
        }
    }

    ResultShape::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_urls() {
        let results = json!({"profile_urls": ["http://a", "http://b"]});
        let shape = normalize(Some(&results));
        assert_eq!(shape.kind(), "profile_urls");
        assert_eq!(shape.total(), 2);
        let c = shape.candidates();
        assert_eq!(c[0].name, "Kandidat #1");
        assert_eq!(c[0].profile_url.as_deref(), Some("http://a"));
        assert_eq!(c[1].name, "Kandidat #2");
        assert_eq!(c[1].profile_url.as_deref(), Some("http://b"));
        assert!(c[1].position.is_none());
        assert!(c[1].profile_links.is_empty());
    }

    #[test]
    fn test_candidate_objects_field_fallbacks() {
        let results = json!({
            "candidates": [
                {
                    "name": "Anna Schmidt",
                    "position": "Backend Engineer",
                    "location": "Berlin",
                    "summary": "8 years Rust",
                    "profile_url": "https://p/anna",
                    "url": "https://u/anna",
                    "links": ["https://github.com/anna"]
                },
                {
                    "cv_url": "https://cv/2",
                    "profile_url": "https://p/2",
                    "profile_links": ["https://a", 7, "https://b"],
                    "links": ["https://ignored"]
                },
                {"url": "https://u/3"}
            ]
        });
        let shape = normalize(Some(&results));
        assert_eq!(shape.kind(), "candidates");
        let c = shape.candidates();
        assert_eq!(c.len(), 3);

        assert_eq!(c[0].name, "Anna Schmidt");
        assert_eq!(c[0].position.as_deref(), Some("Backend Engineer"));
        assert_eq!(c[0].profile_url.as_deref(), Some("https://p/anna"));
        assert_eq!(c[0].profile_links, vec!["https://github.com/anna"]);

        assert_eq!(c[1].name, "Kandidat #2");
        assert_eq!(c[1].profile_url.as_deref(), Some("https://cv/2"));
        assert_eq!(c[1].profile_links, vec!["https://a", "https://b"]);

        assert_eq!(c[2].name, "Kandidat #3");
        assert_eq!(c[2].profile_url.as_deref(), Some("https://u/3"));
        assert!(c[2].profile_links.is_empty());
    }

    #[test]
    fn test_empty_strings_fall_through() {
        let results = json!({"candidates": [{"name": "", "cv_url": "", "profile_url": "https://p"}]});
        let c = normalize(Some(&results)).into_candidates();
        assert_eq!(c[0].name, "Kandidat #1");
        assert_eq!(c[0].profile_url.as_deref(), Some("https://p"));
    }

    #[test]
    fn test_candidate_objects_take_priority() {
        let results = json!({
            "candidates": [{"name": "A"}],
            "profile_urls": ["http://x", "http://y"]
        });
        let shape = normalize(Some(&results));
        assert_eq!(shape.kind(), "candidates");
        assert_eq!(shape.total(), 1);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let results = json!({"candidates": [42, {"name": "B"}, "nope", null, {"name": "D"}]});
        let c = normalize(Some(&results)).into_candidates();
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].name, "B");
        assert_eq!(c[1].name, "D");

        let results = json!({"profile_urls": [null, "http://a", 3, "http://b"]});
        let c = normalize(Some(&results)).into_candidates();
        let urls: Vec<_> = c.iter().filter_map(|c| c.profile_url.as_deref()).collect();
        assert_eq!(urls, vec!["http://a", "http://b"]);
        assert_eq!(c[1].name, "Kandidat #2");
    }

    #[test]
    fn test_empty_bare_url_is_still_a_candidate() {
        let results = json!({"profile_urls": ["", "http://a"]});
        let shape = normalize(Some(&results));
        assert_eq!(shape.total(), 2);
        let c = shape.candidates();
        assert_eq!(c[0].name, "Kandidat #1");
        assert_eq!(c[0].profile_url, None);
        assert_eq!(c[1].name, "Kandidat #2");
        assert_eq!(c[1].profile_url.as_deref(), Some("http://a"));

        let results = json!({"profile_urls": [""]});
        assert_eq!(normalize(Some(&results)).kind(), "profile_urls");
    }

    #[test]
    fn test_whitespace_values_are_kept() {
        let results = json!({"candidates": [{"name": " ", "cv_url": "  ", "url": "https://u"}]});
        let c = normalize(Some(&results)).into_candidates();
        assert_eq!(c[0].name, " ");
        assert_eq!(c[0].profile_url.as_deref(), Some("  "));
    }

    #[test]
    fn test_falls_back_when_no_candidate_object_is_valid() {
        let results = json!({"candidates": [1, 2], "profile_urls": ["http://a"]});
        let shape = normalize(Some(&results));
        assert_eq!(shape.kind(), "profile_urls");
        assert_eq!(shape.total(), 1);

        let results = json!({"candidates": [], "profile_urls": ["http://a"]});
        assert_eq!(normalize(Some(&results)).kind(), "profile_urls");
    }

    #[test]
    fn test_unrecognized_payloads() {
        assert_eq!(normalize(None), ResultShape::Unrecognized);
        assert_eq!(normalize(Some(&Value::Null)), ResultShape::Unrecognized);
        assert_eq!(normalize(Some(&json!([1, 2]))), ResultShape::Unrecognized);
        assert_eq!(normalize(Some(&json!({"candidates": "x"}))), ResultShape::Unrecognized);
        assert_eq!(normalize(Some(&json!({"profile_urls": []}))), ResultShape::Unrecognized);
        assert!(normalize(Some(&json!({}))).is_empty());
    }
}
