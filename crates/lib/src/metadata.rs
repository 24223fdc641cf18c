//! # Document Metadata
//!
//! The seven-field bibliographic record, and the normalization pass that turns
//! whatever the completion provider returned into it. After `normalize` every
//! field is non-empty; anything unresolved holds [`UNKNOWN`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel for a field that could not be resolved.
pub const UNKNOWN: &str = "Unknown";

/// The raw JSON object returned by the completion provider.
pub type RawMetadata = Map<String, Value>;

/// Language markers checked against the sampled text, in priority order.
const LANGUAGE_MARKERS: [(&str, &[&str]); 4] = [
    ("English", &["the"]),
    ("French", &["le"]),
    ("Spanish", &["el"]),
    ("Vietnamese", &["và", "của"]),
];

/// Bibliographic metadata for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub authors: String,
    pub language: String,
    pub publisher: String,
    pub edition: String,
    pub publication_date: String,
    #[serde(rename = "ISBN")]
    pub isbn: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN.to_string(),
            authors: UNKNOWN.to_string(),
            language: UNKNOWN.to_string(),
            publisher: UNKNOWN.to_string(),
            edition: UNKNOWN.to_string(),
            publication_date: UNKNOWN.to_string(),
            isbn: UNKNOWN.to_string(),
        }
    }
}

impl DocumentMetadata {
    /// A record with every field set to the sentinel.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Converts the record back into its raw JSON form.
    pub fn to_raw(&self) -> RawMetadata {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => RawMetadata::new(),
        }
    }
}

/// Returns `true` if `value` is empty or the sentinel, ignoring case and
/// surrounding whitespace.
pub fn is_unknown(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN)
}

/// Looks a field up by exact key, falling back to a case-insensitive match
/// (models regularly answer with `isbn` or `Title`).
fn lookup<'a>(raw: &'a RawMetadata, key: &str) -> Option<&'a Value> {
    raw.get(key).or_else(|| {
        raw.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !is_unknown(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field_to_string(value: Option<&Value>) -> String {
    let resolved = match value {
        Some(Value::Array(items)) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Some(other) => scalar_to_string(other),
        None => None,
    };
    resolved.unwrap_or_else(|| UNKNOWN.to_string())
}

/// Guesses the language of `text` from a handful of function words.
///
/// Markers are matched as whole, case-insensitive words. The language with the
/// most hits wins; ties go to the earlier entry in the priority order.
pub fn infer_language(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    let mut counts = [0usize; LANGUAGE_MARKERS.len()];

    for word in lowered.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        for (index, (_, markers)) in LANGUAGE_MARKERS.iter().enumerate() {
            if markers.contains(&word) {
                counts[index] += 1;
            }
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (index, &count) in counts.iter().enumerate() {
        let beats_best = match best {
            Some((_, best_count)) => count > best_count,
            None => count > 0,
        };
        if beats_best {
            best = Some((index, count));
        }
    }

    best.map_or(UNKNOWN, |(index, _)| LANGUAGE_MARKERS[index].0)
}

/// Normalizes a raw provider result into a complete `DocumentMetadata`.
///
/// * Missing, null, empty or "Unknown" fields become [`UNKNOWN`].
/// * Lists are flattened to a comma-separated string; an empty list is unknown.
/// * An unknown language is guessed from `text`.
/// * An unknown title falls back to `fallback_title` (the source file stem).
///
/// Applying it to its own output yields the same record.
pub fn normalize(raw: &RawMetadata, text: &str, fallback_title: &str) -> DocumentMetadata {
    let field = |key: &str| field_to_string(lookup(raw, key));

    let mut metadata = DocumentMetadata {
        title: field("title"),
        authors: field("authors"),
        language: field("language"),
        publisher: field("publisher"),
        edition: field("edition"),
        publication_date: field("publication_date"),
        isbn: field("ISBN"),
    };

    if metadata.language == UNKNOWN {
        metadata.language = infer_language(text).to_string();
    }

    if metadata.title == UNKNOWN && !is_unknown(fallback_title) {
        metadata.title = fallback_title.trim().to_string();
    }

    metadata
}
