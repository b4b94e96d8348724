// Identifier normalizer - raw URL or bare ID to canonical video ID

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::models::VideoRef;

lazy_static! {
    // URL-embedded forms come first so an ID inside a URL is never misread
    static ref URL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"youtube\.com/watch\?(?:[^#]*&)?v=([^&\n?#]+)").unwrap(),
        Regex::new(r"youtu\.be/([^&\n?#/]+)").unwrap(),
        Regex::new(r"youtube\.com/embed/([^&\n?#/]+)").unwrap(),
        Regex::new(r"youtube\.com/v/([^&\n?#/]+)").unwrap(),
        Regex::new(r"youtube\.com/shorts/([^&\n?#/]+)").unwrap(),
        Regex::new(r"youtube\.com/live/([^&\n?#/]+)").unwrap(),
    ];
    static ref BARE_ID: Regex = Regex::new(r"^([A-Za-z0-9_-]{11})$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid video identifier: {input:?}")]
pub struct InvalidIdentifier {
    pub input: String,
}

/// Whether `id` has the canonical 11-character shape
pub fn is_canonical(id: &str) -> bool {
    BARE_ID.is_match(id)
}

/// Extract the canonical video ID from a raw URL or bare ID.
///
/// Unrecognised input passes through verbatim unless `strict` is set, in
/// which case anything that is not an 11-character `[A-Za-z0-9_-]` ID fails.
pub fn normalize(raw_input: &str, strict: bool) -> Result<VideoRef, InvalidIdentifier> {
    let trimmed = raw_input.trim();
    let invalid = || InvalidIdentifier {
        input: raw_input.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid());
    }

    let candidate = URL_PATTERNS
        .iter()
        .chain(std::iter::once(&*BARE_ID))
        .find_map(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    if strict && !is_canonical(candidate) {
        return Err(invalid());
    }

    Ok(VideoRef::new(raw_input, candidate))
}
