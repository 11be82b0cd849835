//! URL normalization and request field limits.
//!
//! Bare hostnames are accepted by prepending `https://`. After parsing, only
//! `http`/`https` URLs whose hostname looks like a public domain name
//! (`label.` repeated, then an alphabetic TLD of two or more letters) pass.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::{Error, Result};

/// Maximum number of characters in a title (override or resolved).
pub const MAX_TITLE_CHARS: usize = 40;
/// Maximum number of characters in a description (override or resolved).
pub const MAX_DESCRIPTION_CHARS: usize = 150;

static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$")
        .expect("domain pattern is a valid regex")
});

static SCHEME_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").expect("scheme pattern is a valid regex")
});

/// Normalize and validate a user-supplied URL.
///
/// ```
/// let url = linkcard::validate::normalize_url("example.com").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
/// assert!(linkcard::validate::normalize_url("http://localhost").is_err());
/// ```
pub fn normalize_url(input: &str) -> Result<Url> {
    normalize_link(input).map(|(_, url)| url)
}

/// Like [`normalize_url`], but also returns the link text itself: the
/// trimmed input with `https://` prepended when it had no scheme. Unlike
/// `Url::as_str` it is not re-serialized, so `example.com` stays
/// `https://example.com` without a trailing slash.
pub fn normalize_link(input: &str) -> Result<(String, Url)> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::MissingUrl);
    }

    let lower = input.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        input.to_string()
    } else if SCHEME_PREFIX.is_match(input) {
        return Err(Error::InvalidUrl(format!("unsupported scheme in {}", input)));
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&candidate).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::InvalidUrl(format!("unsupported scheme {}", url.scheme())));
    }

    let host = url
        .host_str()
        .ok_or_else(|| Error::InvalidHost(candidate.clone()))?;
    if !DOMAIN_PATTERN.is_match(host) {
        return Err(Error::InvalidHost(host.to_string()));
    }

    Ok((candidate, url))
}

/// Validate an optional override: blank values count as absent, values over
/// `max` characters are rejected.
pub fn check_override(
    value: Option<&str>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(Error::OverrideTooLong { field, max }),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Keep at most `max` characters of `text` (character, not byte, granularity).
pub fn clamp_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
