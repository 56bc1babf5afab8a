// * Text & URL Normalization
// * Cleans scraped text before pattern extraction and canonicalises source URLs.

use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

// * Punctuation that survives normalization; everything else non-alphanumeric becomes a space
const ALLOWED_PUNCTUATION: [char; 9] = ['.', ',', '!', '?', '$', '%', '-', '(', ')'];

// * Normalizes free text for extraction.
// *
// * 1. Collapse whitespace runs.
// * 2. Replace characters outside the allow-list with a space.
// * 3. Collapse again and trim.
// *
// * Never fails; empty input yields an empty string.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let restricted: String = text
        .chars()
        .map(|c| if is_allowed(c) { c } else { ' ' })
        .collect();

    WHITESPACE_RUN.replace_all(&restricted, " ").trim().to_string()
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ' ' || ALLOWED_PUNCTUATION.contains(&c)
}

// * Truncates to at most `max_chars` user-perceived characters without splitting a grapheme
pub fn truncate_content(text: &str, max_chars: usize) -> String {
    text.graphemes(true).take(max_chars).collect()
}

// * Checks that a URL is a usable http(s) address with a host.
// * A missing scheme is treated as https.
pub fn is_valid_url(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    match Url::parse(&candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| h.contains('.') || h == "localhost")
        }
        Err(_) => false,
    }
}

// * Canonicalises a source URL so refreshes of the same page compare equal.
// *
// * - Adds https:// when the scheme is missing.
// * - Strips the fragment.
// * - Lowercases the host.
// * - Drops tracking parameters (utm_*, gclid, ...).
// * - Sorts the remaining query parameters.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&candidate).ok()?;
    url.set_fragment(None);

    if let Some(host) = url.host_str() {
        let lower_host = host.to_lowercase();
        url.set_host(Some(&lower_host)).ok()?;
    }

    // ! Add new tracking params here as they are discovered.
    let drop_params: HashSet<&str> = [
        "utm_source", "utm_medium", "utm_campaign", "utm_term", "utm_content",
        "gclid", "fbclid", "ref", "yclid", "_ga",
    ]
    .into();

    let clean_pairs: BTreeMap<String, String> = url
        .query_pairs()
        .filter(|(k, _)| !drop_params.contains(k.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if clean_pairs.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url.query_pairs_mut();
        serializer.clear();
        for (k, v) in &clean_pairs {
            serializer.append_pair(k, v);
        }
    }

    Some(url.to_string())
}
