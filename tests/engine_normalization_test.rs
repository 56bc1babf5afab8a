use rival_radar::engine::normalization::{is_valid_url, normalize_text, normalize_url, truncate_content};

// * Test Suite for Text & URL Normalization

#[test]
fn test_text_whitespace_and_punctuation() {
    let raw = "  Pro plan:\n\t$49 / month  *billed yearly*  ";
    assert_eq!(normalize_text(raw), "Pro plan $49 month billed yearly");
}

#[test]
fn test_text_is_idempotent() {
    let once = normalize_text("Save 20%!!  <b>Now</b> & forever");
    assert_eq!(normalize_text(&once), once);
}

#[test]
fn test_text_keeps_unicode_letters() {
    assert_eq!(normalize_text("Café — Zürich"), "Café Zürich");
}

#[test]
fn test_truncate_short_text_unchanged() {
    assert_eq!(truncate_content("short", 5000), "short");
}

#[test]
fn test_missing_scheme_defaults_to_https() {
    assert_eq!(normalize_url("acme.io/pricing").unwrap(), "https://acme.io/pricing");
}

#[test]
fn test_strip_fragment() {
    assert_eq!(
        normalize_url("https://example.com/page#section1").unwrap(),
        "https://example.com/page"
    );
}

#[test]
fn test_lowercase_host() {
    assert_eq!(normalize_url("https://EXAMPLE.com/page").unwrap(), "https://example.com/page");
}

#[test]
fn test_tracking_param_removal() {
    // * Mixed tracking and real params
    let normalized =
        normalize_url("https://example.com/product?id=123&utm_source=google&ref=landing&gclid=xyz&sort=asc")
            .unwrap();

    assert!(normalized.contains("id=123"));
    assert!(normalized.contains("sort=asc"));
    assert!(!normalized.contains("utm_source"));
    assert!(!normalized.contains("gclid"));
}

#[test]
fn test_query_sorting() {
    let normalized = normalize_url("https://example.com/search?b=2&a=1&c=3").unwrap();
    assert_eq!(normalized, "https://example.com/search?a=1&b=2&c=3");
}

#[test]
fn test_invalid_url() {
    assert_eq!(normalize_url("http://exa mple.com"), None);
    assert!(!is_valid_url("mailto:sales@acme.io"));
}
