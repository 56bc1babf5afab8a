use crate::config::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::config::AppConfig;
use crate::engine::normalization::normalize_url;
use crate::network::errors::FetchError;
use crate::refinery::content_cleaner::ContentCleaner;
use crate::refinery::metadata::{extract_page_metadata, PageMetadata};
use regex::Regex;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};

static BAN_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<title>[^<]*(Just a moment|Attention Required|Security Check|Access Denied|Captcha)")
        .expect("! CRITICAL: Failed to compile Soft Ban Regex")
});

const BAN_SIGNATURES: [&str; 4] = ["captcha-delivery", "cf-turnstile", "datadome", "challenge-platform"];

/// Result of fetching one page. `text` is `None` when the fetch failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedPage {
    pub text: Option<String>,
    pub metadata: Option<PageMetadata>,
}

impl FetchedPage {
    pub fn new(text: impl Into<String>, metadata: Option<PageMetadata>) -> Self {
        Self {
            text: Some(text.into()),
            metadata,
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    pub fn is_failed(&self) -> bool {
        self.text.is_none()
    }
}

/// Type alias for boxed fetch futures
pub type FetchFuture = Pin<Box<dyn Future<Output = FetchedPage> + Send>>;

// * Single-GET page fetcher. Implementations never error: failures come back as FetchedPage::failed().
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> FetchFuture;
}

// * HTTP fetcher: one GET with timeout and a browser user agent, then HTML -> main text.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    inner: Client,
    cleaner: Arc<ContentCleaner>,
}

impl HttpFetcher {
    // * Initializes the client with the configured identity and timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: client,
            cleaner: Arc::new(ContentCleaner::new()),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(&config.user_agent, Duration::from_secs(config.request_timeout_secs))
    }

    // * Fetches raw HTML and validates the response against block-page rules.
    pub async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let target = normalize_url(url).ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;

        let resp = self.inner.get(&target).send().await?;
        let status = resp.status();

        if status.as_u16() == 403 || status.as_u16() == 429 {
            return Err(FetchError::HardBan(status.as_u16()));
        }

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp.text().await?;
        detect_soft_ban(&body)?;

        debug!(url = %target, bytes = body.len(), "Page downloaded");
        Ok(body)
    }

    // * HTML -> cleaned text + metadata. Empty text counts as a failed fetch.
    pub fn parse_page(cleaner: &ContentCleaner, html: &str) -> Result<FetchedPage, FetchError> {
        let page = cleaner.clean(html);
        if page.is_empty() {
            return Err(FetchError::NoContent);
        }

        let metadata = extract_page_metadata(html);
        let metadata = (!metadata.is_empty()).then_some(metadata);
        Ok(FetchedPage::new(page.text, metadata))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            inner: Client::new(),
            cleaner: Arc::new(ContentCleaner::new()),
        }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> FetchFuture {
        let fetcher = self.clone();
        let url = url.to_string();

        Box::pin(async move {
            let result = match fetcher.fetch_html(&url).await {
                Ok(html) => HttpFetcher::parse_page(&fetcher.cleaner, &html),
                Err(e) => Err(e),
            };

            result.unwrap_or_else(|e| {
                warn!(url = %url, kind = e.kind(), error = %e, "Fetch failed");
                FetchedPage::failed()
            })
        })
    }
}

fn detect_soft_ban(body: &str) -> Result<(), FetchError> {
    if let Some(cap) = BAN_TITLE.captures(body) {
        let trigger = cap.get(1).map_or("", |m| m.as_str());
        return Err(FetchError::SoftBan(format!("Title Trigger: {}", trigger)));
    }

    for sig in BAN_SIGNATURES {
        if body.contains(sig) {
            return Err(FetchError::SoftBan(format!("Body Trigger: {}", sig)));
        }
    }

    Ok(())
}

// * Defaults used when no config file is supplied.
pub fn default_fetcher() -> Result<HttpFetcher, FetchError> {
    HttpFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICING_PAGE: &str = r#"<html><head><title>Acme Pricing</title>
        <meta name="description" content="Simple plans for every team"></head>
        <body><main>
        <h1>Pricing</h1>
        <p>Acme Cloud gives growing teams managed hosting, automatic backups and round the clock monitoring for every project.</p>
        <p>The Starter plan costs $19 per month and includes five seats with unlimited projects.</p>
        </main></body></html>"#;

    #[test]
    fn test_parse_page_extracts_text_and_metadata() {
        let page = HttpFetcher::parse_page(&ContentCleaner::new(), PRICING_PAGE).unwrap();

        let text = page.text.unwrap();
        assert!(text.contains("$19 per month"));
        let metadata = page.metadata.unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Acme Pricing"));
        assert_eq!(metadata.description.as_deref(), Some("Simple plans for every team"));
    }

    #[test]
    fn test_parse_page_empty_is_error() {
        let result = HttpFetcher::parse_page(&ContentCleaner::new(), "<html><body></body></html>");
        assert!(matches!(result, Err(FetchError::NoContent)));
    }

    #[test]
    fn test_soft_ban_detection() {
        assert!(detect_soft_ban("<html><title>Just a moment...</title></html>").is_err());
        assert!(detect_soft_ban("<div class=\"cf-turnstile\"></div>").is_err());
        assert!(detect_soft_ban(PRICING_PAGE).is_ok());
    }

    #[test]
    fn test_failed_page() {
        let page = FetchedPage::failed();
        assert!(page.is_failed());
        assert!(page.metadata.is_none());
        assert!(!FetchedPage::new("text", None).is_failed());
    }

    #[tokio::test]
    async fn test_invalid_url_yields_failed_page() {
        let fetcher = default_fetcher().unwrap();
        let page = fetcher.fetch("http://exa mple.com").await;
        assert!(page.is_failed());
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(FetchError::HardBan(403).kind(), "hard_ban");
        assert_eq!(FetchError::NoContent.kind(), "no_content");
    }
}
