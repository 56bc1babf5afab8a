// * Boilerplate Removal
// * Pulls the readable body text out of a competitor page before pattern extraction.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// * Main content areas, in priority order
static SELECTOR_ARTICLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article").unwrap());
static SELECTOR_MAIN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main, [role='main']").unwrap());
static SELECTOR_CONTENT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"[class*="content"], [class*="pricing"], [class*="product"],
           [id*="content"], [id*="pricing"], [id*="main"]"#,
    )
    .unwrap()
});
static SELECTOR_BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

// * Text-bearing blocks. Pricing cards often keep amounts in spans/divs, so td/dd are included.
static SELECTOR_BLOCKS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, p, li, td, dd, blockquote").unwrap()
});

const BOILERPLATE_PATTERNS: [&str; 14] = [
    "cookie",
    "privacy policy",
    "terms of service",
    "terms and conditions",
    "subscribe to",
    "follow us on",
    "share this",
    "you may also like",
    "advertisement",
    "sponsored",
    "read more",
    "©",
    "all rights reserved",
    "powered by",
];

/// Configuration for content cleaning
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Minimum words for a candidate region to count as main content
    pub min_word_count: usize,
    /// Blocks shorter than this are dropped (headings are always kept)
    pub min_block_length: usize,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            min_word_count: 25,
            min_block_length: 3,
        }
    }
}

/// Readable text extracted from a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub text: String,
    pub word_count: usize,
    pub found_main_content: bool,
}

impl PageText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ContentCleaner {
    config: CleanerConfig,
}

impl ContentCleaner {
    pub fn new() -> Self {
        Self::with_config(CleanerConfig::default())
    }

    pub fn with_config(config: CleanerConfig) -> Self {
        Self { config }
    }

    /// Extracts the main readable text, falling back to the whole body
    pub fn clean(&self, html: &str) -> PageText {
        let document = Html::parse_document(html);

        let main = self.find_main_content(&document);
        let found_main_content = main.is_some();

        let root = main.or_else(|| document.select(&SELECTOR_BODY).next());
        let Some(root) = root else {
            return PageText::default();
        };

        let blocks = self.collect_blocks(root);
        let text = blocks.join("\n");
        let word_count = text.split_whitespace().count();

        PageText {
            text,
            word_count,
            found_main_content,
        }
    }

    fn find_main_content<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        [&*SELECTOR_ARTICLE, &*SELECTOR_MAIN, &*SELECTOR_CONTENT]
            .into_iter()
            .flat_map(|selector| document.select(selector))
            .find(|el| self.word_count(el) >= self.config.min_word_count)
    }

    fn word_count(&self, el: &ElementRef) -> usize {
        el.text().flat_map(|t| t.split_whitespace()).count()
    }

    fn collect_blocks(&self, root: ElementRef) -> Vec<String> {
        let mut blocks = Vec::new();

        for block in root.select(&SELECTOR_BLOCKS) {
            let text = block
                .text()
                .flat_map(|t| t.split_whitespace())
                .collect::<Vec<_>>()
                .join(" ");

            let is_heading = block.value().name().starts_with('h');
            if text.is_empty() || (!is_heading && text.len() < self.config.min_block_length) {
                continue;
            }
            if is_boilerplate(&text) {
                continue;
            }
            // * Nested blocks (li > p) would otherwise repeat text
            if blocks.last().is_some_and(|prev: &String| prev.contains(&text)) {
                continue;
            }
            blocks.push(text);
        }

        blocks
    }
}

impl Default for ContentCleaner {
    fn default() -> Self {
        Self::new()
    }
}

fn is_boilerplate(text: &str) -> bool {
    let lower = text.to_lowercase();
    BOILERPLATE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Extracts page text with the default configuration
pub fn extract_text(html: &str) -> PageText {
    ContentCleaner::new().clean(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_content_preferred() {
        let html = r#"
            <html><body>
                <nav><a href="/">Home</a></nav>
                <main>
                    <h1>Acme Cloud Pricing</h1>
                    <p>Acme Cloud helps small teams ship software faster with managed deployments and monitoring.</p>
                    <ul><li>Starter plan $19 per month for up to five users and unlimited projects</li></ul>
                </main>
                <footer>All rights reserved.</footer>
            </body></html>
        "#;

        let page = extract_text(html);
        assert!(page.found_main_content);
        assert!(page.text.contains("Acme Cloud Pricing"));
        assert!(page.text.contains("$19 per month"));
        assert!(!page.text.contains("rights reserved"));
    }

    #[test]
    fn test_body_fallback() {
        let html = "<html><body><p>Short pitch for Widget app.</p></body></html>";
        let page = extract_text(html);
        assert!(!page.found_main_content);
        assert_eq!(page.text, "Short pitch for Widget app.");
    }

    #[test]
    fn test_boilerplate_dropped() {
        let html = r#"<html><body>
            <p>We use cookies to improve your experience.</p>
            <p>Real product copy lives here.</p>
        </body></html>"#;
        let page = extract_text(html);
        assert_eq!(page.text, "Real product copy lives here.");
    }

    #[test]
    fn test_empty_document() {
        let page = extract_text("");
        assert!(page.is_empty());
        assert_eq!(page.word_count, 0);
    }
}
