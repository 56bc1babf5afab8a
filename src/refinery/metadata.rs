// * Page Metadata
// * Title and description, the two fields the record keeps.
// * Chain: OpenGraph -> standard meta/title -> first <h1>.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static SELECTOR_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").unwrap());
static SELECTOR_H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static SELECTOR_META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[content]").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl PageMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

fn meta_content(document: &Html, keys: &[&str]) -> Option<String> {
    for key in keys {
        let found = document.select(&SELECTOR_META).find_map(|meta| {
            let el = meta.value();
            let name = el.attr("property").or_else(|| el.attr("name"))?;
            if name.eq_ignore_ascii_case(key) {
                el.attr("content").map(str::trim).filter(|c| !c.is_empty()).map(String::from)
            } else {
                None
            }
        });
        if found.is_some() {
            return found;
        }
    }
    None
}

fn element_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| el.text().flat_map(|t| t.split_whitespace()).collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
}

/// Extracts title and description from an HTML document
pub fn extract_page_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = meta_content(&document, &["og:title", "twitter:title"])
        .or_else(|| element_text(&document, &SELECTOR_TITLE))
        .or_else(|| element_text(&document, &SELECTOR_H1));

    let description = meta_content(&document, &["og:description", "description", "twitter:description"]);

    PageMetadata { title, description }
}
