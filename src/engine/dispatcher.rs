// * Scrape Dispatcher
// * Orchestrates fetch -> extract -> summarize -> store for one or many competitors.
// * Sequential and paced; one failing competitor never aborts a batch.

use crate::config::constants::CONTENT_CHAR_LIMIT;
use crate::engine::normalization::{normalize_url, truncate_content};
use crate::engine::pacing::ScrapePacer;
use crate::network::client::PageFetcher;
use crate::ops::telemetry;
use crate::persistence::analyst::Summarizer;
use crate::persistence::schema::CompetitorRecord;
use crate::persistence::store::{RecordStore, StoreError};
use crate::refinery::{CompetitorLead, ExtractedSignals, Extractor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Everything learned from one page, before it is split into records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedCompetitor {
    pub company: String,
    pub source_url: String,
    pub category: String,
    pub content: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub signals: ExtractedSignals,
    pub scraped_at: DateTime<Utc>,
}

/// Outcome of a multi-company refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Could not fetch readable content from {0}")]
    FetchFailed(String),

    #[error("No stored records for company: {0}")]
    UnknownCompany(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ScrapeDispatcher {
    fetcher: Arc<dyn PageFetcher>,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<RecordStore>,
    extractor: Extractor,
    pacer: ScrapePacer,
}

impl ScrapeDispatcher {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<RecordStore>,
    ) -> Self {
        Self {
            fetcher,
            summarizer,
            store,
            extractor: Extractor::new(),
            pacer: ScrapePacer::disabled(),
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_pacer(mut self, pacer: ScrapePacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    // * Fetches one page and extracts its signals. None when the page yielded no text.
    pub async fn scrape_competitor(
        &self,
        url: &str,
        company: &str,
        category: Option<&str>,
    ) -> Option<ScrapedCompetitor> {
        let started = Instant::now();
        let page = self.fetcher.fetch(url).await;

        let Some(text) = page.text.filter(|t| !t.trim().is_empty()) else {
            telemetry::record_fetch_failure();
            warn!(company = company, url = url, "Scrape yielded no content");
            return None;
        };
        telemetry::record_fetch_success();

        let content = truncate_content(&text, CONTENT_CHAR_LIMIT);
        let signals = self.extractor.extract(&content, company);
        if signals.is_miss() {
            telemetry::record_extraction_miss();
        }

        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| signals.category.clone());
        let metadata = page.metadata.unwrap_or_default();

        telemetry::record_scrape_duration(started.elapsed().as_secs_f64());
        info!(
            company = company,
            url = url,
            category = %category,
            price = ?signals.price,
            products = signals.features.len(),
            "Competitor scraped"
        );

        Some(ScrapedCompetitor {
            company: company.to_string(),
            source_url: normalize_url(url).unwrap_or_else(|| url.to_string()),
            category,
            content,
            title: metadata.title,
            description: metadata.description,
            signals,
            scraped_at: Utc::now(),
        })
    }

    // * One record per product (or "<company> Service"); the summary is requested once per page.
    pub async fn to_records(&self, scraped: &ScrapedCompetitor) -> Vec<CompetitorRecord> {
        let summary = if scraped.content.trim().is_empty() {
            None
        } else {
            telemetry::record_summary_requested();
            Some(self.summarizer.summarize(&scraped.content, &scraped.company).await)
        };

        let products = if scraped.signals.features.is_empty() {
            vec![format!("{} Service", scraped.company)]
        } else {
            scraped.signals.features.clone()
        };

        products
            .into_iter()
            .map(|product| {
                CompetitorRecord::builder(scraped.company.as_str(), scraped.source_url.as_str())
                    .category(scraped.category.as_str())
                    .price(scraped.signals.price)
                    .product_name(product)
                    .content(&scraped.content)
                    .title(scraped.title.clone())
                    .description(scraped.description.clone())
                    .summary(summary.clone())
                    .last_updated(scraped.scraped_at)
                    .build()
            })
            .collect()
    }

    /// Scrapes a competitor and appends its records
    pub async fn add_competitor(
        &self,
        url: &str,
        company: &str,
        category: Option<&str>,
    ) -> Result<usize, DispatchError> {
        self.pacer.wait().await;
        let scraped = self
            .scrape_competitor(url, company, category)
            .await
            .ok_or_else(|| DispatchError::FetchFailed(url.to_string()))?;

        let records = self.to_records(&scraped).await;
        let added = self.store.append(records)?;
        telemetry::record_records_stored(added);
        Ok(added)
    }

    /// Re-scrapes a stored company and replaces its rows. On fetch failure the old rows stay.
    pub async fn refresh_competitor(
        &self,
        company: &str,
        url_override: Option<&str>,
    ) -> Result<usize, DispatchError> {
        let existing = self.store.by_company(company);
        let first = existing
            .first()
            .ok_or_else(|| DispatchError::UnknownCompany(company.to_string()))?;

        let url = url_override.unwrap_or(&first.source_url).to_string();
        let category = first.category.clone();

        self.pacer.wait().await;
        let scraped = self
            .scrape_competitor(&url, company, Some(&category))
            .await
            .ok_or_else(|| DispatchError::FetchFailed(url.clone()))?;

        let records = self.to_records(&scraped).await;
        let added = self.store.replace_company(company, records)?;
        telemetry::record_records_stored(added);
        info!(company = company, records = added, "Competitor refreshed");
        Ok(added)
    }

    /// Refreshes every stored company in turn
    pub async fn refresh_all(&self) -> RefreshReport {
        let mut report = RefreshReport::default();

        for (company, _, _) in self.store.companies() {
            match self.refresh_competitor(&company, None).await {
                Ok(_) => report.refreshed.push(company),
                Err(e) => {
                    warn!(company = %company, error = %e, "Refresh failed");
                    report.failed.push((company, e.to_string()));
                }
            }
        }

        info!(
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            "Refresh finished"
        );
        report
    }

    /// Scrapes a list of leads without storing. Failed leads are skipped.
    pub async fn scrape_many(
        &self,
        leads: &[CompetitorLead],
        category: Option<&str>,
    ) -> Vec<ScrapedCompetitor> {
        let mut results = Vec::with_capacity(leads.len());

        for (i, lead) in leads.iter().enumerate() {
            self.pacer.wait().await;
            info!(company = %lead.company, position = i + 1, total = leads.len(), "Scraping lead");

            if let Some(scraped) = self.scrape_competitor(&lead.url, &lead.company, category).await {
                results.push(scraped);
            }
        }

        results
    }

    /// Scrapes and stores every lead; returns the number of records added
    pub async fn add_many(
        &self,
        leads: &[CompetitorLead],
        category: Option<&str>,
    ) -> Result<usize, DispatchError> {
        let mut batch = Vec::new();
        for scraped in self.scrape_many(leads, category).await {
            let records = self.to_records(&scraped).await;
            if let Some(bad) = records.iter().find(|r| !r.is_valid()) {
                warn!(company = %scraped.company, errors = ?bad.validate(), "Lead skipped, invalid records");
                continue;
            }
            batch.extend(records);
        }

        if batch.is_empty() {
            return Ok(0);
        }

        // * One flush for the whole batch
        let added = self.store.append(batch)?;
        telemetry::record_records_stored(added);
        info!(leads = leads.len(), records = added, "Leads stored");
        Ok(added)
    }

    /// Suggested competitors for a company from the knowledge source
    pub fn discover_competitors(&self, company: &str) -> Vec<CompetitorLead> {
        self.extractor.knowledge().competitors_of(company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::client::{FetchFuture, FetchedPage};
    use crate::persistence::analyst::AnalystFuture;
    use crate::refinery::{EmptyKnowledge, PageMetadata};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{tempdir, TempDir};

    #[derive(Default)]
    struct MockFetcher {
        pages: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        fn with_page(mut self, url: &str, text: &str) -> Self {
            self.pages.insert(url.to_string(), text.to_string());
            self
        }
    }

    impl PageFetcher for MockFetcher {
        fn fetch(&self, url: &str) -> FetchFuture {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // * Stored source URLs are normalized with a trailing slash
            let hit = self.pages.get(url).or_else(|| self.pages.get(url.trim_end_matches('/')));
            let page = match hit {
                Some(text) => FetchedPage::new(
                    text.clone(),
                    Some(PageMetadata {
                        title: Some("Mock Title".into()),
                        description: None,
                    }),
                ),
                None => FetchedPage::failed(),
            };
            Box::pin(async move { page })
        }
    }

    #[derive(Default)]
    struct CountingSummarizer {
        calls: AtomicUsize,
    }

    impl Summarizer for CountingSummarizer {
        fn summarize(&self, _text: &str, company: &str) -> AnalystFuture<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let summary = format!("{} summary", company);
            Box::pin(async move { summary })
        }
    }

    const ACME_PAGE: &str = "Introducing Rocket Deploy. The Orbit platform ships apps. Pro plan $49/month.";
    const BETA_PAGE: &str = "Beta helps teams chat. Plans from $12 per user.";

    fn setup(
        fetcher: MockFetcher,
    ) -> (ScrapeDispatcher, Arc<MockFetcher>, Arc<CountingSummarizer>, TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(RecordStore::open(dir.path().join("data.json")));
        let fetcher = Arc::new(fetcher);
        let summarizer = Arc::new(CountingSummarizer::default());
        let dispatcher = ScrapeDispatcher::new(fetcher.clone(), summarizer.clone(), store)
            .with_extractor(Extractor::with_knowledge(Arc::new(EmptyKnowledge)));
        (dispatcher, fetcher, summarizer, dir)
    }

    #[tokio::test]
    async fn test_scrape_competitor_extracts_signals() {
        let (dispatcher, _, _, _dir) =
            setup(MockFetcher::default().with_page("https://acme.io", ACME_PAGE));

        let scraped = dispatcher
            .scrape_competitor("https://acme.io", "Acme", None)
            .await
            .unwrap();

        assert_eq!(scraped.signals.price, Some(49.0));
        assert_eq!(scraped.signals.features, vec!["Rocket Deploy", "Orbit"]);
        assert_eq!(scraped.category, "SaaS");
        assert_eq!(scraped.title.as_deref(), Some("Mock Title"));
        assert_eq!(scraped.source_url, "https://acme.io/");
    }

    #[tokio::test]
    async fn test_caller_category_wins() {
        let (dispatcher, _, _, _dir) =
            setup(MockFetcher::default().with_page("https://acme.io", ACME_PAGE));

        let scraped = dispatcher
            .scrape_competitor("https://acme.io", "Acme", Some("DevOps"))
            .await
            .unwrap();
        assert_eq!(scraped.category, "DevOps");
    }

    #[tokio::test]
    async fn test_failed_fetch_is_none() {
        let (dispatcher, _, _, _dir) = setup(MockFetcher::default());
        assert!(dispatcher.scrape_competitor("https://down.io", "Down", None).await.is_none());
    }

    #[tokio::test]
    async fn test_records_per_product_with_one_summary() {
        let (dispatcher, _, summarizer, _dir) =
            setup(MockFetcher::default().with_page("https://acme.io", ACME_PAGE));

        let added = dispatcher.add_competitor("https://acme.io", "Acme", None).await.unwrap();
        assert_eq!(added, 2);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);

        let records = dispatcher.store().by_company("Acme");
        assert_eq!(records[0].product_name, "Rocket Deploy");
        assert_eq!(records[1].product_name, "Orbit");
        assert!(records.iter().all(|r| r.summary.as_deref() == Some("Acme summary")));
        assert!(records.iter().all(|r| r.price == Some(49.0)));
    }

    #[tokio::test]
    async fn test_generic_service_record() {
        let (dispatcher, _, _, _dir) =
            setup(MockFetcher::default().with_page("https://beta.io", BETA_PAGE));

        dispatcher.add_competitor("https://beta.io", "Beta", None).await.unwrap();
        let records = dispatcher.store().by_company("Beta");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_name, "Beta Service");
        assert_eq!(records[0].price, Some(12.0));
    }

    #[tokio::test]
    async fn test_add_failure_stores_nothing() {
        let (dispatcher, _, summarizer, _dir) = setup(MockFetcher::default());
        let result = dispatcher.add_competitor("https://down.io", "Down", None).await;

        assert!(matches!(result, Err(DispatchError::FetchFailed(_))));
        assert!(dispatcher.store().is_empty());
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_replaces_rows() {
        let (dispatcher, _, _, _dir) = setup(
            MockFetcher::default()
                .with_page("https://acme.io", ACME_PAGE)
                .with_page("https://acme.io/new", "Acme now costs $99 per month."),
        );
        dispatcher.add_competitor("https://acme.io", "Acme", Some("DevOps")).await.unwrap();
        assert_eq!(dispatcher.store().len(), 2);

        let added = dispatcher
            .refresh_competitor("Acme", Some("https://acme.io/new"))
            .await
            .unwrap();

        let rows = dispatcher.store().by_company("Acme");
        assert_eq!(added, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, Some(99.0));
        // * Category carries over from the stored rows
        assert_eq!(rows[0].category, "DevOps");
    }

    #[tokio::test]
    async fn test_refresh_unknown_company() {
        let (dispatcher, _, _, _dir) = setup(MockFetcher::default());
        let result = dispatcher.refresh_competitor("Ghost", None).await;
        assert!(matches!(result, Err(DispatchError::UnknownCompany(_))));
    }

    #[tokio::test]
    async fn test_refresh_all_isolates_failures() {
        let (dispatcher, _, _, _dir) = setup(
            MockFetcher::default()
                .with_page("https://acme.io", ACME_PAGE)
                .with_page("https://beta.io", BETA_PAGE),
        );
        dispatcher.add_competitor("https://acme.io", "Acme", None).await.unwrap();
        // * Stored under a URL the mock cannot serve
        dispatcher
            .store()
            .append(vec![CompetitorRecord::new("Gone", "https://gone.io")])
            .unwrap();
        dispatcher.add_competitor("https://beta.io", "Beta", None).await.unwrap();

        let report = dispatcher.refresh_all().await;

        assert_eq!(report.refreshed, vec!["Acme", "Beta"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "Gone");
        // * Failed company keeps its old row
        assert_eq!(dispatcher.store().by_company("Gone").len(), 1);
    }

    #[tokio::test]
    async fn test_scrape_many_skips_failures() {
        let (dispatcher, fetcher, _, _dir) = setup(
            MockFetcher::default()
                .with_page("https://acme.io", ACME_PAGE)
                .with_page("https://beta.io", BETA_PAGE),
        );
        let leads = vec![
            CompetitorLead::new("Acme", "https://acme.io"),
            CompetitorLead::new("Down", "https://down.io"),
            CompetitorLead::new("Beta", "https://beta.io"),
        ];

        let results = dispatcher.scrape_many(&leads, None).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        let companies: Vec<&str> = results.iter().map(|s| s.company.as_str()).collect();
        assert_eq!(companies, vec!["Acme", "Beta"]);

        let added = dispatcher.add_many(&leads, None).await.unwrap();
        assert_eq!(added, 3);
    }

    #[tokio::test]
    async fn test_add_many_skips_invalid_leads_and_stores_the_rest() {
        let (dispatcher, _, _, _dir) = setup(
            MockFetcher::default()
                .with_page("https://acme.io", ACME_PAGE)
                .with_page("https://beta.io", BETA_PAGE),
        );
        let leads = vec![
            CompetitorLead::new("Acme", "https://acme.io"),
            CompetitorLead::new("", "https://beta.io"),
            CompetitorLead::new("Down", "https://down.io"),
        ];

        let added = dispatcher.add_many(&leads, None).await.unwrap();

        assert_eq!(added, 2);
        assert_eq!(dispatcher.store().len(), 2);
        assert!(dispatcher.store().records().iter().all(|r| r.company == "Acme"));
    }

    #[tokio::test]
    async fn test_add_many_with_no_content_writes_nothing() {
        let (dispatcher, _, _, _dir) = setup(MockFetcher::default());
        let leads = vec![CompetitorLead::new("Down", "https://down.io")];

        assert_eq!(dispatcher.add_many(&leads, None).await.unwrap(), 0);
        assert!(!dispatcher.store().path().exists());
    }

    #[tokio::test]
    async fn test_discover_competitors() {
        let (dispatcher, _, _, _dir) = setup(MockFetcher::default());
        let dispatcher = dispatcher.with_extractor(Extractor::new());

        let leads = dispatcher.discover_competitors("Slack");
        assert!(leads.iter().any(|l| l.company == "Zoom"));
    }
}
