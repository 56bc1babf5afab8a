use rival_radar::engine::{DispatchError, ScrapeDispatcher};
use rival_radar::metrics::{compute_metrics, MetricsOptions};
use rival_radar::network::{FetchFuture, FetchedPage, PageFetcher};
use rival_radar::persistence::analyst::SUMMARY_DISABLED;
use rival_radar::persistence::{DisabledAnalyst, RecordStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

// * Test Suite for the scrape pipeline: fetch -> extract -> summarize -> store

/// Serves canned text keyed by host; pages can be swapped mid-test
#[derive(Default)]
struct CannedFetcher {
    pages: Mutex<HashMap<String, String>>,
}

impl CannedFetcher {
    fn serve(&self, host: &str, text: &str) {
        self.pages.lock().unwrap().insert(host.to_string(), text.to_string());
    }

    fn take_down(&self, host: &str) {
        self.pages.lock().unwrap().remove(host);
    }
}

impl PageFetcher for CannedFetcher {
    fn fetch(&self, url: &str) -> FetchFuture {
        let page = self
            .pages
            .lock()
            .unwrap()
            .iter()
            .find(|(host, _)| url.contains(host.as_str()))
            .map(|(_, text)| FetchedPage::new(text.clone(), None))
            .unwrap_or_else(FetchedPage::failed);
        Box::pin(async move { page })
    }
}

fn pipeline(fetcher: Arc<CannedFetcher>, store: Arc<RecordStore>) -> ScrapeDispatcher {
    ScrapeDispatcher::new(fetcher, Arc::new(DisabledAnalyst), store)
}

#[tokio::test]
async fn test_scrape_store_and_measure() {
    let dir = tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("data.json")));
    let fetcher = Arc::new(CannedFetcher::default());
    fetcher.serve("nimbus.io", "Introducing Nimbus Sync. Plans from $29 per month.");
    fetcher.serve("pulse.io", "Pulse keeps teams aligned. Only $9 per user.");

    let dispatcher = pipeline(fetcher, store.clone());
    assert_eq!(dispatcher.add_competitor("https://nimbus.io", "Nimbus", Some("SaaS")).await.unwrap(), 1);
    assert_eq!(dispatcher.add_competitor("pulse.io", "Pulse", Some("SaaS")).await.unwrap(), 1);

    let nimbus = store.by_company("Nimbus");
    assert_eq!(nimbus[0].product_name, "Nimbus Sync");
    assert_eq!(nimbus[0].price, Some(29.0));
    assert_eq!(nimbus[0].category, "SaaS");
    assert_eq!(nimbus[0].source_url, "https://nimbus.io/");
    assert_eq!(nimbus[0].summary.as_deref(), Some(SUMMARY_DISABLED));

    let pulse = store.by_company("Pulse");
    assert_eq!(pulse[0].product_name, "Pulse Service");
    assert_eq!(pulse[0].price, Some(9.0));

    // * Persisted state matches memory
    let reopened = RecordStore::open(store.path());
    let summary = compute_metrics(&reopened.records(), &MetricsOptions::default());
    assert_eq!(summary.total_records, 2);
    assert_eq!(summary.recent_activity, 2);
    assert_eq!(summary.price_stats.unwrap().max, 29.0);
}

#[tokio::test]
async fn test_unreachable_page_stores_nothing() {
    let dir = tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("data.json")));
    let dispatcher = pipeline(Arc::new(CannedFetcher::default()), store.clone());

    let result = dispatcher.add_competitor("https://offline.io", "Offline", None).await;
    assert!(matches!(result, Err(DispatchError::FetchFailed(_))));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_refresh_keeps_rows_of_failed_companies() {
    let dir = tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("data.json")));
    let fetcher = Arc::new(CannedFetcher::default());
    fetcher.serve("nimbus.io", "Nimbus plans from $29 per month.");
    fetcher.serve("pulse.io", "Pulse costs $9 per user.");

    let dispatcher = pipeline(fetcher.clone(), store.clone());
    dispatcher.add_competitor("https://nimbus.io", "Nimbus", None).await.unwrap();
    dispatcher.add_competitor("https://pulse.io", "Pulse", None).await.unwrap();

    fetcher.serve("nimbus.io", "Nimbus plans from $35 per month.");
    fetcher.take_down("pulse.io");

    let report = dispatcher.refresh_all().await;
    assert_eq!(report.refreshed, vec!["Nimbus"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "Pulse");
    assert!(!report.is_complete());

    assert_eq!(store.by_company("Nimbus")[0].price, Some(35.0));
    assert_eq!(store.by_company("Pulse")[0].price, Some(9.0));
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_refresh_unknown_company() {
    let dir = tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("data.json")));
    let dispatcher = pipeline(Arc::new(CannedFetcher::default()), store);

    let result = dispatcher.refresh_competitor("Ghost", None).await;
    assert!(matches!(result, Err(DispatchError::UnknownCompany(_))));
}
