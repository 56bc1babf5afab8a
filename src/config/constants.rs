// * Configuration Constants
// * Central location for extraction bounds and statistical thresholds

// * Scraped content is truncated to this many characters before extraction
pub const CONTENT_CHAR_LIMIT: usize = 5_000;

// * Accepted price range for extracted values (inclusive)
pub const MIN_PRICE: f64 = 0.01;
pub const MAX_PRICE: f64 = 1_000_000.0;

// * Caps on list-valued extraction outputs
pub const MAX_PRODUCTS: usize = 5;
pub const MAX_AI_CAPABILITIES: usize = 4;
pub const MAX_TARGET_MARKETS: usize = 3;

// * Sentinels returned when extraction finds nothing
pub const NOT_AVAILABLE: &str = "N/A";
pub const DEFAULT_CATEGORY: &str = "Other";
pub const DEFAULT_AI_CAPABILITIES: &str = "No AI capabilities identified";
pub const DEFAULT_TARGET_MARKET: &str = "General Market";

// * HHI classification boundaries (10_000 scale)
pub const HHI_HIGHLY_CONCENTRATED: f64 = 2_500.0;
pub const HHI_MODERATELY_CONCENTRATED: f64 = 1_500.0;

// * Coefficient of variation boundaries
pub const CV_HIGH: f64 = 0.5;
pub const CV_MODERATE: f64 = 0.2;

// * Trend slope boundaries
pub const TREND_SLOPE_THRESHOLD: f64 = 0.1;

// * Outlier detection
pub const IQR_FENCE_FACTOR: f64 = 1.5;
pub const ZSCORE_THRESHOLD: f64 = 2.5;
pub const MIN_OUTLIER_SAMPLE: usize = 4;
pub const MIN_ANOMALY_SAMPLE: usize = 5;

// * Market gap heuristics
pub const PRICE_GAP_QUANTILE: f64 = 0.8;
pub const UNDERSERVED_CATEGORY_QUANTILE: f64 = 0.25;

// * Trend analysis
pub const TREND_RECENT_DAYS: i64 = 30;
pub const PREDICTION_PRICE_WINDOW: usize = 5;
pub const PREDICTION_MIN_CHANGE_PCT: f64 = 5.0;
pub const PREDICTION_MAX_CONFIDENCE: f64 = 85.0;
pub const CORRELATION_THRESHOLD: f64 = 0.5;
pub const MIN_CORRELATION_DAYS: usize = 4;

// * Recent activity window in days
pub const DEFAULT_RECENT_DAYS: i64 = 7;

// * Delay between consecutive scrapes in milliseconds
pub const DEFAULT_SCRAPE_INTERVAL_MS: u64 = 2_000;

// * HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// * Text sent to the summarizer is capped at this many characters
pub const SUMMARY_INPUT_CHAR_LIMIT: usize = 3_000;

pub const DEFAULT_DATA_FILE: &str = "competitor_data.json";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
