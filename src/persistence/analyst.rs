// * Language-model collaborators: page summaries and landscape insights.
// * Both sit behind traits so extraction, metrics and the dispatcher can run offline.

use crate::config::constants::{DEFAULT_OPENAI_MODEL, SUMMARY_INPUT_CHAR_LIMIT, TREND_RECENT_DAYS};
use crate::config::AppConfig;
use crate::engine::normalization::truncate_content;
use crate::metrics::{window_start, CompetitiveInsights, PriceStats, TrendInsight};
use crate::persistence::schema::CompetitorRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const LANDSCAPE_RECORD_LIMIT: usize = 10;
const LANDSCAPE_CONTENT_CHARS: usize = 500;
const ANALYST_SYSTEM_PROMPT: &str = "You are a strategic business analyst specializing in \
competitive intelligence. Provide detailed, actionable insights based on competitor data.";

pub const SUMMARY_NOT_CONFIGURED: &str = "OpenAI API key not configured. Cannot generate summary.";
pub const SUMMARY_DISABLED: &str = "AI summaries are disabled.";

/// Type alias for boxed analyst futures
pub type AnalystFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Produces a short summary of one competitor page. Never fails: problems are
/// reported inside the returned text.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str, company: &str) -> AnalystFuture<String>;
}

/// Produces structured insight over a record collection
pub trait InsightProvider: Send + Sync {
    fn market_insight(
        &self,
        records: &[CompetitorRecord],
    ) -> AnalystFuture<Result<MarketInsight, AnalystError>>;

    fn competitive_insight(
        &self,
        records: &[CompetitorRecord],
    ) -> AnalystFuture<Result<CompetitiveInsights, AnalystError>>;

    fn trend_insight(
        &self,
        records: &[CompetitorRecord],
    ) -> AnalystFuture<Result<TrendInsight, AnalystError>>;
}

/// Landscape analysis returned by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketInsight {
    pub market_segments: Vec<String>,
    pub pricing_analysis: String,
    pub key_differentiators: Vec<String>,
    pub market_opportunities: Vec<String>,
    pub competitive_threats: Vec<String>,
}

/// Errors from the insight provider
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalystError {
    #[error("OpenAI API key not configured")]
    NotConfigured,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP {0} from model endpoint")]
    Status(u16),

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Model returned invalid JSON: {0}")]
    InvalidJson(String),
}

impl From<reqwest::Error> for AnalystError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.to_string())
    }
}

// * Chat-completions wire types

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI chat-completions client
#[derive(Debug, Clone)]
pub struct OpenAiAnalyst {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl OpenAiAnalyst {
    /// Creates a client. A blank or missing key leaves the analyst unconfigured.
    pub fn new(api_key: Option<String>, model: impl Into<String>, timeout: Duration) -> Result<Self, AnalystError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            endpoint: CHAT_COMPLETIONS_URL.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AnalystError> {
        Self::new(
            config.api_key().map(str::to_string),
            config.openai_model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Points the client at a compatible endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    // * Builds an owned future so callers need not borrow self across awaits
    fn chat(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        json_mode: bool,
    ) -> AnalystFuture<Result<String, AnalystError>> {
        let Some(api_key) = self.api_key.clone() else {
            return Box::pin(async { Err(AnalystError::NotConfigured) });
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
            temperature: 0.3,
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        Box::pin(async move {
            let resp = client
                .post(&endpoint)
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(AnalystError::Status(status.as_u16()));
            }

            let body: ChatResponse = resp.json().await?;
            debug!(model = %request.model, "Chat completion received");

            body.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|c| !c.trim().is_empty())
                .ok_or(AnalystError::EmptyResponse)
        })
    }
}

impl Default for OpenAiAnalyst {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            endpoint: CHAT_COMPLETIONS_URL.to_string(),
        }
    }
}

impl Summarizer for OpenAiAnalyst {
    fn summarize(&self, text: &str, company: &str) -> AnalystFuture<String> {
        if !self.is_configured() {
            return Box::pin(async { SUMMARY_NOT_CONFIGURED.to_string() });
        }

        let messages = vec![ChatMessage {
            role: "user",
            content: summary_prompt(text, company),
        }];
        let call = self.chat(messages, 500, false);
        let company = company.to_string();

        Box::pin(async move {
            match call.await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(company = %company, error = %e, "Summary generation failed");
                    format!("Error generating summary: {}", e)
                }
            }
        })
    }
}

impl InsightProvider for OpenAiAnalyst {
    fn market_insight(
        &self,
        records: &[CompetitorRecord],
    ) -> AnalystFuture<Result<MarketInsight, AnalystError>> {
        let messages = vec![
            ChatMessage {
                role: "system",
                content: ANALYST_SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: landscape_prompt(records),
            },
        ];
        let call = self.chat(messages, 1000, true);
        Box::pin(async move {
            call.await
                .and_then(|content| parse_json_reply::<MarketInsight>(&content))
        })
    }

    fn competitive_insight(
        &self,
        records: &[CompetitorRecord],
    ) -> AnalystFuture<Result<CompetitiveInsights, AnalystError>> {
        let messages = vec![ChatMessage {
            role: "user",
            content: swot_prompt(records),
        }];
        let call = self.chat(messages, 600, true);
        Box::pin(async move {
            call.await
                .and_then(|content| parse_json_reply::<CompetitiveInsights>(&content))
        })
    }

    fn trend_insight(
        &self,
        records: &[CompetitorRecord],
    ) -> AnalystFuture<Result<TrendInsight, AnalystError>> {
        let messages = vec![ChatMessage {
            role: "user",
            content: trend_prompt(records, Utc::now()),
        }];
        let call = self.chat(messages, 500, true);
        Box::pin(async move {
            call.await
                .and_then(|content| parse_json_reply::<TrendInsight>(&content))
        })
    }
}

/// Analyst used when no model is available
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAnalyst;

impl Summarizer for DisabledAnalyst {
    fn summarize(&self, _text: &str, _company: &str) -> AnalystFuture<String> {
        Box::pin(async { SUMMARY_DISABLED.to_string() })
    }
}

impl InsightProvider for DisabledAnalyst {
    fn market_insight(
        &self,
        _records: &[CompetitorRecord],
    ) -> AnalystFuture<Result<MarketInsight, AnalystError>> {
        Box::pin(async { Err(AnalystError::NotConfigured) })
    }

    fn competitive_insight(
        &self,
        _records: &[CompetitorRecord],
    ) -> AnalystFuture<Result<CompetitiveInsights, AnalystError>> {
        Box::pin(async { Err(AnalystError::NotConfigured) })
    }

    fn trend_insight(
        &self,
        _records: &[CompetitorRecord],
    ) -> AnalystFuture<Result<TrendInsight, AnalystError>> {
        Box::pin(async { Err(AnalystError::NotConfigured) })
    }
}

/// Prompt asking for a structured summary of one page
pub fn summary_prompt(text: &str, company: &str) -> String {
    format!(
        "Analyze the following content from {company}'s website and provide a concise summary \
         focusing on:\n\
         1. Key products/services offered\n\
         2. Main value propositions\n\
         3. Target market/customers\n\
         4. Competitive advantages mentioned\n\
         5. Recent updates or announcements\n\n\
         Content:\n{content}\n\n\
         Please provide the summary in a structured format.",
        company = company,
        content = truncate_content(text, SUMMARY_INPUT_CHAR_LIMIT),
    )
}

// * One block per record, first ten records only
fn competitor_lines(records: &[CompetitorRecord], with_content: bool) -> String {
    records
        .iter()
        .take(LANDSCAPE_RECORD_LIMIT)
        .map(|r| {
            let price = r
                .price
                .map(|p| format!("${:.2}", p))
                .unwrap_or_else(|| "Not specified".to_string());
            if with_content {
                format!(
                    "Company: {}\nCategory: {}\nPrice: {}\nKey Info: {}",
                    r.company,
                    r.category,
                    price,
                    truncate_content(&r.content, LANDSCAPE_CONTENT_CHARS)
                )
            } else {
                format!("{}: {} - {}", r.company, r.category, price)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt asking for a JSON landscape analysis
pub fn landscape_prompt(records: &[CompetitorRecord]) -> String {
    format!(
        "Analyze the following competitor landscape and provide insights on market segments, \
         pricing strategies, key differentiators, market gaps and competitive threats.\n\n\
         Competitors:\n{}\n\n\
         Respond in JSON with the keys \"market_segments\" (list), \"pricing_analysis\" (text), \
         \"key_differentiators\" (list), \"market_opportunities\" (list) and \
         \"competitive_threats\" (list).",
        competitor_lines(records, true)
    )
}

/// Prompt asking for a JSON SWOT analysis
pub fn swot_prompt(records: &[CompetitorRecord]) -> String {
    format!(
        "Based on this competitive landscape, provide strategic insights.\n\n\
         Competitors:\n{}\n\n\
         Respond in JSON with the list keys \"strengths\", \"weaknesses\", \"opportunities\" \
         and \"threats\". Focus on actionable insights for strategic decision making.",
        competitor_lines(records, false)
    )
}

/// Prompt asking for JSON trend commentary over a compact data summary
pub fn trend_prompt(records: &[CompetitorRecord], now: DateTime<Utc>) -> String {
    let companies: BTreeSet<&str> = records.iter().map(|r| r.company.as_str()).collect();
    let categories: BTreeSet<&str> = records.iter().map(|r| r.category.as_str()).collect();
    let prices: Vec<f64> = records.iter().filter_map(|r| r.price).collect();
    let price_range = PriceStats::from_values(&prices).map(|s| {
        serde_json::json!({ "min": s.min, "max": s.max, "avg": s.mean })
    });
    let cutoff = window_start(now, TREND_RECENT_DAYS);
    let recent_updates = records.iter().filter(|r| r.last_updated >= cutoff).count();

    let summary = serde_json::json!({
        "total_competitors": companies.len(),
        "categories": categories,
        "price_range": price_range,
        "recent_updates": recent_updates,
    });

    format!(
        "Analyze the following competitive intelligence data and identify key trends:\n\n\
         Data Summary: {}\n\n\
         Respond in JSON with the list keys \"feature_trends\", \"market_trends\" and \
         \"strategic_insights\". Focus on emerging features, pricing movement and \
         positioning shifts.",
        summary
    )
}

fn parse_json_reply<T: for<'de> Deserialize<'de>>(content: &str) -> Result<T, AnalystError> {
    serde_json::from_str(content).map_err(|e| AnalystError::InvalidJson(e.to_string()))
}
