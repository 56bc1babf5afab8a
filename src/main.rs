use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rival_radar::config::{AppConfig, LogFormat};
use rival_radar::engine::{ScrapeDispatcher, ScrapePacer};
use rival_radar::metrics::{self, MetricsOptions, OutlierMethod, RecordField};
use rival_radar::network::HttpFetcher;
use rival_radar::ops::telemetry;
use rival_radar::persistence::{
    CompetitorRecord, ExportFormat, InsightProvider, OpenAiAnalyst, RecordStore,
};
use rival_radar::refinery::Extractor;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rival-radar", version)]
#[command(about = "Competitor intelligence: scrape pages, extract pricing signals, compute market metrics")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Record file (overrides config and RIVAL_DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Human-readable logs instead of JSON
    #[arg(long, global = true)]
    pretty_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape a competitor page and store its records
    Scrape {
        #[arg(long)]
        url: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        category: Option<String>,
        /// Also scrape the competitors suggested for this company
        #[arg(long)]
        discover: bool,
    },

    /// Extract signals from text (file or stdin) without fetching or storing
    Extract {
        #[arg(long)]
        company: String,
        /// Text file to read; stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Suggest competitors for a company
    Discover {
        #[arg(long)]
        company: String,
    },

    /// Model-written landscape analysis of the stored records
    Analyze {
        /// Limit to one company
        #[arg(long)]
        company: Option<String>,
    },

    /// List stored records
    List {
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Only records updated within this many days
        #[arg(long)]
        recent: Option<i64>,
    },

    /// Market metrics summary
    Metrics {
        #[arg(long, default_value_t = 7)]
        recent_days: i64,
    },

    /// Records whose price or content length is an outlier
    Outliers {
        /// price | content_length
        #[arg(long, default_value = "price")]
        field: RecordField,
        /// iqr | zscore
        #[arg(long, default_value = "iqr")]
        method: OutlierMethod,
    },

    /// Market gaps, anomalies, pricing insights, trends and predictions
    Insights,

    /// Side-by-side comparison of companies
    Compare {
        #[arg(required = true)]
        companies: Vec<String>,
    },

    /// Re-scrape one company, or all companies when none is given
    Refresh {
        #[arg(long)]
        company: Option<String>,
        /// Scrape this URL instead of the stored one
        #[arg(long, requires = "company")]
        url: Option<String>,
    },

    /// Remove all records of a company
    Remove {
        #[arg(long)]
        company: String,
    },

    /// Delete every stored record
    Clear,

    /// Export the record file
    Export {
        /// csv | json
        #[arg(long, default_value = "csv")]
        format: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print counters in the Prometheus text format
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = cli.data_file {
        config.data_file = path;
    }
    if cli.pretty_logs {
        config.log_format = LogFormat::Pretty;
    }

    telemetry::init_from_config(&config.log_level, config.log_format);
    info!(data_file = %config.data_file.display(), "Rival-Radar started");

    run(cli.command, &config).await
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_dispatcher(config: &AppConfig, store: Arc<RecordStore>) -> Result<ScrapeDispatcher> {
    let fetcher = HttpFetcher::from_config(config).context("Failed to build HTTP client")?;
    let analyst = OpenAiAnalyst::from_config(config).context("Failed to build analyst client")?;

    Ok(ScrapeDispatcher::new(Arc::new(fetcher), Arc::new(analyst), store)
        .with_pacer(ScrapePacer::from_millis(config.scrape_interval_ms)))
}

fn print_records(records: &[CompetitorRecord]) {
    println!(
        "{:<24} {:<28} {:<14} {:>12}  {}",
        "COMPANY", "PRODUCT", "CATEGORY", "PRICE", "UPDATED"
    );
    for r in records {
        println!(
            "{:<24} {:<28} {:<14} {:>12}  {}",
            r.company,
            r.product_name,
            r.category,
            r.price_label(),
            r.last_updated.format("%Y-%m-%d %H:%M")
        );
    }
}

async fn run(command: Commands, config: &AppConfig) -> Result<()> {
    let store = Arc::new(RecordStore::open(&config.data_file));

    match command {
        Commands::Scrape { url, company, category, discover } => {
            let dispatcher = build_dispatcher(config, store)?;
            let added = dispatcher
                .add_competitor(&url, &company, category.as_deref())
                .await
                .with_context(|| format!("Failed to scrape {}", company))?;
            println!("Stored {} record(s) for {}", added, company);

            if discover {
                let leads = dispatcher.discover_competitors(&company);
                let added = dispatcher.add_many(&leads, category.as_deref()).await?;
                println!("Stored {} record(s) from {} suggested competitor(s)", added, leads.len());
            }
        }

        Commands::Extract { company, file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            print_json(&Extractor::new().extract(&text, &company))?;
        }

        Commands::Discover { company } => {
            let dispatcher = build_dispatcher(config, store)?;
            print_json(&dispatcher.discover_competitors(&company))?;
        }

        Commands::Analyze { company } => {
            let records = match company {
                Some(c) => store.by_company(&c),
                None => store.records(),
            };
            if records.is_empty() {
                bail!("No stored records to analyze");
            }

            let analyst = OpenAiAnalyst::from_config(config)?;
            let insight = analyst
                .market_insight(&records)
                .await
                .context("Landscape analysis unavailable")?;
            print_json(&insight)?;
        }

        Commands::List { company, category, recent } => {
            let mut records = match recent {
                Some(days) => store.recent(days, Utc::now()),
                None => store.records(),
            };
            if let Some(c) = company {
                records.retain(|r| r.company == c);
            }
            if let Some(c) = category {
                records.retain(|r| r.category == c);
            }
            print_records(&records);
        }

        Commands::Metrics { recent_days } => {
            let options = MetricsOptions::at(Utc::now()).with_recent_days(recent_days);
            println!("{}", metrics::compute_metrics(&store.records(), &options).to_json_pretty());
        }

        Commands::Outliers { field, method } => {
            let outliers = metrics::detect_outliers(&store.records(), field, method);
            print_records(&outliers);
        }

        Commands::Insights => {
            let records = store.records();
            let mut competitive = metrics::competitive_insights(&records);
            let mut trends = metrics::identify_trends(&records);

            // * Model output is additive; the rule-based baseline always prints
            let analyst = OpenAiAnalyst::from_config(config)?;
            if analyst.is_configured() && !records.is_empty() {
                match analyst.competitive_insight(&records).await {
                    Ok(extra) => competitive.merge(extra),
                    Err(e) => tracing::warn!(error = %e, "Model insights unavailable"),
                }
                match analyst.trend_insight(&records).await {
                    Ok(extra) => trends.merge(extra),
                    Err(e) => tracing::warn!(error = %e, "Model trend analysis unavailable"),
                }
            }

            print_json(&serde_json::json!({
                "market_gaps": metrics::market_gaps(&records),
                "price_anomalies": metrics::price_anomalies(&records),
                "pricing_insights": metrics::pricing_insights(&records),
                "pricing_recommendations": metrics::pricing_recommendations(&records),
                "competitive_insights": competitive,
                "trends": trends,
                "trend_correlations": metrics::trend_correlations(&records),
                "market_predictions": metrics::market_predictions(&records, Utc::now()),
            }))?;
        }

        Commands::Compare { companies } => {
            print_json(&metrics::comparison_table(&store.records(), &companies))?;
        }

        Commands::Refresh { company, url } => {
            let dispatcher = build_dispatcher(config, store)?;
            match company {
                Some(c) => {
                    let added = dispatcher.refresh_competitor(&c, url.as_deref()).await?;
                    println!("Refreshed {} with {} record(s)", c, added);
                }
                None => print_json(&dispatcher.refresh_all().await)?,
            }
        }

        Commands::Remove { company } => {
            if store.remove_company(&company)? {
                println!("Removed {}", company);
            } else {
                println!("No records for {}", company);
            }
        }

        Commands::Clear => {
            store.clear()?;
            println!("All records cleared");
        }

        Commands::Export { format, output } => {
            let format: ExportFormat = format.parse().map_err(anyhow::Error::msg)?;
            let Some(data) = store.export(format) else {
                bail!("Nothing to export");
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, data)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => print!("{}", data),
            }
        }

        Commands::Stats => {
            print!("{}", telemetry::get_metrics_string());
        }
    }

    Ok(())
}
