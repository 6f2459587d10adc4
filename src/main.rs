//! modelmux - Cost-aware LLM routing across providers
//!
//! A CLI front end over the routing library: run completions, preview
//! routing decisions, validate configuration, and inspect usage analytics.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modelmux::analytics::{Period, SqliteAnalyticsStore, UsageTracker};
use modelmux::{AppConfig, CompletionOptions, Router, StrategyKind};

#[derive(Parser)]
#[command(name = "modelmux")]
#[command(about = "Cost-aware LLM routing across providers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a completion through the router
    Complete {
        /// Prompt text
        prompt: String,

        /// Path to configuration file
        #[arg(short, long, default_value = "modelmux.toml")]
        config: String,

        /// Routing strategy override
        #[arg(short, long)]
        strategy: Option<StrategyKind>,

        /// Maximum acceptable cost per request
        #[arg(long)]
        max_cost: Option<f64>,

        /// Maximum acceptable latency in milliseconds
        #[arg(long)]
        max_latency: Option<f64>,

        /// Minimum quality score between 0 and 1
        #[arg(long)]
        min_quality: Option<f64>,
    },

    /// Show where a prompt would be routed, without calling any provider
    Explain {
        /// Prompt text
        prompt: String,

        /// Path to configuration file
        #[arg(short, long, default_value = "modelmux.toml")]
        config: String,

        /// Routing strategy override
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
    },

    /// Validate configuration file
    Check {
        /// Path to configuration file
        #[arg(short, long, default_value = "modelmux.toml")]
        config: String,
    },

    /// Show the configured model catalog
    Models {
        /// Path to configuration file
        #[arg(short, long, default_value = "modelmux.toml")]
        config: String,
    },

    /// Summarize recorded usage
    Stats {
        /// Analytics database path
        #[arg(short, long, default_value = "modelmux.db")]
        db: String,

        /// Trailing window: last_24_hours, last_7_days, or last_30_days
        #[arg(short, long, default_value = "last_24_hours")]
        period: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modelmux=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Complete {
            prompt,
            config,
            strategy,
            max_cost,
            max_latency,
            min_quality,
        } => {
            let (app_config, key_sources) = AppConfig::from_file(&config)?;
            for (kind, source) in &key_sources {
                tracing::debug!(provider = %kind, source = %source, "Credential loaded");
            }

            let mut router = Router::from_app_config(&app_config)?;
            if app_config.router.enable_analytics {
                let store = SqliteAnalyticsStore::connect("modelmux.db").await?;
                router = router.with_tracker(UsageTracker::new(std::sync::Arc::new(store)));
            }

            let options = CompletionOptions {
                max_cost,
                max_latency,
                min_quality,
                strategy,
                ..Default::default()
            };
            let response = router.complete(&prompt, options).await?;

            println!("{}", response.content());
            tracing::info!(
                model = %response.model_used(),
                cost = response.cost(),
                tokens = response.tokens(),
                latency_secs = response.latency(),
                "Completion finished"
            );
            Ok(())
        }

        Commands::Explain {
            prompt,
            config,
            strategy,
        } => {
            let (app_config, _) = AppConfig::from_file(&config)?;
            let router = Router::from_app_config(&app_config)?;
            let options = CompletionOptions {
                strategy,
                ..Default::default()
            };
            println!("{}", router.explain(&prompt, &options)?);
            Ok(())
        }

        Commands::Check { config } => {
            tracing::info!(config = %config, "Checking configuration");
            let (app_config, key_sources) = AppConfig::from_file(&config)?;

            println!("Configuration OK");
            println!("  strategy: {}", app_config.router.default_strategy);
            println!("  providers: {}", app_config.providers.len());
            println!("  models: {}", app_config.models.len());
            for (kind, source) in &key_sources {
                println!("  credential for {kind}: {source}");
            }
            Ok(())
        }

        Commands::Models { config } => {
            let (app_config, _) = AppConfig::from_file(&config)?;
            for model in &app_config.models {
                let capabilities: Vec<&str> =
                    model.capabilities().iter().map(String::as_str).collect();
                println!(
                    "{:<24} {:<12} ${:<10} [{}]",
                    model.model_name(),
                    model.provider().to_string(),
                    model.pricing(),
                    capabilities.join(", ")
                );
            }
            Ok(())
        }

        Commands::Stats { db, period } => {
            let period: Period = period.parse()?;
            let store = SqliteAnalyticsStore::connect(&db).await?;
            let tracker = UsageTracker::new(std::sync::Arc::new(store));
            let summary = tracker.get_summary(period).await?;

            println!("Usage for {}", summary.period);
            println!("  requests: {}", summary.total_requests);
            println!("  tokens:   {}", summary.total_tokens);
            println!("  cost:     ${:.6}", summary.total_cost);
            println!("  savings:  ${:.6} vs flagship baseline", summary.savings_vs_baseline);
            println!(
                "  latency:  p50 {:.3}s  p95 {:.3}s  p99 {:.3}s",
                summary.latency_p50, summary.latency_p95, summary.latency_p99
            );
            for (model, usage) in &summary.by_model {
                println!(
                    "  {:<24} {} requests  ${:.6}  {} tokens",
                    model, usage.requests, usage.cost, usage.tokens
                );
            }
            Ok(())
        }
    }
}
