//! Stock Sentiment Forecaster CLI
//!
//! Runs the daily commands: `gather`, `evaluate`, `calibrate`, `forecast`
//! (all three) and `learn`.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use forecast_core::{NewsSource, SentimentOracle};
use forecast_news::{GoogleNewsClient, NewsApiClient};
use forecast_quotes::AlphaVantageClient;
use forecast_research::{LexiconSentimentOracle, OpenAISentimentOracle};
use forecast_services::{
    Committer, FileSink, ForecastConfig, ForecastPipeline, GitCommitter, NewsProvider,
    NoopCommitter, SentimentProvider, DEFAULT_DISCOVERY_QUERY,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "forecast", about = "News sentiment stock forecaster", version)]
struct Cli {
    /// Write files without committing them
    #[arg(long, global = true)]
    no_commit: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Predict every watchlist symbol from today's headlines
    Gather,
    /// Score the previous predictions against closing prices
    Evaluate {
        /// Only evaluate this symbol
        symbol: Option<String>,
    },
    /// Gather, evaluate and calibrate in one run
    Forecast,
    /// Add symbols mentioned in market headlines to the watchlist
    Learn {
        #[arg(long, default_value = DEFAULT_DISCOVERY_QUERY)]
        query: String,
    },
    /// Suggest BUY threshold adjustments from the accuracy history
    Calibrate,
}

impl Command {
    fn needs_news(&self) -> bool {
        matches!(self, Command::Gather | Command::Forecast | Command::Learn { .. })
    }

    fn needs_sentiment(&self) -> bool {
        matches!(self, Command::Gather | Command::Forecast)
    }

    fn needs_quotes(&self) -> bool {
        matches!(self, Command::Evaluate { .. } | Command::Forecast)
    }
}

fn build_news(config: &ForecastConfig) -> anyhow::Result<Arc<dyn NewsSource>> {
    let news: Arc<dyn NewsSource> = match config.news_provider {
        NewsProvider::NewsApi => {
            Arc::new(NewsApiClient::from_env().context("NewsAPI is the configured news provider")?)
        }
        NewsProvider::GoogleNews => Arc::new(GoogleNewsClient::new()),
    };
    info!("News provider: {}", news.name());
    Ok(news)
}

fn build_oracle(config: &ForecastConfig) -> anyhow::Result<Arc<dyn SentimentOracle>> {
    let oracle: Arc<dyn SentimentOracle> = match config.sentiment_provider {
        SentimentProvider::OpenAi => Arc::new(
            OpenAISentimentOracle::from_env()
                .context("OpenAI is the configured sentiment provider")?
                .with_model(&config.openai_model),
        ),
        SentimentProvider::Lexicon => Arc::new(LexiconSentimentOracle::new()),
    };
    info!("Sentiment provider: {}", oracle.name());
    Ok(oracle)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,forecast_cli=debug,forecast_services=debug")
            }),
        )
        .init();

    // Unknown commands print usage and exit cleanly
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return Ok(());
        }
    };
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = ForecastConfig::from_env()?;
    debug!("Configuration: {:?}", config);

    // Adapters a command never touches are not built, so their keys stay optional
    let news: Arc<dyn NewsSource> = if command.needs_news() {
        build_news(&config)?
    } else {
        Arc::new(GoogleNewsClient::new())
    };
    let oracle: Arc<dyn SentimentOracle> = if command.needs_sentiment() {
        build_oracle(&config)?
    } else {
        Arc::new(LexiconSentimentOracle::new())
    };

    let sink = Arc::new(FileSink::new(&config.output_root, &config.history_log_path));
    let committer: Arc<dyn Committer> = if cli.no_commit || !config.git_commit {
        Arc::new(NoopCommitter)
    } else {
        Arc::new(GitCommitter::new(&config.output_root))
    };

    let mut pipeline = ForecastPipeline::new(config, news, oracle, sink, committer);
    if command.needs_quotes() {
        let quotes = AlphaVantageClient::from_env()
            .context("Evaluation needs Alpha Vantage closing prices")?;
        pipeline = pipeline.with_quotes(Arc::new(quotes));
    }

    let today = Utc::now().date_naive();
    info!("Running {:?} for {}", command, today);

    match command {
        Command::Gather => {
            let outcome = pipeline.gather(today).await?;
            for path in &outcome.written {
                println!("Report generated at {}", path.display());
            }
        }
        Command::Evaluate { symbol } => {
            let outcome = pipeline.evaluate(today, symbol.as_deref()).await?;
            match outcome.batch_date {
                Some(date) => println!(
                    "Evaluated {} predictions from {}",
                    outcome.records.len(),
                    date
                ),
                None => println!("No prediction reports found"),
            }
        }
        Command::Forecast => {
            let outcome = pipeline.forecast(today).await;
            if let Some(calibration) = outcome.calibration {
                println!("{}", calibration.report);
            }
        }
        Command::Learn { query } => {
            let added = pipeline.learn(&query, today).await?;
            if added.is_empty() {
                println!("No new stocks discovered.");
            } else {
                println!("Added new stocks: {}", added.join(", "));
            }
        }
        Command::Calibrate => {
            let outcome = pipeline.calibrate(today).await?;
            println!("{}", outcome.report);
        }
    }

    Ok(())
}
