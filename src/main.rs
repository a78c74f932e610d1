use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Instrument;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use anime_hype::{
    config::Config,
    services::{
        hype::{HypeAggregator, HypeConfig},
        pipeline,
        providers::{self, MetadataProvider},
        ratings::RatingConfig,
        sentiment::{SentimentScorer, VaderScorer},
        training::TrainingConfig,
    },
    storage::DataPaths,
};

#[derive(Parser)]
#[command(name = "anime-hype")]
#[command(about = "Anime metadata collection, hype scoring and synthetic rating pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and normalize the top airing titles
    Collect {
        /// Metadata source: jikan or mal
        #[arg(long, default_value = "jikan")]
        source: MetadataProvider,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Attach a hype score to every collected title
    Hype {
        #[arg(long)]
        delay_ms: Option<u64>,
        #[arg(long)]
        max_threads: Option<usize>,
    },
    /// Simulate user ratings from mean scores and hype
    Ratings {
        #[arg(long)]
        users: Option<u32>,
        #[arg(long)]
        min_ratings: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Train the latent-factor model on the simulated ratings
    Train,
    /// Run every stage in order
    Run {
        #[arg(long, default_value = "jikan")]
        source: MetadataProvider,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Collect { .. } => "collect",
            Commands::Hype { .. } => "hype",
            Commands::Ratings { .. } => "ratings",
            Commands::Train => "train",
            Commands::Run { .. } => "run",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    let span = tracing::info_span!("pipeline", run_id = %Uuid::new_v4(), command = cli.command.name());
    execute(cli.command, &mut config).instrument(span).await
}

async fn execute(command: Commands, config: &mut Config) -> anyhow::Result<()> {
    match command {
        Commands::Collect { source, limit } => {
            if let Some(limit) = limit {
                config.anime_limit = limit;
            }
            collect(source, config).await
        }
        Commands::Hype {
            delay_ms,
            max_threads,
        } => {
            if let Some(delay_ms) = delay_ms {
                config.hype_delay_ms = delay_ms;
            }
            if let Some(max_threads) = max_threads {
                config.hype_max_threads = max_threads;
            }
            hype(config).await
        }
        Commands::Ratings {
            users,
            min_ratings,
            seed,
        } => {
            if let Some(users) = users {
                config.num_users = users;
            }
            if let Some(min_ratings) = min_ratings {
                config.min_ratings = min_ratings;
            }
            if seed.is_some() {
                config.rating_seed = seed;
            }
            ratings(config)
        }
        Commands::Train => train(config),
        Commands::Run { source } => {
            collect(source, config).await?;
            hype(config).await?;
            ratings(config)?;
            train(config)
        }
    }
}

async fn collect(provider: MetadataProvider, config: &Config) -> anyhow::Result<()> {
    let source = providers::metadata_source(provider, config)
        .context("Failed to build metadata source")?;
    let records = pipeline::collect(source.as_ref(), config.anime_limit, &DataPaths::from_config(config))
        .await
        .context("Collection failed")?;

    if records.is_empty() {
        anyhow::bail!("Could not collect anime data from {}", source.name());
    }
    tracing::info!(titles = records.len(), "Collection complete");
    Ok(())
}

async fn hype(config: &Config) -> anyhow::Result<()> {
    let source: Arc<dyn providers::DiscussionSource> = Arc::from(providers::discussion_source(config));
    let scorer: Arc<dyn SentimentScorer> = Arc::new(VaderScorer::new());
    let aggregator = HypeAggregator::new(source, scorer, HypeConfig::from_config(config));

    pipeline::enrich(&aggregator, &DataPaths::from_config(config))
        .await
        .context("Hype analysis failed")?;
    Ok(())
}

fn ratings(config: &Config) -> anyhow::Result<()> {
    let ratings = pipeline::generate_ratings(
        &RatingConfig::from_config(config),
        &DataPaths::from_config(config),
    )
    .context("Rating simulation failed")?;

    tracing::info!(ratings = ratings.len(), "Synthetic ratings saved");
    Ok(())
}

fn train(config: &Config) -> anyhow::Result<()> {
    let model = pipeline::train_model(&TrainingConfig::default(), &DataPaths::from_config(config))
        .context("Model training failed")?;

    tracing::info!(
        users = model.num_users(),
        items = model.num_items(),
        "Model and hype mapping saved"
    );
    Ok(())
}
