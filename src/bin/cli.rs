// src/bin/cli.rs

//! techtrend: job vacancy trend harvester CLI.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use techtrend::analysis::HeuristicClassifier;
use techtrend::config::Config;
use techtrend::error::Result;
use techtrend::export::{export_statistics, export_vacancies};
use techtrend::fetch::{HttpFetcher, PageFetcher};
use techtrend::parse::{PageParser, SelectorParser};
use techtrend::pipeline::{run_analysis, run_ingestion, run_pipeline};
use techtrend::storage::SqliteStore;

#[derive(Parser, Debug)]
#[command(
    name = "techtrend",
    version,
    about = "Job vacancy harvester and technology trend miner"
)]
struct Cli {
    #[arg(short, long, default_value = "data/config.toml")]
    config: String,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl configured categories and ingest vacancies
    Crawl {
        /// Override the configured category list, separated by " | "
        #[arg(long)]
        categories: Option<String>,
    },
    /// Compute frequency statistics over the configured window
    Analyze,
    /// Crawl, then analyze
    Pipeline,
    /// Validate the configuration file
    Validate,
    /// Export stored data to CSV
    Export {
        /// Output path for the vacancy CSV
        #[arg(long, default_value = "data/vacancies.csv")]
        vacancies: String,
        /// Output path for the statistics CSV
        #[arg(long, default_value = "data/statistics.csv")]
        statistics: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Crawl { categories } => {
            if let Some(categories) = categories {
                config.crawler.categories = categories;
            }
            config.validate()?;
            let (config, store, fetcher, parser) = wire(config)?;
            run_ingestion(config, store, fetcher, parser).await;
        }
        Command::Analyze => {
            config.validate()?;
            let store = SqliteStore::open(&config.storage.db_path)?;
            run_analysis(&config, &store, &HeuristicClassifier)?;
        }
        Command::Pipeline => {
            config.validate()?;
            let (config, store, fetcher, parser) = wire(config)?;
            run_pipeline(config, store, fetcher, parser, &HeuristicClassifier).await?;
        }
        Command::Validate => {
            config.validate()?;
            SelectorParser::new(&config.selectors)?;
            log::info!("Configuration at '{}' is valid", cli.config);
        }
        Command::Export {
            vacancies,
            statistics,
        } => {
            let store = SqliteStore::open(&config.storage.db_path)?;
            export_vacancies(&store, vacancies)?;
            export_statistics(&store, statistics)?;
        }
    }

    Ok(())
}

type Wired = (
    Arc<Config>,
    Arc<SqliteStore>,
    Arc<dyn PageFetcher>,
    Arc<dyn PageParser>,
);

/// Build the shared collaborators of the crawl paths.
fn wire(config: Config) -> Result<Wired> {
    let store = Arc::new(SqliteStore::open(&config.storage.db_path)?);
    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.crawler)?);
    let parser: Arc<dyn PageParser> = Arc::new(SelectorParser::new(&config.selectors)?);
    Ok((Arc::new(config), store, fetcher, parser))
}
