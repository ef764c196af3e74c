mod config;
mod export;
mod heuristics;
mod jobs;
mod models;
mod retriever;
mod trading;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::AppConfig;
use export::ExportLayout;
use retriever::Retriever;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trading::TradingClient;

#[derive(Parser)]
#[command(name = "listing-scout")]
#[command(about = "Export a seller's active listings and reshape the exported CSV files")]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every active listing with its details and write the raw export
    Fetch {
        /// INI file with an [eBayAPI] section holding IAF_TOKEN
        #[arg(short, long, default_value = "config.ini")]
        config: PathBuf,

        #[arg(short, long, default_value = "ebay_listings.csv")]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ExportLayout::Listing)]
        layout: ExportLayout,

        /// Detail requests in flight at once
        #[arg(long, default_value_t = 8)]
        concurrency: usize,

        /// Also save each detail record as JSON in this directory
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },

    /// Keep only the rows whose id appears in an id list
    Filter {
        #[arg(short, long, default_value = "ebay_listings.csv")]
        input: PathBuf,

        /// One id per line, no header
        #[arg(long, default_value = "items.txt")]
        ids: PathBuf,

        #[arg(short, long, default_value = "filtered_ebay_listings.csv")]
        output: PathBuf,

        /// Key column; the first column when omitted
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Copy columns from a primary file into a secondary file by key
    Merge {
        #[arg(long, default_value = "ebay_listings.csv")]
        primary: PathBuf,

        #[arg(long, default_value = "messed_up.csv")]
        secondary: PathBuf,

        #[arg(short, long, default_value = "combined_listings.csv")]
        output: PathBuf,

        #[arg(short, long, default_value = jobs::ITEM_ID)]
        key: String,

        /// Columns to copy; every shared column when omitted
        #[arg(short, long = "column")]
        columns: Vec<String>,
    },

    /// Empty the given columns on every row
    Redact {
        #[arg(short, long, default_value = "combined_listings.csv")]
        input: PathBuf,

        #[arg(short, long, default_value = "ebay_listings_no_model_size.csv")]
        output: PathBuf,

        #[arg(short, long = "column", default_values_t = jobs::redact::DEFAULT_COLUMNS.map(String::from))]
        columns: Vec<String>,
    },

    /// Convert the listing export to the marketplace inventory layout
    Map {
        #[arg(short, long, default_value = "filtered_ebay_listings.csv")]
        input: PathBuf,

        #[arg(short, long, default_value = "amazon_product_listings.csv")]
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn fetch(
    config_path: PathBuf,
    output: PathBuf,
    layout: ExportLayout,
    concurrency: usize,
    dump_dir: Option<PathBuf>,
) -> Result<()> {
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    let settings = config.retrieval.with_concurrency(concurrency)?;

    info!("🛒 Listing Scout - active listing export");
    info!(endpoint = %config.api.endpoint, concurrency, "Configuration loaded");

    let client = TradingClient::new(config.api)?;
    let retriever = Retriever::new(client, settings);
    let outcomes = retriever.run().await;

    export::export_to_file(&output, &outcomes, layout)?;

    if let Some(dir) = dump_dir {
        export::dump_details(&dir, &outcomes).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Fetch {
            config,
            output,
            layout,
            concurrency,
            dump_dir,
        } => fetch(config, output, layout, concurrency, dump_dir).await,
        Commands::Filter {
            input,
            ids,
            output,
            key,
        } => jobs::filter::run(&input, &ids, &output, key.as_deref()),
        Commands::Merge {
            primary,
            secondary,
            output,
            key,
            columns,
        } => jobs::merge::run(&primary, &secondary, &output, &key, &columns),
        Commands::Redact {
            input,
            output,
            columns,
        } => jobs::redact::run(&input, &output, &columns),
        Commands::Map { input, output } => jobs::schema_map::run(&input, &output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn redact_defaults_to_model_and_size() {
        let cli = Cli::try_parse_from(["listing-scout", "redact"]).unwrap();
        match cli.command {
            Commands::Redact { columns, input, .. } => {
                assert_eq!(columns, vec!["Model", "Size"]);
                assert_eq!(input, PathBuf::from("combined_listings.csv"));
            }
            _ => panic!("expected redact"),
        }
    }

    #[test]
    fn fetch_accepts_layout_and_concurrency() {
        let cli = Cli::try_parse_from([
            "listing-scout",
            "-v",
            "fetch",
            "--layout",
            "detail",
            "--concurrency",
            "2",
            "--dump-dir",
            "raw",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Fetch {
                layout,
                concurrency,
                dump_dir,
                ..
            } => {
                assert_eq!(layout, ExportLayout::Detail);
                assert_eq!(concurrency, 2);
                assert_eq!(dump_dir, Some(PathBuf::from("raw")));
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn merge_collects_repeated_columns() {
        let cli = Cli::try_parse_from(["listing-scout", "merge", "-c", "Title", "-c", "Size"]).unwrap();
        match cli.command {
            Commands::Merge { columns, key, .. } => {
                assert_eq!(columns, vec!["Title", "Size"]);
                assert_eq!(key, "Item ID");
            }
            _ => panic!("expected merge"),
        }
    }
}
