use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

mod config;
mod constants;
mod datasets;
mod error;
mod loader;
mod logging;
mod pipeline;
mod project;
mod resolver;
mod schema;
mod types;
mod writer;

use crate::config::Config;
use crate::datasets::{HundredLc, TeddiSample};
use crate::pipeline::Pipeline;
use crate::types::CorpusDataset;

#[derive(Parser)]
#[command(name = "corpus_cldf")]
#[command(about = "Converts relational corpus database exports into CLDF datasets")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the raw database exports for the selected datasets
    Download {
        /// Specific datasets to fetch (comma-separated). Available: 100LC, TeDDi_sample
        #[arg(long)]
        datasets: Option<String>,
    },
    /// Convert the raw exports into CLDF tables
    Convert {
        /// Specific datasets to convert (comma-separated)
        #[arg(long)]
        datasets: Option<String>,
    },
    /// Run both download and convert sequentially
    Run {
        /// Specific datasets to run (comma-separated)
        #[arg(long)]
        datasets: Option<String>,
    },
}

fn create_dataset(dataset_id: &str) -> Option<Box<dyn CorpusDataset>> {
    match dataset_id {
        constants::HUNDRED_LC_DATASET => Some(Box::new(HundredLc::new())),
        constants::TEDDI_SAMPLE_DATASET => Some(Box::new(TeddiSample::new())),
        _ => None,
    }
}

fn selected_datasets(datasets: Option<String>) -> Vec<String> {
    if let Some(list) = datasets {
        list.split(',').map(|s| s.trim().to_string()).collect()
    } else {
        constants::get_supported_datasets()
            .into_iter()
            .map(String::from)
            .collect()
    }
}

async fn download_datasets(dataset_ids: &[String], config: &Config) {
    for dataset_id in dataset_ids {
        if let Some(dataset) = create_dataset(dataset_id) {
            println!("📡 Fetching raw data for {}...", dataset_id);
            match dataset.download(&config.raw_dir).await {
                Ok(()) => {
                    info!("Download finished for {}", dataset_id);
                    println!("✅ Raw data for {} is up to date", dataset_id);
                }
                Err(e) => {
                    error!("Download failed for {}: {}", dataset_id, e);
                    println!("❌ Download failed for {}: {}", dataset_id, e);
                }
            }
        } else {
            warn!("Unknown dataset specified");
            println!("⚠️  Unknown dataset: {}", dataset_id);
        }
    }
}

fn convert_datasets(dataset_ids: &[String], config: &Config) {
    for dataset_id in dataset_ids {
        let span = tracing::info_span!("Converting dataset", dataset = %dataset_id);
        let _enter = span.enter();

        if let Some(dataset) = create_dataset(dataset_id) {
            match Pipeline::run_for_dataset(dataset.as_ref(), &config.raw_dir, &config.output_dir) {
                Ok(result) => {
                    info!("Pipeline finished");
                    println!("\n📊 Conversion results for {}:", dataset_id);
                    println!("   Languages: {}", result.stats.languages);
                    println!("   Contributions: {}", result.stats.contributions);
                    println!("   Parameters: {}", result.stats.parameters);
                    println!("   Values: {}", result.stats.values);
                    println!("   Examples: {}", result.stats.examples);
                    println!("   Output dir: {}", result.output_dir.display());
                    for artifact in &result.artifacts {
                        println!(
                            "   {} -> {} rows ({})",
                            artifact.component,
                            artifact.rows,
                            &artifact.sha256[..12]
                        );
                    }
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    println!("❌ Conversion failed for {}: {}", dataset_id, e);
                }
            }
        } else {
            warn!("Unknown dataset specified");
            println!("⚠️  Unknown dataset: {}", dataset_id);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        info!("Using default configuration ({})", e);
        Config::default()
    });

    match cli.command {
        Commands::Download { datasets } => {
            println!("🔄 Running download step...");
            let dataset_ids = selected_datasets(datasets);
            download_datasets(&dataset_ids, &config).await;
        }
        Commands::Convert { datasets } => {
            println!("🔧 Running conversion pipeline...");
            let dataset_ids = selected_datasets(datasets);
            convert_datasets(&dataset_ids, &config);
        }
        Commands::Run { datasets } => {
            println!("🚀 Running full pipeline (download + convert)...");
            let dataset_ids = selected_datasets(datasets);

            println!("\n📥 Step 1: Downloading raw data...");
            download_datasets(&dataset_ids, &config).await;

            println!("\n🔧 Step 2: Converting...");
            convert_datasets(&dataset_ids, &config);
        }
    }
    Ok(())
}
