use clap::Parser;
use eda_harvest::{harvest, HarvestConfig};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eda-harvest")]
#[command(about = "Parser for eda.ru site", long_about = None)]
struct Cli {
    /// Name of the output folder
    #[arg(long)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = HarvestConfig::load()?;

    let summary = harvest(&config, &cli.output).await?;
    info!(
        "Harvest finished: {} recipes written, {} errors",
        summary.recipes, summary.errors
    );

    Ok(())
}
