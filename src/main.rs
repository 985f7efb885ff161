pub mod types;
pub mod config;
pub mod error;
pub mod data;
pub mod boundary;
pub mod projection;
pub mod view;
pub mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the risk dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Load the data sources and report coverage without serving
    Check {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let state = load_state(app_config).await?;
            server::start_server(state).await?;
        }
        Commands::Check { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let state = load_state(app_config).await?;
            report(&state);
        }
    }

    Ok(())
}

async fn load_state(app_config: config::AppConfig) -> anyhow::Result<server::AppState> {
    let table = data::load(
        &app_config.input.risk_csv,
        app_config.input.summer_months_only,
    )?;
    let boundary = boundary::load(
        &app_config.input.boundary_url,
        app_config.input.boundary_cache.as_deref(),
    )
    .await?;
    Ok(server::AppState::new(table, boundary, app_config))
}

fn report(state: &server::AppState) {
    let years = state.table.years();
    let codes = state.table.region_codes();

    println!("dataset fingerprint: {}", state.table.fingerprint());
    println!("rows: {}", state.table.records().len());
    println!("regions: {}", codes.len());
    match (years.first(), years.last()) {
        (Some(first), Some(last)) => println!("years: {} ({}..{})", years.len(), first, last),
        _ => println!("years: 0"),
    }
    println!("boundary features: {}", state.boundary.feature_count());

    let matched = codes.len() - state.unmatched_codes.len();
    println!("join coverage: {}/{} regions", matched, codes.len());
    for code in &state.unmatched_codes {
        println!("  no boundary feature for region code {}", code);
    }

    for index in crate::types::RiskIndex::ALL {
        let [lo, hi] = state.ranges.range(index);
        println!("{}: color range [{:.4}, {:.4}]", index.title(), lo, hi);
    }

    info!("check complete");
}
