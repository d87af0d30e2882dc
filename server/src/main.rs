use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;

use config::Config;
use dataset::TurbineDataset;
use error_log::ErrorLog;
use geocoder::NominatimGeocoder;
use locator::Locator;
use projection::Transformer;

mod cli;
mod config;
mod dataset;
mod error;
mod error_log;
mod geocoder;
mod locator;
mod models;
mod nearest;
mod projection;
mod server;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Cli::parse();

    if let Err(e) = exec(args).await {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn exec(args: Cli) -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    let locator = build_locator(&config)?;

    match args.cmd {
        Command::Http { address } => {
            if let Err(e) = config.dataset.source() {
                log::warn!("Turbine dataset is not configured, lookups will fail: {}", e);
            }
            server::run(address, Arc::new(locator), config.service.static_dir).await;
        }
        Command::Locate { address } => {
            let address = address.join(" ");
            match locator.locate(Some(&address)).await {
                Ok(response) => println!("{}", serde_json::to_string_pretty(&response)?),
                Err(failure) => {
                    println!("{}", serde_json::to_string_pretty(&failure.body())?);
                    anyhow::bail!("{} ({})", failure.public, failure.detail);
                }
            }
        }
        Command::Check => {
            let records = locator.dataset().load().await?;
            println!("{} turbines loaded", records.len());
        }
    }
    Ok(())
}

fn build_locator(config: &Config) -> anyhow::Result<Locator<NominatimGeocoder>> {
    let transformer = Arc::new(Transformer::new(
        config.service.geographic_crs,
        config.service.planar_crs,
    )?);
    log::info!("Projection {}", transformer.describe());

    let geocoder = NominatimGeocoder::new(&config.geocoder)?;
    let dataset = TurbineDataset::new(config.dataset.clone(), transformer.clone());
    let error_log = ErrorLog::new(&config.service.error_log_path);
    log::info!("Recording failures to {}", error_log.path().display());

    Ok(Locator::new(geocoder, transformer, dataset, error_log))
}
