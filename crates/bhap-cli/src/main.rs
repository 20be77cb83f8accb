use anyhow::{Context, Result};
use bhap_cli::cli::Cli;
use bhap_cli::container::RuntimeConfig;
use bhap_telemetry::init_telemetry;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = bhap_cli::apply_flags(RuntimeConfig::from_env(), &cli);
    let _telemetry =
        init_telemetry(config.telemetry.clone()).context("initializing logging")?;
    config.validate().context("invalid configuration")?;

    let output = bhap_cli::run(&config, cli.command).await?;
    println!("{output}");
    Ok(())
}
