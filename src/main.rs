use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use massmint::batch::Coordinator;
use massmint::config::Config;
use massmint::ledger::{JsonRpcLedger, JsonTxBuilder};
use massmint::signer::Identity;

#[derive(Parser)]
#[command(version, about = "Batch mint/burn orchestrator")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "config/default.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reset the gas pool: merge fragment coins, then split one coin per
    /// discovered supply manager
    Prepare,

    /// Run the full chain: mint across all workers, then burn the created
    /// objects in fixed-size groups
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    info!("loaded configuration from {}", cli.config);

    // Seed phrase and identity: fatal before any work if absent or malformed.
    let phrase = Config::seed_phrase()?;
    let identity = Arc::new(Identity::from_seed_phrase(&phrase)?);
    info!("orchestrator address: {}", identity.address());

    let client = Arc::new(JsonRpcLedger::new(
        config.ledger.endpoint_url.clone(),
        config.ledger.package_id.clone(),
    ));
    let builder = Arc::new(JsonTxBuilder::new(config.package_id()));
    let coordinator = Coordinator::new(client, builder, identity, config);

    match cli.command {
        Command::Prepare => coordinator.prepare().await?,
        Command::Run => {
            let (mint, burn) = coordinator.run().await?;
            info!(
                "run complete: minted {} (of {} attempted), burned {} (of {} attempted)",
                mint.confirmed, mint.attempted, burn.confirmed, burn.attempted
            );
        }
    }

    Ok(())
}
