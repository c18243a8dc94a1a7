use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use cardlink_bridge::mock::MockPlatform;
use cardlink_bridge::{BridgeConfig, CardBridge, PendingResponse};
use cardlink_core::GenericValue;
use cardlink_hardware::{AdapterBroadcast, AdapterState};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cardlink", version, about = "Card reader bridge driver (mock host)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Bridge configuration file (JSON). Missing fields take defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print adapter support and enablement.
    Status,

    /// Scan the presented card.
    Scan,

    /// Create a wallet on a card.
    CreateWallet {
        #[arg(long)]
        cid: String,
    },

    /// Purge the wallet on a card.
    PurgeWallet {
        #[arg(long)]
        cid: String,
    },

    /// Sign hex-encoded hashes. Can be repeated; order is kept.
    Sign {
        #[arg(long)]
        cid: String,

        #[arg(long = "hash", required = true)]
        hashes: Vec<String>,
    },

    /// Change an access code. An empty pin clears it.
    ChangePin {
        #[arg(long)]
        cid: String,

        #[arg(long, default_value = "")]
        pin: String,

        #[arg(long, value_enum, default_value_t = PinSlot::First)]
        slot: PinSlot,
    },

    /// Walk the session through a host lifecycle and print each step.
    Simulate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PinSlot {
    First,
    Second,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("cardlink_cli=debug,cardlink_bridge=debug,cardlink_hardware=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(cli.config.as_deref())?;
    let platform = Arc::new(MockPlatform::new());
    let bridge = CardBridge::new(platform.clone(), config);

    let result = match cli.command {
        Commands::Status => {
            print_value(&bridge.hardware_status().to_value())?;
            Ok(())
        }
        Commands::Scan => run(&bridge, bridge.scan_card()).await,
        Commands::CreateWallet { cid } => run(&bridge, bridge.create_wallet(cid)).await,
        Commands::PurgeWallet { cid } => run(&bridge, bridge.purge_wallet(cid)).await,
        Commands::Sign { cid, hashes } => run(&bridge, bridge.sign(cid, &hashes)).await,
        Commands::ChangePin { cid, pin, slot } => {
            let pending = match slot {
                PinSlot::First => bridge.change_pin1(cid, &pin),
                PinSlot::Second => bridge.change_pin2(cid, &pin),
            };
            run(&bridge, pending).await
        }
        Commands::Simulate => simulate(&bridge, &platform).await,
    };

    bridge.shutdown().await;
    result
}

fn load_config(path: Option<&std::path::Path>) -> Result<BridgeConfig> {
    let Some(path) = path else {
        return Ok(BridgeConfig::default());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    BridgeConfig::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Await one command and print its result.
async fn run(bridge: &CardBridge, pending: PendingResponse) -> Result<()> {
    let kind = pending.kind();
    info!(%kind, id = %pending.id(), "Invocation issued");

    match pending.await {
        Ok(value) => print_value(&value)?,
        Err(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            bail!("{kind} failed: {record}");
        }
    }

    info!(state = %bridge.snapshot().state, "Done");
    Ok(())
}

async fn simulate(bridge: &CardBridge, platform: &MockPlatform) -> Result<()> {
    let mut events = bridge.subscribe();

    expect_null(bridge.start_session().await)?;
    println!("started: {:?}", bridge.snapshot());

    bridge.on_host_pause()?;
    println!("paused: {:?}", bridge.snapshot());

    bridge.on_host_resume()?;
    println!("resumed: {:?}", bridge.snapshot());

    if let Some(context) = platform.context() {
        context.destroy();
    }
    platform.set_context(2);
    bridge.on_host_resume()?;
    println!("rebuilt: {:?}", bridge.snapshot());

    bridge.publish_adapter_broadcast(&AdapterBroadcast::state_changed(AdapterState::Off));
    let event = events.recv().await?;
    print_value(&event.to_value())?;

    bridge.on_host_destroy();
    println!("destroyed: {:?}", bridge.snapshot());

    for transition in bridge.history() {
        println!("{} {} -> {}", transition.at.to_rfc3339(), transition.from, transition.to);
    }
    Ok(())
}

fn expect_null(outcome: cardlink_bridge::Outcome) -> Result<()> {
    match outcome {
        Ok(GenericValue::Null) => Ok(()),
        Ok(other) => bail!("Unexpected session result: {other:?}"),
        Err(record) => bail!("Session request failed: {record}"),
    }
}

fn print_value(value: &GenericValue) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    Ok(())
}
