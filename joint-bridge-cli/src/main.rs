//! CLI entry point for joint-bridge

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use joint_bridge_core::bus::{LocalBus, OutboundSink};
use joint_bridge_core::config::{Config, ConfigLoader};
use joint_bridge_core::logging::init_logging;
use joint_bridge_core::peer::{LinePeerReader, LinePeerWriter};
use joint_bridge_core::Bridge;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "joint-bridge")]
#[command(about = "Bridge joint values between the console and a pub/sub bus")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge with stdin/stdout as the peer
    Run {
        /// Republish every outbound message on the inbound topic
        #[arg(long)]
        loopback: bool,
        /// Log bridge statistics every N seconds (0 disables)
        #[arg(long, default_value_t = 0)]
        stats_secs: u64,
    },
    /// Print the effective configuration
    Config,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    match cli.command {
        Commands::Run {
            loopback,
            stats_secs,
        } => run_bridge(&config_loader, loopback, stats_secs).await?,
        Commands::Config => show_config(&config_loader)?,
        Commands::Init { force } => run_init(&config_loader, force)?,
    }

    Ok(())
}

async fn run_bridge(loader: &ConfigLoader, loopback: bool, stats_secs: u64) -> Result<()> {
    let config = loader.load().context("failed to load configuration")?;
    let _log_guard = init_logging(&config.logging);

    let bus = LocalBus::new();
    bus.subscribe_fn(config.topics.outbound.clone(), |msg| {
        match serde_json::to_string(msg) {
            Ok(json) => info!(target: "joint_bridge::publish", "{}", json),
            Err(e) => warn!("Failed to serialize published message: {}", e),
        }
    });
    if loopback {
        info!(
            "Loopback enabled: {} -> {}",
            config.topics.outbound, config.topics.inbound
        );
        let relay = bus.clone();
        let inbound = config.topics.inbound.clone();
        bus.subscribe_fn(config.topics.outbound.clone(), move |msg| {
            if let Err(e) = relay.publish(&inbound, msg.clone()) {
                warn!("Loopback publish failed: {}", e);
            }
        });
    }

    let mut reader = LinePeerReader::new(BufReader::new(io::stdin()));
    if config.peer.echo_prompt {
        reader = reader.with_prompt(config.peer.prompt.clone(), io::stdout());
    }
    let writer = LinePeerWriter::new(io::stdout()).with_prefix(config.peer.output_prefix.clone());

    let running = Bridge::from_config(&config).start(reader, writer, &bus, bus.clone())?;
    info!("Bridge running, press Ctrl-C to stop");

    let mut stats_tick = tokio::time::interval(Duration::from_secs(stats_secs.max(1)));
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                break;
            }
            _ = stats_tick.tick(), if stats_secs > 0 => {
                let stats = running.stats();
                info!(
                    alive = ?running.alive_workers(),
                    "Bridge stats: {}",
                    serde_json::to_string(&stats)?
                );
            }
        }
    }

    tokio::task::spawn_blocking(move || running.shutdown()).await??;
    Ok(())
}

fn show_config(loader: &ConfigLoader) -> Result<()> {
    let config = loader.load().context("failed to load configuration")?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn run_init(loader: &ConfigLoader, force: bool) -> Result<()> {
    let path = loader.config_path();
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists, use --force to overwrite",
            path.display()
        );
    }
    loader.save(&Config::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}
