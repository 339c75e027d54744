use anyhow::{Context, Result};
use clap::Args;
use mqtt5_embedded::{BrokerSupervisor, Mqtt5EngineFactory, SupervisorConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, info};

#[derive(Args)]
pub struct RunCommand {
    /// Supervisor configuration file path (JSON format)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Base directory of the broker layout (default: ./mqtt-embedded)
    #[arg(long)]
    pub config_folder: Option<PathBuf>,

    /// TCP bind address used when conf/broker.json does not exist
    #[arg(long, short = 'H', default_value = "0.0.0.0:1883")]
    pub host: String,

    /// Disable message persistence in the data folder
    #[arg(long)]
    pub no_persistence: bool,

    /// Give up on a broker start after this many seconds
    #[arg(long)]
    pub start_timeout: Option<u64>,

    /// Give up on a broker stop after this many seconds
    #[arg(long)]
    pub stop_timeout: Option<u64>,
}

pub async fn execute(cmd: RunCommand) -> Result<()> {
    let config = supervisor_config(&cmd)?;

    let bind_addr: SocketAddr = cmd
        .host
        .parse()
        .with_context(|| format!("Invalid bind address: {}", cmd.host))?;
    let factory = Mqtt5EngineFactory::new()
        .with_bind_address(bind_addr)
        .with_persistence(!cmd.no_persistence);

    let supervisor = BrokerSupervisor::with_factory(config, factory)
        .context("Failed to provision embedded broker")?;
    info!(
        "Broker layout at {}",
        supervisor.layout().base().display()
    );

    supervisor.start().await;
    if !supervisor.is_server_running() {
        anyhow::bail!("Embedded broker did not start: {}", supervisor.status());
    }

    println!("MQTT v5.0 broker running");
    println!("  Data: {}", supervisor.descriptor().data_folder().display());
    println!(
        "  Configuration: {}",
        supervisor.descriptor().configuration_folder().display()
    );
    println!("  Press Ctrl+C to stop");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, stopping broker..."),
        Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
    }

    supervisor.stop().await;
    println!("MQTT broker stopped");
    Ok(())
}

fn supervisor_config(cmd: &RunCommand) -> Result<SupervisorConfig> {
    let mut config = if let Some(path) = &cmd.config {
        debug!("Loading supervisor configuration from: {:?}", path);
        SupervisorConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {path:?}"))?
    } else {
        SupervisorConfig::new()
    };

    if let Some(folder) = &cmd.config_folder {
        config = config.with_config_folder(folder);
    }
    if let Some(secs) = cmd.start_timeout {
        config = config.with_start_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = cmd.stop_timeout {
        config = config.with_stop_timeout(Duration::from_secs(secs));
    }

    config
        .validate()
        .context("Configuration validation failed")?;
    Ok(config)
}
