use anyhow::{Context, Result};
use clap::Args;
use mqtt5_embedded::{BrokerLayout, Mqtt5EngineFactory};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Args)]
pub struct ProvisionCommand {
    /// Base directory of the broker layout (default: ./mqtt-embedded)
    #[arg(long)]
    pub config_folder: Option<PathBuf>,

    /// Also write a default conf/broker.json if none exists
    #[arg(long)]
    pub write_config: bool,

    /// Bind address recorded in a newly written broker.json
    #[arg(long, short = 'H', default_value = "0.0.0.0:1883")]
    pub host: String,
}

pub fn execute(cmd: &ProvisionCommand) -> Result<()> {
    let layout = BrokerLayout::resolve(cmd.config_folder.as_deref());
    layout
        .provision()
        .context("Failed to provision broker directories")?;

    for dir in layout.dirs() {
        println!("{}", dir.display());
    }

    if cmd.write_config {
        let bind_addr: SocketAddr = cmd
            .host
            .parse()
            .with_context(|| format!("Invalid bind address: {}", cmd.host))?;
        let path = Mqtt5EngineFactory::new()
            .with_bind_address(bind_addr)
            .write_default_config(&layout)
            .context("Failed to write broker configuration")?;
        println!("{}", path.display());
    }

    Ok(())
}
