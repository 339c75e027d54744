use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mqtt5-embedded")]
#[command(about = "Run and provision an embedded MQTT v5.0 broker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the embedded broker and stop it on Ctrl+C
    Run(commands::run_cmd::RunCommand),
    /// Create the broker directory layout without starting it
    Provision(commands::provision_cmd::ProvisionCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(&cli))
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Run(cmd) => commands::run_cmd::execute(cmd).await,
        Commands::Provision(cmd) => commands::provision_cmd::execute(&cmd),
    }
}

fn log_level(cli: &Cli) -> tracing::Level {
    if cli.debug {
        tracing::Level::DEBUG
    } else if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::ERROR
    }
}
