//! weathervane - historical weather tool server
//!
//! Subcommands:
//! - `weathervane serve` - Run the SSE tool server
//! - `weathervane config` - Print the effective configuration and its sources
//! - `weathervane tools` - Print the advertised tool descriptors as JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vaneconf::VaneConfig;
use weathervane::{serve, telemetry};

#[derive(Parser)]
#[command(name = "weathervane")]
#[command(about = "Historical weather tools over server-sent events")]
#[command(version)]
struct Cli {
    /// Config file, replacing ./weathervane.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tool server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(short, long)]
        port: Option<u16>,

        /// OTLP gRPC endpoint for OpenTelemetry (e.g., "localhost:4317")
        #[arg(long)]
        otlp_endpoint: Option<String>,

        /// Upper bound on one tool call, in seconds
        #[arg(long)]
        tool_timeout_secs: Option<u64>,
    },

    /// Print the effective configuration
    Config,

    /// Print tool descriptors as JSON
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = VaneConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            otlp_endpoint,
            tool_timeout_secs,
        } => {
            if let Some(host) = host {
                config.bind.host = host;
            }
            if let Some(port) = port {
                config.bind.port = port;
            }
            if otlp_endpoint.is_some() {
                config.telemetry.otlp_endpoint = otlp_endpoint;
            }
            if tool_timeout_secs.is_some() {
                config.transport.tool_timeout_secs = tool_timeout_secs;
            }

            let telemetry = telemetry::init(&config.telemetry)?;
            for path in &sources.files {
                tracing::info!(path = %path.display(), "Loaded config file");
            }

            let result = serve::run(config).await;
            telemetry.shutdown();
            result?;
        }
        Commands::Config => {
            println!("# Files:");
            if sources.files.is_empty() {
                println!("#   (none, compiled defaults)");
            }
            for path in &sources.files {
                println!("#   {}", path.display());
            }
            if !sources.env_overrides.is_empty() {
                println!("# Environment: {}", sources.env_overrides.join(", "));
            }
            println!();
            print!("{}", config.to_toml()?);
        }
        Commands::Tools => {
            let (_, state) = serve::app(&config)?;
            println!("{}", serde_json::to_string_pretty(&state.tools[..])?);
        }
    }

    Ok(())
}
