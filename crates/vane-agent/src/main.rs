//! vane-agent - ask an LLM about historical weather
//!
//! Subcommands:
//! - `vane-agent ask "<question>"` - One question, one answer
//! - `vane-agent chat` - Line-based conversation
//! - `vane-agent tools` - List the tool server's tools

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use vane::client::{ClientError, ClientOptions, StreamClient};
use vane_agent::{Agent, AgentSettings, Reply};
use vaneconf::VaneConfig;

#[derive(Parser)]
#[command(name = "vane-agent")]
#[command(about = "Weather questions answered with a vane tool server")]
#[command(version)]
struct Cli {
    /// Config file, replacing ./weathervane.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Tool server base URL
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Chat model
    #[arg(long, global = true)]
    model: Option<String>,

    /// Directory for generated charts
    #[arg(long, global = true)]
    image_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question
    Ask {
        /// The question
        question: String,
    },

    /// Interactive chat; `/clear` resets history, `exit` quits
    Chat,

    /// List tools advertised by the server
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = VaneConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.server_url {
        config.agent.server_url = url;
    }
    if let Some(model) = cli.model {
        config.agent.model = model;
    }
    if let Some(dir) = cli.image_dir {
        config.agent.image_dir = dir;
    }

    match cli.command {
        Commands::Tools => list_tools(&config).await,
        Commands::Ask { question } => {
            let mut agent = connect(&config).await?;
            let reply = agent.ask(&question).await?;
            print_reply(&reply);
            Ok(())
        }
        Commands::Chat => {
            let mut agent = connect(&config).await?;
            chat(&mut agent).await
        }
    }
}

async fn connect(config: &VaneConfig) -> Result<Agent> {
    let settings = AgentSettings::from_config(config)?;
    vane_agent::connect(&settings)
        .await
        .with_context(|| format!("Failed to connect to {}", settings.server_url))
}

async fn list_tools(config: &VaneConfig) -> Result<()> {
    let options = ClientOptions {
        stream_path: config.transport.stream_path.clone(),
        message_path: config.transport.message_path.clone(),
        ..ClientOptions::default()
    };
    let client = StreamClient::connect(&config.agent.server_url, options)
        .await
        .with_context(|| format!("Failed to connect to {}", config.agent.server_url))?;

    for tool in client.tools() {
        println!("{}", tool.name);
        println!("    {}", tool.description);
    }
    Ok(())
}

async fn chat(agent: &mut Agent) -> Result<()> {
    println!("Connected (session {}). Type `exit` to quit, `/clear` to reset.", agent.session_id());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            "/clear" => {
                agent.clear_history();
                println!("(history cleared)");
                continue;
            }
            _ => {}
        }

        match agent.ask(line).await {
            Ok(reply) => print_reply(&reply),
            Err(e @ vane_agent::AgentError::ToolServer(ClientError::StreamClosed)) => {
                // The session is gone; nothing more can be answered
                return Err(e.into());
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }
    Ok(())
}

fn print_reply(reply: &Reply) {
    println!("{}", reply.text);
    for path in &reply.images {
        println!("[chart saved to {}]", path.display());
    }
}
