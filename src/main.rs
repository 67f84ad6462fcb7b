//! CoText - Collaborative Text Editor Client
//!
//! Terminal front end for the CoText client transport: connects to a
//! server and prints the frames it pushes.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cotext::config::{self, Config};
use cotext::network::{Client, MessageHandler};
use cotext::protocol::{self, Message, MessageStatus, MessageType};

/// CoText - Collaborative text editing from the terminal
#[derive(Parser)]
#[command(name = "cotext")]
#[command(author = "CoText Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Connect to a CoText server", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a server and print received frames
    Connect {
        /// Server host, or "host:port"
        #[arg(short, long)]
        server: Option<String>,

        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Request the document list after connecting
        #[arg(short, long)]
        list: bool,
    },

    /// Show current configuration
    Config {
        /// Generate sample configuration
        #[arg(long)]
        generate: bool,

        /// Output path for generated config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show protocol information
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default().unwrap_or_default()
    };

    match cli.command {
        Commands::Connect { server, port, list } => {
            run_connect(config, server, port, list).await?;
        }
        Commands::Config { generate, output } => {
            if generate {
                let sample = config::generate_sample_config();
                if let Some(path) = output {
                    std::fs::write(&path, &sample)?;
                    println!("Configuration written to: {}", path.display());
                } else {
                    println!("{}", sample);
                }
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        Commands::Info => {
            print_protocol_info();
        }
    }

    Ok(())
}

/// Prints received frames to stdout
struct FramePrinter;

impl MessageHandler for FramePrinter {
    fn handle(&self, message: &Message) {
        match message.kind {
            MessageType::DocList => {
                println!("Documents on server:");
                for name in message.document_names() {
                    println!("  - {}", name);
                }
            }
            MessageType::UserJoin => {
                println!("* {} joined (user {})", message.name, message.id);
            }
            MessageType::UserQuit => {
                println!("* user {} left", message.id);
            }
            _ => match message.status {
                Some(status) => println!("<- {:?} [{:?}]", message.kind, status),
                None => println!("<- {:?}", message.kind),
            },
        }
    }
}

/// Connect and print frames until the server closes or Ctrl+C
async fn run_connect(
    config: Config,
    server: Option<String>,
    port: Option<u16>,
    list: bool,
) -> anyhow::Result<()> {
    let mut net_config = config.network_settings();
    if let Some(server) = server {
        if let Some((host, port)) = split_host_port(&server) {
            net_config.host = host;
            net_config.port = port;
        } else {
            net_config.host = server;
        }
    }
    if let Some(port) = port {
        net_config.port = port;
    }

    tracing::info!("Starting CoText client as '{}'", config.general.username);

    let mut client = Client::new(net_config);
    client.add_handler(Arc::new(FramePrinter));

    println!("Connecting to {}...", client.config().address());
    client.connect().await?;

    println!("\n========================================");
    println!("  CoText Client Connected");
    println!("========================================");
    println!("  User:   {}", config.general.username);
    println!("  Server: {}", client.config().address());
    println!("========================================");
    println!("\nPress Ctrl+C to disconnect.\n");

    if list {
        client.send(&Message::doc_list()).await?;
    }

    // Main event loop
    loop {
        tokio::select! {
            result = client.receive_once() => {
                if let Err(e) = result {
                    tracing::error!("Receive failed: {}", e);
                }
                if !client.is_connected() {
                    println!("Connection closed.");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nDisconnecting...");
                break;
            }
        }
    }

    if client.is_connected() {
        client.disconnect().await?;
    }
    tracing::info!("Client stopped");

    Ok(())
}

/// Split "host:port" when the suffix is a valid port number
fn split_host_port(server: &str) -> Option<(String, u16)> {
    let (host, port) = server.rsplit_once(':')?;
    let port = port.parse().ok()?;
    Some((host.to_string(), port))
}

/// Print protocol information
fn print_protocol_info() {
    println!("CoText Protocol Information");
    println!("===========================\n");

    println!("Default Port: {}", protocol::DEFAULT_PORT);
    println!(
        "Field widths: document name {} bytes, user name {} bytes, hash {} bytes",
        protocol::DOC_NAME_LEN,
        protocol::USER_NAME_LEN,
        protocol::HASH_LEN
    );

    println!("\nMessage types:");
    for kind in MessageType::ALL {
        println!("  {:>2}  {:?}", kind.tag(), kind);
    }

    println!("\nStatus codes:");
    for status in MessageStatus::ALL {
        println!("  {:>2}  {:?}", status.byte(), status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        // Test that CLI parsing works
        let cli = Cli::try_parse_from(["cotext", "info"]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from(["cotext", "connect", "--server", "example.org", "--list"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(
            split_host_port("example.org:9000"),
            Some(("example.org".to_string(), 9000))
        );
        assert_eq!(split_host_port("example.org"), None);
        assert_eq!(split_host_port("example.org:editor"), None);
    }
}
