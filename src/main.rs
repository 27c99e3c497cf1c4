use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use filegate::commands;

#[derive(Parser)]
#[command(name = "filegate", version, about = "Access grants and upload tickets for stored files")]
struct Cli {
    /// Path to filegate.toml (defaults to ./filegate.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Override [server].port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Remove expired pending uploads, files and grants
    Sweep {
        /// Sweep through this server (e.g. http://127.0.0.1:3940) instead of
        /// the one in [server]
        #[arg(long)]
        server: Option<String>,
    },
    /// Print an endpoint URL built from base, prefix and endpoint
    Url {
        base_url: String,
        path_prefix: String,
        endpoint: String,
    },
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    commands::init_tracing(cli.json);

    let config = cli.config.as_deref();
    match cli.command {
        Command::Serve { port } => commands::serve::execute(config, port).await,
        Command::Sweep { server } => commands::sweep::execute(config, server.as_deref()).await,
        Command::Url {
            base_url,
            path_prefix,
            endpoint,
        } => {
            commands::url::execute(&base_url, &path_prefix, &endpoint);
            Ok(())
        },
        Command::Config => commands::show_config::execute(config),
    }
}
