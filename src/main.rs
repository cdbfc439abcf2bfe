mod api;
mod client;
mod commands;
mod config;
mod domain;
mod server;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "netsight", version, about = "macOS network and security telemetry collector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a snapshot of this machine and print it
    Collect {
        /// performance, interfaces, security, routes or all
        #[arg(long, default_value = "all")]
        category: String,

        /// Include a traceroute to the ping target
        #[arg(long)]
        traceroute: bool,

        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,

        /// Path to config file (default: ~/.config/netsight/config.yaml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the netsight daemon (REST + GraphQL)
    Daemon {
        /// HTTP listen address (overrides config)
        #[arg(long)]
        http_addr: Option<String>,

        /// Log level (overrides config)
        #[arg(long)]
        log_level: Option<String>,

        /// Path to config file (default: ~/.config/netsight/config.yaml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Query a netsight daemon's REST API
    Query {
        /// Daemon base URL
        #[arg(long, global = true, default_value = client::DEFAULT_BASE_URL)]
        url: String,

        /// Output format (table or json)
        #[arg(long, global = true, default_value = "table")]
        format: String,

        #[command(subcommand)]
        command: commands::query::QueryCommands,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            category,
            traceroute,
            format,
            config,
        } => commands::collect::run(&category, traceroute, &format, config.as_deref()),
        Commands::Daemon {
            http_addr,
            log_level,
            config,
        } => commands::daemon::run(http_addr, log_level, config.as_deref()),
        Commands::Query {
            url,
            format,
            command,
        } => commands::query::run(&url, &format, &command),
    }
}
