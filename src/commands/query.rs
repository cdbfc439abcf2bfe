//! `netsight query`: fetch a snapshot from a running daemon.

use anyhow::Result;
use clap::Subcommand;

use crate::api::DaemonHealth;
use crate::client::NetsightClient;
use crate::domain::collector::Category;

#[derive(Subcommand)]
pub enum QueryCommands {
    /// Daemon health and degradation counters
    Health,
    /// Network status snapshot
    Status {
        /// performance, interfaces, security, routes or all
        #[arg(long, default_value = "all")]
        category: String,

        /// Ask the daemon to run a traceroute
        #[arg(long)]
        traceroute: bool,
    },
}

pub fn run(url: &str, format: &str, command: &QueryCommands) -> Result<()> {
    super::init_cli_logging("warn");
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(url, format, command))
}

async fn run_async(url: &str, format: &str, command: &QueryCommands) -> Result<()> {
    let client = NetsightClient::new(url)?;

    match command {
        QueryCommands::Health => {
            let data = client.health().await?;
            super::print_output(format, &data, print_health)
        }
        QueryCommands::Status {
            category,
            traceroute,
        } => {
            let category: Category = category.parse()?;
            let data = client
                .network_status(category, traceroute.then_some(true))
                .await?;
            super::print_output(format, &data, super::collect::print_table)
        }
    }
}

fn print_health(health: &DaemonHealth) {
    println!("  Version:       {}", health.version);
    println!("  Uptime:        {}", fmt_uptime(health.uptime_secs));
    if health.degradations.is_empty() {
        println!("  Degradations:  none");
    } else {
        println!("  Degradations:");
        for d in &health.degradations {
            println!("    {:<18} {}", d.probe, d.count);
        }
    }
}

fn fmt_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let mins = (secs % 3600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, mins)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formatting() {
        assert_eq!(fmt_uptime(59), "0m");
        assert_eq!(fmt_uptime(3_660), "1h 1m");
        assert_eq!(fmt_uptime(90_000), "1d 1h 0m");
    }
}
