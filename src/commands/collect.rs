//! `netsight collect`: take a snapshot of this machine and print it.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;

use crate::config;
use crate::domain::collector::{Category, CollectRequest, Collector};
use crate::domain::runner::SystemRunner;
use crate::domain::snapshot::{LinkStatus, Risk, Snapshot};

pub fn run(
    category: &str,
    traceroute: bool,
    format: &str,
    config_path: Option<&Path>,
) -> Result<()> {
    let cfg = config::load(config_path)?;
    super::init_cli_logging("warn");

    let category: Category = category.parse()?;
    let request = CollectRequest {
        category,
        traceroute: traceroute.then_some(true),
    };

    let rt = tokio::runtime::Runtime::new()?;
    let snapshot = rt.block_on(async {
        let collector = Collector::new(Arc::new(SystemRunner), cfg.collector);
        collector.collect(&request).await
    })?;

    super::print_output(format, &snapshot, print_table)
}

fn fmt_bytes(bytes: u64) -> String {
    if bytes >= 1_099_511_627_776 {
        format!("{:.1} TB", bytes as f64 / 1_099_511_627_776.0)
    } else if bytes >= 1_073_741_824 {
        format!("{:.1} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

fn fmt_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", fmt_bytes(bytes_per_sec.max(0.0) as u64))
}

fn fmt_latency(ms: f64) -> String {
    if ms >= 999.0 {
        "unreachable".red().to_string()
    } else {
        format!("{:.1} ms", ms)
    }
}

pub fn print_table(snapshot: &Snapshot) {
    println!("{}", "═══ Network Snapshot ═══".cyan().bold());
    println!("  Taken:         {}", snapshot.timestamp.to_rfc3339());
    println!();

    if let Some(host) = &snapshot.mac_info {
        println!("{}", "── Host ──".yellow());
        println!("  Hostname:      {}", host.hostname.bold());
        println!("  macOS:         {}", host.os_version);
        println!("  Chip:          {}", host.chip_info);
        println!("  Uptime:        {}", host.uptime);
        println!(
            "  Battery:       {}%{}",
            host.battery.percentage,
            if host.battery.charging { " (charging)" } else { "" }
        );
        println!();
    }

    if let Some(perf) = &snapshot.performance {
        println!("{}", "── Performance ──".yellow());
        println!("  CPU:           {:.1}%", perf.cpu);
        println!(
            "  Memory:        {:.1}% ({:.2} / {:.2} GB)",
            perf.memory.percentage, perf.memory.used, perf.memory.total
        );
        if !perf.jitter.is_empty() {
            let jitter: Vec<String> = perf.jitter.iter().map(|j| format!("{:.1}", j)).collect();
            println!("  Jitter (ms):   {}", jitter.join(", "));
        }
        println!();
    }

    if let Some(interfaces) = &snapshot.interfaces {
        println!("{}", "── Interfaces ──".yellow());
        for iface in interfaces {
            let status = match iface.status {
                LinkStatus::Active => "active".green(),
                LinkStatus::Inactive => "inactive".dimmed(),
                LinkStatus::Connecting => "connecting".yellow(),
            };
            println!(
                "  {:<10} {:<10} {:<16} {:<18} {}",
                iface.name.bold(),
                status,
                iface.ip,
                iface.mac,
                iface.description.dimmed()
            );
        }
        println!();
    }

    if let Some(traffic) = &snapshot.traffic {
        println!("{}", "── Traffic ──".yellow());
        println!(
            "  Upload:        {}  (total {})",
            fmt_rate(traffic.upload),
            fmt_bytes(traffic.total.upload)
        );
        println!(
            "  Download:      {}  (total {})",
            fmt_rate(traffic.download),
            fmt_bytes(traffic.total.download)
        );
        println!();
    }

    if let Some(security) = &snapshot.security {
        println!("{}", "── Security ──".yellow());
        let fw = &security.firewall;
        println!(
            "  Firewall:      {}  stealth={} block_all={} rules={}",
            if fw.enabled { "on".green() } else { "off".red() },
            fw.stealth_mode,
            fw.block_all,
            fw.rules
        );
        println!("  VPN:           {}", if security.vpn { "active" } else { "none" });
        println!("  Threats:       {}", security.threats);
        for port in &security.ports {
            let risk = match port.risk {
                Risk::High => "high".red(),
                Risk::Medium => "medium".yellow(),
                Risk::Low => "low".green(),
            };
            println!(
                "    {:>5}  {:<14} {:<16} {:<8} {}",
                port.port, port.service, port.process, port.user, risk
            );
        }
        for conn in &security.suspicious_connections {
            println!("    {} → {} ({})", conn.local, conn.foreign.red(), conn.state);
        }
        println!();
    }

    if let Some(routes) = &snapshot.routes {
        println!("{}", "── Routes ──".yellow());
        for gw in &routes.default_gateways {
            println!(
                "  default via {:<20} {:<8} {}  loss {:.0}%  {}",
                gw.gateway,
                gw.interface,
                fmt_latency(gw.latency.unwrap_or(999.0)),
                gw.loss.unwrap_or(100.0),
                gw.hostname.as_deref().unwrap_or("").dimmed()
            );
        }
        for route in &routes.routes {
            println!(
                "  {:<24} {:<24} {:<8} {}",
                route.destination, route.gateway, route.flags, route.interface
            );
        }
        if !routes.traceroute.is_empty() {
            println!("  {}", "traceroute:".dimmed());
            for hop in &routes.traceroute {
                println!(
                    "  {:>3}  {:<32} {:<16} {}",
                    hop.number,
                    hop.hostname,
                    hop.ip,
                    hop.latency.map(fmt_latency).unwrap_or_else(|| "*".into())
                );
            }
        }
        println!();
    }

    if let Some(ping) = &snapshot.ping {
        println!("{}", "── Internet ──".yellow());
        println!("  Latency:       {}", fmt_latency(ping.latency));
        println!("  Loss:          {:.1}%", ping.loss);
        println!();
    }

    if !snapshot.degraded.is_empty() {
        println!("{}", "── Degraded probes ──".red());
        for d in &snapshot.degraded {
            println!("  {:<18} {}", d.probe, d.reason.dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_units() {
        assert_eq!(fmt_bytes(512), "512 B");
        assert_eq!(fmt_bytes(2048), "2.0 KB");
        assert_eq!(fmt_bytes(5 * 1_048_576), "5.0 MB");
        assert_eq!(fmt_bytes(3 * 1_073_741_824), "3.0 GB");
    }

    #[test]
    fn rates_never_negative() {
        assert_eq!(fmt_rate(-5.0), "0 B/s");
        assert_eq!(fmt_rate(1536.0), "1.5 KB/s");
    }
}
