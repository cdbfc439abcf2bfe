//! Firewall, VPN, listening ports and outbound connections.

use crate::domain::classify::is_tunnel_name;
use crate::domain::outcome::Probe;
use crate::domain::parse::interface::interface_names;
use crate::domain::parse::port::{
    parse_established, parse_lsof_listeners, parse_netstat_listeners,
};
use crate::domain::runner::ToolError;
use crate::domain::snapshot::{FirewallPosture, PortRecord, SuspiciousConnection};

use super::ProbeContext;

const SOCKETFILTERFW: &str = "/usr/libexec/ApplicationFirewall/socketfilterfw";

impl ProbeContext {
    /// Query the application firewall, through `sudo -n` when configured.
    async fn socketfilterfw(&self, flag: &str) -> Result<String, ToolError> {
        if self.config.use_sudo {
            self.run("sudo", &["-n", SOCKETFILTERFW, flag]).await
        } else {
            self.run(SOCKETFILTERFW, &[flag]).await
        }
    }
}

/// Whether the firewall is on: application firewall first, then pf.
pub async fn firewall_enabled(ctx: &ProbeContext) -> Probe<bool> {
    let alf = match ctx.socketfilterfw("--getglobalstate").await {
        Ok(out) => return Probe::Ok(!out.contains("disabled")),
        Err(e) => e,
    };
    match ctx.run("pfctl", &["-s", "info"]).await {
        Ok(out) => Probe::Ok(!out.to_lowercase().contains("disabled")),
        Err(pf) => Probe::degraded(true, format!("{alf}; {pf}")),
    }
}

/// Stealth mode, block-all and rule count.
///
/// The four application-firewall queries run together and each one only
/// affects its own field. pf is consulted only when all four fail.
pub async fn firewall_detail(ctx: &ProbeContext) -> Probe<FirewallPosture> {
    let (global, stealth, block_all, apps) = tokio::join!(
        ctx.socketfilterfw("--getglobalstate"),
        ctx.socketfilterfw("--getstealthmode"),
        ctx.socketfilterfw("--getblockall"),
        ctx.socketfilterfw("--listapps"),
    );

    if global.is_err() && stealth.is_err() && block_all.is_err() && apps.is_err() {
        return pf_detail(ctx).await;
    }

    let default = FirewallPosture::default();
    let mut failures = Vec::new();
    let mut field = |name: &str, result: Result<String, ToolError>| match result {
        Ok(out) => Some(out),
        Err(e) => {
            failures.push(format!("{name}: {e}"));
            None
        }
    };

    let posture = FirewallPosture {
        enabled: field("globalstate", global)
            .map_or(default.enabled, |out| !out.contains("disabled")),
        stealth_mode: field("stealthmode", stealth)
            .map_or(default.stealth_mode, |out| out.contains("enabled")),
        block_all: field("blockall", block_all)
            .map_or(default.block_all, |out| out.contains("enabled")),
        rules: field("listapps", apps).map_or(default.rules, |out| {
            out.lines().filter(|l| l.contains("ALF:")).count() as u32
        }),
    };

    if failures.is_empty() {
        Probe::Ok(posture)
    } else {
        Probe::degraded(posture, failures.join("; "))
    }
}

async fn pf_detail(ctx: &ProbeContext) -> Probe<FirewallPosture> {
    let (info, rules) = tokio::join!(
        ctx.run("pfctl", &["-s", "info"]),
        ctx.run("pfctl", &["-s", "rules"]),
    );
    match (info, rules) {
        (Ok(info), Ok(rules)) => {
            let rule_lines: Vec<&str> = rules
                .lines()
                .filter(|l| !l.trim().is_empty() && !l.contains('@'))
                .collect();
            Probe::Ok(FirewallPosture {
                enabled: !info.to_lowercase().contains("disabled"),
                stealth_mode: rules.contains("block drop all"),
                block_all: rules.contains("block all"),
                rules: rule_lines.len() as u32,
            })
        }
        (Err(e), _) | (_, Err(e)) => {
            Probe::degraded(FirewallPosture::default(), format!("pfctl: {e}"))
        }
    }
}

/// A VPN counts as active when any tunnel-style interface exists.
pub async fn vpn_active(ctx: &ProbeContext) -> Probe<bool> {
    match ctx.run("ifconfig", &["-l"]).await {
        Ok(out) => Probe::Ok(out.split_whitespace().any(is_tunnel_name)),
        Err(list_err) => match ctx.run("ifconfig", &[]).await {
            Ok(out) => Probe::Ok(interface_names(&out).iter().any(|n| is_tunnel_name(n))),
            Err(e) => Probe::degraded(false, format!("{list_err}; {e}")),
        },
    }
}

/// Listening ports from lsof, falling back to netstat when lsof has none.
pub async fn open_ports(ctx: &ProbeContext) -> Probe<Vec<PortRecord>> {
    let limit = ctx.config.port_limit;

    let lsof_err = match ctx.run("lsof", &["-i", "-P", "-n"]).await {
        Ok(out) => {
            let ports = parse_lsof_listeners(&out, limit);
            if !ports.is_empty() {
                return Probe::Ok(ports);
            }
            None
        }
        Err(e) => Some(e),
    };

    match ctx.run("netstat", &["-an"]).await {
        Ok(out) => Probe::Ok(parse_netstat_listeners(&out, limit)),
        Err(e) => match lsof_err {
            // lsof answered with nothing listening; that is a valid result
            None => Probe::Ok(Vec::new()),
            Some(lsof) => Probe::degraded(Vec::new(), format!("{lsof}; {e}")),
        },
    }
}

/// Established connections to addresses outside loopback and private ranges.
pub async fn suspicious_connections(ctx: &ProbeContext) -> Probe<Vec<SuspiciousConnection>> {
    match ctx.run("netstat", &["-an"]).await {
        Ok(out) => Probe::Ok(parse_established(&out, ctx.config.suspicious_limit)),
        Err(e) => Probe::degraded(Vec::new(), e.to_string()),
    }
}
