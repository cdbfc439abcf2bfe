//! Listening-socket and established-connection parsing (`lsof`, `netstat -an`).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::classify::{port_risk, service_name};
use crate::domain::snapshot::{PortRecord, SuspiciousConnection};

static LSOF_COLON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\S+)\s+(\d+)\s+(\S+)\s+.*?:(\d+)\s+.*LISTEN").unwrap()
});
static LSOF_DOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\S+)\s+(\d+)\s+(\S+)\s+.*?\.(\d+)\s+.*LISTEN").unwrap()
});
static NETSTAT_LISTEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*?[.:](\d+)\s+.*LISTEN").unwrap());

const UNKNOWN_OWNER: &str = "unknown";

/// Foreign address prefixes that are never reported as suspicious.
const TRUSTED_PREFIXES: &[&str] = &["127.", "192.168.", "10.", "::1"];

/// Listening sockets from `lsof -i -P -n`.
///
/// ```text
/// COMMAND     PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
/// sshd        301  root    3u  IPv4 0x5e2b3c4d5e6f7a8b      0t0  TCP *:22 (LISTEN)
/// ```
///
/// Ports are deduplicated (first line wins) and the list is capped at `limit`.
pub fn parse_lsof_listeners(output: &str, limit: usize) -> Vec<PortRecord> {
    let mut seen = HashSet::new();
    let mut ports = Vec::new();

    for line in output.lines().filter(|l| l.contains("LISTEN")) {
        let Some(caps) = LSOF_COLON_RE
            .captures(line)
            .or_else(|| LSOF_DOT_RE.captures(line))
        else {
            continue;
        };
        let Ok(port) = caps[4].parse::<u16>() else {
            continue;
        };
        if port == 0 || !seen.insert(port) {
            continue;
        }

        ports.push(PortRecord {
            port,
            service: service_name(port).to_string(),
            status: "open".into(),
            process: caps[1].to_string(),
            pid: caps[2].parse().ok(),
            user: caps[3].to_string(),
            risk: port_risk(port),
        });
    }

    ports.truncate(limit);
    ports
}

/// Listening sockets from `netstat -an`, used when lsof has nothing.
///
/// ```text
/// tcp4       0      0  *.22                   *.*                    LISTEN
/// ```
pub fn parse_netstat_listeners(output: &str, limit: usize) -> Vec<PortRecord> {
    let mut seen = HashSet::new();
    let mut ports = Vec::new();

    for line in output.lines() {
        let Some(caps) = NETSTAT_LISTEN_RE.captures(line) else {
            continue;
        };
        let Ok(port) = caps[1].parse::<u16>() else {
            continue;
        };
        if port == 0 || !seen.insert(port) {
            continue;
        }

        ports.push(PortRecord {
            port,
            service: service_name(port).to_string(),
            status: "open".into(),
            process: UNKNOWN_OWNER.into(),
            pid: None,
            user: UNKNOWN_OWNER.into(),
            risk: port_risk(port),
        });
    }

    ports.truncate(limit);
    ports
}

/// Established connections to hosts outside loopback and private ranges.
///
/// ```text
/// tcp4       0      0  192.168.1.108.52344    52.84.12.7.443         ESTABLISHED
/// ```
pub fn parse_established(output: &str, limit: usize) -> Vec<SuspiciousConnection> {
    output
        .lines()
        .filter(|l| l.contains("ESTABLISHED"))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 5 {
                return None;
            }
            let foreign = parts[4];
            if TRUSTED_PREFIXES.iter().any(|p| foreign.starts_with(p)) {
                return None;
            }
            Some(SuspiciousConnection {
                local: parts[3].to_string(),
                foreign: foreign.to_string(),
                state: parts.get(5).unwrap_or(&"ESTABLISHED").to_string(),
            })
        })
        .take(limit)
        .collect()
}
