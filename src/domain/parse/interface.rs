//! `ifconfig` and `netstat -ib` parsing.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::classify::classify_interface;
use crate::domain::snapshot::{InterfaceRecord, LinkStatus, PacketCounters, NOT_AVAILABLE};

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\w+):").unwrap());
static INET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"inet (\d+\.\d+\.\d+\.\d+)").unwrap());
static ETHER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ether ([a-f0-9:]{17})").unwrap());
static STATUS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"status: (\w+)").unwrap());

/// Split ifconfig output into one text block per interface.
///
/// A block starts at every line that does not begin with whitespace.
pub fn split_blocks(output: &str) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    for line in output.lines() {
        let starts_block = line.chars().next().is_some_and(|c| !c.is_whitespace());
        if !starts_block {
            if let Some(block) = blocks.last_mut() {
                block.push('\n');
                block.push_str(line);
                continue;
            }
        }
        if !line.trim().is_empty() {
            blocks.push(line.to_string());
        }
    }
    blocks
}

/// Interface names from block headers, in listing order.
pub fn interface_names(output: &str) -> Vec<String> {
    split_blocks(output)
        .iter()
        .filter_map(|block| NAME_RE.captures(block).map(|c| c[1].to_string()))
        .collect()
}

pub fn parse_ifconfig(output: &str) -> Vec<InterfaceRecord> {
    split_blocks(output)
        .iter()
        .filter_map(|block| parse_block(block))
        .collect()
}

fn parse_block(block: &str) -> Option<InterfaceRecord> {
    let name = NAME_RE.captures(block)?[1].to_string();

    let ip = INET_RE.captures(block).map(|c| c[1].to_string());
    let mac = ETHER_RE.captures(block).map(|c| c[1].to_string());
    let status = match STATUS_RE.captures(block) {
        Some(c) => match &c[1] {
            "active" => LinkStatus::Active,
            "inactive" => LinkStatus::Inactive,
            _ => LinkStatus::Connecting,
        },
        None if ip.is_some() => LinkStatus::Active,
        None => LinkStatus::Inactive,
    };

    let class = classify_interface(&name, block);

    Some(InterfaceRecord {
        name,
        kind: class.kind,
        status,
        ip: ip.unwrap_or_else(|| NOT_AVAILABLE.into()),
        mac: mac.unwrap_or_else(|| NOT_AVAILABLE.into()),
        speed: link_speed(block).to_string(),
        description: class.description,
        purpose: class.purpose,
        packets: PacketCounters::default(),
    })
}

/// Nominal link speed inferred from the media line.
pub fn link_speed(block: &str) -> &'static str {
    if block.contains("1000baseT") {
        "1 Gbps"
    } else if block.contains("100baseTX") {
        "100 Mbps"
    } else if block.contains("10baseT") {
        "10 Mbps"
    } else if block.contains("802.11ax") {
        "1.2 Gbps (802.11ax)"
    } else if block.contains("802.11ac") {
        "866 Mbps (802.11ac)"
    } else if block.contains("802.11n") {
        "300 Mbps (802.11n)"
    } else if block.contains("802.11") {
        "WiFi"
    } else {
        NOT_AVAILABLE
    }
}

/// Per-interface packet and byte counters from `netstat -ib`.
///
/// ```text
/// Name  Mtu   Network       Address            Ipkts Ierrs     Ibytes    Opkts Oerrs     Obytes  Coll
/// en0   1500  <Link#11>     a4:83:e7:2b:4c:1d  81231     0   91234567    60211     0   12345678     0
/// utun0 1380  <Link#16>                            0     0          0        3     0        380     0
/// ```
///
/// Rows without an Address column shift every counter one column left. An
/// interface appears once per address; the largest counters win.
pub fn parse_netstat_ib(output: &str) -> HashMap<String, PacketCounters> {
    let mut counters: HashMap<String, PacketCounters> = HashMap::new();

    for line in output.lines().skip(1) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let offset = match parts.len() {
            n if n >= 11 => 0,
            10 => 1,
            _ => continue,
        };
        let field = |i: usize| -> u64 { parts[i - offset].parse().unwrap_or(0) };

        let row = PacketCounters {
            rx: field(4),
            rx_bytes: field(6),
            tx: field(7),
            tx_bytes: field(9),
        };

        let entry = counters
            .entry(parts[0].trim_end_matches('*').to_string())
            .or_default();
        entry.rx = entry.rx.max(row.rx);
        entry.tx = entry.tx.max(row.tx);
        entry.rx_bytes = entry.rx_bytes.max(row.rx_bytes);
        entry.tx_bytes = entry.tx_bytes.max(row.tx_bytes);
    }

    counters
}
