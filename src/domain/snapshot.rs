//! Snapshot: point-in-time network and security state of this host.
//!
//! Every record is rebuilt from scratch on each collection. Nothing here
//! carries identity across snapshots; interface names are display labels only.

use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for text fields the tool output did not contain.
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder for names that could not be resolved.
pub const UNKNOWN: &str = "Unknown";

/// Latency reported when a host could not be reached.
pub const UNREACHABLE_LATENCY_MS: f64 = 999.0;

/// Loss reported when a host could not be reached.
pub const TOTAL_LOSS_PERCENT: f64 = 100.0;

/// Complete snapshot returned by one `collect()` call.
///
/// Category fields are present only when their category was requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<InterfaceRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<TrafficSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityPosture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<RouteReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping: Option<PingResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[graphql(name = "macInfo")]
    pub mac_info: Option<HostInfo>,
    /// Probes that fell back to a default while building this snapshot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<Degradation>,
    pub timestamp: DateTime<Utc>,
}

/// A probe that returned its documented default instead of live data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct Degradation {
    pub probe: String,
    pub reason: String,
}

// ── Interfaces ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    Wifi,
    Ethernet,
    Loopback,
    Bridge,
    Vpn,
    P2p,
    Lowlatency,
    Tunnel,
    Virtual,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active,
    Inactive,
    Connecting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRecord {
    pub name: String,
    #[serde(rename = "type")]
    #[graphql(name = "type")]
    pub kind: InterfaceKind,
    pub status: LinkStatus,
    pub ip: String,
    pub mac: String,
    pub speed: String,
    pub description: String,
    pub purpose: String,
    pub packets: PacketCounters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct PacketCounters {
    pub rx: u64,
    pub tx: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Bandwidth derived from two byte-counter samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSample {
    /// Bytes per second sent since the previous sample.
    pub upload: f64,
    /// Bytes per second received since the previous sample.
    pub download: f64,
    pub total: TrafficTotals,
}

/// Cumulative bytes across all non-loopback interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct TrafficTotals {
    pub upload: u64,
    pub download: u64,
}

// ── Routes ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    pub destination: String,
    pub gateway: String,
    pub flags: String,
    pub interface: String,
    #[serde(rename = "type")]
    #[graphql(name = "type")]
    pub family: AddressFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl RouteRecord {
    pub fn is_default(&self) -> bool {
        self.destination == "default"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct HopRecord {
    pub number: u32,
    pub hostname: String,
    pub ip: String,
    pub latency: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct RouteReport {
    pub default_gateways: Vec<RouteRecord>,
    pub routes: Vec<RouteRecord>,
    pub traceroute: Vec<HopRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct PingResult {
    pub latency: f64,
    pub loss: f64,
}

impl PingResult {
    pub fn unreachable() -> Self {
        Self {
            latency: UNREACHABLE_LATENCY_MS,
            loss: TOTAL_LOSS_PERCENT,
        }
    }
}

impl Default for PingResult {
    fn default() -> Self {
        Self::unreachable()
    }
}

// ── Security ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct PortRecord {
    pub port: u16,
    pub service: String,
    pub status: String,
    pub process: String,
    pub pid: Option<u32>,
    pub user: String,
    pub risk: Risk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct FirewallPosture {
    pub enabled: bool,
    pub stealth_mode: bool,
    pub block_all: bool,
    pub rules: u32,
}

impl Default for FirewallPosture {
    /// Assume the firewall is on when it cannot be queried.
    fn default() -> Self {
        Self {
            enabled: true,
            stealth_mode: false,
            block_all: false,
            rules: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct SuspiciousConnection {
    pub local: String,
    pub foreign: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPosture {
    pub firewall: FirewallPosture,
    pub vpn: bool,
    pub threats: u32,
    pub ports: Vec<PortRecord>,
    pub suspicious_connections: Vec<SuspiciousConnection>,
}

impl SecurityPosture {
    pub fn new(
        firewall: FirewallPosture,
        vpn: bool,
        ports: Vec<PortRecord>,
        suspicious_connections: Vec<SuspiciousConnection>,
    ) -> Self {
        let high_risk = ports.iter().filter(|p| p.risk == Risk::High).count();
        let threats = (high_risk + suspicious_connections.len()) as u32;
        Self {
            firewall,
            vpn,
            threats,
            ports,
            suspicious_connections,
        }
    }
}

// ── Performance ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct PerformanceSample {
    pub cpu: f64,
    pub memory: MemoryBreakdown,
    pub jitter: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct MemoryBreakdown {
    pub percentage: f64,
    /// Gigabytes in use (active + wired + compressed).
    pub used: f64,
    pub total: f64,
    pub details: MemoryPages,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct MemoryPages {
    pub active: u64,
    pub inactive: u64,
    pub wired: u64,
    pub compressed: u64,
    pub free: u64,
}

// ── Host ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub os_version: String,
    pub chip_info: String,
    pub battery: BatteryInfo,
    pub hostname: String,
    pub uptime: String,
}

impl Default for HostInfo {
    fn default() -> Self {
        Self {
            os_version: UNKNOWN.into(),
            chip_info: UNKNOWN.into(),
            battery: BatteryInfo::default(),
            hostname: UNKNOWN.into(),
            uptime: UNKNOWN.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct BatteryInfo {
    pub percentage: u32,
    pub charging: bool,
    pub time_remaining: u32,
}
