//! Static lookup tables: interface classification, port services, port risk.

use super::snapshot::{InterfaceKind, Risk, UNKNOWN};

/// Medium type and human-readable labels for one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: InterfaceKind,
    pub description: String,
    pub purpose: String,
}

/// One row of the interface decision table.
///
/// `matches` receives the interface name and its full ifconfig block.
pub struct InterfaceRule {
    pub matches: fn(&str, &str) -> bool,
    pub kind: InterfaceKind,
    pub description: &'static str,
    pub purpose: &'static str,
}

fn is_en(name: &str) -> bool {
    name.starts_with("en")
}

/// Rules are evaluated top to bottom; the first match wins.
pub static INTERFACE_RULES: &[InterfaceRule] = &[
    InterfaceRule {
        matches: |name, _| name.starts_with("lo"),
        kind: InterfaceKind::Loopback,
        description: "Loopback interface for internal system communication",
        purpose: "System Internal",
    },
    InterfaceRule {
        matches: |name, block| is_en(name) && (block.contains("802.11") || block.contains("AirPort")),
        kind: InterfaceKind::Wifi,
        description: "Wireless network adapter for WiFi connectivity",
        purpose: "WiFi Connection",
    },
    InterfaceRule {
        matches: |name, block| {
            is_en(name) && (block.contains("1000baseT") || block.contains("100baseTX"))
        },
        kind: InterfaceKind::Ethernet,
        description: "Wired Ethernet adapter for stable network connection",
        purpose: "Wired Network",
    },
    InterfaceRule {
        matches: |name, _| name == "en0",
        kind: InterfaceKind::Wifi,
        description: "Primary network interface (usually WiFi on MacBook)",
        purpose: "Primary WiFi",
    },
    InterfaceRule {
        matches: |name, _| is_en(name),
        kind: InterfaceKind::Ethernet,
        description: "Secondary network interface (USB/Thunderbolt adapter)",
        purpose: "USB/TB Ethernet",
    },
    InterfaceRule {
        matches: |name, _| name.starts_with("bridge"),
        kind: InterfaceKind::Bridge,
        description: "Virtual bridge for VM or container networking",
        purpose: "Virtual Bridge",
    },
    InterfaceRule {
        matches: |name, _| name.starts_with("utun") || name.starts_with("tun"),
        kind: InterfaceKind::Vpn,
        description: "VPN tunnel interface for secure remote connection",
        purpose: "VPN Tunnel",
    },
    InterfaceRule {
        matches: |name, _| name.starts_with("awdl"),
        kind: InterfaceKind::P2p,
        description: "Apple Wireless Direct Link for AirDrop/Handoff",
        purpose: "AirDrop/Handoff",
    },
    InterfaceRule {
        matches: |name, _| name.starts_with("llw"),
        kind: InterfaceKind::Lowlatency,
        description: "Low Latency WLAN interface for real-time apps",
        purpose: "Low Latency WiFi",
    },
    InterfaceRule {
        matches: |name, _| name.starts_with("gif"),
        kind: InterfaceKind::Tunnel,
        description: "Generic tunnel interface",
        purpose: "IP Tunnel",
    },
    InterfaceRule {
        matches: |name, _| name.starts_with("stf"),
        kind: InterfaceKind::Tunnel,
        description: "6to4 tunnel interface",
        purpose: "IPv6 Tunnel",
    },
    InterfaceRule {
        matches: |name, _| name.starts_with("ap"),
        kind: InterfaceKind::Virtual,
        description: "Access point virtual interface",
        purpose: "Virtual AP",
    },
];

pub fn classify_interface(name: &str, block: &str) -> Classification {
    INTERFACE_RULES
        .iter()
        .find(|rule| (rule.matches)(name, block))
        .map(|rule| Classification {
            kind: rule.kind,
            description: rule.description.to_string(),
            purpose: rule.purpose.to_string(),
        })
        .unwrap_or_else(|| Classification {
            kind: InterfaceKind::Unknown,
            description: format!("Network interface {} - purpose unknown", name),
            purpose: UNKNOWN.to_string(),
        })
}

/// Interface names that indicate a VPN or other tunnel is up.
pub fn is_tunnel_name(name: &str) -> bool {
    ["utun", "tun", "ppp", "ipsec"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

pub fn is_loopback_name(name: &str) -> bool {
    name.starts_with("lo")
}

/// Well-known service for a listening port.
pub fn service_name(port: u16) -> &'static str {
    match port {
        22 => "SSH",
        23 => "Telnet",
        25 => "SMTP",
        53 => "DNS",
        80 => "HTTP",
        110 => "POP3",
        143 => "IMAP",
        443 => "HTTPS",
        993 => "IMAPS",
        995 => "POP3S",
        3000 => "Node.js Dev",
        3306 => "MySQL",
        5432 => "PostgreSQL",
        6379 => "Redis",
        8080 => "HTTP-Alt",
        8443 => "HTTPS-Alt",
        9090 => "Prometheus",
        _ => UNKNOWN,
    }
}

const HIGH_RISK_PORTS: &[u16] = &[22, 23, 3389, 5900];
const MEDIUM_RISK_PORTS: &[u16] = &[21, 25, 53, 110, 143, 993, 995];

/// Exposure risk of a port that is listening on this host.
pub fn port_risk(port: u16) -> Risk {
    if HIGH_RISK_PORTS.contains(&port) {
        Risk::High
    } else if MEDIUM_RISK_PORTS.contains(&port) {
        Risk::Medium
    } else {
        Risk::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn en0_without_media_hints_is_primary_wifi() {
        let c = classify_interface("en0", "en0: flags=8863<UP> mtu 1500");
        assert_eq!(c.kind, InterfaceKind::Wifi);
        assert_eq!(c.purpose, "Primary WiFi");
    }

    #[test]
    fn media_hints_take_precedence_over_name() {
        let wired = classify_interface("en0", "media: autoselect (1000baseT <full-duplex>)");
        assert_eq!(wired.kind, InterfaceKind::Ethernet);
        assert_eq!(wired.purpose, "Wired Network");

        let wifi = classify_interface("en7", "media: autoselect (802.11ac)");
        assert_eq!(wifi.kind, InterfaceKind::Wifi);
        assert_eq!(wifi.purpose, "WiFi Connection");
    }

    #[test]
    fn secondary_en_is_ethernet() {
        let c = classify_interface("en5", "");
        assert_eq!(c.kind, InterfaceKind::Ethernet);
        assert_eq!(c.purpose, "USB/TB Ethernet");
    }

    #[test]
    fn prefix_table() {
        let cases = [
            ("lo0", InterfaceKind::Loopback),
            ("bridge0", InterfaceKind::Bridge),
            ("utun3", InterfaceKind::Vpn),
            ("tun0", InterfaceKind::Vpn),
            ("awdl0", InterfaceKind::P2p),
            ("llw0", InterfaceKind::Lowlatency),
            ("gif0", InterfaceKind::Tunnel),
            ("stf0", InterfaceKind::Tunnel),
            ("ap1", InterfaceKind::Virtual),
            ("anpi0", InterfaceKind::Unknown),
        ];
        for (name, kind) in cases {
            assert_eq!(classify_interface(name, "").kind, kind, "{}", name);
        }
    }

    #[test]
    fn unknown_interface_names_itself() {
        let c = classify_interface("vmenet0", "");
        assert_eq!(c.description, "Network interface vmenet0 - purpose unknown");
        assert_eq!(c.purpose, "Unknown");
    }

    #[test]
    fn port_risk_tiers() {
        assert_eq!(port_risk(22), Risk::High);
        assert_eq!(port_risk(5900), Risk::High);
        assert_eq!(port_risk(143), Risk::Medium);
        assert_eq!(port_risk(53), Risk::Medium);
        assert_eq!(port_risk(80), Risk::Low);
        assert_eq!(port_risk(49152), Risk::Low);
    }

    #[test]
    fn service_names() {
        assert_eq!(service_name(443), "HTTPS");
        assert_eq!(service_name(9090), "Prometheus");
        assert_eq!(service_name(7000), "Unknown");
    }

    #[test]
    fn tunnel_names() {
        assert!(is_tunnel_name("utun0"));
        assert!(is_tunnel_name("ppp0"));
        assert!(is_tunnel_name("ipsec1"));
        assert!(!is_tunnel_name("en0"));
    }
}
