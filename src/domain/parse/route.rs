//! `netstat -rn` routing table parsing.

use crate::domain::snapshot::{AddressFamily, RouteRecord};

/// Parse both sections of a `netstat -rn` listing.
///
/// `Internet:` / `Internet6:` markers select the family of the header that
/// follows them. A header carrying a `Gateway6` column is IPv6 regardless.
/// Lines before the first header are ignored.
pub fn parse_route_table(output: &str) -> Vec<RouteRecord> {
    let mut routes = Vec::new();
    let mut pending = AddressFamily::Ipv4;
    let mut section: Option<AddressFamily> = None;

    for line in output.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("Internet6:") {
            pending = AddressFamily::Ipv6;
            section = None;
            continue;
        }
        if trimmed.starts_with("Internet:") {
            pending = AddressFamily::Ipv4;
            section = None;
            continue;
        }
        if trimmed.contains("Destination") {
            if trimmed.contains("Gateway6") {
                section = Some(AddressFamily::Ipv6);
            } else if trimmed.contains("Gateway") {
                section = Some(pending);
            }
            continue;
        }

        let Some(family) = section else {
            continue;
        };
        if trimmed.is_empty() {
            continue;
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }

        routes.push(RouteRecord {
            destination: parts[0].to_string(),
            gateway: parts[1].to_string(),
            flags: parts[2].to_string(),
            interface: parts[parts.len() - 1].to_string(),
            family,
            latency: None,
            loss: None,
            hostname: None,
        });
    }

    routes
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETSTAT_RN: &str = "\
Routing tables

Internet:
Destination        Gateway            Flags               Netif Expire
default            192.168.1.1        UGScg                 en0
127                127.0.0.1          UCS                   lo0
127.0.0.1          127.0.0.1          UH                    lo0
192.168.1          link#11            UCS                   en0      !
192.168.1.1/32     link#11            UCS                   en0      !

Internet6:
Destination                             Gateway                                 Flags               Netif Expire
default                                 fe80::%utun0                            UGcIg               utun0
::1                                     ::1                                     UHL                   lo0
";

    #[test]
    fn splits_families_by_section() {
        let routes = parse_route_table(NETSTAT_RN);
        let v4 = routes.iter().filter(|r| r.family == AddressFamily::Ipv4).count();
        let v6 = routes.iter().filter(|r| r.family == AddressFamily::Ipv6).count();
        assert_eq!(v4, 5);
        assert_eq!(v6, 2);
    }

    #[test]
    fn interface_is_last_token() {
        let routes = parse_route_table(NETSTAT_RN);
        let local = routes
            .iter()
            .find(|r| r.destination == "192.168.1")
            .unwrap();
        assert_eq!(local.gateway, "link#11");
        assert_eq!(local.flags, "UCS");
        assert_eq!(local.interface, "!");

        let default = &routes[0];
        assert!(default.is_default());
        assert_eq!(default.gateway, "192.168.1.1");
        assert_eq!(default.interface, "en0");
    }

    #[test]
    fn gateway6_header_is_ipv6() {
        let routes = parse_route_table(
            "Destination Gateway6 Flags Netif\nfe80::/64 link#4 UCI en0\n",
        );
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].family, AddressFamily::Ipv6);
    }

    #[test]
    fn ignores_lines_outside_sections() {
        let routes = parse_route_table("Routing tables\nsomething else entirely here\n");
        assert!(routes.is_empty());
    }
}
