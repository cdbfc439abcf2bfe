//! `ping` and `traceroute` parsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::snapshot::{HopRecord, PingResult};

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"time=(\d+\.?\d*)").unwrap());
static LOSS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)% packet loss").unwrap());
static HOP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s+(?:(\S+)\s+\(([^)]+)\)|(\*))(?:\s+(\d+\.?\d*)\s*ms)?").unwrap()
});

/// Every round-trip time reported in a ping transcript, in order.
pub fn latency_samples(output: &str) -> Vec<f64> {
    TIME_RE
        .captures_iter(output)
        .filter_map(|c| c[1].parse().ok())
        .collect()
}

/// Mean latency and loss, or `None` when no reply arrived at all.
pub fn parse_ping(output: &str) -> Option<PingResult> {
    let samples = latency_samples(output);
    if samples.is_empty() {
        return None;
    }
    let latency = samples.iter().sum::<f64>() / samples.len() as f64;
    let loss = LOSS_RE
        .captures(output)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0.0);

    Some(PingResult { latency, loss })
}

/// Absolute differences between consecutive latency samples.
pub fn jitter(samples: &[f64]) -> Vec<f64> {
    samples.windows(2).map(|w| (w[1] - w[0]).abs()).collect()
}

/// One record per numbered hop; the first line is the traceroute banner.
///
/// ```text
/// traceroute to 8.8.8.8 (8.8.8.8), 64 hops max, 52 byte packets
///  1  router.lan (192.168.1.1)  2.114 ms
///  2  *
/// ```
pub fn parse_traceroute(output: &str) -> Vec<HopRecord> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let caps = HOP_RE.captures(line)?;
            let number = caps[1].parse().ok()?;
            Some(HopRecord {
                number,
                hostname: caps.get(2).map_or("*", |m| m.as_str()).to_string(),
                ip: caps.get(3).map_or("*", |m| m.as_str()).to_string(),
                latency: caps.get(5).and_then(|m| m.as_str().parse().ok()),
            })
        })
        .collect()
}
