//! Bandwidth derived from successive byte-counter samples.
//!
//! The tracker owns the only mutable state in the collector. Its mutex
//! serializes concurrent snapshot requests so a slower request can never
//! overwrite a newer sample with the one it read earlier.

use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::Mutex;

use super::classify::is_loopback_name;
use super::snapshot::{PacketCounters, TrafficSample, TrafficTotals};

#[derive(Debug, Clone, Copy)]
struct Reading {
    rx_bytes: u64,
    tx_bytes: u64,
    at: Instant,
}

#[derive(Debug, Default)]
pub struct RateTracker {
    last: Mutex<Option<Reading>>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record cumulative byte counters and return the rate since the last call.
    ///
    /// The first call in a process reports zero rates. The stored sample is
    /// replaced on every call, whether or not a rate could be computed.
    pub async fn observe(&self, rx_bytes: u64, tx_bytes: u64, at: Instant) -> TrafficSample {
        let mut last = self.last.lock().await;

        let (upload, download) = match *last {
            Some(prev) if prev.rx_bytes > 0 && prev.tx_bytes > 0 => {
                let elapsed = at.saturating_duration_since(prev.at).as_secs_f64();
                if elapsed > 0.0 {
                    (
                        per_second(tx_bytes, prev.tx_bytes, elapsed),
                        per_second(rx_bytes, prev.rx_bytes, elapsed),
                    )
                } else {
                    (0.0, 0.0)
                }
            }
            _ => (0.0, 0.0),
        };

        *last = Some(Reading {
            rx_bytes,
            tx_bytes,
            at,
        });

        TrafficSample {
            upload,
            download,
            total: TrafficTotals {
                upload: tx_bytes,
                download: rx_bytes,
            },
        }
    }
}

/// Counters that went backwards (interface reset) report zero.
fn per_second(current: u64, previous: u64, secs: f64) -> f64 {
    current.saturating_sub(previous) as f64 / secs
}

/// Total (received, transmitted) bytes across non-loopback interfaces.
pub fn non_loopback_totals(counters: &HashMap<String, PacketCounters>) -> (u64, u64) {
    counters
        .iter()
        .filter(|(name, _)| !is_loopback_name(name))
        .fold((0, 0), |(rx, tx), (_, c)| {
            (rx.saturating_add(c.rx_bytes), tx.saturating_add(c.tx_bytes))
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn first_sample_reports_zero() {
        let tracker = RateTracker::new();
        let sample = tracker.observe(5_000_000, 1_000_000, Instant::now()).await;
        assert_eq!(sample.upload, 0.0);
        assert_eq!(sample.download, 0.0);
        assert_eq!(sample.total.download, 5_000_000);
        assert_eq!(sample.total.upload, 1_000_000);
    }

    #[tokio::test]
    async fn second_sample_is_delta_over_elapsed() {
        let tracker = RateTracker::new();
        let t1 = Instant::now();
        let t2 = t1 + Duration::from_secs(4);

        tracker.observe(1_000, 2_000, t1).await;
        let sample = tracker.observe(9_000, 4_000, t2).await;

        assert_eq!(sample.download, 2_000.0);
        assert_eq!(sample.upload, 500.0);
    }

    #[tokio::test]
    async fn zero_previous_counters_report_zero() {
        let tracker = RateTracker::new();
        let t1 = Instant::now();
        tracker.observe(0, 0, t1).await;
        let sample = tracker.observe(10_000, 10_000, t1 + Duration::from_secs(1)).await;
        assert_eq!(sample.download, 0.0);

        // the zero sample was still replaced
        let sample = tracker.observe(20_000, 30_000, t1 + Duration::from_secs(2)).await;
        assert_eq!(sample.download, 10_000.0);
        assert_eq!(sample.upload, 20_000.0);
    }

    #[tokio::test]
    async fn no_elapsed_time_reports_zero() {
        let tracker = RateTracker::new();
        let t = Instant::now();
        tracker.observe(1_000, 1_000, t).await;
        let sample = tracker.observe(2_000, 2_000, t).await;
        assert_eq!(sample.download, 0.0);
        assert_eq!(sample.upload, 0.0);
    }

    #[tokio::test]
    async fn counter_reset_reports_zero() {
        let tracker = RateTracker::new();
        let t = Instant::now();
        tracker.observe(50_000, 50_000, t).await;
        let sample = tracker.observe(10, 10, t + Duration::from_secs(1)).await;
        assert_eq!(sample.download, 0.0);
        assert_eq!(sample.upload, 0.0);
    }

    #[tokio::test]
    async fn concurrent_observers_each_see_a_previous_sample() {
        let tracker = Arc::new(RateTracker::new());
        let t0 = Instant::now();
        tracker.observe(1_000, 1_000, t0).await;

        let mut handles = Vec::new();
        for i in 1..=8u64 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                tracker
                    .observe(1_000 + i * 100, 1_000 + i * 100, t0 + Duration::from_secs(i))
                    .await
            }));
        }
        for handle in handles {
            let sample = handle.await.unwrap();
            assert!(sample.download >= 0.0);
            assert!(sample.total.download > 1_000);
        }
    }

    #[test]
    fn totals_skip_loopback() {
        let mut counters = HashMap::new();
        counters.insert(
            "lo0".to_string(),
            PacketCounters { rx: 1, tx: 1, rx_bytes: 1_000_000, tx_bytes: 1_000_000 },
        );
        counters.insert(
            "en0".to_string(),
            PacketCounters { rx: 1, tx: 1, rx_bytes: 300, tx_bytes: 100 },
        );
        counters.insert(
            "utun0".to_string(),
            PacketCounters { rx: 1, tx: 1, rx_bytes: 20, tx_bytes: 80 },
        );
        assert_eq!(non_loopback_totals(&counters), (320, 180));
    }
}
