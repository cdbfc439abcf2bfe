//! Snapshot aggregator: fans probe units out and merges what comes back.
//!
//! Each unit runs as its own task. All of them share one deadline: every
//! command a unit runs is cut off at it, so a unit returns whatever its
//! finished sub-probes produced and degrades only the ones still waiting.
//! A unit that panics, or somehow outlives the deadline by more than
//! [`JOIN_GRACE`], is replaced by its category default.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_graphql::Enum;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::CollectorConfig;

use super::outcome::{DegradationCount, DegradationStats, Gathered, Notes, Probe};
use super::probes::{host, network, performance, route, security, ProbeContext};
use super::runner::CommandRunner;
use super::snapshot::{
    FirewallPosture, HostInfo, InterfaceRecord, PerformanceSample, PingResult, RouteReport,
    SecurityPosture, Snapshot, TrafficSample,
};
use super::traffic::{non_loopback_totals, RateTracker};

/// Slack past the collect deadline for units to assemble their results.
const JOIN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Performance,
    Interfaces,
    Security,
    Routes,
    #[default]
    All,
}

impl Category {
    fn includes(self, other: Category) -> bool {
        self == Category::All || self == other
    }
}

impl FromStr for Category {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "performance" => Ok(Self::Performance),
            "interfaces" => Ok(Self::Interfaces),
            "security" => Ok(Self::Security),
            "routes" => Ok(Self::Routes),
            "all" => Ok(Self::All),
            _ => Err(CollectorError::UnknownCategory(s.to_string())),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Performance => "performance",
            Self::Interfaces => "interfaces",
            Self::Security => "security",
            Self::Routes => "routes",
            Self::All => "all",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectRequest {
    pub category: Category,
    /// `None` uses the configured default.
    pub traceroute: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("unknown category '{0}' (expected performance, interfaces, security, routes or all)")]
    UnknownCategory(String),
    #[error("collection aborted: {0}")]
    Total(String),
}

/// Interfaces plus the traffic rate derived from their counters.
#[derive(Debug, Default)]
struct NetworkState {
    interfaces: Vec<InterfaceRecord>,
    traffic: TrafficSample,
}

#[derive(Clone)]
pub struct Collector {
    ctx: ProbeContext,
    tracker: Arc<RateTracker>,
    stats: Arc<DegradationStats>,
}

impl Collector {
    pub fn new(runner: Arc<dyn CommandRunner>, config: CollectorConfig) -> Self {
        Self {
            ctx: ProbeContext::new(runner, Arc::new(config)),
            tracker: Arc::new(RateTracker::new()),
            stats: Arc::new(DegradationStats::default()),
        }
    }

    /// Degradations seen since startup, per probe.
    pub fn degradation_counts(&self) -> Vec<DegradationCount> {
        self.stats.counts()
    }

    /// Build one snapshot for the requested category.
    ///
    /// Only a cancelled probe task (runtime shutting down) fails the whole
    /// call; every other problem degrades a field.
    pub async fn collect(&self, request: &CollectRequest) -> Result<Snapshot, CollectorError> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.ctx.config.collect_timeout();
        let ctx = self.ctx.with_deadline(deadline);
        let category = request.category;
        let traceroute = request
            .traceroute
            .unwrap_or(self.ctx.config.traceroute_by_default);

        debug!(%category, traceroute, "collecting snapshot");

        let network_task = category
            .includes(Category::Interfaces)
            .then(|| UnitTask::spawn(network_unit(ctx.clone(), self.tracker.clone())));
        let security_task = category
            .includes(Category::Security)
            .then(|| UnitTask::spawn(security_unit(ctx.clone())));
        let routes_task = category
            .includes(Category::Routes)
            .then(|| UnitTask::spawn(routes_unit(ctx.clone(), traceroute)));
        let ping_task = category
            .includes(Category::Routes)
            .then(|| UnitTask::spawn(ping_unit(ctx.clone())));
        let performance_task = category
            .includes(Category::Performance)
            .then(|| UnitTask::spawn(performance_unit(ctx.clone())));
        let host_task = category
            .includes(Category::Performance)
            .then(|| UnitTask::spawn(host_unit(ctx.clone())));

        // an early return drops the remaining UnitTasks, which aborts them
        let join_by = deadline + JOIN_GRACE;
        let mut notes = Notes::default();
        let network = join_unit("interfaces", network_task, join_by, &mut notes).await?;
        let security = join_unit("security", security_task, join_by, &mut notes).await?;
        let routes = join_unit("routes", routes_task, join_by, &mut notes).await?;
        let ping = join_unit("ping", ping_task, join_by, &mut notes).await?;
        let performance = join_unit("performance", performance_task, join_by, &mut notes).await?;
        let host = join_unit("host", host_task, join_by, &mut notes).await?;

        let degraded = notes.into_vec();
        self.stats.record(&degraded);

        info!(
            %category,
            degraded = degraded.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "snapshot collected"
        );

        let (interfaces, traffic) = match network {
            Some(n) => (Some(n.interfaces), Some(n.traffic)),
            None => (None, None),
        };

        Ok(Snapshot {
            interfaces,
            traffic,
            security,
            routes,
            performance,
            ping,
            mac_info: host,
            degraded,
            timestamp: Utc::now(),
        })
    }
}

/// Spawned probe unit, aborted when dropped.
struct UnitTask<T>(JoinHandle<Gathered<T>>);

impl<T: Send + 'static> UnitTask<T> {
    fn spawn<Fut>(unit: Fut) -> Self
    where
        Fut: Future<Output = Gathered<T>> + Send + 'static,
    {
        Self(tokio::spawn(unit))
    }
}

impl<T> Drop for UnitTask<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Wait for one unit until `join_by`.
///
/// `None` in means the category was not requested. A panic or a missed
/// deadline yields the default; cancellation aborts the collection.
async fn join_unit<T: Default>(
    unit: &str,
    task: Option<UnitTask<T>>,
    join_by: tokio::time::Instant,
    notes: &mut Notes,
) -> Result<Option<T>, CollectorError> {
    let Some(mut task) = task else {
        return Ok(None);
    };

    match tokio::time::timeout_at(join_by, &mut task.0).await {
        Ok(Ok(gathered)) => {
            notes.merge(gathered.notes);
            Ok(Some(gathered.value))
        }
        Ok(Err(e)) if e.is_panic() => {
            notes.push(unit, "probe task panicked");
            Ok(Some(T::default()))
        }
        Ok(Err(e)) => Err(CollectorError::Total(format!("{unit} task cancelled: {e}"))),
        Err(_) => {
            notes.push(unit, "deadline exceeded");
            Ok(Some(T::default()))
        }
    }
}

async fn network_unit(ctx: ProbeContext, tracker: Arc<RateTracker>) -> Gathered<NetworkState> {
    let (interfaces, counters) = tokio::join!(network::interfaces(&ctx), network::counters(&ctx));

    let mut notes = Notes::default();
    let mut interfaces = notes.settle("interfaces", interfaces);

    // a failed counter read leaves the previous sample in place
    let traffic = match counters {
        Probe::Ok(table) => {
            network::attach_counters(&mut interfaces, &table);
            let (rx, tx) = non_loopback_totals(&table);
            tracker.observe(rx, tx, Instant::now()).await
        }
        Probe::Degraded { reason, .. } => {
            notes.push("traffic", reason);
            TrafficSample::default()
        }
    };

    Gathered::new(
        NetworkState {
            interfaces,
            traffic,
        },
        notes,
    )
}

async fn security_unit(ctx: ProbeContext) -> Gathered<SecurityPosture> {
    let (enabled, detail, vpn, ports, suspicious) = tokio::join!(
        security::firewall_enabled(&ctx),
        security::firewall_detail(&ctx),
        security::vpn_active(&ctx),
        security::open_ports(&ctx),
        security::suspicious_connections(&ctx),
    );

    let mut notes = Notes::default();
    let firewall = FirewallPosture {
        enabled: notes.settle("firewall.enabled", enabled),
        ..notes.settle("firewall.detail", detail)
    };
    let posture = SecurityPosture::new(
        firewall,
        notes.settle("vpn", vpn),
        notes.settle("ports", ports),
        notes.settle("connections", suspicious),
    );
    Gathered::new(posture, notes)
}

async fn routes_unit(ctx: ProbeContext, traceroute: bool) -> Gathered<RouteReport> {
    let mut notes = Notes::default();
    let mut routes = notes.settle("routes", route::route_table(&ctx).await);

    let hops = async {
        if traceroute {
            Some(route::traceroute(&ctx).await)
        } else {
            None
        }
    };
    let (gateways, hops) = tokio::join!(route::default_gateways(&ctx, &routes), hops);

    let default_gateways = gateways
        .into_iter()
        .map(|probe| notes.settle("gateway", probe))
        .collect();
    let traceroute = hops
        .map(|probe| notes.settle("traceroute", probe))
        .unwrap_or_default();

    routes.truncate(ctx.config.route_limit);

    Gathered::new(
        RouteReport {
            default_gateways,
            routes,
            traceroute,
        },
        notes,
    )
}

async fn ping_unit(ctx: ProbeContext) -> Gathered<PingResult> {
    let mut notes = Notes::default();
    let ping = notes.settle("ping", route::internet_ping(&ctx).await);
    Gathered::new(ping, notes)
}

async fn performance_unit(ctx: ProbeContext) -> Gathered<PerformanceSample> {
    let (cpu, memory, jitter) = tokio::join!(
        performance::cpu(&ctx),
        performance::memory(&ctx),
        performance::jitter(&ctx),
    );

    let mut notes = Notes::default();
    let sample = PerformanceSample {
        cpu: notes.settle("cpu", cpu),
        memory: notes.settle("memory", memory),
        jitter: notes.settle("jitter", jitter),
    };
    Gathered::new(sample, notes)
}

async fn host_unit(ctx: ProbeContext) -> Gathered<HostInfo> {
    host::host_info(&ctx).await
}
