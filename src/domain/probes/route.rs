//! Routing table, gateway reachability, internet ping and traceroute.

use tokio::task::JoinSet;

use crate::domain::outcome::Probe;
use crate::domain::parse::ping::{parse_ping, parse_traceroute};
use crate::domain::parse::route::parse_route_table;
use crate::domain::snapshot::{AddressFamily, HopRecord, PingResult, RouteRecord, UNKNOWN};

use super::ProbeContext;

pub async fn route_table(ctx: &ProbeContext) -> Probe<Vec<RouteRecord>> {
    match ctx.run("netstat", &["-rn"]).await {
        Ok(out) => Probe::Ok(parse_route_table(&out)),
        Err(e) => Probe::degraded(Vec::new(), e.to_string()),
    }
}

/// Three echo requests with a 3 s reply wait, bounded by the ping timeout.
pub async fn ping(ctx: &ProbeContext, host: &str, family: AddressFamily) -> Probe<PingResult> {
    let result = match family {
        AddressFamily::Ipv4 => {
            ctx.run_for("ping", &["-c", "3", "-W", "3000", host], ctx.config.ping_timeout())
                .await
        }
        AddressFamily::Ipv6 => {
            ctx.run_for("ping6", &["-c", "3", host], ctx.config.ping_timeout())
                .await
        }
    };

    match result {
        Ok(out) => match parse_ping(&out) {
            Some(result) => Probe::Ok(result),
            None => Probe::degraded(PingResult::unreachable(), format!("no replies from {host}")),
        },
        Err(e) => Probe::degraded(PingResult::unreachable(), e.to_string()),
    }
}

/// Reverse DNS name for `ip`, or the address itself when there is none.
pub async fn reverse_lookup(ctx: &ProbeContext, ip: &str) -> String {
    match ctx.run("dig", &["+short", "-x", ip]).await {
        Ok(out) => out
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(|name| name.trim_end_matches('.').to_string())
            .unwrap_or_else(|| ip.to_string()),
        Err(_) => ip.to_string(),
    }
}

/// Ping a default gateway and resolve its name.
///
/// An unreachable gateway gets latency 999, loss 100 and hostname "Unknown"
/// without a DNS lookup.
pub async fn gateway_reachability(ctx: &ProbeContext, mut route: RouteRecord) -> Probe<RouteRecord> {
    match ping(ctx, &route.gateway, route.family).await {
        Probe::Ok(result) => {
            route.latency = Some(result.latency);
            route.loss = Some(result.loss);
            route.hostname = Some(reverse_lookup(ctx, &route.gateway).await);
            Probe::Ok(route)
        }
        Probe::Degraded { value, reason } => {
            route.latency = Some(value.latency);
            route.loss = Some(value.loss);
            route.hostname = Some(UNKNOWN.to_string());
            Probe::degraded(route, reason)
        }
    }
}

/// Probe every default gateway concurrently, keeping table order.
pub async fn default_gateways(ctx: &ProbeContext, routes: &[RouteRecord]) -> Vec<Probe<RouteRecord>> {
    let mut set = JoinSet::new();
    for (idx, route) in routes.iter().filter(|r| r.is_default()).cloned().enumerate() {
        let ctx = ctx.clone();
        set.spawn(async move { (idx, gateway_reachability(&ctx, route).await) });
    }

    let mut results = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(entry) => results.push(entry),
            // a panicking gateway probe is dropped from the list
            Err(e) => tracing::warn!(error = %e, "gateway probe task failed"),
        }
    }
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, probe)| probe).collect()
}

/// Latency to the configured internet target.
pub async fn internet_ping(ctx: &ProbeContext) -> Probe<PingResult> {
    ping(ctx, &ctx.config.ping_target, AddressFamily::Ipv4).await
}

pub async fn traceroute(ctx: &ProbeContext) -> Probe<Vec<HopRecord>> {
    let max_hops = ctx.config.traceroute_max_hops.to_string();
    let target = ctx.config.ping_target.as_str();
    let args = ["-q", "1", "-w", "1", "-m", max_hops.as_str(), target];

    match ctx
        .run_for("traceroute", &args, ctx.config.traceroute_timeout())
        .await
    {
        Ok(out) => Probe::Ok(parse_traceroute(&out)),
        Err(e) => Probe::degraded(Vec::new(), e.to_string()),
    }
}
