//! CPU load, memory pressure and latency jitter.

use crate::domain::outcome::Probe;
use crate::domain::parse::host::{parse_cpu_usage, parse_vm_stat};
use crate::domain::parse::ping::{jitter as consecutive_deltas, latency_samples};
use crate::domain::snapshot::MemoryBreakdown;

use super::ProbeContext;

pub async fn cpu(ctx: &ProbeContext) -> Probe<f64> {
    match ctx.run("top", &["-l", "1", "-n", "0"]).await {
        Ok(out) => match parse_cpu_usage(&out) {
            Some(cpu) => Probe::Ok(cpu),
            None => Probe::degraded(0.0, "top output had no CPU usage line"),
        },
        Err(e) => Probe::degraded(0.0, e.to_string()),
    }
}

pub async fn memory(ctx: &ProbeContext) -> Probe<MemoryBreakdown> {
    match ctx.run("vm_stat", &[]).await {
        Ok(out) => Probe::Ok(parse_vm_stat(&out)),
        Err(e) => Probe::degraded(MemoryBreakdown::default(), e.to_string()),
    }
}

/// Five quick pings to the internet target; jitter is the list of deltas.
pub async fn jitter(ctx: &ProbeContext) -> Probe<Vec<f64>> {
    let target = ctx.config.ping_target.as_str();
    match ctx
        .run_for("ping", &["-c", "5", "-i", "0.2", target], ctx.config.ping_timeout())
        .await
    {
        Ok(out) => Probe::Ok(consecutive_deltas(&latency_samples(&out))),
        Err(e) => Probe::degraded(Vec::new(), e.to_string()),
    }
}
