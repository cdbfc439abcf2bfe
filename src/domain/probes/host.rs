//! OS version, chip, battery, hostname and uptime.

use crate::domain::outcome::{Gathered, Notes, Probe};
use crate::domain::parse::host::{parse_battery, parse_chip, parse_uptime};
use crate::domain::snapshot::{BatteryInfo, HostInfo, UNKNOWN};

use super::ProbeContext;

pub async fn os_version(ctx: &ProbeContext) -> Probe<String> {
    match ctx.run("sw_vers", &["-productVersion"]).await {
        Ok(out) if !out.trim().is_empty() => Probe::Ok(out.trim().to_string()),
        Ok(_) => Probe::degraded(UNKNOWN.to_string(), "sw_vers printed nothing"),
        Err(e) => Probe::degraded(UNKNOWN.to_string(), e.to_string()),
    }
}

/// CPU brand string, falling back to the "Chip" line of system_profiler.
pub async fn chip(ctx: &ProbeContext) -> Probe<String> {
    let sysctl_err = match ctx.run("sysctl", &["-n", "machdep.cpu.brand_string"]).await {
        Ok(out) if !out.trim().is_empty() => return Probe::Ok(parse_chip(&out)),
        Ok(_) => "sysctl printed nothing".to_string(),
        Err(e) => e.to_string(),
    };

    match ctx.run("system_profiler", &["SPHardwareDataType"]).await {
        Ok(out) => match out.lines().find(|l| l.contains("Chip")) {
            Some(line) => Probe::Ok(parse_chip(line)),
            None => Probe::degraded(UNKNOWN.to_string(), format!("{sysctl_err}; no Chip line")),
        },
        Err(e) => Probe::degraded(UNKNOWN.to_string(), format!("{sysctl_err}; {e}")),
    }
}

pub async fn battery(ctx: &ProbeContext) -> Probe<BatteryInfo> {
    match ctx.run("pmset", &["-g", "batt"]).await {
        Ok(out) => Probe::Ok(parse_battery(&out)),
        Err(e) => Probe::degraded(BatteryInfo::default(), e.to_string()),
    }
}

/// `hostname` output, or the kernel's answer when the tool is missing.
pub async fn hostname(ctx: &ProbeContext) -> Probe<String> {
    match ctx.run("hostname", &[]).await {
        Ok(out) if !out.trim().is_empty() => Probe::Ok(out.trim().to_string()),
        _ => match ::hostname::get() {
            Ok(name) => Probe::Ok(name.to_string_lossy().into_owned()),
            Err(e) => Probe::degraded(UNKNOWN.to_string(), e.to_string()),
        },
    }
}

pub async fn uptime(ctx: &ProbeContext) -> Probe<String> {
    match ctx.run("uptime", &[]).await {
        Ok(out) => Probe::Ok(parse_uptime(&out)),
        Err(e) => Probe::degraded(UNKNOWN.to_string(), e.to_string()),
    }
}

/// All host facts; each field falls back on its own.
pub async fn host_info(ctx: &ProbeContext) -> Gathered<HostInfo> {
    let (os, cpu, batt, name, up) = tokio::join!(
        os_version(ctx),
        chip(ctx),
        battery(ctx),
        hostname(ctx),
        uptime(ctx),
    );

    let mut notes = Notes::default();
    let info = HostInfo {
        os_version: notes.settle("host.osVersion", os),
        chip_info: notes.settle("host.chip", cpu),
        battery: notes.settle("host.battery", batt),
        hostname: notes.settle("host.hostname", name),
        uptime: notes.settle("host.uptime", up),
    };
    Gathered::new(info, notes)
}
