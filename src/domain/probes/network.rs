//! Interface inventory and per-interface counters.

use std::collections::HashMap;

use crate::domain::outcome::Probe;
use crate::domain::parse::interface::{parse_ifconfig, parse_netstat_ib};
use crate::domain::snapshot::{InterfaceRecord, PacketCounters};

use super::ProbeContext;

pub async fn interfaces(ctx: &ProbeContext) -> Probe<Vec<InterfaceRecord>> {
    match ctx.run("ifconfig", &[]).await {
        Ok(out) => Probe::Ok(parse_ifconfig(&out)),
        Err(e) => Probe::degraded(Vec::new(), e.to_string()),
    }
}

pub async fn counters(ctx: &ProbeContext) -> Probe<HashMap<String, PacketCounters>> {
    match ctx.run("netstat", &["-ib"]).await {
        Ok(out) => Probe::Ok(parse_netstat_ib(&out)),
        Err(e) => Probe::degraded(HashMap::new(), e.to_string()),
    }
}

/// Fill each record's packet counters from the `netstat -ib` table.
pub fn attach_counters(records: &mut [InterfaceRecord], counters: &HashMap<String, PacketCounters>) {
    for record in records {
        if let Some(c) = counters.get(&record.name) {
            record.packets = *c;
        }
    }
}
