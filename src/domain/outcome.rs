//! Fail-soft probe results and degradation bookkeeping.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::snapshot::Degradation;

/// Result of a probe that is not allowed to fail.
///
/// `Degraded` still carries a well-typed value, usually the documented
/// default, together with the reason live data was unavailable.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    Ok(T),
    Degraded { value: T, reason: String },
}

impl<T> Probe<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self::Degraded {
            value,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
impl<T> Probe<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}

/// Degradations gathered while one probe unit assembles its result.
#[derive(Debug, Default)]
pub struct Notes {
    entries: Vec<Degradation>,
}

impl Notes {
    /// Unwrap a probe result, logging and recording it if it degraded.
    pub fn settle<T>(&mut self, probe: &str, result: Probe<T>) -> T {
        match result {
            Probe::Ok(value) => value,
            Probe::Degraded { value, reason } => {
                self.push(probe, reason);
                value
            }
        }
    }

    pub fn push(&mut self, probe: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(probe, reason = %reason, "probe degraded to default");
        self.entries.push(Degradation {
            probe: probe.to_string(),
            reason,
        });
    }

    /// Take over degradations another unit already logged.
    pub fn merge(&mut self, other: Notes) {
        self.entries.extend(other.entries);
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Degradation> {
        self.entries
    }
}

/// Value produced by a probe unit plus the degradations it hit.
#[derive(Debug)]
pub struct Gathered<T> {
    pub value: T,
    pub notes: Notes,
}

impl<T> Gathered<T> {
    pub fn new(value: T, notes: Notes) -> Self {
        Self { value, notes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct DegradationCount {
    pub probe: String,
    pub count: u64,
}

/// Process-wide tally of degradations per probe name.
#[derive(Debug, Default)]
pub struct DegradationStats {
    counts: Mutex<BTreeMap<String, u64>>,
}

impl DegradationStats {
    pub fn record(&self, degradations: &[Degradation]) {
        if degradations.is_empty() {
            return;
        }
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        for d in degradations {
            *counts.entry(d.probe.clone()).or_insert(0) += 1;
        }
    }

    pub fn counts(&self) -> Vec<DegradationCount> {
        self.counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(probe, count)| DegradationCount {
                probe: probe.clone(),
                count: *count,
            })
            .collect()
    }
}
