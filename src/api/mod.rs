pub mod graphql;
pub mod rest;

use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};

use crate::domain::outcome::DegradationCount;

#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct DaemonHealth {
    pub version: String,
    pub uptime_secs: u64,
    pub degradations: Vec<DegradationCount>,
}
