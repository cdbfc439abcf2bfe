//! Typed HTTP client for the netsight daemon REST API.

use anyhow::{bail, Context, Result};
use reqwest::Client;

use crate::api::rest::ErrorBody;
use crate::api::DaemonHealth;
use crate::domain::collector::Category;
use crate::domain::snapshot::Snapshot;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3001";

pub struct NetsightClient {
    base_url: String,
    http: Client,
}

impl NetsightClient {
    pub fn new(base_url: &str) -> Result<Self> {
        // traceroute alone may take 25 s on the daemon side
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub async fn health(&self) -> Result<DaemonHealth> {
        self.get("/health").await
    }

    /// `traceroute: None` leaves the choice to the daemon's config.
    pub async fn network_status(
        &self,
        category: Category,
        traceroute: Option<bool>,
    ) -> Result<Snapshot> {
        self.get(&status_path(category, traceroute)).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?;

        let status = resp.status();
        if !status.is_success() {
            match resp.json::<ErrorBody>().await {
                Ok(body) => bail!("{} returned {}: {} ({})", url, status, body.error, body.details),
                Err(_) => bail!("{} returned {}", url, status),
            }
        }

        resp.json()
            .await
            .with_context(|| format!("parsing response from {}", url))
    }
}

fn status_path(category: Category, traceroute: Option<bool>) -> String {
    match traceroute {
        Some(t) => format!("/api/network-status?type={}&traceroute={}", category, t),
        None => format!("/api/network-status?type={}", category),
    }
}
