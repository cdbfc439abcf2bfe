use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub daemon: DaemonConfig,
    pub collector: CollectorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub http_addr: String,
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:3001".into(),
            log_level: "info".into(),
        }
    }
}

/// Knobs for the probes and the snapshot deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub command_timeout_secs: u64,
    pub ping_timeout_secs: u64,
    pub traceroute_timeout_secs: u64,
    /// Overall deadline for one snapshot; unfinished probes get defaults.
    pub collect_timeout_secs: u64,
    pub port_limit: usize,
    pub route_limit: usize,
    pub suspicious_limit: usize,
    /// Host used for the internet ping, jitter burst and traceroute.
    pub ping_target: String,
    pub traceroute_max_hops: u32,
    pub traceroute_by_default: bool,
    /// Prefix socketfilterfw queries with `sudo -n`.
    pub use_sudo: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 10,
            ping_timeout_secs: 15,
            traceroute_timeout_secs: 25,
            collect_timeout_secs: 30,
            port_limit: 10,
            route_limit: 15,
            suspicious_limit: 5,
            ping_target: "8.8.8.8".into(),
            traceroute_max_hops: 20,
            traceroute_by_default: false,
            use_sudo: true,
        }
    }
}

impl CollectorConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }

    pub fn traceroute_timeout(&self) -> Duration {
        Duration::from_secs(self.traceroute_timeout_secs)
    }

    pub fn collect_timeout(&self) -> Duration {
        Duration::from_secs(self.collect_timeout_secs)
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("netsight").join("config.yaml"))
    }

    /// Defaults, then the YAML file (if present), then `NETSIGHT_*` env vars.
    ///
    /// Nested keys use a double underscore: `NETSIGHT_COLLECTOR__PORT_LIMIT=20`.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("NETSIGHT_").split("__"))
    }
}

/// Load from an explicit path, or the default location when none is given.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("config file {} does not exist", p.display());
            }
            p.to_path_buf()
        }
        None => Config::path()?,
    };

    Config::figment(&path)
        .extract()
        .with_context(|| format!("loading config from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_file_or_env() {
        Jail::expect_with(|jail| {
            let config: Config = Config::figment(&jail.directory().join("missing.yaml"))
                .extract()
                .unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.collector.ping_target, "8.8.8.8");
            assert_eq!(config.collector.command_timeout(), Duration::from_secs(10));
            Ok(())
        });
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
daemon:
  http_addr: "0.0.0.0:9000"
collector:
  port_limit: 25
  use_sudo: false
"#,
            )?;
            let config: Config = Config::figment(&jail.directory().join("config.yaml"))
                .extract()
                .unwrap();
            assert_eq!(config.daemon.http_addr, "0.0.0.0:9000");
            assert_eq!(config.daemon.log_level, "info");
            assert_eq!(config.collector.port_limit, 25);
            assert!(!config.collector.use_sudo);
            assert_eq!(config.collector.route_limit, 15);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "collector:\n  ping_target: \"1.1.1.1\"\n")?;
            jail.set_env("NETSIGHT_COLLECTOR__PING_TARGET", "9.9.9.9");
            jail.set_env("NETSIGHT_DAEMON__LOG_LEVEL", "debug");
            let config: Config = Config::figment(&jail.directory().join("config.yaml"))
                .extract()
                .unwrap();
            assert_eq!(config.collector.ping_target, "9.9.9.9");
            assert_eq!(config.daemon.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load(Some(Path::new("/nonexistent/netsight.yaml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
