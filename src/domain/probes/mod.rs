//! Probe strategies: one fallback chain per fact category.
//!
//! A probe never returns an error. When every command in its chain fails it
//! hands back the documented default wrapped in [`Probe::Degraded`].
//!
//! [`Probe::Degraded`]: super::outcome::Probe::Degraded

pub mod host;
pub mod network;
pub mod performance;
pub mod route;
pub mod security;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::CollectorConfig;

use super::runner::{CommandRunner, ToolError};

/// Shared handles every probe needs. Cheap to clone into spawned tasks.
#[derive(Clone)]
pub struct ProbeContext {
    pub runner: Arc<dyn CommandRunner>,
    pub config: Arc<CollectorConfig>,
    deadline: Option<Instant>,
}

impl ProbeContext {
    pub fn new(runner: Arc<dyn CommandRunner>, config: Arc<CollectorConfig>) -> Self {
        Self {
            runner,
            config,
            deadline: None,
        }
    }

    /// Copy of this context whose commands never run past `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Run with the general command timeout.
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<String, ToolError> {
        self.run_for(program, args, self.config.command_timeout())
            .await
    }

    /// Run with `timeout`, shortened to whatever is left before the deadline.
    pub async fn run_for(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, ToolError> {
        let timeout = match self.deadline {
            Some(deadline) => timeout.min(deadline.saturating_duration_since(Instant::now())),
            None => timeout,
        };
        if timeout.is_zero() {
            return Err(ToolError::DeadlinePassed {
                program: program.to_string(),
            });
        }
        self.runner.run(program, args, timeout).await
    }
}

#[cfg(test)]
pub(crate) fn scripted_context(
    runner: super::runner::scripted::ScriptedRunner,
) -> ProbeContext {
    ProbeContext::new(Arc::new(runner), Arc::new(CollectorConfig::default()))
}
