//! Command runner: executes diagnostic tools with a hard timeout.
//!
//! All failures come back as [`ToolError`] values so probes can walk their
//! fallback chains. Retrying is the caller's business.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("{program} is unavailable: {reason}")]
    Unavailable { program: String, reason: String },
    #[error("{program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },
    #[error("{program} exited with status {status:?}: {stderr}")]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("{program} not started: collection deadline passed")]
    DeadlinePassed { program: String },
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, returning stdout on a zero exit status.
    async fn run(&self, program: &str, args: &[&str], timeout: Duration)
        -> Result<String, ToolError>;
}

/// Runs real subprocesses through tokio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, ToolError> {
        debug!(command = %command_line(program, args), "spawning");

        // kill_on_drop reaps the child when the timeout drops the wait future
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::Unavailable {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::Unavailable {
                    program: program.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ToolError::Timeout {
                    program: program.to_string(),
                    after: timeout,
                })
            }
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(ToolError::Failed {
                program: program.to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Render a command the way a shell user would type it.
pub fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    //! Runner double that answers from canned tool output.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{command_line, CommandRunner, ToolError};

    #[derive(Debug, Clone)]
    enum Reply {
        Output(Result<String, ToolError>),
        Hang,
    }

    /// Unscripted commands behave as if the binary were missing.
    #[derive(Debug, Default)]
    pub struct ScriptedRunner {
        replies: HashMap<String, Reply>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ok(mut self, line: &str, stdout: &str) -> Self {
            self.replies
                .insert(line.to_string(), Reply::Output(Ok(stdout.to_string())));
            self
        }

        pub fn fail(mut self, line: &str) -> Self {
            let program = line.split_whitespace().next().unwrap_or(line).to_string();
            self.replies.insert(
                line.to_string(),
                Reply::Output(Err(ToolError::Failed {
                    program,
                    status: Some(1),
                    stderr: String::new(),
                })),
            );
            self
        }

        /// Never answers; the call ends only when its timeout elapses.
        pub fn hang(mut self, line: &str) -> Self {
            self.replies.insert(line.to_string(), Reply::Hang);
            self
        }

        pub fn called(&self, line: &str) -> bool {
            self.calls.lock().unwrap().iter().any(|c| c == line)
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(
            &self,
            program: &str,
            args: &[&str],
            timeout: Duration,
        ) -> Result<String, ToolError> {
            let line = command_line(program, args);
            self.calls.lock().unwrap().push(line.clone());

            match self.replies.get(&line).cloned() {
                Some(Reply::Output(result)) => result,
                Some(Reply::Hang) => {
                    tokio::time::sleep(timeout).await;
                    Err(ToolError::Timeout {
                        program: program.to_string(),
                        after: timeout,
                    })
                }
                None => Err(ToolError::Unavailable {
                    program: program.to_string(),
                    reason: "not scripted".into(),
                }),
            }
        }
    }
}
