//! Launches an agent over `ssh` and keeps the session open while it runs.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::debug;
use wolagent_core::{HostSource, Launcher, RemoteChannel};

use crate::process::ProcessSession;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshOptions {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
    /// Remote command that starts the agent.
    pub command: String,
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default = "default_startup_grace")]
    pub startup_grace_millis: u64,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_millis: u64,
}

fn default_program() -> String {
    "ssh".into()
}

fn default_startup_grace() -> u64 {
    1_000
}

fn default_command_timeout() -> u64 {
    10_000
}

impl SshOptions {
    fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }

    /// `ssh [options] destination`, ready for a remote command argument.
    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("-o").arg("BatchMode=yes");
        if let Some(port) = self.port {
            command.arg("-p").arg(port.to_string());
        }
        if let Some(identity) = &self.identity_file {
            command.arg("-i").arg(identity);
        }
        command.args(&self.extra_args).arg(self.destination());
        command
    }
}

pub struct SshConnector {
    options: SshOptions,
    session: Mutex<Option<Arc<ProcessSession>>>,
}

impl SshConnector {
    pub fn new(options: SshOptions) -> Self {
        Self {
            options,
            session: Mutex::new(None),
        }
    }

    pub fn from_options(options: &Map<String, Value>) -> anyhow::Result<Arc<dyn Launcher>> {
        let options: SshOptions = serde_json::from_value(Value::Object(options.clone()))
            .context("invalid ssh connector options")?;
        Ok(Arc::new(Self::new(options)))
    }

    fn current_session(&self) -> Option<Arc<ProcessSession>> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Launcher for SshConnector {
    fn name(&self) -> &str {
        "ssh"
    }

    async fn launch(&self) -> anyhow::Result<()> {
        let mut command = self.options.command();
        command.arg(&self.options.command);
        let grace = Duration::from_millis(self.options.startup_grace_millis);

        let label = format!("ssh session to {}", self.options.destination());
        let session = ProcessSession::spawn(command, &label, grace).await?;
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(session));
        Ok(())
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        // The stopped session stays around so `finished` still resolves.
        if let Some(session) = self.current_session() {
            session.stop().await;
        }
        Ok(())
    }

    async fn finished(&self) {
        match self.current_session() {
            Some(session) => session.finished().await,
            None => std::future::pending::<()>().await,
        }
    }

    fn host_source(&self) -> Option<&dyn HostSource> {
        Some(self)
    }

    fn channel(&self) -> Option<Arc<dyn RemoteChannel>> {
        let session = self.current_session()?;
        if !session.is_running() {
            return None;
        }
        Some(Arc::new(SshChannel {
            options: self.options.clone(),
        }))
    }
}

impl HostSource for SshConnector {
    fn host(&self) -> anyhow::Result<Option<String>> {
        Ok(Some(self.options.host.clone()))
    }
}

/// Runs one-off commands next to the agent session.
pub struct SshChannel {
    options: SshOptions,
}

#[async_trait]
impl RemoteChannel for SshChannel {
    async fn execute(&self, command: &str) -> std::io::Result<Option<i32>> {
        let mut ssh = self.options.command();
        ssh.arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let limit = Duration::from_millis(self.options.command_timeout_millis);
        match tokio::time::timeout(limit, ssh.output()).await {
            Ok(output) => {
                let output = output?;
                if !output.stderr.is_empty() {
                    debug!("{}", String::from_utf8_lossy(&output.stderr).trim_end());
                }
                Ok(output.status.code())
            }
            // A suspending machine often drops the connection without an answer.
            Err(_elapsed) => {
                debug!("No exit status for '{command}' after {}ms", limit.as_millis());
                Ok(None)
            }
        }
    }
}
