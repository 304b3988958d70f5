//! Launches a local command, e.g. a script that connects to the woken
//! machine on its own.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::process::Command;
use wolagent_core::{HostSource, Launcher};

use crate::process::ProcessSession;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecOptions {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// The machine the command talks to, if known.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_startup_grace")]
    pub startup_grace_millis: u64,
}

fn default_startup_grace() -> u64 {
    1_000
}

pub struct ExecConnector {
    options: ExecOptions,
    session: Mutex<Option<Arc<ProcessSession>>>,
}

impl ExecConnector {
    pub fn new(options: ExecOptions) -> Self {
        Self {
            options,
            session: Mutex::new(None),
        }
    }

    pub fn from_options(options: &Map<String, Value>) -> anyhow::Result<Arc<dyn Launcher>> {
        let options: ExecOptions = serde_json::from_value(Value::Object(options.clone()))
            .context("invalid exec connector options")?;
        Ok(Arc::new(Self::new(options)))
    }
}

#[async_trait]
impl Launcher for ExecConnector {
    fn name(&self) -> &str {
        "exec"
    }

    async fn launch(&self) -> anyhow::Result<()> {
        let mut command = Command::new(&self.options.program);
        command.args(&self.options.args);
        let grace = Duration::from_millis(self.options.startup_grace_millis);

        let session = ProcessSession::spawn(command, &self.options.program, grace).await?;
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(session));
        Ok(())
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        // The stopped session stays around so `finished` still resolves.
        let session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(session) = session {
            session.stop().await;
        }
        Ok(())
    }

    async fn finished(&self) {
        let session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match session {
            Some(session) => session.finished().await,
            None => std::future::pending::<()>().await,
        }
    }

    fn host_source(&self) -> Option<&dyn HostSource> {
        self.options.host.as_ref().map(|_| self as &dyn HostSource)
    }
}

impl HostSource for ExecConnector {
    fn host(&self) -> anyhow::Result<Option<String>> {
        Ok(self.options.host.clone())
    }
}
