use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, bail};
use tokio::process::Command;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Exited(Option<i32>),
}

/// A long-running child process owned by a background task.
///
/// Dropping the session kills the process.
pub struct ProcessSession {
    label: String,
    kill: Mutex<Option<oneshot::Sender<()>>>,
    status: watch::Receiver<SessionStatus>,
}

impl ProcessSession {
    /// Spawns `command` and gives it `grace` to fail fast. A process that
    /// exits non-zero within that window is reported as a launch error.
    pub async fn spawn(mut command: Command, label: &str, grace: Duration) -> anyhow::Result<Self> {
        command.stdin(Stdio::null()).kill_on_drop(true);
        let mut child = command
            .spawn()
            .with_context(|| format!("spawning {label}"))?;
        debug!("Spawned {label} (pid {:?})", child.id());

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let (status_tx, status_rx) = watch::channel(SessionStatus::Running);
        let name = label.to_string();

        tokio::spawn(async move {
            let exit = tokio::select! {
                exit = child.wait() => exit,
                _ = kill_rx => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill {name}: {e}");
                    }
                    child.wait().await
                }
            };
            let code = match exit {
                Ok(status) => {
                    debug!("{name} exited with {status}");
                    status.code()
                }
                Err(e) => {
                    warn!("Lost track of {name}: {e}");
                    None
                }
            };
            let _ = status_tx.send(SessionStatus::Exited(code));
        });

        let session = Self {
            label: label.to_string(),
            kill: Mutex::new(Some(kill_tx)),
            status: status_rx,
        };

        let mut status = session.status.clone();
        let waited =
            tokio::time::timeout(grace, status.wait_for(|s| *s != SessionStatus::Running)).await;
        let early_exit = match waited {
            Ok(Ok(exited)) => Some(*exited),
            _ => None,
        };
        if let Some(SessionStatus::Exited(code)) = early_exit
            && code != Some(0)
        {
            bail!("{label} exited during startup with status {code:?}");
        }

        Ok(session)
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.status() == SessionStatus::Running
    }

    /// Resolves once the process has exited, for whatever reason.
    pub async fn finished(&self) {
        let mut status = self.status.clone();
        let _ = status.wait_for(|s| *s != SessionStatus::Running).await;
    }

    pub async fn stop(&self) {
        let kill = self
            .kill
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(kill) = kill {
            debug!("Stopping {}", self.label);
            let _ = kill.send(());
        }
        self.finished().await;
    }
}
