//! # Delegate Connectors
//!
//! The thing that actually logs into (or starts an agent on) the woken
//! machine. The orchestrator only needs [`Launcher::launch`]; everything else
//! is an optional capability a connector may or may not offer:
//!
//! * [`HostSource`]: tells us which host the connector is going to talk to,
//!   so the orchestrator can probe it and guess its broadcast address.
//! * [`RemoteChannel`]: an established channel to the remote machine, used
//!   for the command run right before disconnecting.
//!
//! Capabilities are declared by the implementing type, not discovered at
//! runtime.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::orchestrator::WakeOrchestrator;

#[async_trait]
pub trait Launcher: Send + Sync {
    /// Short name used in progress output.
    fn name(&self) -> &str;

    async fn launch(&self) -> anyhow::Result<()>;

    /// Tears the connection down. Called after any pre-disconnect command.
    async fn disconnect(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Resolves once the launched session ends on its own.
    ///
    /// Connectors that cannot tell never resolve.
    async fn finished(&self) {
        std::future::pending::<()>().await
    }

    fn host_source(&self) -> Option<&dyn HostSource> {
        None
    }

    /// The currently established channel, if any.
    fn channel(&self) -> Option<Arc<dyn RemoteChannel>> {
        None
    }
}

pub trait HostSource: Send + Sync {
    /// Errors mean the connector could not report its host at all; a
    /// missing host is `Ok(None)`.
    fn host(&self) -> anyhow::Result<Option<String>>;
}

#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Runs `command` on the remote machine and returns its exit code, if the
    /// channel reports one.
    async fn execute(&self, command: &str) -> std::io::Result<Option<i32>>;
}

/// A launcher, possibly already wrapped in a wake orchestrator.
pub enum Delegate {
    Wake(Box<WakeOrchestrator>),
    Base(Arc<dyn Launcher>),
}

impl Delegate {
    pub fn base(launcher: Arc<dyn Launcher>) -> Self {
        Self::Base(launcher)
    }

    /// Peels off every wake wrapper and returns the launcher underneath.
    pub fn into_base(self) -> Arc<dyn Launcher> {
        let mut current = self;
        loop {
            match current {
                Delegate::Base(launcher) => return launcher,
                Delegate::Wake(orchestrator) => {
                    warn!(
                        "Delegate for {} is already a wake orchestrator, unwrapping it",
                        orchestrator.target()
                    );
                    current = orchestrator.into_delegate();
                }
            }
        }
    }
}

impl From<Arc<dyn Launcher>> for Delegate {
    fn from(launcher: Arc<dyn Launcher>) -> Self {
        Self::Base(launcher)
    }
}
