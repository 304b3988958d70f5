//! # Wake Orchestrator
//!
//! Wraps a delegate [`Launcher`] so that launching it first wakes the target
//! machine:
//!
//! 1. infer the target host and, if needed, its broadcast address
//! 2. send the magic packet
//! 3. wait until the host answers (or cool down when it is unknown)
//! 4. hand over to the delegate
//!
//! Tearing down runs the configured [`DisconnectAction`] before the delegate
//! disconnects. Nothing that goes wrong during teardown stops the delegate's
//! own disconnect.

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

use tracing::{debug, error, warn};
use wolagent_common::WakeError;
use wolagent_common::config::{DisconnectAction, WaitPolicy, WakeConfig};
use wolagent_common::network::target::{DEFAULT_BROADCAST, WakeTarget};

use crate::delegate::{Delegate, Launcher};
use crate::inference;
use crate::progress::{ProgressSink, TracingProgress};
use crate::reachability::{self, ReachabilityWaiter};
use crate::remote;
use crate::wake::MagicPacketSender;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    AddressResolved,
    PacketSent,
    Reachable,
    Delegated,
    Active,
    DisconnectRequested,
    Done,
    Failed(String),
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleState::Failed(reason) => write!(f, "Failed ({reason})"),
            other => write!(f, "{other:?}"),
        }
    }
}

pub struct WakeOrchestrator {
    target: WakeTarget,
    policy: WaitPolicy,
    action: DisconnectAction,
    base: Arc<dyn Launcher>,
    sender: MagicPacketSender,
    waiter: ReachabilityWaiter,
    progress: Arc<dyn ProgressSink>,
    state: CycleState,
    delegated: bool,
}

impl WakeOrchestrator {
    /// Wraps `delegate`. Nested orchestrators are unwrapped first so a
    /// machine is never woken twice per launch.
    pub fn new(
        target: WakeTarget,
        policy: WaitPolicy,
        action: DisconnectAction,
        delegate: impl Into<Delegate>,
    ) -> Self {
        Self {
            target,
            policy,
            action,
            base: delegate.into().into_base(),
            sender: MagicPacketSender::default(),
            waiter: ReachabilityWaiter::new(reachability::default_prober()),
            progress: Arc::new(TracingProgress),
            state: CycleState::Idle,
            delegated: false,
        }
    }

    pub fn from_config(config: &WakeConfig, delegate: impl Into<Delegate>) -> Result<Self, WakeError> {
        Ok(Self::new(
            config.target()?,
            config.wait_policy()?,
            config.disconnect_action.clone(),
            delegate,
        ))
    }

    pub fn with_sender(mut self, sender: MagicPacketSender) -> Self {
        self.sender = sender;
        self
    }

    pub fn with_waiter(mut self, waiter: ReachabilityWaiter) -> Self {
        self.waiter = waiter;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn target(&self) -> &WakeTarget {
        &self.target
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    pub fn launcher(&self) -> &Arc<dyn Launcher> {
        &self.base
    }

    pub fn into_delegate(self) -> Delegate {
        Delegate::Base(self.base)
    }

    /// Runs one launch cycle. Only the packet send, the reachability wait
    /// and the delegate launch can fail it.
    pub async fn launch(&mut self) -> Result<(), WakeError> {
        self.state = CycleState::Idle;
        self.delegated = false;

        let result = self.run_launch().await;
        match &result {
            Ok(()) => self.state = CycleState::Active,
            Err(e) => {
                error!("Launch of {} failed: {e}", self.base.name());
                self.state = CycleState::Failed(e.to_string());
            }
        }
        result
    }

    async fn run_launch(&mut self) -> Result<(), WakeError> {
        let host = inference::infer_host(self.base.as_ref());
        match &host {
            Some(host) => self.report(&format!("Inferred host name: {host}")),
            None => {
                self.report(&format!("Unable to infer host name from {}", self.base.name()));
                self.report("Using static cooldown instead of pinging");
            }
        }

        let broadcast = self.resolve_broadcast(host.as_deref()).await;
        self.state = CycleState::AddressResolved;

        self.report("Sending magic packet, time to wake up");
        self.sender.send_packet(broadcast, self.target.mac).await?;
        self.state = CycleState::PacketSent;
        self.report(&format!("Magic packet sent to {broadcast}"));

        match &host {
            Some(host) => self.report(&format!("Pinging {host}")),
            None => self.report("Waiting for the node to wake up"),
        }
        self.waiter
            .wait_until_reachable(host.as_deref(), &self.policy)
            .await?;
        self.state = CycleState::Reachable;

        self.report(&format!("Launching agent via {}", self.base.name()));
        self.state = CycleState::Delegated;
        self.delegated = true;
        self.base.launch().await.map_err(WakeError::Delegate)
    }

    /// Configured address first, then a guess from the inferred host, then
    /// the fixed default. The outcome is remembered for later cycles.
    async fn resolve_broadcast(&mut self, host: Option<&str>) -> Ipv4Addr {
        if let Some(broadcast) = self.target.broadcast {
            return broadcast;
        }

        let guessed = match host {
            Some(host) => {
                self.report("No explicit broadcast IP specified, trying to guess it from the inferred host");
                match inference::guess_broadcast(host).await {
                    Ok(broadcast) => {
                        self.report(&format!("Guessed broadcast IP: {broadcast}"));
                        Some(broadcast)
                    }
                    Err(e) => {
                        self.report(&format!("Unable to guess broadcast IP from inferred host ({e})"));
                        None
                    }
                }
            }
            None => None,
        };

        let broadcast = guessed.unwrap_or_else(|| {
            self.report(&format!("Defaulting broadcast IP to {DEFAULT_BROADCAST}"));
            DEFAULT_BROADCAST
        });
        self.target.broadcast = Some(broadcast);
        broadcast
    }

    /// Marks a cycle whose `launch` future was dropped before it finished.
    /// Cycles that already settled keep their state.
    pub fn interrupt(&mut self) {
        if !matches!(
            self.state,
            CycleState::Active | CycleState::Done | CycleState::Failed(_)
        ) {
            warn!("Launch of {} interrupted in state {}", self.base.name(), self.state);
            self.state = CycleState::Failed("interrupted".into());
        }
    }

    /// Teardown. The disconnect action runs at most once per cycle and only
    /// if the delegate was handed control; its failures are logged and
    /// swallowed. The delegate disconnects regardless.
    pub async fn disconnect(&mut self) -> Result<(), WakeError> {
        if self.delegated {
            self.delegated = false;
            self.state = CycleState::DisconnectRequested;
            self.run_disconnect_action().await;
        } else {
            debug!("Launch never reached the delegate, skipping disconnect action");
        }

        let result = self.base.disconnect().await.map_err(WakeError::Delegate);
        self.state = CycleState::Done;
        result
    }

    async fn run_disconnect_action(&self) {
        let Some(command) = self.action.command() else {
            return;
        };

        self.report(&format!("Execute command before disconnecting: {command}"));
        let channel = self.base.channel();
        if let Err(e) = remote::run_command(channel.as_deref(), &command).await {
            warn!("Pre-disconnect command failed: {e}");
            self.report(&format!("Could not execute command on remote ({e})"));
        }
    }

    fn report(&self, line: &str) {
        self.progress.report(line);
    }
}
