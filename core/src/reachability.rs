//! Waiting for a freshly woken machine to answer on the network.
//!
//! The poll loop runs on its own tokio task and is raced against the overall
//! deadline, so a probe that hangs can never stretch the wait past
//! `timeout`. Dropping the wait (e.g. the whole launch is aborted) aborts the
//! loop as well.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use wolagent_common::WakeError;
use wolagent_common::config::WaitPolicy;

use crate::network::tcp::TcpProber;
use crate::network::transport::IcmpProber;

/// Sleep used instead of polling when the target's address is unknown.
pub const COOLDOWN: Duration = Duration::from_millis(5_000);

/// A single "is this address answering" check.
#[async_trait]
pub trait Prober: Send + Sync {
    /// `Ok(false)` means no answer within `timeout`; errors are retried by
    /// the caller like any other miss.
    async fn probe(&self, addr: IpAddr, timeout: Duration) -> anyhow::Result<bool>;
}

/// Raw ICMP when running as root, TCP echo-port connects otherwise.
pub fn default_prober() -> Arc<dyn Prober> {
    if is_root::is_root() {
        debug!("Running as root, probing with ICMP echo");
        Arc::new(IcmpProber::default())
    } else {
        debug!("Not running as root, probing with TCP connects");
        Arc::new(TcpProber::default())
    }
}

pub struct ReachabilityWaiter {
    prober: Arc<dyn Prober>,
    cooldown: Duration,
}

impl ReachabilityWaiter {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self {
            prober,
            cooldown: COOLDOWN,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Returns once `host` answers a probe, or fails with
    /// [`WakeError::Timeout`] when `policy.timeout()` has elapsed.
    ///
    /// Without a host there is nothing to probe: the fixed cooldown is slept
    /// and the wait always succeeds.
    pub async fn wait_until_reachable(
        &self,
        host: Option<&str>,
        policy: &WaitPolicy,
    ) -> Result<(), WakeError> {
        let Some(host) = host.map(str::trim).filter(|h| !h.is_empty()) else {
            debug!("No host to probe, cooling down for {}ms", self.cooldown.as_millis());
            tokio::time::sleep(self.cooldown).await;
            return Ok(());
        };

        let mut task = PollTask(tokio::spawn(poll_loop(
            Arc::clone(&self.prober),
            host.to_string(),
            policy.poll_interval(),
        )));

        match tokio::time::timeout(policy.timeout(), &mut task.0).await {
            Ok(Ok(addr)) => {
                info!("{host} ({addr}) is reachable");
                Ok(())
            }
            Ok(Err(e)) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Ok(Err(_cancelled)) => Err(WakeError::Interrupted),
            Err(_elapsed) => Err(WakeError::Timeout {
                host: host.to_string(),
                timeout: policy.timeout(),
            }),
        }
    }
}

/// Aborts the poll loop whenever the wait ends, whichever way it ends.
struct PollTask(JoinHandle<IpAddr>);

impl Drop for PollTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn poll_loop(prober: Arc<dyn Prober>, host: String, interval: Duration) -> IpAddr {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match resolve(&host).await {
            Ok(addr) => {
                match tokio::time::timeout(interval, prober.probe(addr, interval)).await {
                    Ok(Ok(true)) => return addr,
                    Ok(Ok(false)) => debug!("Attempt {attempt}: {host} did not answer"),
                    Ok(Err(e)) => debug!("Attempt {attempt}: probing {host} failed: {e}"),
                    Err(_elapsed) => debug!("Attempt {attempt}: probe of {host} timed out"),
                }
            }
            // Names of sleeping machines often only resolve once they are up.
            Err(e) => debug!("Attempt {attempt}: {e}"),
        }
        tokio::time::sleep(interval).await;
    }
}

async fn resolve(host: &str) -> anyhow::Result<IpAddr> {
    if let Ok(addr) = host.parse::<IpAddr>() {
        return Ok(addr);
    }
    tokio::net::lookup_host((host, 0))
        .await?
        .next()
        .map(|socket_addr| socket_addr.ip())
        .ok_or_else(|| anyhow::anyhow!("{host} has no addresses"))
}
