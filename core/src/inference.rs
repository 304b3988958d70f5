//! Best-effort discovery of the target's address from its delegate
//! connector.

use std::net::{IpAddr, Ipv4Addr};

use tracing::warn;
use wolagent_common::WakeError;
use wolagent_common::network::range;

use crate::delegate::Launcher;

/// The host the delegate will connect to, if it is willing to say.
///
/// A connector that cannot yield a host, or fails while doing so, gives
/// `None`; the caller then falls back to a fixed cooldown.
pub fn infer_host(launcher: &dyn Launcher) -> Option<String> {
    let source = launcher.host_source()?;
    match source.host() {
        Ok(host) => host
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty()),
        Err(e) => {
            warn!("Unable to infer host from {}: {e:#}", launcher.name());
            None
        }
    }
}

/// Broadcast address of `host`'s subnet, assuming a `/24`.
///
/// IPv4 literals are used as is, anything else goes through the resolver and
/// its first IPv4 answer is used.
pub async fn guess_broadcast(host: &str) -> Result<Ipv4Addr, WakeError> {
    let ip = match host.parse::<Ipv4Addr>() {
        Ok(ip) => ip,
        Err(_) => resolve_v4(host).await?,
    };
    Ok(range::guess_broadcast(ip))
}

async fn resolve_v4(host: &str) -> Result<Ipv4Addr, WakeError> {
    let unresolvable = |reason: String| WakeError::UnresolvableHost {
        host: host.to_string(),
        reason,
    };

    let addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| unresolvable(e.to_string()))?;

    addrs
        .filter_map(|socket_addr| match socket_addr.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| unresolvable("no IPv4 address".into()))
}
