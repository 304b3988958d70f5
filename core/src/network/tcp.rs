use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::reachability::Prober;

/// The echo service port, probed when raw ICMP is not available.
pub const ECHO_PORT: u16 = 7;

/// Unprivileged reachability probe.
///
/// A completed handshake and an active refusal both prove the host's stack is
/// up. Silence until the deadline, or an unreachable route, does not.
#[derive(Debug, Clone, Copy)]
pub struct TcpProber {
    port: u16,
}

impl TcpProber {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Default for TcpProber {
    fn default() -> Self {
        Self::new(ECHO_PORT)
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, addr: IpAddr, probe_timeout: Duration) -> anyhow::Result<bool> {
        let socket_addr: SocketAddr = SocketAddr::new(addr, self.port);

        match timeout(probe_timeout, TcpStream::connect(socket_addr)).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => Ok(true),
            Ok(Err(e)) => Err(e.into()),
            Err(_elapsed) => Ok(false),
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
