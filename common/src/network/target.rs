//! # Wake Target Model
//!
//! The machine to wake: its MAC address and, optionally, the broadcast
//! address of its segment. The broadcast address may be left out and filled
//! in later, once it has been inferred from the delegate connector.

use std::fmt;
use std::net::Ipv4Addr;

use pnet::util::MacAddr;

use crate::error::WakeError;
use crate::network::mac;

/// Used when no broadcast address is configured and none could be guessed.
pub const DEFAULT_BROADCAST: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 255);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WakeTarget {
    pub mac: MacAddr,
    pub broadcast: Option<Ipv4Addr>,
}

impl WakeTarget {
    pub fn new(mac: MacAddr) -> Self {
        Self {
            mac,
            broadcast: None,
        }
    }

    pub fn with_broadcast(mut self, broadcast: Ipv4Addr) -> Self {
        self.broadcast = Some(broadcast);
        self
    }

    /// Validates both addresses. A blank broadcast string counts as absent.
    pub fn parse(mac_addr: &str, broadcast: Option<&str>) -> Result<Self, WakeError> {
        let target = Self::new(mac::parse_mac(mac_addr.trim())?);
        match broadcast.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Ok(target.with_broadcast(parse_ipv4(raw)?)),
            None => Ok(target),
        }
    }
}

impl fmt::Display for WakeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.broadcast {
            Some(broadcast) => write!(f, "{} via {}", self.mac, broadcast),
            None => write!(f, "{}", self.mac),
        }
    }
}

/// Strict dotted-quad parsing; host names are not accepted here.
pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr, WakeError> {
    s.parse::<Ipv4Addr>()
        .map_err(|_| WakeError::invalid_address(s, "not a dotted-quad IPv4 address"))
}
