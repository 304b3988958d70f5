//! Sending Wake-on-LAN magic packets.
//!
//! The UDP socket comes from a [`TransportFactory`] so the exact datagram can
//! be observed without touching the network. A transport is opened per send
//! and dropped before [`MagicPacketSender::send_packet`] returns, on every
//! path.

use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;

use async_trait::async_trait;
use pnet::util::MacAddr;
use tokio::net::UdpSocket;
use tracing::{debug, info};
use wolagent_common::WakeError;
use wolagent_common::network::{mac, target};
use wolagent_protocols::magic::{self, WOL_PORT};

/// One-shot datagram sink.
#[async_trait]
pub trait DatagramTransport: Send {
    async fn send_to(&mut self, payload: &[u8], destination: SocketAddrV4) -> io::Result<usize>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn open(&self) -> io::Result<Box<dyn DatagramTransport>>;
}

/// Unbound IPv4 UDP socket with `SO_BROADCAST` set.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpTransportFactory;

struct UdpTransport(UdpSocket);

#[async_trait]
impl DatagramTransport for UdpTransport {
    async fn send_to(&mut self, payload: &[u8], destination: SocketAddrV4) -> io::Result<usize> {
        self.0.send_to(payload, destination).await
    }
}

#[async_trait]
impl TransportFactory for UdpTransportFactory {
    async fn open(&self) -> io::Result<Box<dyn DatagramTransport>> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_broadcast(true)?;
        Ok(Box::new(UdpTransport(socket)))
    }
}

#[derive(Clone)]
pub struct MagicPacketSender {
    factory: Arc<dyn TransportFactory>,
}

impl Default for MagicPacketSender {
    fn default() -> Self {
        Self::new(Arc::new(UdpTransportFactory))
    }
}

impl MagicPacketSender {
    pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
        Self { factory }
    }

    /// Validates both addresses, then sends a single magic packet to
    /// `broadcast:9`. Nothing touches the network if validation fails.
    pub async fn send(&self, broadcast: &str, mac_addr: &str) -> Result<(), WakeError> {
        let mac_addr = mac::parse_mac(mac_addr)?;
        let broadcast = target::parse_ipv4(broadcast)?;
        self.send_packet(broadcast, mac_addr).await
    }

    /// Fire and forget: no acknowledgment exists, and failures are not
    /// retried here.
    pub async fn send_packet(&self, broadcast: Ipv4Addr, mac_addr: MacAddr) -> Result<(), WakeError> {
        info!("Sending magic packet to broadcast IP {broadcast} for MAC {mac_addr}");
        let destination = SocketAddrV4::new(broadcast, WOL_PORT);
        let packet = magic::create_packet(mac_addr);

        let transmission = |source: io::Error| WakeError::Transmission {
            destination: destination.to_string(),
            source,
        };

        let mut transport = self.factory.open().await.map_err(transmission)?;
        let sent = transport
            .send_to(&packet, destination)
            .await
            .map_err(transmission)?;
        debug!("Sent {sent} bytes to {destination}");
        Ok(())
    }
}
