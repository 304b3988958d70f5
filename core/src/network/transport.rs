use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use pnet::packet::icmp::IcmpPacket;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::transport::{
    self, TransportChannelType, TransportProtocol, TransportReceiver, TransportSender,
};
use wolagent_protocols::icmp;

use super::tcp::TcpProber;
use crate::reachability::Prober;

const TRANSPORT_BUFFER_SIZE: usize = 4096;
const CHANNEL_TYPE_ICMP: TransportChannelType =
    TransportChannelType::Layer4(TransportProtocol::Ipv4(IpNextHeaderProtocols::Icmp));

/// ICMP echo probe over a raw layer 4 channel. Requires root.
///
/// Only IPv4 is pinged; IPv6 targets are handed to the TCP fallback.
#[derive(Debug, Default)]
pub struct IcmpProber {
    fallback: TcpProber,
}

impl IcmpProber {
    pub fn new(fallback: TcpProber) -> Self {
        Self { fallback }
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, addr: IpAddr, probe_timeout: Duration) -> anyhow::Result<bool> {
        let IpAddr::V4(v4) = addr else {
            return self.fallback.probe(addr, probe_timeout).await;
        };

        let identifier: u16 = rand::random();
        tokio::task::spawn_blocking(move || echo(v4, identifier, probe_timeout)).await?
    }
}

fn echo(addr: Ipv4Addr, identifier: u16, probe_timeout: Duration) -> anyhow::Result<bool> {
    let (mut tx, mut rx) = open_channel()?;
    let request: Vec<u8> = icmp::create_echo_request(identifier, 0)?;
    let packet = IcmpPacket::new(&request).context("creating ICMP packet")?;
    tx.send_to(packet, IpAddr::V4(addr))?;

    let deadline = Instant::now() + probe_timeout;
    let mut iterator = transport::icmp_packet_iter(&mut rx);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(false);
        }
        match iterator.next_with_timeout(remaining)? {
            Some((reply, source)) if source == IpAddr::V4(addr) => {
                if icmp::is_echo_reply(&reply, identifier) {
                    return Ok(true);
                }
            }
            Some(_) => {}
            None => return Ok(false),
        }
    }
}

fn open_channel() -> anyhow::Result<(TransportSender, TransportReceiver)> {
    let (tx, rx) = transport::transport_channel(TRANSPORT_BUFFER_SIZE, CHANNEL_TYPE_ICMP)
        .context("opening ICMP channel (root required)")?;
    Ok((tx, rx))
}
