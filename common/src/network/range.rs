use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;

/// Prefix assumed when guessing the broadcast address of a host's subnet.
///
/// There is no way to learn the real mask of a remote host, so `/24` it is.
pub const GUESSED_PREFIX: u8 = 24;

/// Broadcast address of the network `ip/prefix`.
pub fn broadcast_for(ip: Ipv4Addr, prefix: u8) -> anyhow::Result<Ipv4Addr> {
    let network = Ipv4Network::new(ip, prefix)?;
    Ok(network.broadcast())
}

/// `a.b.c.d` becomes `a.b.c.255`.
pub fn guess_broadcast(ip: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = ip.octets();
    broadcast_for(ip, GUESSED_PREFIX).unwrap_or(Ipv4Addr::new(a, b, c, 255))
}
