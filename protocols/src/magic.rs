use pnet::util::MacAddr;
use wolagent_common::network::mac;

/// The Wake-on-LAN discard port.
pub const WOL_PORT: u16 = 9;

const SYNC_LEN: usize = 6;
const MAC_REPETITIONS: usize = 16;

/// 6 sync bytes followed by 16 copies of the MAC.
pub const MAGIC_PACKET_LEN: usize = SYNC_LEN + MAC_REPETITIONS * 6;

/// Builds the magic packet payload that wakes the NIC owning `mac_addr`.
pub fn create_packet(mac_addr: MacAddr) -> [u8; MAGIC_PACKET_LEN] {
    let octets = mac::to_octets(mac_addr);
    let mut packet = [0xFFu8; MAGIC_PACKET_LEN];
    for chunk in packet[SYNC_LEN..].chunks_exact_mut(octets.len()) {
        chunk.copy_from_slice(&octets);
    }
    packet
}
