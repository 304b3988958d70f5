use anyhow::Context;
use pnet::packet::Packet;
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{IcmpCode, IcmpPacket, IcmpTypes, checksum};

const ECHO_HDR_LEN: usize = 8;
const ECHO_PAYLOAD: &[u8] = b"wolagent";

/// ICMPv4 echo request with a valid checksum, ready for a layer 4 channel.
pub fn create_echo_request(identifier: u16, sequence: u16) -> anyhow::Result<Vec<u8>> {
    let mut buffer = vec![0u8; ECHO_HDR_LEN + ECHO_PAYLOAD.len()];
    {
        let mut echo =
            MutableEchoRequestPacket::new(&mut buffer).context("creating echo request packet")?;
        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(IcmpCode(0));
        echo.set_identifier(identifier);
        echo.set_sequence_number(sequence);
        echo.set_payload(ECHO_PAYLOAD);
        echo.set_checksum(0);
    }
    let csum = checksum(&IcmpPacket::new(&buffer).context("creating ICMP packet")?);
    {
        let mut echo =
            MutableEchoRequestPacket::new(&mut buffer).context("creating echo request packet")?;
        echo.set_checksum(csum);
    }
    Ok(buffer)
}

/// True if `packet` is the echo reply to a request sent with `identifier`.
pub fn is_echo_reply(packet: &IcmpPacket, identifier: u16) -> bool {
    if packet.get_icmp_type() != IcmpTypes::EchoReply {
        return false;
    }
    EchoReplyPacket::new(packet.packet())
        .map(|reply| reply.get_identifier() == identifier)
        .unwrap_or(false)
}
