//! Bit-exact builders for the packets this tool puts on the wire.

pub mod icmp;
pub mod magic;
