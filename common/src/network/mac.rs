use pnet::util::MacAddr;

use crate::error::WakeError;

const OCTETS: usize = 6;

/// Parses a MAC address written as six two-digit hex octets separated by
/// `:` or `-` (e.g. `DE-AD-BE-EF-12-34`, `de:ad:be:ef:12:34`).
pub fn parse_mac(s: &str) -> Result<MacAddr, WakeError> {
    let fields: Vec<&str> = s.split([':', '-']).collect();
    if fields.len() != OCTETS {
        return Err(WakeError::invalid_address(s, "expected six octets"));
    }

    let mut octets = [0u8; OCTETS];
    for (slot, field) in octets.iter_mut().zip(&fields) {
        if field.len() != 2 || !field.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WakeError::invalid_address(s, "invalid hex digit in octet"));
        }
        *slot = u8::from_str_radix(field, 16)
            .map_err(|_| WakeError::invalid_address(s, "invalid hex digit in octet"))?;
    }

    let [a, b, c, d, e, f] = octets;
    Ok(MacAddr::new(a, b, c, d, e, f))
}

pub fn to_octets(mac: MacAddr) -> [u8; OCTETS] {
    [mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]
}
