//! Address classification shared by every resolution strategy.

use std::net::Ipv4Addr;
use std::str::FromStr;

/// Returns true if `addr` must never be reported as the host address:
/// loopback (`127.0.0.0/8`), unspecified (`0.0.0.0`), limited broadcast
/// (`255.255.255.255`), or the conventional container-bridge allocation
/// (`172.16.0.0/12`).
pub fn is_excluded(addr: Ipv4Addr) -> bool {
    addr.is_loopback() || addr.is_unspecified() || addr.is_broadcast() || is_bridge_range(addr)
}

/// Returns true if `addr` falls in `172.16.0.0/12`.
pub fn is_bridge_range(addr: Ipv4Addr) -> bool {
    let octets = addr.octets();
    octets[0] == 172 && (16..=31).contains(&octets[1])
}

/// Returns true for the private ranges preferred over any other candidate
/// (`192.168.0.0/16`, `10.0.0.0/8`). The bridge range is deliberately not
/// preferred even though it is RFC 1918 private.
pub fn is_preferred_private(addr: Ipv4Addr) -> bool {
    let octets = addr.octets();
    (octets[0] == 192 && octets[1] == 168) || octets[0] == 10
}

/// Returns true if `addr` reads as a subnet mask rather than a host address:
/// its bit pattern is a contiguous run of ones followed by zeros.
///
/// Used when scanning raw routing-table fields, where the mask column cannot
/// always be identified positionally.
pub fn is_subnet_mask(addr: Ipv4Addr) -> bool {
    let bits = u32::from(addr);
    bits != 0 && bits.leading_ones() + bits.trailing_zeros() == 32
}

/// Extracts every dotted-quad IPv4 token from free-form kernel text.
///
/// Tokens are split on whitespace and on `/` so that prefix notations like
/// `192.168.0.0/24` yield their address part.
pub fn scan_ipv4_tokens(text: &str) -> impl Iterator<Item = Ipv4Addr> + '_ {
    text.split_whitespace()
        .flat_map(|token| token.split('/'))
        .filter_map(|token| Ipv4Addr::from_str(token).ok())
}

/// Picks the best candidate from `addrs`: the first preferred-private
/// address if any exists, else the first address at all. Excluded addresses
/// must already have been filtered out by the caller.
pub fn prefer_private(addrs: &[Ipv4Addr]) -> Option<Ipv4Addr> {
    addrs
        .iter()
        .copied()
        .find(|addr| is_preferred_private(*addr))
        .or_else(|| addrs.first().copied())
}
