use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Is `addr` in a private, loopback, link-local or otherwise reserved range?
///
/// No geolocation provider holds data for such addresses.
#[must_use]
pub fn is_reserved(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(addr) => is_reserved_v4(addr),
        IpAddr::V6(addr) => is_reserved_v6(addr),
    }
}

fn is_reserved_v4(addr: Ipv4Addr) -> bool {
    let [a, b, ..] = addr.octets();
    addr.is_private()
        || addr.is_loopback()
        || addr.is_link_local()
        || addr.is_unspecified()
        || addr.is_broadcast()
        || addr.is_documentation()
        || addr.is_multicast()
        // shared address space 100.64.0.0/10
        || (a == 100 && (b & 0b1100_0000) == 64)
        // benchmarking 198.18.0.0/15
        || (a == 198 && (b & 0b1111_1110) == 18)
        // reserved 240.0.0.0/4
        || a >= 240
        // "this network" 0.0.0.0/8
        || a == 0
}

fn is_reserved_v6(addr: Ipv6Addr) -> bool {
    if let Some(mapped) = addr.to_ipv4_mapped() {
        return is_reserved_v4(mapped);
    }
    let first = addr.segments()[0];
    let second = addr.segments()[1];
    addr.is_loopback()
        || addr.is_unspecified()
        || addr.is_multicast()
        // unique local fc00::/7
        || (first & 0xfe00) == 0xfc00
        // link local fe80::/10
        || (first & 0xffc0) == 0xfe80
        // documentation 2001:db8::/32
        || (first == 0x2001 && second == 0x0db8)
}
