//! CIDR parsing, containment arithmetic, and private-range classification.
//!
//! All functions here are pure. Blocks are [`IpNet`] values normalized to
//! their network address; the address the caller typed is returned
//! separately by [`parse_cidr`].

use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

use ipnet::IpNet;

use crate::error::{IpamError, IpamResult};

/// Parse a CIDR literal such as `10.0.1.0/24`.
///
/// Returns the address as written and the block it belongs to, with host
/// bits cleared. `10.0.1.5/24` yields `(10.0.1.5, 10.0.1.0/24)`.
///
/// # Examples
///
/// ```
/// use ipam_core::addr::parse_cidr;
///
/// let (addr, net) = parse_cidr("10.0.1.5/24").unwrap();
/// assert_eq!(addr.to_string(), "10.0.1.5");
/// assert_eq!(net.to_string(), "10.0.1.0/24");
/// assert!(parse_cidr("10.0.1.0").is_err());
/// ```
pub fn parse_cidr(text: &str) -> IpamResult<(IpAddr, IpNet)> {
    let net = IpNet::from_str(text).map_err(|_| IpamError::MalformedCidr {
        text: text.to_string(),
    })?;
    Ok((net.addr(), net.trunc()))
}

/// Parse a bare IP address literal.
///
/// IPv4-mapped IPv6 literals (`::ffff:10.0.1.5`) come back as IPv4.
pub fn parse_address(text: &str) -> IpamResult<IpAddr> {
    IpAddr::from_str(text)
        .map(|addr| addr.to_canonical())
        .map_err(|_| IpamError::MalformedAddress {
            text: text.to_string(),
        })
}

/// Returns `true` if `address` lies inside `network`, using the network's
/// own mask. Addresses of the other family are never contained.
pub fn contains(network: &IpNet, address: &IpAddr) -> bool {
    network.contains(address)
}

/// Returns `true` if every address of `inner` lies inside `outer`.
pub fn contains_block(outer: &IpNet, inner: &IpNet) -> bool {
    outer.contains(inner)
}

/// Returns `true` if either block contains the other's network address.
///
/// Two CIDR blocks either nest or are disjoint, so this is a full overlap
/// test.
pub fn overlaps(a: &IpNet, b: &IpNet) -> bool {
    a.contains(&b.network()) || b.contains(&a.network())
}

/// Prefix length of the block, e.g. `24` for `10.0.1.0/24`.
pub fn mask_length(network: &IpNet) -> u8 {
    network.prefix_len()
}

/// Returns `true` if the address is in a private range for its family:
/// 10.0.0.0/8, 172.16.0.0/12 and 192.168.0.0/16 for IPv4 (RFC 1918), or
/// fc00::/7 for IPv6 (RFC 4193).
pub fn is_private(address: &IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => v4.is_private(),
        IpAddr::V6(v6) => is_unique_local(v6),
    }
}

fn is_unique_local(address: &Ipv6Addr) -> bool {
    (address.segments()[0] & 0xfe00) == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> IpNet {
        parse_cidr(s).unwrap().1
    }

    fn ip(s: &str) -> IpAddr {
        parse_address(s).unwrap()
    }

    #[test]
    fn parse_cidr_truncates_host_bits() {
        let (addr, block) = parse_cidr("192.168.7.42/16").unwrap();
        assert_eq!(addr, ip("192.168.7.42"));
        assert_eq!(block.to_string(), "192.168.0.0/16");
    }

    #[test]
    fn parse_cidr_ipv6() {
        let (_, block) = parse_cidr("fd00:1::/48").unwrap();
        assert_eq!(mask_length(&block), 48);
    }

    #[test]
    fn parse_cidr_rejects_garbage() {
        for text in ["", "10.0.0.0", "10.0.0.0/33", "10.0.0/8", "bogus/8", "10.0.0.0/-1"] {
            let err = parse_cidr(text).unwrap_err();
            assert!(
                matches!(err, IpamError::MalformedCidr { .. }),
                "{text:?} gave {err}"
            );
        }
    }

    #[test]
    fn parse_address_unmaps_ipv4() {
        assert_eq!(parse_address("::ffff:10.0.1.5").unwrap(), ip("10.0.1.5"));
        assert!(parse_address("::ffff:10.0.1.5").unwrap().is_ipv4());
        assert!(parse_address("2001:db8::1").unwrap().is_ipv6());
    }

    #[test]
    fn parse_address_rejects_cidr() {
        let err = parse_address("10.0.0.1/32").unwrap_err();
        assert!(matches!(err, IpamError::MalformedAddress { .. }));
    }

    #[test]
    fn containment_uses_network_mask() {
        let block = net("10.0.1.0/24");
        assert!(contains(&block, &ip("10.0.1.0")));
        assert!(contains(&block, &ip("10.0.1.255")));
        assert!(!contains(&block, &ip("10.0.2.0")));
        assert!(!contains(&block, &ip("::1")));
    }

    #[test]
    fn block_containment_is_structural() {
        let outer = net("10.0.0.0/16");
        assert!(contains_block(&outer, &net("10.0.1.0/24")));
        assert!(contains_block(&outer, &outer));
        assert!(!contains_block(&outer, &net("10.0.0.0/15")));
        assert!(!contains_block(&net("10.0.1.0/24"), &outer));
    }

    #[test]
    fn overlap_is_symmetric() {
        let big = net("10.0.0.0/16");
        let small = net("10.0.128.0/17");
        assert!(overlaps(&big, &small));
        assert!(overlaps(&small, &big));
        assert!(!overlaps(&big, &net("10.1.0.0/16")));
        assert!(!overlaps(&big, &net("fd00::/16")));
    }

    #[test]
    fn private_ranges() {
        assert!(is_private(&ip("10.0.1.5")));
        assert!(is_private(&ip("172.16.0.1")));
        assert!(is_private(&ip("172.31.255.255")));
        assert!(is_private(&ip("192.168.10.1")));
        assert!(!is_private(&ip("172.32.0.1")));
        assert!(!is_private(&ip("8.8.8.8")));
        assert!(is_private(&ip("fd12:3456::1")));
        assert!(is_private(&ip("fc00::1")));
        assert!(!is_private(&ip("2001:db8::1")));
        assert!(!is_private(&ip("fe80::1")));
    }
}
