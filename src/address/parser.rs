//! Textual IP literal parsing.
//!
//! Two entry points are offered for every form: a `try_*` probe that reports
//! a malformed literal as `None`, and a strict variant returning
//! [`AddressError::InvalidAddress`] that names the offending text. Neither
//! performs name resolution; only numeric literals are accepted.

use super::{AddressError, IpAddress};

/// Probes `text` for an IPv4 or IPv6 literal. The port of the result is 0.
pub fn try_parse_ip(text: &str) -> Option<IpAddress> {
    if let Some(octets) = v4_octets(text) {
        return Some(IpAddress::from_v4_octets(octets, 0));
    }
    v6_octets(text).map(|octets| IpAddress::from_v6_octets(octets, 0))
}

pub fn parse_ipv4(text: &str) -> Result<IpAddress, AddressError> {
    v4_octets(text)
        .map(|octets| IpAddress::from_v4_octets(octets, 0))
        .ok_or_else(|| AddressError::InvalidAddress(text.to_string()))
}

pub fn parse_ipv6(text: &str) -> Result<IpAddress, AddressError> {
    v6_octets(text)
        .map(|octets| IpAddress::from_v6_octets(octets, 0))
        .ok_or_else(|| AddressError::InvalidAddress(text.to_string()))
}

/// Probes `text` for `a.b.c.d:port` or `[v6]:port`.
///
/// An unbracketed IPv6 literal is never accepted here since its last group
/// cannot be told apart from a port.
pub fn try_parse_socket_address(text: &str) -> Option<IpAddress> {
    if let Some(rest) = text.strip_prefix('[') {
        let (host, port) = rest.split_once("]:")?;
        let octets = v6_octets(host)?;
        return Some(IpAddress::from_v6_octets(octets, port_number(port)?));
    }

    let (host, port) = text.rsplit_once(':')?;
    let octets = v4_octets(host)?;
    Some(IpAddress::from_v4_octets(octets, port_number(port)?))
}

pub fn parse_socket_address(text: &str) -> Result<IpAddress, AddressError> {
    try_parse_socket_address(text)
        .ok_or_else(|| AddressError::InvalidAddress(text.to_string()))
}

fn port_number(text: &str) -> Option<u16> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u16>().ok()
}

/*
    Exactly four decimal octets. Like inet_pton(3), a multi-digit octet may
    not start with zero, so "010.0.0.1" is rejected instead of being read
    as octal or decimal.
*/
fn v4_octets(text: &str) -> Option<[u8; 4]> {
    let mut bytes = [0u8; 4];
    let mut parts = text.split('.');

    for byte in bytes.iter_mut() {
        let part = parts.next()?;

        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        if part.len() > 1 && part.starts_with('0') {
            return None;
        }

        *byte = part.parse::<u8>().ok()?;
    }

    if parts.next().is_some() {
        return None;
    }

    Some(bytes)
}

/*
    Colon-hex groups of one to four digits, at most one `::`, and an
    optional dotted-quad standing in for the final two groups.
*/
fn v6_octets(text: &str) -> Option<[u8; 16]> {
    let mut groups = [0u16; 8];

    match text.split_once("::") {
        Some((head, tail)) => {
            if tail.contains("::") {
                return None;
            }

            let head = v6_groups(head, false)?;
            let tail = v6_groups(tail, true)?;

            // `::` stands for at least one zero group
            if head.len() + tail.len() > 7 {
                return None;
            }

            groups[..head.len()].copy_from_slice(&head);
            groups[8 - tail.len()..].copy_from_slice(&tail);
        }
        None => {
            let all = v6_groups(text, true)?;
            if all.len() != 8 {
                return None;
            }
            groups.copy_from_slice(&all);
        }
    }

    let mut bytes = [0u8; 16];
    for (i, group) in groups.iter().enumerate() {
        bytes[i * 2..i * 2 + 2].copy_from_slice(&group.to_be_bytes());
    }

    Some(bytes)
}

fn v6_groups(text: &str, allow_v4_tail: bool) -> Option<Vec<u16>> {
    let mut groups = Vec::with_capacity(8);

    if text.is_empty() {
        return Some(groups);
    }

    let parts: Vec<&str> = text.split(':').collect();
    let last = parts.len() - 1;

    for (i, part) in parts.iter().enumerate() {

        if i == last && allow_v4_tail && part.contains('.') {
            let v4 = v4_octets(part)?;
            groups.push(u16::from_be_bytes([v4[0], v4[1]]));
            groups.push(u16::from_be_bytes([v4[2], v4[3]]));
            break;
        }

        if part.is_empty() || part.len() > 4 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        groups.push(u16::from_str_radix(part, 16).ok()?);

        if groups.len() > 8 {
            return None;
        }
    }

    Some(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::IpVersion;

    #[test]
    fn test_ipv4_valid() {
        let ip = try_parse_ip("192.168.1.1").unwrap();
        assert_eq!(ip.octets(), &[192, 168, 1, 1]);
        assert_eq!(ip.version(), IpVersion::V4);
        assert_eq!(ip.port(), 0);

        assert_eq!(try_parse_ip("0.0.0.0").unwrap().octets(), &[0, 0, 0, 0]);
        assert_eq!(try_parse_ip("255.255.255.255").unwrap().octets(), &[255; 4]);
    }

    #[test]
    fn test_ipv4_invalid() {
        for text in ["", "1.2.3", "1.2.3.4.5", "1.2.3.256", "foo", "192.168..1",
                     "192.-1.1.1", " 1.2.3.4", "1.2.3.4 ", "1.2.3.4\n", "1.2.3.4:80",
                     "01.2.3.4", "1.2.3.+4", "1.2.3.0x4"] {
            assert!(try_parse_ip(text).is_none(), "accepted {:?}", text);
            assert!(parse_ipv4(text).is_err(), "strictly accepted {:?}", text);
        }
    }

    #[test]
    fn test_ipv6_equivalent_spellings() {
        let expected = try_parse_ip("1:23::ef").unwrap();
        for text in ["01:023::00Ef", "1:0023::0Ef", "0001:0023:0000:0000:0000:0000:0000:00ef", "1:23:0:0:0:0:0:EF"] {
            let ip = try_parse_ip(text).unwrap();
            assert_eq!(ip, expected, "parsing {}", text);
            assert_eq!(ip.address_as_string(), "1:23::ef");
        }

        assert_eq!(try_parse_ip("0:0:0:0:0:0:0:1").unwrap().address_as_string(), "::1");
        assert_eq!(try_parse_ip("::0001").unwrap().address_as_string(), "::1");
        assert_eq!(try_parse_ip("::0000").unwrap().address_as_string(), "::");
    }

    #[test]
    fn test_ipv6_compression_positions() {
        assert_eq!(try_parse_ip("::").unwrap().octets(), &[0u8; 16]);
        assert_eq!(try_parse_ip("1::").unwrap().address_as_string(), "1::");
        assert_eq!(try_parse_ip("ff02::1").unwrap().address_as_string(), "ff02::1");
        assert_eq!(try_parse_ip("1:2:3:4:5:6:7::").unwrap().address_as_string(), "1:2:3:4:5:6:7:0");
        assert_eq!(try_parse_ip("::2:3:4:5:6:7:8").unwrap().address_as_string(), "0:2:3:4:5:6:7:8");
    }

    #[test]
    fn test_ipv6_embedded_v4() {
        let ip = try_parse_ip("::ffff:192.168.0.1").unwrap();
        assert!(ip.is_v4_mapped());
        assert_eq!(&ip.octets()[12..], &[192, 168, 0, 1]);
        assert_eq!(ip.address_as_string(), "::ffff:192.168.0.1");

        let ip = try_parse_ip("0:0:0:0:0:ffff:10.0.0.1").unwrap();
        assert_eq!(ip.address_as_string(), "::ffff:10.0.0.1");

        assert!(try_parse_ip("::ffff:256.0.0.1").is_none());
        assert!(try_parse_ip("::1.2.3.4:5").is_none());
        assert!(try_parse_ip("1.2.3.4::").is_none());
    }

    #[test]
    fn test_ipv6_invalid() {
        for text in ["0:0:0:0", "fffff::", "/foo", "::1::2", ":::", "1:2:3:4:5:6:7:8:9",
                     "1:2:3", "1:2:3:4:5:6:7:ghij", "12345::1", ":1:2:3:4:5:6:7",
                     "1:2:3:4:5:6:7:", "1:2:3:4::5:6:7:8", "[::1]", "fe80::1%eth0", " ::1"] {
            assert!(try_parse_ip(text).is_none(), "accepted {:?}", text);
            assert!(parse_ipv6(text).is_err(), "strictly accepted {:?}", text);
        }
    }

    #[test]
    fn test_strict_error_names_literal() {
        match parse_ipv4("bar") {
            Err(AddressError::InvalidAddress(text)) => assert_eq!(text, "bar"),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(parse_ipv4("::1").is_err());
        assert!(parse_ipv6("1.2.3.4").is_err());
    }

    #[test]
    fn test_socket_address() {
        let ip = try_parse_socket_address("1.2.3.4:80").unwrap();
        assert_eq!(ip.to_string(), "1.2.3.4:80");

        let ip = try_parse_socket_address("[0:0::1]:65535").unwrap();
        assert_eq!(ip.to_string(), "[::1]:65535");

        for text in ["1.2.3.4", "1.2.3.4:", "1.2.3.4:65536", "1.2.3.4:+1", "::1:80",
                     "[::1]", "[::1]80", "[1.2.3.4]:80", "foo:80"] {
            assert!(try_parse_socket_address(text).is_none(), "accepted {:?}", text);
            assert!(parse_socket_address(text).is_err());
        }
    }
}
