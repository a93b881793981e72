use std::{fmt, net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6}};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {

    // The native address family for sockets of this version.
    pub fn family(&self) -> libc::c_int {
        match self {
            IpVersion::V4 => libc::AF_INET,
            IpVersion::V6 => libc::AF_INET6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

// Byte data is stored in network order
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub(crate) enum Octets {
    V4([u8; 4]),
    V6([u8; 16]),
}

/// An IP endpoint: a canonical binary address of a fixed width plus a port.
///
/// Values can only be produced by the parser, by decoding a native socket
/// address, or by the well-known constructors below, so the byte width always
/// agrees with [`IpVersion`]. Equality and hashing cover the address bytes and
/// the port; the textual spelling an address was parsed from is not retained.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct IpAddress {
    octets: Octets,
    port: u16,
}

impl IpAddress {

    pub(crate) fn from_v4_octets(octets: [u8; 4], port: u16) -> Self {
        Self { octets: Octets::V4(octets), port }
    }

    pub(crate) fn from_v6_octets(octets: [u8; 16], port: u16) -> Self {
        Self { octets: Octets::V6(octets), port }
    }

    pub(crate) fn octets_raw(&self) -> Octets { self.octets }

    // The all-zero address used for wildcard binds.
    pub fn any(version: IpVersion, port: u16) -> Self {
        match version {
            IpVersion::V4 => Self::from_v4_octets([0u8; 4], port),
            IpVersion::V6 => Self::from_v6_octets([0u8; 16], port),
        }
    }

    pub fn loopback(version: IpVersion, port: u16) -> Self {
        match version {
            IpVersion::V4 => Self::from_v4_octets([127, 0, 0, 1], port),
            IpVersion::V6 => {
                let mut bytes = [0u8; 16];
                bytes[15] = 1;
                Self::from_v6_octets(bytes, port)
            }
        }
    }

    pub fn with_port(self, port: u16) -> Self {
        Self { octets: self.octets, port }
    }

    pub fn version(&self) -> IpVersion {
        match self.octets {
            Octets::V4(_) => IpVersion::V4,
            Octets::V6(_) => IpVersion::V6,
        }
    }

    pub fn port(&self) -> u16 { self.port }

    pub fn octets(&self) -> &[u8] {
        match &self.octets {
            Octets::V4(bytes) => bytes,
            Octets::V6(bytes) => bytes,
        }
    }

    pub fn is_any_address(&self) -> bool {
        self.octets().iter().all(|&b| b == 0)
    }

    pub fn is_loopback(&self) -> bool {
        match self.octets {
            Octets::V4(bytes) => bytes[0] == 127,
            Octets::V6(bytes) => bytes[..15].iter().all(|&b| b == 0) && bytes[15] == 1,
        }
    }

    pub fn is_v4_mapped(&self) -> bool {
        match self.octets {
            Octets::V4(_) => false,
            Octets::V6(bytes) => {
                bytes[0..10].iter().all(|&b| b == 0)
                    && bytes[10] == 0xff
                    && bytes[11] == 0xff
            }
        }
    }

    // The canonical address text without the port.
    pub fn address_as_string(&self) -> String {
        CanonicalIp(self).to_string()
    }

    pub fn to_std(&self) -> SocketAddr {
        match self.octets {
            Octets::V4(bytes) => SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::from(bytes), self.port)),
            Octets::V6(bytes) => SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::from(bytes), self.port, 0, 0)),
        }
    }
}

/// Renders `ip:port` for IPv4 and `[ip]:port` for IPv6.
impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.octets {
            Octets::V4(_) => write!(f, "{}:{}", CanonicalIp(self), self.port),
            Octets::V6(_) => write!(f, "[{}]:{}", CanonicalIp(self), self.port),
        }
    }
}

struct CanonicalIp<'a>(&'a IpAddress);

impl fmt::Display for CanonicalIp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0.octets {
            Octets::V4(bytes) => write!(f, "{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3]),
            Octets::V6(bytes) => {
                if self.0.is_v4_mapped() {
                    return write!(f, "::ffff:{}.{}.{}.{}", bytes[12], bytes[13], bytes[14], bytes[15]);
                }
                fmt_v6_groups(&bytes, f)
            }
        }
    }
}

/*
    Lower-case hex with leading zeroes dropped, and the longest run of two or
    more zero groups collapsed to `::`. Ties go to the leftmost run. A lone
    zero group is never collapsed.
*/
fn fmt_v6_groups(bytes: &[u8; 16], f: &mut fmt::Formatter) -> fmt::Result {
    let mut groups = [0u16; 8];
    for (i, group) in groups.iter_mut().enumerate() {
        *group = u16::from_be_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
    }

    let mut best: Option<(usize, usize)> = None;
    let mut run_start = 0;
    let mut run_len = 0;

    for (i, &group) in groups.iter().enumerate() {
        if group == 0 {
            if run_len == 0 { run_start = i; }
            run_len += 1;
            if run_len > 1 && best.is_none_or(|(_, len)| run_len > len) {
                best = Some((run_start, run_len));
            }
        } else {
            run_len = 0;
        }
    }

    let Some((start, len)) = best else {
        return write_groups(&groups, f);
    };

    write_groups(&groups[..start], f)?;
    write!(f, "::")?;
    write_groups(&groups[start + len..], f)
}

fn write_groups(groups: &[u16], f: &mut fmt::Formatter) -> fmt::Result {
    for (i, group) in groups.iter().enumerate() {
        if i > 0 { write!(f, ":")?; }
        write!(f, "{:x}", group)?;
    }
    Ok(())
}
