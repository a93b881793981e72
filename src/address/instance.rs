use std::{fmt, hash::{Hash, Hasher}, os::{fd::AsRawFd, unix::ffi::OsStrExt}, path::{Path, PathBuf}};

use crate::socket::{self, ConnectStatus, OwnedSocket, SocketError, SocketType};

use super::{AddressError, IpAddress, IpVersion, parser};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum AddressType {
    Ip,
    Pipe,
}

// Room in sun_path, minus the terminating NUL (or the leading NUL of an abstract name).
const MAX_PIPE_PATH: usize = 107;

// Marks a Linux abstract-namespace name in text form.
const ABSTRACT_PREFIX: u8 = b'@';

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum PipeName {
    Path(PathBuf),
    // The name without its leading NUL
    Abstract(Vec<u8>),
    // A local socket that was never bound, as reported for an accepted peer
    Unnamed,
}

/// A local domain socket endpoint: a filesystem path, or a Linux
/// abstract-namespace name written as `@name`.
///
/// Unnamed sockets only come out of the kernel; they cannot be built from text.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PipeAddress {
    name: PipeName,
}

impl PipeAddress {

    fn new(path: &Path) -> Result<Self, AddressError> {
        let bytes = path.as_os_str().as_bytes();
        let display = path.to_string_lossy().into_owned();

        if bytes.is_empty() || bytes.contains(&0) || bytes == [ABSTRACT_PREFIX] {
            return Err(AddressError::InvalidAddress(display));
        }

        if bytes.len() > MAX_PIPE_PATH {
            return Err(AddressError::PathTooLong {
                path: display,
                len: bytes.len(),
                max: MAX_PIPE_PATH,
            });
        }

        let name = match bytes.strip_prefix(&[ABSTRACT_PREFIX]) {
            Some(name) => PipeName::Abstract(name.to_vec()),
            None => PipeName::Path(path.to_path_buf()),
        };

        Ok(Self { name })
    }

    /*
        Builds the address from the `sun_path` bytes the kernel reported,
        already cut to the returned address length. No bytes means an unnamed
        socket and a leading NUL an abstract name; otherwise the path ends at
        the first NUL.
    */
    pub(super) fn from_native_bytes(bytes: &[u8]) -> Self {
        let name = match bytes.split_first() {
            None => PipeName::Unnamed,
            Some((0, name)) => PipeName::Abstract(name.to_vec()),
            Some(_) => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                PipeName::Path(PathBuf::from(std::ffi::OsStr::from_bytes(&bytes[..end])))
            }
        };

        Self { name }
    }

    // None for abstract and unnamed sockets.
    pub fn path(&self) -> Option<&Path> {
        match &self.name {
            PipeName::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn abstract_name(&self) -> Option<&[u8]> {
        match &self.name {
            PipeName::Abstract(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_unnamed(&self) -> bool {
        self.name == PipeName::Unnamed
    }

    // The bytes to place in sun_path and whether a terminating NUL is counted.
    pub(super) fn native_bytes(&self) -> (Vec<u8>, bool) {
        match &self.name {
            PipeName::Path(path) => (path.as_os_str().as_bytes().to_vec(), true),
            PipeName::Abstract(name) => {
                let mut bytes = Vec::with_capacity(name.len() + 1);
                bytes.push(0);
                bytes.extend_from_slice(name);
                (bytes, false)
            }
            PipeName::Unnamed => (Vec::new(), false),
        }
    }
}

impl fmt::Display for PipeAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.name {
            PipeName::Path(path) => write!(f, "{}", path.display()),
            PipeName::Abstract(name) => {
                // NULs inside an abstract name are shown as '@', like ss(8) does
                let name: String = String::from_utf8_lossy(name)
                    .chars()
                    .map(|c| if c == '\0' { '@' } else { c })
                    .collect();
                write!(f, "@{}", name)
            }
            PipeName::Unnamed => write!(f, "(unnamed)"),
        }
    }
}

/// Where a connection comes from or goes to.
///
/// An instance is either an IP endpoint or a local socket path. It is
/// immutable, holds no descriptors, and knows which native address family
/// and structure its socket operations need, so callers never branch on the
/// variant to pick one.
///
/// Equality is meant for matching a resolved endpoint against a configured
/// one: two `Ip` instances are equal when their versions and canonical
/// addresses agree, regardless of port. `Pipe` instances compare by path and
/// never equal an `Ip` instance.
#[derive(Debug, Clone)]
pub enum AddressInstance {
    Ip(IpAddress),
    Pipe(PipeAddress),
}

impl AddressInstance {

    pub fn ipv4(addr: &str) -> Result<Self, AddressError> {
        Self::ipv4_with_port(addr, 0)
    }

    pub fn ipv4_with_port(addr: &str, port: u16) -> Result<Self, AddressError> {
        Ok(AddressInstance::Ip(parser::parse_ipv4(addr)?.with_port(port)))
    }

    // 0.0.0.0 on the given port
    pub fn ipv4_any(port: u16) -> Self {
        AddressInstance::Ip(IpAddress::any(IpVersion::V4, port))
    }

    pub fn ipv6(addr: &str) -> Result<Self, AddressError> {
        Self::ipv6_with_port(addr, 0)
    }

    pub fn ipv6_with_port(addr: &str, port: u16) -> Result<Self, AddressError> {
        Ok(AddressInstance::Ip(parser::parse_ipv6(addr)?.with_port(port)))
    }

    // :: on the given port
    pub fn ipv6_any(port: u16) -> Self {
        AddressInstance::Ip(IpAddress::any(IpVersion::V6, port))
    }

    pub fn pipe(path: impl AsRef<Path>) -> Result<Self, AddressError> {
        Ok(AddressInstance::Pipe(PipeAddress::new(path.as_ref())?))
    }

    pub(crate) fn from_sockaddr_in(addr: &libc::sockaddr_in) -> Self {
        AddressInstance::Ip(IpAddress::from_v4_octets(
            addr.sin_addr.s_addr.to_ne_bytes(),
            u16::from_be(addr.sin_port),
        ))
    }

    pub(crate) fn from_sockaddr_in6(addr: &libc::sockaddr_in6) -> Self {
        AddressInstance::Ip(IpAddress::from_v6_octets(
            addr.sin6_addr.s6_addr,
            u16::from_be(addr.sin6_port),
        ))
    }

    pub fn address_type(&self) -> AddressType {
        match self {
            AddressInstance::Ip(_) => AddressType::Ip,
            AddressInstance::Pipe(_) => AddressType::Pipe,
        }
    }

    pub fn ip(&self) -> Option<&IpAddress> {
        match self {
            AddressInstance::Ip(ip) => Some(ip),
            AddressInstance::Pipe(_) => None,
        }
    }

    pub fn pipe_address(&self) -> Option<&PipeAddress> {
        match self {
            AddressInstance::Ip(_) => None,
            AddressInstance::Pipe(pipe) => Some(pipe),
        }
    }

    pub fn pipe_path(&self) -> Option<&Path> {
        match self {
            AddressInstance::Ip(_) => None,
            AddressInstance::Pipe(pipe) => pipe.path(),
        }
    }

    pub fn as_string(&self) -> String { self.to_string() }

    // The native address family for sockets of this instance.
    pub fn family(&self) -> libc::c_int {
        match self {
            AddressInstance::Ip(ip) => ip.version().family(),
            AddressInstance::Pipe(_) => libc::AF_UNIX,
        }
    }

    /*
        Port-insensitive comparison of the IP view only; false whenever
        either side is a Pipe.
    */
    pub fn ip_matches(&self, other: &AddressInstance) -> bool {
        match (self, other) {
            (AddressInstance::Ip(a), AddressInstance::Ip(b)) => same_ip(a, b),
            _ => false,
        }
    }

    /// Creates a non-blocking, close-on-exec socket of this instance's family.
    pub fn socket(&self, kind: SocketType) -> Result<OwnedSocket, SocketError> {
        socket::create(self, kind)
    }

    pub fn bind(&self, fd: &impl AsRawFd) -> Result<(), SocketError> {
        socket::bind(self, fd.as_raw_fd())
    }

    /// Issues a single `connect(2)`. On a non-blocking socket this normally
    /// yields [`ConnectStatus::InProgress`].
    pub fn connect(&self, fd: &impl AsRawFd) -> Result<ConnectStatus, SocketError> {
        socket::connect(self, fd.as_raw_fd())
    }
}

fn same_ip(a: &IpAddress, b: &IpAddress) -> bool {
    a.version() == b.version() && a.octets() == b.octets()
}

impl PartialEq for AddressInstance {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AddressInstance::Ip(a), AddressInstance::Ip(b)) => same_ip(a, b),
            (AddressInstance::Pipe(a), AddressInstance::Pipe(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AddressInstance {}

impl PartialEq<IpAddress> for AddressInstance {
    fn eq(&self, other: &IpAddress) -> bool {
        self.ip().is_some_and(|ip| same_ip(ip, other))
    }
}

// Must agree with PartialEq, so the port is left out.
impl Hash for AddressInstance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address_type().hash(state);
        match self {
            AddressInstance::Ip(ip) => {
                ip.version().hash(state);
                ip.octets().hash(state);
            }
            AddressInstance::Pipe(pipe) => pipe.hash(state),
        }
    }
}

impl fmt::Display for AddressInstance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AddressInstance::Ip(ip) => write!(f, "{}", ip),
            AddressInstance::Pipe(pipe) => write!(f, "{}", pipe),
        }
    }
}

impl From<IpAddress> for AddressInstance {
    fn from(ip: IpAddress) -> Self {
        AddressInstance::Ip(ip)
    }
}
