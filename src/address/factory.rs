//! The construction paths for [`AddressInstance`].
//!
//! Text goes through the strict parser; kernel-provided structures are
//! decoded directly. Nothing else builds an instance from raw bytes.

use std::os::fd::AsRawFd;

use crate::OsError;

use super::{AddressError, AddressInstance, NativeAddress, parser};

/// Builds an IP instance from a bare IPv4 or IPv6 literal.
///
/// `port` defaults to 0. The literal's version is picked by the presence of
/// a colon, so the error always refers to the parser the caller would expect.
pub fn from_text(text: &str, port: Option<u16>) -> Result<AddressInstance, AddressError> {
    let port = port.unwrap_or(0);

    if text.contains(':') {
        AddressInstance::ipv6_with_port(text, port)
    } else {
        AddressInstance::ipv4_with_port(text, port)
    }
}

/// Decodes a `sockaddr_storage` filled in by `accept(2)`, `getsockname(2)`
/// or `getpeername(2)`.
pub fn from_native(
    storage: &libc::sockaddr_storage,
    len: libc::socklen_t
) -> Result<AddressInstance, AddressError> {
    NativeAddress::decode(storage, len)
}

/*
    SAFETY:

        `addr` must point to at least `len` readable bytes holding a socket
        address whose `sa_family` field is initialized.
*/
pub unsafe fn from_raw_sockaddr(
    addr: *const libc::sockaddr,
    len: libc::socklen_t
) -> Result<AddressInstance, AddressError> {
    let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
    let copy_len = (len as usize).min(std::mem::size_of::<libc::sockaddr_storage>());

    unsafe {
        std::ptr::copy_nonoverlapping(
            addr as *const u8,
            &mut storage as *mut _ as *mut u8,
            copy_len
        );
    }

    from_native(&storage, copy_len as libc::socklen_t)
}

/// Parses `tcp://a.b.c.d:port`, `tcp://[v6]:port` or `unix://path`.
pub fn from_url(url: &str) -> Result<AddressInstance, AddressError> {
    if let Some(rest) = url.strip_prefix("tcp://") {
        return parser::try_parse_socket_address(rest)
            .map(AddressInstance::Ip)
            .ok_or_else(|| AddressError::InvalidUrl(url.to_string()));
    }

    if let Some(path) = url.strip_prefix("unix://") {
        return AddressInstance::pipe(path);
    }

    Err(AddressError::InvalidUrl(url.to_string()))
}

// The address a socket is bound to.
pub fn local_address(fd: &impl AsRawFd) -> Result<AddressInstance, AddressError> {
    query(fd, Query::Local)
}

// The address of the remote end of a connected socket.
pub fn peer_address(fd: &impl AsRawFd) -> Result<AddressInstance, AddressError> {
    query(fd, Query::Peer)
}

enum Query {
    Local,
    Peer,
}

fn query(fd: &impl AsRawFd, which: Query) -> Result<AddressInstance, AddressError> {
    let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
    let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    let storage_ptr = &mut storage as *mut _ as *mut libc::sockaddr;

    let result = match which {
        Query::Local => syscall!(getsockname(fd.as_raw_fd(), storage_ptr, &mut len)),
        Query::Peer => syscall!(getpeername(fd.as_raw_fd(), storage_ptr, &mut len)),
    };
    result.map_err(OsError::from)?;

    from_native(&storage, len)
}
