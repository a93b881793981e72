mod owned;
mod options;

use std::os::fd::{FromRawFd, RawFd};

use thiserror::Error;

use crate::{OsError, address::{AddressInstance, NativeAddress}};

pub use owned::OwnedSocket;
pub use options::{Linger, SocketConfigurable, SocketOption};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum SocketType {
    Stream,
    Datagram,
}

impl SocketType {
    fn as_raw(&self) -> libc::c_int {
        match self {
            SocketType::Stream => libc::SOCK_STREAM,
            SocketType::Datagram => libc::SOCK_DGRAM,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConnectStatus {
    Connected, // The connection is established
    InProgress, // EINPROGRESS: the handshake continues; wait for writability
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum SocketError {
    #[error("Failed to create socket for {address}: {error}")]
    SocketCreationFailed {
        address: String,
        error: OsError,
    },

    #[error("Failed to bind socket to {address}: {error}")]
    BindFailed {
        address: String,
        error: OsError,
    },

    #[error("Failed to connect socket to {address}: {error}")]
    ConnectFailed {
        address: String,
        error: OsError,
    },

    #[error("Failed to set socket option {option:?}: {error}")]
    SetOptionFailed {
        option: SocketOption,
        error: OsError,
    },

    #[error("Failed to change blocking mode: {0}")]
    BlockingModeFailed(OsError),
}

impl SocketError {

    // The underlying OS error, for telling transient conditions apart.
    pub fn os_error(&self) -> OsError {
        match self {
            SocketError::SocketCreationFailed { error, .. }
            | SocketError::BindFailed { error, .. }
            | SocketError::ConnectFailed { error, .. }
            | SocketError::SetOptionFailed { error, .. } => *error,
            SocketError::BlockingModeFailed(error) => *error,
        }
    }
}

pub(crate) fn create(address: &AddressInstance, kind: SocketType) -> Result<OwnedSocket, SocketError> {
    let fd = syscall!(socket(
        address.family(),
        kind.as_raw() | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
        0
    )).map_err(|e| SocketError::SocketCreationFailed {
        address: address.as_string(),
        error: e.into(),
    })?;

    // SAFETY: socket(2) just returned this descriptor and nothing else owns it
    Ok(unsafe { OwnedSocket::from_raw_fd(fd) })
}

pub(crate) fn bind(address: &AddressInstance, fd: RawFd) -> Result<(), SocketError> {
    let native = NativeAddress::from(address);

    syscall!(bind(
        fd,
        native.as_ptr(),
        native.socklen()
    )).map_err(|e| SocketError::BindFailed {
        address: address.as_string(),
        error: e.into(),
    })?;

    Ok(())
}

pub(crate) fn connect(address: &AddressInstance, fd: RawFd) -> Result<ConnectStatus, SocketError> {
    let native = NativeAddress::from(address);

    let result = syscall!(connect(
        fd,
        native.as_ptr(),
        native.socklen()
    ));

    match result {
        Ok(_) => Ok(ConnectStatus::Connected),
        Err(e) if e.raw_os_error() == Some(libc::EINPROGRESS) => Ok(ConnectStatus::InProgress),
        // EAGAIN is not progress: the attempt was never queued (full local backlog)
        Err(e) => Err(SocketError::ConnectFailed {
            address: address.as_string(),
            error: e.into(),
        }),
    }
}
