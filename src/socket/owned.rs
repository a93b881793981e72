use std::{fmt, mem::ManuallyDrop, os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, RawFd}};

use crate::{OsError, address::{AddressError, AddressInstance, factory}};

use super::{SocketConfigurable, SocketError, SocketOption};

/// A socket descriptor closed when dropped.
///
/// Every exit path of the owning scope releases the descriptor, including
/// early returns on error. Use [`IntoRawFd::into_raw_fd`] to hand it off
/// deliberately.
pub struct OwnedSocket(RawFd);

impl OwnedSocket {

    pub fn is_nonblocking(&self) -> Result<bool, OsError> {
        let flags = syscall!(fcntl(self.0, libc::F_GETFL)).map_err(OsError::from)?;
        Ok(flags & libc::O_NONBLOCK != 0)
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), SocketError> {
        let flags = syscall!(fcntl(self.0, libc::F_GETFL))
            .map_err(|e| SocketError::BlockingModeFailed(e.into()))?;

        let flags = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };

        syscall!(fcntl(self.0, libc::F_SETFL, flags))
            .map_err(|e| SocketError::BlockingModeFailed(e.into()))?;

        Ok(())
    }

    pub fn local_address(&self) -> Result<AddressInstance, AddressError> {
        factory::local_address(self)
    }

    pub fn peer_address(&self) -> Result<AddressInstance, AddressError> {
        factory::peer_address(self)
    }
}

impl AsRawFd for OwnedSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

impl AsFd for OwnedSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        // SAFETY: the descriptor stays open for as long as self is borrowed
        unsafe { BorrowedFd::borrow_raw(self.0) }
    }
}

impl IntoRawFd for OwnedSocket {
    fn into_raw_fd(self) -> RawFd {
        ManuallyDrop::new(self).0
    }
}

impl FromRawFd for OwnedSocket {

    /*
        SAFETY:

            The caller must own `fd`, and it must be an open socket. The
            returned value closes it on drop.
    */
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        assert!(fd >= 0);
        Self(fd)
    }
}

impl Drop for OwnedSocket {
    fn drop(&mut self) {
        if let Err(e) = syscall!(close(self.0)) {
            // Linux releases the descriptor even when close is interrupted
            if e.raw_os_error() == Some(libc::EINTR) {
                warn!("edge-addr: close of fd {} was interrupted", self.0);
            } else {
                error!("edge-addr: Failed to close fd {}: {}", self.0, e);
            }
        }
    }
}

impl SocketConfigurable for OwnedSocket {
    fn set_opt(&self, option: SocketOption) -> Result<&Self, SocketError> {
        option.set(self.0).map_err(|error| SocketError::SetOptionFailed { option, error })?;
        Ok(self)
    }
}

impl fmt::Debug for OwnedSocket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "OwnedSocket({})", self.0)
    }
}
