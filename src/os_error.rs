use std::fmt;

use thiserror::Error;

/// Coarse classification of the errno values the socket layer can produce.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq, Hash)]
pub enum OsErrorKind {

    #[error("Maximum number of file descriptors reached")]
    MaxFdReached,

    #[error("Not enough memory")]
    NotEnoughMemory,

    #[error("The operation is in progress")]
    OperationInProgress,

    #[error("The operation is already in progress")]
    OperationAlreadyInProgress,

    #[error("This operation is forbidden on this object")]
    OperationForbidden,

    #[error("The operation is not supported")]
    OperationNotSupported,

    #[error("The resource is temporarily unavailable")]
    ResourceUnavailable,

    #[error("Invalid file descriptor")]
    InvalidFd,

    #[error("Not a socket")]
    NotASocket,

    #[error("Invalid pointer")]
    InvalidPointer,

    #[error("Insufficient permissions")]
    PermissionDenied,

    #[error("The operation was interrupted")]
    OperationInterrupted,

    #[error("Invalid operation")]
    InvalidOperation,

    #[error("The resource was not found")]
    NotFound,

    #[error("Path name too long")]
    NameTooLong,

    #[error("Protocol not supported")]
    ProtocolNotSupported,

    #[error("Address already in use")]
    AddressInUse,

    #[error("Address not available")]
    AddressNotAvailable,

    #[error("Address family not supported")]
    AddressFamilyNotSupported,

    #[error("Socket is already connected")]
    AlreadyConnected,

    #[error("Connection refused")]
    ConnectionRefused,

    #[error("Connection reset")]
    ConnectionReset,

    #[error("Not connected")]
    NotConnected,

    #[error("Connection aborted")]
    ConnectionAborted,

    #[error("Connection timed out")]
    ConnectionTimedOut,

    #[error("Network unreachable")]
    NetworkUnreachable,

    #[error("Peer unreachable")]
    PeerUnreachable,

    #[error("Network disconnected")]
    NetworkDisconnected,

    #[error("No buffer space available")]
    NoBufferSpace,

    #[error("Unknown OS error")]
    Unknown,
}

impl From<i32> for OsErrorKind {
    fn from(code: i32) -> Self {
        match code {
            libc::EINVAL => OsErrorKind::InvalidOperation,
            libc::EMFILE | libc::ENFILE => OsErrorKind::MaxFdReached,
            libc::ENOMEM => OsErrorKind::NotEnoughMemory,
            libc::EACCES => OsErrorKind::OperationForbidden,
            libc::EBADF => OsErrorKind::InvalidFd,
            libc::ENOTSOCK => OsErrorKind::NotASocket,
            libc::EFAULT => OsErrorKind::InvalidPointer,
            libc::ENOENT => OsErrorKind::NotFound,
            libc::ENAMETOOLONG => OsErrorKind::NameTooLong,
            libc::EPERM => OsErrorKind::PermissionDenied,
            libc::EINTR => OsErrorKind::OperationInterrupted,
            libc::EOPNOTSUPP => OsErrorKind::OperationNotSupported,
            libc::EPROTONOSUPPORT => OsErrorKind::ProtocolNotSupported,
            // EWOULDBLOCK aliases EAGAIN on every target libc supports
            libc::EAGAIN => OsErrorKind::ResourceUnavailable,
            libc::EINPROGRESS => OsErrorKind::OperationInProgress,
            libc::EALREADY => OsErrorKind::OperationAlreadyInProgress,
            libc::EADDRINUSE => OsErrorKind::AddressInUse,
            libc::EADDRNOTAVAIL => OsErrorKind::AddressNotAvailable,
            libc::EAFNOSUPPORT => OsErrorKind::AddressFamilyNotSupported,
            libc::EISCONN => OsErrorKind::AlreadyConnected,
            libc::ECONNREFUSED => OsErrorKind::ConnectionRefused,
            libc::ECONNRESET => OsErrorKind::ConnectionReset,
            libc::ECONNABORTED => OsErrorKind::ConnectionAborted,
            libc::ETIMEDOUT => OsErrorKind::ConnectionTimedOut,
            libc::ENOTCONN => OsErrorKind::NotConnected,
            libc::ENETUNREACH => OsErrorKind::NetworkUnreachable,
            libc::ENETDOWN => OsErrorKind::NetworkDisconnected,
            libc::EHOSTUNREACH => OsErrorKind::PeerUnreachable,
            libc::ENOBUFS => OsErrorKind::NoBufferSpace,
            _ => OsErrorKind::Unknown,
        }
    }
}

/// A raw OS error code as reported by `errno`.
///
/// The numeric code is kept verbatim so callers can match on it directly;
/// [`OsError::kind`] gives the classified view.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct OsError(i32);

impl OsError {

    pub fn from_raw(code: i32) -> Self { OsError(code) }

    // Captures the calling thread's current errno.
    pub fn last() -> Self {
        std::io::Error::last_os_error().into()
    }

    pub fn code(&self) -> i32 { self.0 }

    pub fn kind(&self) -> OsErrorKind { OsErrorKind::from(self.0) }

    pub fn message(&self) -> String {
        std::io::Error::from_raw_os_error(self.0).to_string()
    }

    /*
        True for the outcomes a non-blocking socket produces during normal
        operation. These are not failures; the caller is expected to wait
        for readiness and try again.
    */
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            OsErrorKind::OperationInProgress
                | OsErrorKind::OperationAlreadyInProgress
                | OsErrorKind::ResourceUnavailable
                | OsErrorKind::OperationInterrupted
        )
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (errno {}: {})", self.kind(), self.0, self.message())
    }
}

impl std::error::Error for OsError {}

impl From<std::io::Error> for OsError {
    fn from(error: std::io::Error) -> Self {
        match error.raw_os_error() {
            Some(code) => OsError(code),
            None => OsError(-1),
        }
    }
}

impl From<OsError> for i32 {
    fn from(error: OsError) -> Self { error.0 }
}

impl From<OsError> for std::io::Error {
    fn from(error: OsError) -> Self {
        std::io::Error::from_raw_os_error(error.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(OsError::from_raw(libc::EADDRINUSE).kind(), OsErrorKind::AddressInUse);
        assert_eq!(OsError::from_raw(libc::EINPROGRESS).kind(), OsErrorKind::OperationInProgress);
        assert_eq!(OsError::from_raw(libc::EWOULDBLOCK).kind(), OsErrorKind::ResourceUnavailable);
        assert_eq!(OsError::from_raw(libc::EAFNOSUPPORT).kind(), OsErrorKind::AddressFamilyNotSupported);
        assert_eq!(OsError::from_raw(99999).kind(), OsErrorKind::Unknown);
    }

    #[test]
    fn test_code_is_preserved() {
        let err = OsError::from(std::io::Error::from_raw_os_error(libc::ECONNREFUSED));
        assert_eq!(err.code(), libc::ECONNREFUSED);
        let code: i32 = err.into();
        assert_eq!(code, libc::ECONNREFUSED);
    }

    #[test]
    fn test_transient() {
        assert!(OsError::from_raw(libc::EINPROGRESS).is_transient());
        assert!(OsError::from_raw(libc::EAGAIN).is_transient());
        assert!(!OsError::from_raw(libc::EADDRINUSE).is_transient());
        assert!(!OsError::from_raw(libc::ECONNREFUSED).is_transient());
    }

    #[test]
    fn test_display_names_code() {
        let text = OsError::from_raw(libc::EADDRINUSE).to_string();
        assert!(text.starts_with("Address already in use"));
        assert!(text.contains(&format!("errno {}", libc::EADDRINUSE)));
    }
}
