//! Network endpoint addresses for a proxy's listeners and upstream
//! connections: IPv4, IPv6 and local domain-socket paths behind one
//! immutable [`AddressInstance`], plus the non-blocking `socket`/`bind`/
//! `connect` calls that derive their native address family from it.

use thiserror::Error;

#[macro_use]
pub (crate) mod sys;

#[macro_use]
pub (crate) mod logging;

mod os_error;

pub mod address;
pub mod socket;

pub use os_error::{OsError, OsErrorKind};
pub use address::{
    AddressError,
    AddressInstance,
    AddressType,
    IpAddress,
    IpVersion,
    factory,
    try_parse_ip,
};
pub use socket::{ConnectStatus, OwnedSocket, SocketError, SocketType};


#[derive(Debug, Error)]
pub enum Error {
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Socket error: {0}")]
    Socket(#[from] SocketError),

    #[error("OS error: {0}")]
    Os(#[from] OsError),
}

pub type Result<T> = std::result::Result<T, Error>;
