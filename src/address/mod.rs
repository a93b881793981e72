mod ip;
mod instance;
mod native;

pub mod parser;
pub mod factory;

use thiserror::Error;

use crate::OsError;

pub use ip::{IpAddress, IpVersion};
pub use instance::{AddressInstance, AddressType, PipeAddress};
pub use native::NativeAddress;
pub use parser::{try_parse_ip, try_parse_socket_address};

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum AddressError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Pipe path is too long ({len} bytes, at most {max}): {path}")]
    PathTooLong {
        path: String,
        len: usize,
        max: usize,
    },

    #[error("Unsupported address family: {0}")]
    UnsupportedFamily(libc::c_int),

    #[error("Native address of family {family} is truncated ({len} bytes)")]
    Truncated {
        family: libc::c_int,
        len: usize,
    },

    #[error("Invalid address URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to retrieve socket address: {0}")]
    Retrieval(#[from] OsError),
}
