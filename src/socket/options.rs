use std::os::fd::RawFd;

use crate::OsError;

use super::SocketError;

macro_rules! impl_option {

    ($name:ident, $level:ident, $option:ident) => {
        fn $name<T>(fd: RawFd, value: T) -> Result<(), OsError> {
            unsafe {
                Self::setsockopt(fd, libc::$level, libc::$option, value)
            }
        }
    };
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Linger {
    pub onoff: bool,
    pub linger: i32,
}

impl Linger {

    fn as_c_linger(&self) -> libc::linger {
        libc::linger {
            l_onoff: self.onoff as libc::c_int,
            l_linger: self.linger,
        }
    }
}

/// Options a listener or upstream connection applies between `socket()`
/// and `bind()`/`connect()`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SocketOption {
    ReuseAddress(bool),
    ReusePort(bool),
    KeepAlive(bool),
    NoDelay(bool),
    Linger(Linger),
    SendBuffer(u32),
    ReceiveBuffer(u32),
    // Restricts an AF_INET6 socket to IPv6 traffic only
    Ipv6Only(bool),
}

impl SocketOption {

    /*
        SAFETY:

            `T` must be the C type the kernel expects for `option`.
    */
    unsafe fn setsockopt<T>(fd: RawFd, level: libc::c_int, option: libc::c_int, value: T) -> Result<(), OsError> {
        syscall!(
            setsockopt(
                fd,
                level,
                option,
                &value as *const _ as *const libc::c_void,
                std::mem::size_of_val(&value) as libc::socklen_t
            )
        ).map_err(OsError::from)?;

        Ok(())
    }

    impl_option!(reuse_address,     SOL_SOCKET,     SO_REUSEADDR    );
    impl_option!(reuse_port,        SOL_SOCKET,     SO_REUSEPORT    );
    impl_option!(keepalive,         SOL_SOCKET,     SO_KEEPALIVE    );
    impl_option!(no_delay,          IPPROTO_TCP,    TCP_NODELAY     );
    impl_option!(linger,            SOL_SOCKET,     SO_LINGER       );
    impl_option!(send_buffer,       SOL_SOCKET,     SO_SNDBUF       );
    impl_option!(receive_buffer,    SOL_SOCKET,     SO_RCVBUF       );
    impl_option!(ipv6_only,         IPPROTO_IPV6,   IPV6_V6ONLY     );

    pub fn set(&self, fd: RawFd) -> Result<(), OsError> {
        let flag = |on: bool| on as libc::c_int;

        match self {
            Self::ReuseAddress(on) => Self::reuse_address(fd, flag(*on)),
            Self::ReusePort(on) => Self::reuse_port(fd, flag(*on)),
            Self::KeepAlive(on) => Self::keepalive(fd, flag(*on)),
            Self::NoDelay(on) => Self::no_delay(fd, flag(*on)),
            Self::Linger(linger) => Self::linger(fd, linger.as_c_linger()),
            Self::SendBuffer(size) => Self::send_buffer(fd, *size as libc::c_int),
            Self::ReceiveBuffer(size) => Self::receive_buffer(fd, *size as libc::c_int),
            Self::Ipv6Only(on) => Self::ipv6_only(fd, flag(*on)),
        }
    }
}

pub trait SocketConfigurable {
    fn set_opt(&self, option: SocketOption) -> Result<&Self, SocketError> where Self: Sized;
    fn set_opt_multi(&self, options: &[SocketOption]) -> Result<&Self, SocketError> where Self: Sized {
        for option in options {
            self.set_opt(*option)?;
        }
        Ok(self)
    }
}
