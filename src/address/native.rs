use std::{fmt, mem::{self, offset_of}};

use super::{AddressError, AddressInstance, IpAddress, PipeAddress, ip::Octets};

/// A `sockaddr_storage` holding the native encoding of an [`AddressInstance`],
/// together with the length the kernel should read from it.
#[derive(Clone, Copy)]
pub struct NativeAddress {
    storage: libc::sockaddr_storage,
    len: libc::socklen_t,
}

impl NativeAddress {

    pub fn family(&self) -> libc::c_int { self.storage.ss_family as libc::c_int }

    pub fn socklen(&self) -> libc::socklen_t { self.len }

    pub fn as_ptr(&self) -> *const libc::sockaddr {
        &self.storage as *const _ as *const libc::sockaddr
    }

    pub fn storage(&self) -> &libc::sockaddr_storage { &self.storage }

    fn zeroed() -> libc::sockaddr_storage {
        // SAFETY: sockaddr_storage is plain old data; all-zero is a valid value
        unsafe { mem::zeroed() }
    }

    fn from_ip(ip: &IpAddress) -> Self {
        let mut storage = Self::zeroed();

        let len = match ip.octets_raw() {
            Octets::V4(be_bytes) => {
                let addr_in = libc::sockaddr_in {
                    sin_family: libc::AF_INET as libc::sa_family_t,
                    sin_port: ip.port().to_be(),
                    sin_addr: libc::in_addr {
                        s_addr: u32::from_ne_bytes(be_bytes),
                    },
                    sin_zero: [0; 8],
                };

                // SAFETY: sockaddr_storage is large and aligned enough for any sockaddr_*
                unsafe {
                    std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in, addr_in);
                }

                mem::size_of::<libc::sockaddr_in>()
            }
            Octets::V6(be_bytes) => {
                let addr_in6 = libc::sockaddr_in6 {
                    sin6_family: libc::AF_INET6 as libc::sa_family_t,
                    sin6_port: ip.port().to_be(),
                    sin6_addr: libc::in6_addr { s6_addr: be_bytes },
                    sin6_flowinfo: 0,
                    sin6_scope_id: 0,
                };

                // SAFETY: see above
                unsafe {
                    std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in6, addr_in6);
                }

                mem::size_of::<libc::sockaddr_in6>()
            }
        };

        Self { storage, len: len as libc::socklen_t }
    }

    // The name length was checked when the PipeAddress was built.
    fn from_pipe(pipe: &PipeAddress) -> Self {
        let mut storage = Self::zeroed();

        // SAFETY: see from_ip
        let addr_un = unsafe { &mut *(&mut storage as *mut _ as *mut libc::sockaddr_un) };
        addr_un.sun_family = libc::AF_UNIX as libc::sa_family_t;

        let (bytes, terminated) = pipe.native_bytes();
        for (dst, &src) in addr_un.sun_path.iter_mut().zip(&bytes) {
            *dst = src as libc::c_char;
        }

        // Abstract names are not NUL-terminated; their length is the address length
        let len = offset_of!(libc::sockaddr_un, sun_path) + bytes.len() + terminated as usize;
        Self { storage, len: len as libc::socklen_t }
    }

    /*
        Decodes a native address filled in by the kernel. `len` is the value
        returned through the address-length argument of accept(2),
        getsockname(2) or getpeername(2).
    */
    pub fn decode(
        storage: &libc::sockaddr_storage,
        len: libc::socklen_t
    ) -> Result<AddressInstance, AddressError> {
        let family = storage.ss_family as libc::c_int;
        let len = len as usize;

        let require = |needed: usize| {
            if len < needed {
                Err(AddressError::Truncated { family, len })
            } else {
                Ok(())
            }
        };

        match family {
            libc::AF_INET => {
                require(mem::size_of::<libc::sockaddr_in>())?;
                // SAFETY: family and length were checked above
                let addr_in = unsafe { &*(storage as *const _ as *const libc::sockaddr_in) };
                Ok(AddressInstance::from_sockaddr_in(addr_in))
            }
            libc::AF_INET6 => {
                require(mem::size_of::<libc::sockaddr_in6>())?;
                // SAFETY: family and length were checked above
                let addr_in6 = unsafe { &*(storage as *const _ as *const libc::sockaddr_in6) };
                Ok(AddressInstance::from_sockaddr_in6(addr_in6))
            }
            libc::AF_UNIX => {
                let path_offset = offset_of!(libc::sockaddr_un, sun_path);
                require(path_offset)?;
                // SAFETY: family was checked above and storage covers a whole sockaddr_un
                let addr_un = unsafe { &*(storage as *const _ as *const libc::sockaddr_un) };

                let path_len = (len - path_offset).min(addr_un.sun_path.len());
                let bytes: Vec<u8> = addr_un.sun_path[..path_len]
                    .iter()
                    .map(|&c| c as u8)
                    .collect();

                Ok(AddressInstance::Pipe(PipeAddress::from_native_bytes(&bytes)))
            }
            _ => Err(AddressError::UnsupportedFamily(family)),
        }
    }
}

impl From<&AddressInstance> for NativeAddress {
    fn from(instance: &AddressInstance) -> Self {
        match instance {
            AddressInstance::Ip(ip) => Self::from_ip(ip),
            AddressInstance::Pipe(pipe) => Self::from_pipe(pipe),
        }
    }
}

impl fmt::Debug for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NativeAddress")
            .field("family", &self.family())
            .field("len", &self.len)
            .finish()
    }
}
