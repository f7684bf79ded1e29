use std::fmt;
use std::io;
use std::mem;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use std::ptr;

use socket2::SockAddr;

/// The address family tag of a [`SocketAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Unspec,
    Inet,
    Inet6,
    Unix,
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly",
    ))]
    Link,
    Other(libc::sa_family_t),
}

impl Family {
    pub fn raw(self) -> libc::sa_family_t {
        match self {
            Family::Unspec => libc::AF_UNSPEC as libc::sa_family_t,
            Family::Inet => libc::AF_INET as libc::sa_family_t,
            Family::Inet6 => libc::AF_INET6 as libc::sa_family_t,
            Family::Unix => libc::AF_UNIX as libc::sa_family_t,
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly",
            ))]
            Family::Link => libc::AF_LINK as libc::sa_family_t,
            Family::Other(raw) => raw,
        }
    }

    pub fn from_raw(raw: libc::sa_family_t) -> Family {
        match raw as libc::c_int {
            libc::AF_UNSPEC => Family::Unspec,
            libc::AF_INET => Family::Inet,
            libc::AF_INET6 => Family::Inet6,
            libc::AF_UNIX => Family::Unix,
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly",
            ))]
            libc::AF_LINK => Family::Link,
            _ => Family::Other(raw),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Unspec => write!(f, "unspec"),
            Family::Inet => write!(f, "inet"),
            Family::Inet6 => write!(f, "inet6"),
            Family::Unix => write!(f, "unix"),
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly",
            ))]
            Family::Link => write!(f, "link"),
            Family::Other(raw) => write!(f, "family({})", raw),
        }
    }
}

/// A socket address, the tagged union over the `sockaddr` representations
/// used by the BSD sockets API.
///
/// The variant is picked from the address-family tag at construction;
/// families this crate has no typed view for are kept whole in `Other`.
#[derive(Clone, Copy)]
pub enum SocketAddress {
    Inet(libc::sockaddr_in),
    Inet6(libc::sockaddr_in6),
    Unix(libc::sockaddr_un),
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly",
    ))]
    Link(libc::sockaddr_dl),
    Other(libc::sockaddr_storage),
}

impl SocketAddress {
    pub fn new(ip: IpAddr, port: u16) -> SocketAddress {
        match ip {
            IpAddr::V4(v4) => SocketAddress::inet(v4, port),
            IpAddr::V6(v6) => SocketAddress::inet6(v6, port),
        }
    }

    pub fn inet(ip: Ipv4Addr, port: u16) -> SocketAddress {
        let mut sin: libc::sockaddr_in = unsafe { mem::zeroed() };
        sin.sin_family = libc::AF_INET as libc::sa_family_t;
        sin.sin_port = port.to_be();
        sin.sin_addr = libc::in_addr {
            s_addr: u32::from(ip).to_be(),
        };
        #[cfg(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd",
            target_os = "dragonfly",
        ))]
        {
            sin.sin_len = mem::size_of::<libc::sockaddr_in>() as u8;
        }
        SocketAddress::Inet(sin)
    }

    pub fn inet6(ip: Ipv6Addr, port: u16) -> SocketAddress {
        let mut sin6: libc::sockaddr_in6 = unsafe { mem::zeroed() };
        sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
        sin6.sin6_port = port.to_be();
        sin6.sin6_addr = libc::in6_addr {
            s6_addr: ip.octets(),
        };
        #[cfg(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd",
            target_os = "dragonfly",
        ))]
        {
            sin6.sin6_len = mem::size_of::<libc::sockaddr_in6>() as u8;
        }
        SocketAddress::Inet6(sin6)
    }

    /// Builds a unix domain address. The path must fit in `sun_path` with a
    /// terminating nul.
    pub fn unix<P: AsRef<Path>>(path: P) -> io::Result<SocketAddress> {
        let bytes = path.as_ref().as_os_str().as_bytes();
        let mut sun: libc::sockaddr_un = unsafe { mem::zeroed() };
        if bytes.len() >= sun.sun_path.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "path does not fit in sockaddr_un",
            ));
        }
        sun.sun_family = libc::AF_UNIX as libc::sa_family_t;
        #[cfg(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd",
            target_os = "dragonfly",
        ))]
        {
            sun.sun_len = mem::size_of::<libc::sockaddr_un>() as u8;
        }
        for (dst, src) in sun.sun_path.iter_mut().zip(bytes) {
            *dst = *src as libc::c_char;
        }
        Ok(SocketAddress::Unix(sun))
    }

    /// Picks the typed variant out of a `sockaddr_storage` by its family tag.
    pub fn from_storage(storage: libc::sockaddr_storage) -> SocketAddress {
        let ptr = &storage as *const libc::sockaddr_storage;
        match storage.ss_family as libc::c_int {
            libc::AF_INET => SocketAddress::Inet(unsafe { *(ptr as *const libc::sockaddr_in) }),
            libc::AF_INET6 => SocketAddress::Inet6(unsafe { *(ptr as *const libc::sockaddr_in6) }),
            libc::AF_UNIX => SocketAddress::Unix(unsafe { *(ptr as *const libc::sockaddr_un) }),
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly",
            ))]
            libc::AF_LINK => SocketAddress::Link(unsafe { *(ptr as *const libc::sockaddr_dl) }),
            _ => SocketAddress::Other(storage),
        }
    }

    /// Reads a socket address out of a raw `sockaddr` pointer.
    ///
    /// # Safety
    ///
    /// `addr` must point to a valid address of at least the size its family
    /// tag implies.
    pub unsafe fn from_raw(addr: *const libc::sockaddr) -> SocketAddress {
        let len = match (*addr).sa_family as libc::c_int {
            libc::AF_INET => mem::size_of::<libc::sockaddr_in>(),
            libc::AF_INET6 => mem::size_of::<libc::sockaddr_in6>(),
            libc::AF_UNIX => mem::size_of::<libc::sockaddr_un>(),
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly",
            ))]
            libc::AF_LINK => mem::size_of::<libc::sockaddr_dl>(),
            _ => mem::size_of::<libc::sockaddr>(),
        };
        let mut storage: libc::sockaddr_storage = mem::zeroed();
        ptr::copy_nonoverlapping(
            addr as *const u8,
            &mut storage as *mut libc::sockaddr_storage as *mut u8,
            len.min(mem::size_of::<libc::sockaddr_storage>()),
        );
        SocketAddress::from_storage(storage)
    }

    pub fn family(&self) -> Family {
        match self {
            SocketAddress::Inet(_) => Family::Inet,
            SocketAddress::Inet6(_) => Family::Inet6,
            SocketAddress::Unix(_) => Family::Unix,
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly",
            ))]
            SocketAddress::Link(_) => Family::Link,
            SocketAddress::Other(storage) => Family::from_raw(storage.ss_family),
        }
    }

    /// The `socklen_t` of the concrete variant, for passing to C alongside
    /// [`as_ptr`](SocketAddress::as_ptr).
    pub fn socklen(&self) -> libc::socklen_t {
        let size = match self {
            SocketAddress::Inet(_) => mem::size_of::<libc::sockaddr_in>(),
            SocketAddress::Inet6(_) => mem::size_of::<libc::sockaddr_in6>(),
            SocketAddress::Unix(_) => mem::size_of::<libc::sockaddr_un>(),
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly",
            ))]
            SocketAddress::Link(_) => mem::size_of::<libc::sockaddr_dl>(),
            SocketAddress::Other(_) => mem::size_of::<libc::sockaddr_storage>(),
        };
        size as libc::socklen_t
    }

    pub fn as_ptr(&self) -> *const libc::sockaddr {
        match self {
            SocketAddress::Inet(sin) => sin as *const libc::sockaddr_in as *const libc::sockaddr,
            SocketAddress::Inet6(sin6) => {
                sin6 as *const libc::sockaddr_in6 as *const libc::sockaddr
            }
            SocketAddress::Unix(sun) => sun as *const libc::sockaddr_un as *const libc::sockaddr,
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly",
            ))]
            SocketAddress::Link(dl) => dl as *const libc::sockaddr_dl as *const libc::sockaddr,
            SocketAddress::Other(storage) => {
                storage as *const libc::sockaddr_storage as *const libc::sockaddr
            }
        }
    }

    /// The whole address copied into a `sockaddr_storage`.
    pub fn as_storage(&self) -> libc::sockaddr_storage {
        let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
        unsafe {
            ptr::copy_nonoverlapping(
                self.as_ptr() as *const u8,
                &mut storage as *mut libc::sockaddr_storage as *mut u8,
                self.socklen() as usize,
            );
        }
        storage
    }

    /// The port number, for inet/inet6 addresses.
    pub fn port(&self) -> Option<u16> {
        match self {
            SocketAddress::Inet(sin) => Some(u16::from_be(sin.sin_port)),
            SocketAddress::Inet6(sin6) => Some(u16::from_be(sin6.sin6_port)),
            _ => None,
        }
    }

    /// Sets the port on inet/inet6 addresses; other families are untouched.
    pub fn set_port(&mut self, port: u16) {
        match self {
            SocketAddress::Inet(sin) => sin.sin_port = port.to_be(),
            SocketAddress::Inet6(sin6) => sin6.sin6_port = port.to_be(),
            _ => {}
        }
    }

    /// The ip address, for inet/inet6 addresses.
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            SocketAddress::Inet(sin) => Some(IpAddr::V4(Ipv4Addr::from(u32::from_be(
                sin.sin_addr.s_addr,
            )))),
            SocketAddress::Inet6(sin6) => Some(IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr))),
            _ => None,
        }
    }

    /// The filesystem path, for unix domain addresses.
    pub fn path(&self) -> Option<PathBuf> {
        let sun = match self {
            SocketAddress::Unix(sun) => sun,
            _ => return None,
        };
        let bytes: Vec<u8> = sun
            .sun_path
            .iter()
            .take_while(|c| **c != 0)
            .map(|c| *c as u8)
            .collect();
        Some(PathBuf::from(std::ffi::OsString::from_vec(bytes)))
    }

    pub fn is_loopback(&self) -> bool {
        match self.ip() {
            Some(IpAddr::V4(ip)) => ip.is_loopback(),
            Some(IpAddr::V6(ip)) => ip.is_loopback(),
            None => false,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        match self.ip() {
            Some(IpAddr::V4(ip)) => ip.is_unspecified(),
            Some(IpAddr::V6(ip)) => ip.is_unspecified(),
            None => false,
        }
    }

    /// Whether `self` and `other` share the `prefix`-bit network prefix.
    /// False when families differ or the prefix is out of range.
    pub fn same_subnet(&self, other: &SocketAddress, prefix: u32) -> bool {
        match (self.ip(), other.ip()) {
            (Some(IpAddr::V4(a)), Some(IpAddr::V4(b))) if prefix <= 32 => {
                let mask = prefix_mask_v4(prefix);
                u32::from(a) & mask == u32::from(b) & mask
            }
            (Some(IpAddr::V6(a)), Some(IpAddr::V6(b))) if prefix <= 128 => {
                let mask = prefix_mask_v6(prefix);
                u128::from(a) & mask == u128::from(b) & mask
            }
            _ => false,
        }
    }

    /// [`same_subnet`](SocketAddress::same_subnet) with the mask given as an
    /// address of the same family.
    pub fn same_subnet_masked(&self, other: &SocketAddress, mask: &SocketAddress) -> bool {
        match (self.ip(), other.ip(), mask.ip()) {
            (Some(IpAddr::V4(a)), Some(IpAddr::V4(b)), Some(IpAddr::V4(m))) => {
                let m = u32::from(m);
                u32::from(a) & m == u32::from(b) & m
            }
            (Some(IpAddr::V6(a)), Some(IpAddr::V6(b)), Some(IpAddr::V6(m))) => {
                let m = u128::from(m);
                u128::from(a) & m == u128::from(b) & m
            }
            _ => false,
        }
    }

    /// Converts to the std representation, for inet/inet6 addresses.
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        match self {
            SocketAddress::Inet(sin) => {
                let ip = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
                Some(SocketAddr::V4(SocketAddrV4::new(
                    ip,
                    u16::from_be(sin.sin_port),
                )))
            }
            SocketAddress::Inet6(sin6) => {
                let ip = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
                Some(SocketAddr::V6(SocketAddrV6::new(
                    ip,
                    u16::from_be(sin6.sin6_port),
                    u32::from_be(sin6.sin6_flowinfo),
                    sin6.sin6_scope_id,
                )))
            }
            _ => None,
        }
    }

    /// Converts to a [`socket2::SockAddr`].
    pub fn to_sock_addr(&self) -> io::Result<SockAddr> {
        let socklen = self.socklen();
        let src = self.as_ptr() as *const u8;
        let ((), addr) = unsafe {
            SockAddr::try_init(|storage, len| {
                ptr::copy_nonoverlapping(src, storage as *mut u8, socklen as usize);
                *len = socklen;
                Ok(())
            })
        }?;
        Ok(addr)
    }
}

fn prefix_mask_v4(prefix: u32) -> u32 {
    if prefix == 0 {
        0
    } else if prefix >= 32 {
        u32::MAX
    } else {
        u32::MAX << (32 - prefix)
    }
}

fn prefix_mask_v6(prefix: u32) -> u128 {
    if prefix == 0 {
        0
    } else if prefix >= 128 {
        u128::MAX
    } else {
        u128::MAX << (128 - prefix)
    }
}

impl From<SocketAddr> for SocketAddress {
    fn from(addr: SocketAddr) -> SocketAddress {
        match addr {
            SocketAddr::V4(v4) => SocketAddress::inet(*v4.ip(), v4.port()),
            SocketAddr::V6(v6) => {
                let mut out = SocketAddress::inet6(*v6.ip(), v6.port());
                if let SocketAddress::Inet6(sin6) = &mut out {
                    sin6.sin6_flowinfo = v6.flowinfo().to_be();
                    sin6.sin6_scope_id = v6.scope_id();
                }
                out
            }
        }
    }
}

impl From<&SockAddr> for SocketAddress {
    fn from(addr: &SockAddr) -> SocketAddress {
        unsafe { SocketAddress::from_raw(addr.as_ptr() as *const libc::sockaddr) }
    }
}

impl PartialEq for SocketAddress {
    fn eq(&self, other: &SocketAddress) -> bool {
        match (self, other) {
            (SocketAddress::Inet(a), SocketAddress::Inet(b)) => {
                a.sin_port == b.sin_port && a.sin_addr.s_addr == b.sin_addr.s_addr
            }
            (SocketAddress::Inet6(a), SocketAddress::Inet6(b)) => {
                a.sin6_port == b.sin6_port
                    && a.sin6_addr.s6_addr == b.sin6_addr.s6_addr
                    && a.sin6_scope_id == b.sin6_scope_id
            }
            (SocketAddress::Unix(_), SocketAddress::Unix(_)) => self.path() == other.path(),
            _ => {
                if self.family() != other.family() {
                    return false;
                }
                let (a, b) = (self.as_storage(), other.as_storage());
                let a: &[u8] = unsafe {
                    std::slice::from_raw_parts(
                        &a as *const libc::sockaddr_storage as *const u8,
                        self.socklen() as usize,
                    )
                };
                let b: &[u8] = unsafe {
                    std::slice::from_raw_parts(
                        &b as *const libc::sockaddr_storage as *const u8,
                        other.socklen() as usize,
                    )
                };
                a == b
            }
        }
    }
}

impl Eq for SocketAddress {}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketAddress::Inet(_) | SocketAddress::Inet6(_) => {
                match (self.ip(), self.port()) {
                    (Some(ip), Some(port)) => write!(f, "{} {}:{}", self.family(), ip, port),
                    _ => write!(f, "{}", self.family()),
                }
            }
            SocketAddress::Unix(_) => match self.path() {
                Some(path) => write!(f, "unix {}", path.display()),
                None => write!(f, "unix"),
            },
            _ => write!(f, "{}", self.family()),
        }
    }
}

impl fmt::Debug for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SocketAddress({})", self)
    }
}
