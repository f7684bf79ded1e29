//! Network interface enumeration over `getifaddrs`.

use std::ffi::CStr;
use std::fmt;
use std::io;
use std::ptr;

use bitflags::bitflags;

use crate::addr::SocketAddress;

bitflags! {
    /// `IFF_*` interface flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterfaceFlags: libc::c_int {
        const UP = libc::IFF_UP;
        const BROADCAST = libc::IFF_BROADCAST;
        const DEBUG = libc::IFF_DEBUG;
        const LOOPBACK = libc::IFF_LOOPBACK;
        const POINTOPOINT = libc::IFF_POINTOPOINT;
        const RUNNING = libc::IFF_RUNNING;
        const NOARP = libc::IFF_NOARP;
        const PROMISC = libc::IFF_PROMISC;
        const MULTICAST = libc::IFF_MULTICAST;
    }
}

/// One address record of a network interface. An interface with several
/// addresses shows up once per address.
#[derive(Debug, Clone)]
pub struct Interface {
    name: String,
    address: Option<SocketAddress>,
    netmask: Option<SocketAddress>,
    peer: Option<SocketAddress>,
    flags: InterfaceFlags,
}

impl Interface {
    /// # Safety
    ///
    /// `ifa` must come from a live `getifaddrs` list.
    unsafe fn from_ifaddrs(ifa: &libc::ifaddrs) -> Interface {
        cfg_if::cfg_if! {
            if #[cfg(any(target_os = "linux", target_os = "android"))] {
                // On Linux ifa_ifu is the dstaddr/broadaddr union.
                let peer = ifa.ifa_ifu;
            } else {
                let peer = ifa.ifa_dstaddr;
            }
        }
        Interface {
            name: CStr::from_ptr(ifa.ifa_name).to_string_lossy().into_owned(),
            address: sockaddr_opt(ifa.ifa_addr),
            netmask: sockaddr_opt(ifa.ifa_netmask),
            peer: sockaddr_opt(peer),
            flags: InterfaceFlags::from_bits_truncate(ifa.ifa_flags as libc::c_int),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Option<&SocketAddress> {
        self.address.as_ref()
    }

    pub fn netmask(&self) -> Option<&SocketAddress> {
        self.netmask.as_ref()
    }

    /// The broadcast address, on broadcast-capable interfaces.
    pub fn broadcast(&self) -> Option<&SocketAddress> {
        if self.flags.contains(InterfaceFlags::BROADCAST) {
            self.peer.as_ref()
        } else {
            None
        }
    }

    /// The peer address, on point-to-point interfaces.
    pub fn destination(&self) -> Option<&SocketAddress> {
        if self.flags.contains(InterfaceFlags::POINTOPOINT) {
            self.peer.as_ref()
        } else {
            None
        }
    }

    pub fn flags(&self) -> InterfaceFlags {
        self.flags
    }

    pub fn is_up(&self) -> bool {
        self.flags.contains(InterfaceFlags::UP)
    }

    pub fn is_running(&self) -> bool {
        self.flags.contains(InterfaceFlags::RUNNING)
    }

    pub fn is_loopback(&self) -> bool {
        self.flags.contains(InterfaceFlags::LOOPBACK)
    }

    pub fn is_point_to_point(&self) -> bool {
        self.flags.contains(InterfaceFlags::POINTOPOINT)
    }

    pub fn supports_broadcast(&self) -> bool {
        self.flags.contains(InterfaceFlags::BROADCAST)
    }

    pub fn supports_multicast(&self) -> bool {
        self.flags.contains(InterfaceFlags::MULTICAST)
    }

    pub fn no_arp(&self) -> bool {
        self.flags.contains(InterfaceFlags::NOARP)
    }

    pub fn promiscuous(&self) -> bool {
        self.flags.contains(InterfaceFlags::PROMISC)
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(addr) => write!(f, "{} {}", self.name, addr),
            None => f.write_str(&self.name),
        }
    }
}

fn sockaddr_opt(ptr: *const libc::sockaddr) -> Option<SocketAddress> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { SocketAddress::from_raw(ptr) })
    }
}

/// Enumerates the address records of all network interfaces.
pub fn interfaces() -> io::Result<Vec<Interface>> {
    let mut list: *mut libc::ifaddrs = ptr::null_mut();
    syscall!(getifaddrs(&mut list))?;
    let mut out = Vec::new();
    let mut cur = list;
    while !cur.is_null() {
        let ifa = unsafe { &*cur };
        out.push(unsafe { Interface::from_ifaddrs(ifa) });
        cur = ifa.ifa_next;
    }
    unsafe { libc::freeifaddrs(list) };
    Ok(out)
}
