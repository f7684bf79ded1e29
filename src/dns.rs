//! Host and service resolution over `getaddrinfo`.

use std::ffi::{CStr, CString};
use std::io;
use std::mem;
use std::ptr;

use log::trace;
use thiserror::Error;

use crate::addr::{Family, SocketAddress};
use crate::socket::Kind;

/// A failed `getaddrinfo` call. These carry `EAI_*` codes, not errno;
/// only `EAI_SYSTEM` wraps an OS error.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("temporary failure in name resolution")]
    Again,
    #[error("invalid resolver flags")]
    BadFlags,
    #[error("non-recoverable failure in name resolution")]
    Fail,
    #[error("address family not supported")]
    UnsupportedFamily,
    #[error("resolver ran out of memory")]
    Memory,
    #[error("name or service not known")]
    NotFound,
    #[error("service not supported for socket type")]
    UnsupportedService,
    #[error("socket type not supported")]
    UnsupportedSockType,
    #[error("system error")]
    System(#[source] io::Error),
    #[error("host or service contains a nul byte")]
    InvalidName,
    #[error("resolver error ({0})")]
    Other(i32),
}

impl LookupError {
    fn from_code(code: libc::c_int) -> LookupError {
        match code {
            libc::EAI_AGAIN => LookupError::Again,
            libc::EAI_BADFLAGS => LookupError::BadFlags,
            libc::EAI_FAIL => LookupError::Fail,
            libc::EAI_FAMILY => LookupError::UnsupportedFamily,
            libc::EAI_MEMORY => LookupError::Memory,
            libc::EAI_NONAME => LookupError::NotFound,
            libc::EAI_SERVICE => LookupError::UnsupportedService,
            libc::EAI_SOCKTYPE => LookupError::UnsupportedSockType,
            libc::EAI_SYSTEM => LookupError::System(io::Error::last_os_error()),
            other => LookupError::Other(other),
        }
    }
}

/// Options for a lookup, the typed view of `addrinfo` hints.
#[derive(Debug, Default, Clone)]
pub struct Lookup {
    family: Option<Family>,
    kind: Option<Kind>,
    protocol: Option<i32>,
    flags: libc::c_int,
    max: Option<usize>,
}

impl Lookup {
    pub fn new() -> Lookup {
        Lookup::default()
    }

    pub fn family(mut self, family: Family) -> Lookup {
        self.family = Some(family);
        self
    }

    pub fn kind(mut self, kind: Kind) -> Lookup {
        self.kind = Some(kind);
        self
    }

    pub fn protocol(mut self, protocol: i32) -> Lookup {
        self.protocol = Some(protocol);
        self
    }

    /// Ask for the official name of the host (`AI_CANONNAME`).
    pub fn canonical_name(mut self) -> Lookup {
        self.flags |= libc::AI_CANONNAME;
        self
    }

    /// Only return families this machine has an interface configured for.
    pub fn addr_config(mut self) -> Lookup {
        self.flags |= libc::AI_ADDRCONFIG;
        self
    }

    /// The host is a numeric address string; never resolve.
    pub fn numeric_host(mut self) -> Lookup {
        self.flags |= libc::AI_NUMERICHOST;
        self
    }

    /// The service is a numeric port string; never consult the services db.
    pub fn numeric_service(mut self) -> Lookup {
        self.flags |= libc::AI_NUMERICSERV;
        self
    }

    /// Addresses intended for `bind` (`AI_PASSIVE`).
    pub fn passive(mut self) -> Lookup {
        self.flags |= libc::AI_PASSIVE;
        self
    }

    /// Cap the number of records returned.
    pub fn max_records(mut self, max: usize) -> Lookup {
        self.max = Some(max);
        self
    }
}

/// The result of a lookup.
#[derive(Debug)]
pub struct AddrList {
    /// The official hostname, when `canonical_name` was requested.
    pub canonical_name: Option<String>,
    pub addrs: Vec<SocketAddress>,
}

/// Resolves `host`/`service` into socket addresses.
pub fn lookup(host: &str, service: &str, options: &Lookup) -> Result<AddrList, LookupError> {
    lookup_inner(Some(host), Some(service), options)
}

/// Resolves a host with the port given numerically.
pub fn lookup_port(host: &str, port: u16, options: &Lookup) -> Result<AddrList, LookupError> {
    let options = options.clone().numeric_service();
    lookup_inner(Some(host), Some(&port.to_string()), &options)
}

/// Addresses suitable for binding a listener for `service`.
pub fn bindable(service: &str, options: &Lookup) -> Result<AddrList, LookupError> {
    let options = options.clone().passive();
    lookup_inner(None, Some(service), &options)
}

fn lookup_inner(
    host: Option<&str>,
    service: Option<&str>,
    options: &Lookup,
) -> Result<AddrList, LookupError> {
    let host = host
        .map(CString::new)
        .transpose()
        .map_err(|_| LookupError::InvalidName)?;
    let service = service
        .map(CString::new)
        .transpose()
        .map_err(|_| LookupError::InvalidName)?;

    let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
    hints.ai_family = options
        .family
        .map(|f| f.raw() as libc::c_int)
        .unwrap_or(libc::AF_UNSPEC);
    hints.ai_socktype = options.kind.map(Kind::raw).unwrap_or(0);
    hints.ai_protocol = options.protocol.unwrap_or(0);
    hints.ai_flags = options.flags;

    let mut list: *mut libc::addrinfo = ptr::null_mut();
    let code = unsafe {
        libc::getaddrinfo(
            host.as_ref().map_or(ptr::null(), |h| h.as_ptr()),
            service.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
            &hints,
            &mut list,
        )
    };
    if code != 0 {
        return Err(LookupError::from_code(code));
    }

    let mut canonical_name = None;
    let mut addrs = Vec::new();
    let mut cur = list;
    while !cur.is_null() {
        let info = unsafe { &*cur };
        if canonical_name.is_none() && !info.ai_canonname.is_null() {
            canonical_name = Some(
                unsafe { CStr::from_ptr(info.ai_canonname) }
                    .to_string_lossy()
                    .into_owned(),
            );
        }
        if !info.ai_addr.is_null() {
            addrs.push(unsafe { SocketAddress::from_raw(info.ai_addr) });
        }
        if options.max.map_or(false, |max| addrs.len() >= max) {
            break;
        }
        cur = info.ai_next;
    }
    unsafe { libc::freeaddrinfo(list) };

    trace!(
        "resolved {} address(es) for host={:?} service={:?}",
        addrs.len(),
        host,
        service
    );
    Ok(AddrList {
        canonical_name,
        addrs,
    })
}
