use std::io;
use std::mem;
use std::net::Shutdown;
use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd, RawFd};
use std::time::Duration;

use bitflags::bitflags;
use socket2::{Domain, Protocol, Type};

use crate::addr::{Family, SocketAddress};

/// The socket type, the `SOCK_*` constant passed to `socket(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Stream,
    Datagram,
    SeqPacket,
    Raw,
}

impl Kind {
    pub fn raw(self) -> libc::c_int {
        match self {
            Kind::Stream => libc::SOCK_STREAM,
            Kind::Datagram => libc::SOCK_DGRAM,
            Kind::SeqPacket => libc::SOCK_SEQPACKET,
            Kind::Raw => libc::SOCK_RAW,
        }
    }

    pub fn from_raw(raw: libc::c_int) -> Option<Kind> {
        match raw {
            libc::SOCK_STREAM => Some(Kind::Stream),
            libc::SOCK_DGRAM => Some(Kind::Datagram),
            libc::SOCK_SEQPACKET => Some(Kind::SeqPacket),
            libc::SOCK_RAW => Some(Kind::Raw),
            _ => None,
        }
    }
}

bitflags! {
    /// `MSG_*` flags for send/recv calls.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MsgFlags: libc::c_int {
        const OOB = libc::MSG_OOB;
        const PEEK = libc::MSG_PEEK;
        const DONTROUTE = libc::MSG_DONTROUTE;
        const DONTWAIT = libc::MSG_DONTWAIT;
        const WAITALL = libc::MSG_WAITALL;
        const EOR = libc::MSG_EOR;
        #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
        const NOSIGNAL = libc::MSG_NOSIGNAL;
    }
}

/// An owned socket descriptor. Closed on drop.
#[derive(Debug)]
pub struct Socket {
    fd: RawFd,
}

impl Socket {
    /// Opens a socket. Creation goes through `socket2` so close-on-exec (and
    /// `SO_NOSIGPIPE` on macos) is handled at the same time.
    pub fn new(family: Family, kind: Kind, protocol: Option<i32>) -> io::Result<Socket> {
        let socket = socket2::Socket::new(
            Domain::from(family.raw() as libc::c_int),
            Type::from(kind.raw()),
            protocol.map(Protocol::from),
        )?;
        Ok(Socket {
            fd: socket.into_raw_fd(),
        })
    }

    pub fn pair(family: Family, kind: Kind, protocol: i32) -> io::Result<(Socket, Socket)> {
        let mut fds = [0; 2];
        syscall!(socketpair(
            family.raw() as libc::c_int,
            kind.raw(),
            protocol,
            fds.as_mut_ptr()
        ))?;
        Ok((Socket { fd: fds[0] }, Socket { fd: fds[1] }))
    }

    pub fn bind(&self, addr: &SocketAddress) -> io::Result<()> {
        syscall!(bind(self.fd, addr.as_ptr(), addr.socklen()))?;
        Ok(())
    }

    pub fn listen(&self, backlog: i32) -> io::Result<()> {
        syscall!(listen(self.fd, backlog))?;
        Ok(())
    }

    pub fn connect(&self, addr: &SocketAddress) -> io::Result<()> {
        syscall!(connect(self.fd, addr.as_ptr(), addr.socklen()))?;
        Ok(())
    }

    pub fn accept(&self) -> io::Result<(Socket, SocketAddress)> {
        let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
        let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
        let fd = syscall!(accept(
            self.fd,
            &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr,
            &mut len
        ))?;
        Ok((Socket { fd }, SocketAddress::from_storage(storage)))
    }

    pub fn send(&self, buf: &[u8], flags: MsgFlags) -> io::Result<usize> {
        let n = syscall!(send(
            self.fd,
            buf.as_ptr() as *const libc::c_void,
            buf.len(),
            flags.bits()
        ))?;
        Ok(n as usize)
    }

    pub fn recv(&self, buf: &mut [u8], flags: MsgFlags) -> io::Result<usize> {
        let n = syscall!(recv(
            self.fd,
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
            flags.bits()
        ))?;
        Ok(n as usize)
    }

    pub fn send_to(&self, buf: &[u8], dest: &SocketAddress, flags: MsgFlags) -> io::Result<usize> {
        let n = syscall!(sendto(
            self.fd,
            buf.as_ptr() as *const libc::c_void,
            buf.len(),
            flags.bits(),
            dest.as_ptr(),
            dest.socklen()
        ))?;
        Ok(n as usize)
    }

    pub fn recv_from(&self, buf: &mut [u8], flags: MsgFlags) -> io::Result<(usize, SocketAddress)> {
        let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
        let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
        let n = syscall!(recvfrom(
            self.fd,
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
            flags.bits(),
            &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr,
            &mut len
        ))?;
        Ok((n as usize, SocketAddress::from_storage(storage)))
    }

    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        let how = match how {
            Shutdown::Read => libc::SHUT_RD,
            Shutdown::Write => libc::SHUT_WR,
            Shutdown::Both => libc::SHUT_RDWR,
        };
        syscall!(shutdown(self.fd, how))?;
        Ok(())
    }

    pub fn local_addr(&self) -> io::Result<SocketAddress> {
        let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
        let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
        syscall!(getsockname(
            self.fd,
            &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr,
            &mut len
        ))?;
        Ok(SocketAddress::from_storage(storage))
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddress> {
        let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
        let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
        syscall!(getpeername(
            self.fd,
            &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr,
            &mut len
        ))?;
        Ok(SocketAddress::from_storage(storage))
    }
}

// Socket options. The generic helpers take any plain-data value type and
// forward the level/name constants; the named accessors pin down the types
// the options actually use.
impl Socket {
    fn getsockopt<T: Copy>(&self, level: libc::c_int, name: libc::c_int) -> io::Result<T> {
        let mut value: T = unsafe { mem::zeroed() };
        let mut len = mem::size_of::<T>() as libc::socklen_t;
        syscall!(getsockopt(
            self.fd,
            level,
            name,
            &mut value as *mut T as *mut libc::c_void,
            &mut len
        ))?;
        Ok(value)
    }

    fn setsockopt<T: Copy>(&self, level: libc::c_int, name: libc::c_int, value: T) -> io::Result<()> {
        syscall!(setsockopt(
            self.fd,
            level,
            name,
            &value as *const T as *const libc::c_void,
            mem::size_of::<T>() as libc::socklen_t
        ))?;
        Ok(())
    }

    fn get_bool(&self, name: libc::c_int) -> io::Result<bool> {
        Ok(self.getsockopt::<libc::c_int>(libc::SOL_SOCKET, name)? != 0)
    }

    fn set_bool(&self, name: libc::c_int, on: bool) -> io::Result<()> {
        self.setsockopt(libc::SOL_SOCKET, name, on as libc::c_int)
    }

    pub fn reuse_addr(&self) -> io::Result<bool> {
        self.get_bool(libc::SO_REUSEADDR)
    }

    pub fn set_reuse_addr(&self, on: bool) -> io::Result<()> {
        self.set_bool(libc::SO_REUSEADDR, on)
    }

    pub fn reuse_port(&self) -> io::Result<bool> {
        self.get_bool(libc::SO_REUSEPORT)
    }

    pub fn set_reuse_port(&self, on: bool) -> io::Result<()> {
        self.set_bool(libc::SO_REUSEPORT, on)
    }

    pub fn keepalive(&self) -> io::Result<bool> {
        self.get_bool(libc::SO_KEEPALIVE)
    }

    pub fn set_keepalive(&self, on: bool) -> io::Result<()> {
        self.set_bool(libc::SO_KEEPALIVE, on)
    }

    pub fn broadcast(&self) -> io::Result<bool> {
        self.get_bool(libc::SO_BROADCAST)
    }

    pub fn set_broadcast(&self, on: bool) -> io::Result<()> {
        self.set_bool(libc::SO_BROADCAST, on)
    }

    pub fn send_buffer_size(&self) -> io::Result<usize> {
        let n: libc::c_int = self.getsockopt(libc::SOL_SOCKET, libc::SO_SNDBUF)?;
        Ok(n as usize)
    }

    pub fn set_send_buffer_size(&self, size: usize) -> io::Result<()> {
        self.setsockopt(libc::SOL_SOCKET, libc::SO_SNDBUF, size as libc::c_int)
    }

    pub fn recv_buffer_size(&self) -> io::Result<usize> {
        let n: libc::c_int = self.getsockopt(libc::SOL_SOCKET, libc::SO_RCVBUF)?;
        Ok(n as usize)
    }

    pub fn set_recv_buffer_size(&self, size: usize) -> io::Result<()> {
        self.setsockopt(libc::SOL_SOCKET, libc::SO_RCVBUF, size as libc::c_int)
    }

    pub fn send_low_watermark(&self) -> io::Result<usize> {
        let n: libc::c_int = self.getsockopt(libc::SOL_SOCKET, libc::SO_SNDLOWAT)?;
        Ok(n as usize)
    }

    pub fn recv_low_watermark(&self) -> io::Result<usize> {
        let n: libc::c_int = self.getsockopt(libc::SOL_SOCKET, libc::SO_RCVLOWAT)?;
        Ok(n as usize)
    }

    pub fn send_timeout(&self) -> io::Result<Option<Duration>> {
        let tv: libc::timeval = self.getsockopt(libc::SOL_SOCKET, libc::SO_SNDTIMEO)?;
        Ok(timeval_to_duration(tv))
    }

    pub fn set_send_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.setsockopt(libc::SOL_SOCKET, libc::SO_SNDTIMEO, duration_to_timeval(timeout))
    }

    pub fn recv_timeout(&self) -> io::Result<Option<Duration>> {
        let tv: libc::timeval = self.getsockopt(libc::SOL_SOCKET, libc::SO_RCVTIMEO)?;
        Ok(timeval_to_duration(tv))
    }

    pub fn set_recv_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.setsockopt(libc::SOL_SOCKET, libc::SO_RCVTIMEO, duration_to_timeval(timeout))
    }

    /// The socket type this descriptor was created with.
    pub fn kind(&self) -> io::Result<Kind> {
        let raw: libc::c_int = self.getsockopt(libc::SOL_SOCKET, libc::SO_TYPE)?;
        Kind::from_raw(raw)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "unknown socket type"))
    }

    /// Takes the pending socket error, if any.
    pub fn take_error(&self) -> io::Result<Option<io::Error>> {
        let code: libc::c_int = self.getsockopt(libc::SOL_SOCKET, libc::SO_ERROR)?;
        if code == 0 {
            Ok(None)
        } else {
            Ok(Some(io::Error::from_raw_os_error(code)))
        }
    }
}

fn timeval_to_duration(tv: libc::timeval) -> Option<Duration> {
    if tv.tv_sec == 0 && tv.tv_usec == 0 {
        None
    } else {
        Some(Duration::new(tv.tv_sec as u64, tv.tv_usec as u32 * 1000))
    }
}

fn duration_to_timeval(timeout: Option<Duration>) -> libc::timeval {
    match timeout {
        None => libc::timeval {
            tv_sec: 0,
            tv_usec: 0,
        },
        Some(t) => libc::timeval {
            tv_sec: t.as_secs() as libc::time_t,
            tv_usec: t.subsec_micros() as libc::suseconds_t,
        },
    }
}

impl AsRawFd for Socket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl FromRawFd for Socket {
    unsafe fn from_raw_fd(fd: RawFd) -> Socket {
        Socket { fd }
    }
}

impl IntoRawFd for Socket {
    fn into_raw_fd(self) -> RawFd {
        let fd = self.fd;
        mem::forget(self);
        fd
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        let _ = syscall!(close(self.fd));
    }
}
