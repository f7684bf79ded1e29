//! Descriptor helpers layered on `fcntl`, `ioctl` and positioned/vectored
//! I/O, available on anything that exposes a raw fd.

use std::io::{self, IoSlice, IoSliceMut};
use std::os::unix::io::AsRawFd;

use bitflags::bitflags;

bitflags! {
    /// Status flags from `fcntl(F_GETFL)`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileFlags: libc::c_int {
        const NONBLOCK = libc::O_NONBLOCK;
        const APPEND = libc::O_APPEND;
        const ASYNC = libc::O_ASYNC;
    }
}

/// The access mode a descriptor was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// The recipient of `SIGIO`/`SIGURG` for a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOwner {
    Process(libc::pid_t),
    Group(libc::pid_t),
}

pub trait Fd: AsRawFd {
    fn status_flags(&self) -> io::Result<FileFlags> {
        let flags = syscall!(fcntl(self.as_raw_fd(), libc::F_GETFL))?;
        Ok(FileFlags::from_bits_truncate(flags))
    }

    fn set_status_flags(&self, flags: FileFlags) -> io::Result<()> {
        syscall!(fcntl(self.as_raw_fd(), libc::F_SETFL, flags.bits()))?;
        Ok(())
    }

    fn set_nonblocking(&self, on: bool) -> io::Result<()> {
        let flags = syscall!(fcntl(self.as_raw_fd(), libc::F_GETFL))?;
        let flags = if on {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };
        syscall!(fcntl(self.as_raw_fd(), libc::F_SETFL, flags))?;
        Ok(())
    }

    fn access_mode(&self) -> io::Result<AccessMode> {
        let flags = syscall!(fcntl(self.as_raw_fd(), libc::F_GETFL))?;
        match flags & libc::O_ACCMODE {
            libc::O_RDONLY => Ok(AccessMode::ReadOnly),
            libc::O_WRONLY => Ok(AccessMode::WriteOnly),
            libc::O_RDWR => Ok(AccessMode::ReadWrite),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unknown access mode",
            )),
        }
    }

    /// Who receives `SIGIO` for this descriptor; a negative `F_GETOWN`
    /// result names a process group.
    fn signal_owner(&self) -> io::Result<SignalOwner> {
        let pid = syscall!(fcntl(self.as_raw_fd(), libc::F_GETOWN))?;
        if pid < 0 {
            Ok(SignalOwner::Group(-pid))
        } else {
            Ok(SignalOwner::Process(pid))
        }
    }

    fn set_signal_owner(&self, pid: libc::pid_t) -> io::Result<()> {
        syscall!(fcntl(self.as_raw_fd(), libc::F_SETOWN, pid))?;
        Ok(())
    }

    /// Bytes waiting to be read, via the `FIONREAD` ioctl.
    fn bytes_readable(&self) -> io::Result<usize> {
        let mut n: libc::c_int = 0;
        syscall!(ioctl(self.as_raw_fd(), libc::FIONREAD as _, &mut n))?;
        Ok(n as usize)
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let n = syscall!(pread(
            self.as_raw_fd(),
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len(),
            offset as libc::off_t
        ))?;
        Ok(n as usize)
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        let n = syscall!(pwrite(
            self.as_raw_fd(),
            buf.as_ptr() as *const libc::c_void,
            buf.len(),
            offset as libc::off_t
        ))?;
        Ok(n as usize)
    }

    /// Scatter read. `IoSliceMut` is ABI-compatible with `struct iovec`.
    fn read_vectored(&self, bufs: &mut [IoSliceMut<'_>]) -> io::Result<usize> {
        let n = syscall!(readv(
            self.as_raw_fd(),
            bufs.as_mut_ptr() as *mut libc::iovec,
            bufs.len() as libc::c_int
        ))?;
        Ok(n as usize)
    }

    /// Gather write.
    fn write_vectored(&self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        let n = syscall!(writev(
            self.as_raw_fd(),
            bufs.as_ptr() as *const libc::iovec,
            bufs.len() as libc::c_int
        ))?;
        Ok(n as usize)
    }
}

impl<T: AsRawFd> Fd for T {}
