//! The BSD/Darwin `kqueue` surface.

use std::io;
use std::mem;
use std::os::unix::io::{AsRawFd, RawFd};
use std::ptr;
use std::time::Duration;

use bitflags::bitflags;
use log::trace;

use super::{Event, NOTIFY_KEY};

bitflags! {
    /// `EV_*` action and status flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventFlags: u16 {
        const ADD = libc::EV_ADD as u16;
        const DELETE = libc::EV_DELETE as u16;
        const ENABLE = libc::EV_ENABLE as u16;
        const DISABLE = libc::EV_DISABLE as u16;
        const ONESHOT = libc::EV_ONESHOT as u16;
        const CLEAR = libc::EV_CLEAR as u16;
        const RECEIPT = libc::EV_RECEIPT as u16;
        const EOF = libc::EV_EOF as u16;
        const ERROR = libc::EV_ERROR as u16;
    }
}

/// A kevent filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Read,
    Write,
    Aio,
    Vnode,
    Proc,
    Signal,
    Timer,
    User,
}

impl Filter {
    pub fn raw(self) -> i16 {
        match self {
            Filter::Read => libc::EVFILT_READ as i16,
            Filter::Write => libc::EVFILT_WRITE as i16,
            Filter::Aio => libc::EVFILT_AIO as i16,
            Filter::Vnode => libc::EVFILT_VNODE as i16,
            Filter::Proc => libc::EVFILT_PROC as i16,
            Filter::Signal => libc::EVFILT_SIGNAL as i16,
            Filter::Timer => libc::EVFILT_TIMER as i16,
            Filter::User => libc::EVFILT_USER as i16,
        }
    }

    pub fn from_raw(raw: i16) -> Option<Filter> {
        match raw {
            raw if raw == libc::EVFILT_READ as i16 => Some(Filter::Read),
            raw if raw == libc::EVFILT_WRITE as i16 => Some(Filter::Write),
            raw if raw == libc::EVFILT_AIO as i16 => Some(Filter::Aio),
            raw if raw == libc::EVFILT_VNODE as i16 => Some(Filter::Vnode),
            raw if raw == libc::EVFILT_PROC as i16 => Some(Filter::Proc),
            raw if raw == libc::EVFILT_SIGNAL as i16 => Some(Filter::Signal),
            raw if raw == libc::EVFILT_TIMER as i16 => Some(Filter::Timer),
            raw if raw == libc::EVFILT_USER as i16 => Some(Filter::User),
            _ => None,
        }
    }
}

/// A change or report record, `struct kevent` behind a builder.
#[derive(Clone, Copy)]
pub struct Kevent(libc::kevent);

impl Kevent {
    pub fn new(ident: usize, filter: Filter, flags: EventFlags) -> Kevent {
        let mut ev: libc::kevent = unsafe { mem::zeroed() };
        ev.ident = ident as _;
        ev.filter = filter.raw() as _;
        ev.flags = flags.bits() as _;
        Kevent(ev)
    }

    /// Filter-specific flags (`NOTE_*`).
    pub fn fflags(mut self, fflags: u32) -> Kevent {
        self.0.fflags = fflags as _;
        self
    }

    pub fn data(mut self, data: i64) -> Kevent {
        self.0.data = data as _;
        self
    }

    /// Opaque key carried through to the report.
    pub fn udata(mut self, key: usize) -> Kevent {
        self.0.udata = key as _;
        self
    }

    pub fn ident(&self) -> usize {
        self.0.ident as usize
    }

    pub fn filter(&self) -> Option<Filter> {
        Filter::from_raw(self.0.filter as i16)
    }

    pub fn flags(&self) -> EventFlags {
        EventFlags::from_bits_truncate(self.0.flags as u16)
    }

    pub fn raw_fflags(&self) -> u32 {
        self.0.fflags as u32
    }

    pub fn raw_data(&self) -> i64 {
        self.0.data as i64
    }

    pub fn key(&self) -> usize {
        self.0.udata as usize
    }
}

/// An owned kqueue instance. Closed on drop.
#[derive(Debug)]
pub struct KQueue {
    fd: RawFd,
}

impl KQueue {
    pub fn new() -> io::Result<KQueue> {
        let fd = syscall!(kqueue())?;
        let flags = syscall!(fcntl(fd, libc::F_GETFD))?;
        syscall!(fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC))?;
        Ok(KQueue { fd })
    }

    /// Submits change records without draining any pending reports.
    pub fn push(&self, changes: &[Kevent]) -> io::Result<()> {
        syscall!(kevent(
            self.fd,
            changes.as_ptr() as *const libc::kevent,
            changes.len() as _,
            ptr::null_mut(),
            0,
            ptr::null()
        ))?;
        Ok(())
    }

    /// Waits for reports; `None` blocks indefinitely. Returns how many
    /// records landed in `events`.
    pub fn poll(&self, events: &mut Events, timeout: Option<Duration>) -> io::Result<usize> {
        let ts = timeout.map(|t| libc::timespec {
            tv_sec: t.as_secs() as libc::time_t,
            tv_nsec: t.subsec_nanos() as libc::c_long,
        });
        let res = syscall!(kevent(
            self.fd,
            ptr::null(),
            0,
            events.list.as_mut_ptr() as *mut libc::kevent,
            events.list.len() as _,
            ts.as_ref().map_or(ptr::null(), |ts| ts)
        ))?;
        events.len = res as usize;
        Ok(events.len)
    }
}

impl AsRawFd for KQueue {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for KQueue {
    fn drop(&mut self) {
        let _ = syscall!(close(self.fd));
    }
}

/// A list of reported kevents.
pub struct Events {
    list: Box<[Kevent]>,
    len: usize,
}

// udata is a raw pointer in the C struct, but it only ever carries an
// integer key here.
unsafe impl Send for Events {}
unsafe impl Sync for Events {}

impl Events {
    pub fn new() -> Events {
        Events::with_capacity(1024)
    }

    pub fn with_capacity(cap: usize) -> Events {
        let ev = Kevent(unsafe { mem::zeroed() });
        Events {
            list: vec![ev; cap].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Kevent> + '_ {
        self.list[..self.len].iter()
    }

    pub(crate) fn ready(&self) -> impl Iterator<Item = Event> + '_ {
        self.iter().map(|ev| Event {
            key: ev.key(),
            readable: ev.filter() == Some(Filter::Read),
            writable: ev.filter() == Some(Filter::Write),
        })
    }
}

impl Default for Events {
    fn default() -> Events {
        Events::new()
    }
}

/// Oneshot readiness backend for [`Poller`](super::Poller): a kqueue with
/// an `EVFILT_USER` record as the wakeup channel.
pub(crate) struct Reactor {
    kq: KQueue,
}

impl Reactor {
    pub fn new() -> io::Result<Reactor> {
        let kq = KQueue::new()?;
        kq.push(&[
            Kevent::new(0, Filter::User, EventFlags::ADD | EventFlags::CLEAR).udata(NOTIFY_KEY),
        ])?;
        Ok(Reactor { kq })
    }

    pub fn insert(&self, fd: RawFd) -> io::Result<()> {
        let flags = syscall!(fcntl(fd, libc::F_GETFL))?;
        syscall!(fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK))?;
        trace!("insert fd={}", fd);
        Ok(())
    }

    pub fn interest(&self, fd: RawFd, key: usize, read: bool, write: bool) -> io::Result<()> {
        let arm = EventFlags::ADD | EventFlags::ONESHOT;
        let read_flags = if read { arm } else { EventFlags::DELETE };
        let write_flags = if write { arm } else { EventFlags::DELETE };
        self.submit(Kevent::new(fd as usize, Filter::Read, read_flags).udata(key))?;
        self.submit(Kevent::new(fd as usize, Filter::Write, write_flags).udata(key))?;
        Ok(())
    }

    pub fn remove(&self, fd: RawFd) -> io::Result<()> {
        trace!("remove fd={}", fd);
        self.submit(Kevent::new(fd as usize, Filter::Read, EventFlags::DELETE))?;
        self.submit(Kevent::new(fd as usize, Filter::Write, EventFlags::DELETE))?;
        Ok(())
    }

    pub fn wait(&self, events: &mut Events, timeout: Option<Duration>) -> io::Result<usize> {
        self.kq.poll(events, timeout)
    }

    pub fn notify(&self) -> io::Result<()> {
        self.kq.push(&[
            Kevent::new(0, Filter::User, EventFlags::empty()).fflags(libc::NOTE_TRIGGER),
        ])
    }

    // Deleting a filter that was never armed reports ENOENT; that is fine.
    fn submit(&self, ev: Kevent) -> io::Result<()> {
        match self.kq.push(std::slice::from_ref(&ev)) {
            Err(err) if err.raw_os_error() == Some(libc::ENOENT) => Ok(()),
            res => res,
        }
    }
}
