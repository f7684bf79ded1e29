//! The Linux `epoll` surface.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::ptr;
use std::time::Duration;

use bitflags::bitflags;
use log::trace;

use super::{Event, NOTIFY_KEY};
use crate::poll::Trigger;

bitflags! {
    /// `EPOLL*` event flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EpollFlags: u32 {
        const IN = libc::EPOLLIN as u32;
        const OUT = libc::EPOLLOUT as u32;
        const RDHUP = libc::EPOLLRDHUP as u32;
        const PRI = libc::EPOLLPRI as u32;
        const ERR = libc::EPOLLERR as u32;
        const HUP = libc::EPOLLHUP as u32;
        const EDGE_TRIGGERED = libc::EPOLLET as u32;
        const ONESHOT = libc::EPOLLONESHOT as u32;
        const WAKEUP = libc::EPOLLWAKEUP as u32;
        const EXCLUSIVE = libc::EPOLLEXCLUSIVE as u32;
    }
}

/// Epoll flags for all possible readability events.
pub(crate) fn read_flags() -> EpollFlags {
    EpollFlags::IN | EpollFlags::RDHUP | EpollFlags::HUP | EpollFlags::ERR | EpollFlags::PRI
}

/// Epoll flags for all possible writability events.
pub(crate) fn write_flags() -> EpollFlags {
    EpollFlags::OUT | EpollFlags::HUP | EpollFlags::ERR
}

/// An owned epoll instance. Closed on drop.
#[derive(Debug)]
pub struct Epoll {
    fd: RawFd,
}

impl Epoll {
    pub fn new() -> io::Result<Epoll> {
        let fd = syscall!(epoll_create1(libc::EPOLL_CLOEXEC))?;
        Ok(Epoll { fd })
    }

    /// Starts watching `fd`; events carry `key` back out.
    pub fn add(&self, fd: RawFd, key: usize, flags: EpollFlags) -> io::Result<()> {
        self.ctl(libc::EPOLL_CTL_ADD, fd, Some((key, flags)))
    }

    /// Replaces the event mask and key of a watched descriptor.
    pub fn modify(&self, fd: RawFd, key: usize, flags: EpollFlags) -> io::Result<()> {
        self.ctl(libc::EPOLL_CTL_MOD, fd, Some((key, flags)))
    }

    pub fn delete(&self, fd: RawFd) -> io::Result<()> {
        self.ctl(libc::EPOLL_CTL_DEL, fd, None)
    }

    fn ctl(&self, op: libc::c_int, fd: RawFd, ev: Option<(usize, EpollFlags)>) -> io::Result<()> {
        let mut ev = ev.map(|(key, flags)| libc::epoll_event {
            events: flags.bits(),
            u64: key as u64,
        });
        syscall!(epoll_ctl(
            self.fd,
            op,
            fd,
            ev.as_mut().map_or(ptr::null_mut(), |ev| ev)
        ))?;
        Ok(())
    }

    /// Waits for events; `None` blocks indefinitely. Returns how many
    /// events landed in `events`.
    pub fn wait(&self, events: &mut Events, timeout: Option<Duration>) -> io::Result<usize> {
        let timeout_ms = match timeout {
            None => -1,
            Some(t) => t.as_millis().min(i32::MAX as u128) as libc::c_int,
        };
        let res = syscall!(epoll_wait(
            self.fd,
            events.list.as_mut_ptr(),
            events.list.len() as libc::c_int,
            timeout_ms
        ))?;
        events.len = res as usize;
        Ok(events.len)
    }
}

impl AsRawFd for Epoll {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for Epoll {
    fn drop(&mut self) {
        let _ = syscall!(close(self.fd));
    }
}

/// A list of reported epoll events.
pub struct Events {
    list: Box<[libc::epoll_event]>,
    len: usize,
}

impl Events {
    pub fn new() -> Events {
        Events::with_capacity(1024)
    }

    pub fn with_capacity(cap: usize) -> Events {
        let ev = libc::epoll_event { events: 0, u64: 0 };
        Events {
            list: vec![ev; cap].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, EpollFlags)> + '_ {
        self.list[..self.len]
            .iter()
            .map(|ev| (ev.u64 as usize, EpollFlags::from_bits_truncate(ev.events)))
    }

    pub(crate) fn ready(&self) -> impl Iterator<Item = Event> + '_ {
        self.iter().map(|(key, flags)| Event {
            key,
            readable: flags.intersects(read_flags()),
            writable: flags.intersects(write_flags()),
        })
    }
}

impl Default for Events {
    fn default() -> Events {
        Events::new()
    }
}

/// Oneshot readiness backend for [`Poller`](super::Poller): an epoll
/// instance plus an eventfd wakeup channel watched level-triggered.
pub(crate) struct Reactor {
    epoll: Epoll,
    notifier: Trigger,
}

impl Reactor {
    pub fn new() -> io::Result<Reactor> {
        let epoll = Epoll::new()?;
        let notifier = Trigger::nonblocking()?;
        epoll.add(notifier.as_raw_fd(), NOTIFY_KEY, EpollFlags::IN)?;
        Ok(Reactor { epoll, notifier })
    }

    pub fn insert(&self, fd: RawFd) -> io::Result<()> {
        let flags = syscall!(fcntl(fd, libc::F_GETFL))?;
        syscall!(fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK))?;
        trace!("insert fd={}", fd);
        self.epoll.add(fd, 0, EpollFlags::ONESHOT)
    }

    pub fn interest(&self, fd: RawFd, key: usize, read: bool, write: bool) -> io::Result<()> {
        let mut flags = EpollFlags::ONESHOT;
        if read {
            flags |= read_flags();
        }
        if write {
            flags |= write_flags();
        }
        self.epoll.modify(fd, key, flags)
    }

    pub fn remove(&self, fd: RawFd) -> io::Result<()> {
        trace!("remove fd={}", fd);
        self.epoll.delete(fd)
    }

    pub fn wait(&self, events: &mut Events, timeout: Option<Duration>) -> io::Result<usize> {
        let n = self.epoll.wait(events, timeout)?;
        self.notifier.clear();
        Ok(n)
    }

    pub fn notify(&self) -> io::Result<()> {
        self.notifier.toggle()
    }
}
