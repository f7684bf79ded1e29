//! Kernel readiness notification.
//!
//! The per-platform facilities stay separate typed surfaces: [`epoll`] on
//! Linux, [`kqueue`] on the BSDs. [`Poller`] is the thin oneshot readiness
//! poller built on whichever is native, and [`Trigger`] the cross-thread
//! wakeup switch.

use std::io;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android"))] {
        pub mod epoll;
        use epoll as sys;
    } else if #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly",
    ))] {
        pub mod kqueue;
        use kqueue as sys;
    } else {
        compile_error!("does not support this target OS");
    }
}

mod trigger;
pub use trigger::Trigger;

/// Key reserved for the poller's own wakeup channel.
pub(crate) const NOTIFY_KEY: usize = usize::MAX;

/// A readiness event reported by epoll/kqueue.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    /// Key passed when registering interest in the descriptor.
    pub key: usize,
    /// Is the descriptor readable?
    pub readable: bool,
    /// Is the descriptor writable?
    pub writable: bool,
}

/// A oneshot readiness poller. Each registered descriptor is armed with
/// [`interest`](Poller::interest) and reports at most one event until
/// re-armed.
pub struct Poller {
    notified: AtomicBool,
    reactor: sys::Reactor,
    events: Mutex<sys::Events>,
}

impl Poller {
    pub fn new() -> io::Result<Poller> {
        Ok(Poller {
            notified: AtomicBool::new(false),
            reactor: sys::Reactor::new()?,
            events: Mutex::new(sys::Events::new()),
        })
    }

    /// Registers a descriptor, disarmed and switched to nonblocking.
    pub fn insert(&self, fd: RawFd) -> io::Result<()> {
        self.reactor.insert(fd)
    }

    /// Arms a descriptor for one readiness report under `key`.
    pub fn interest(&self, fd: RawFd, key: usize, read: bool, write: bool) -> io::Result<()> {
        if key == NOTIFY_KEY {
            Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "the key is not allowed to be `usize::MAX`",
            ))
        } else {
            self.reactor.interest(fd, key, read, write)
        }
    }

    pub fn remove(&self, fd: RawFd) -> io::Result<()> {
        self.reactor.remove(fd)
    }

    /// Blocks until events arrive, a notify lands, or `timeout` passes;
    /// appends the events to `events` and returns how many were added.
    pub fn wait(&self, events: &mut Vec<Event>, timeout: Option<Duration>) -> io::Result<usize> {
        if let Ok(mut lock) = self.events.try_lock() {
            self.reactor.wait(&mut lock, timeout)?;
            self.notified.swap(false, Ordering::SeqCst);
            let len = events.len();
            events.extend(lock.ready().filter(|ev| ev.key != NOTIFY_KEY));
            Ok(events.len() - len)
        } else {
            Ok(0)
        }
    }

    /// Wakes up a concurrent `wait`. Notifications coalesce until the next
    /// wait returns.
    pub fn notify(&self) -> io::Result<()> {
        if self
            .notified
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.reactor.notify()?;
        }
        Ok(())
    }
}
