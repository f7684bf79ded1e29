use std::io;

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android"))] {
        use std::os::unix::io::{AsRawFd, RawFd};

        /// A cross-thread wakeup channel backed by an eventfd.
        ///
        /// One side calls [`toggle`](Trigger::toggle), the other observes the
        /// trigger by blocking in [`wait`](Trigger::wait) or by registering
        /// the descriptor for read readiness.
        #[derive(Debug)]
        pub struct Trigger {
            fd: RawFd,
        }

        impl Trigger {
            pub fn new() -> io::Result<Trigger> {
                let fd = syscall!(eventfd(0, libc::EFD_CLOEXEC))?;
                Ok(Trigger { fd })
            }

            pub(crate) fn nonblocking() -> io::Result<Trigger> {
                let fd = syscall!(eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK))?;
                Ok(Trigger { fd })
            }

            /// Fires the trigger. Wakes a blocked [`wait`](Trigger::wait) and
            /// marks the descriptor readable.
            pub fn toggle(&self) -> io::Result<()> {
                let buf = 1u64.to_ne_bytes();
                syscall!(write(self.fd, buf.as_ptr() as *const libc::c_void, buf.len()))?;
                Ok(())
            }

            /// Blocks until the trigger fires, then resets it.
            pub fn wait(&self) -> io::Result<()> {
                let mut buf = [0u8; 8];
                syscall!(read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()))?;
                Ok(())
            }

            // Drains the counter without blocking. Nothing pending is not an
            // error here.
            pub(crate) fn clear(&self) {
                let mut buf = [0u8; 8];
                let _ = syscall!(read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()));
            }
        }

        impl AsRawFd for Trigger {
            fn as_raw_fd(&self) -> RawFd {
                self.fd
            }
        }

        impl Drop for Trigger {
            fn drop(&mut self) {
                let _ = syscall!(close(self.fd));
            }
        }
    } else if #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly",
    ))] {
        use std::os::unix::io::{AsRawFd, RawFd};

        use super::kqueue::{EventFlags, Events, Filter, KQueue, Kevent};

        /// A cross-thread wakeup channel backed by a kqueue `EVFILT_USER`
        /// record.
        ///
        /// One side calls [`toggle`](Trigger::toggle), the other observes the
        /// trigger by blocking in [`wait`](Trigger::wait).
        #[derive(Debug)]
        pub struct Trigger {
            kq: KQueue,
        }

        impl Trigger {
            pub fn new() -> io::Result<Trigger> {
                let kq = KQueue::new()?;
                kq.push(&[Kevent::new(0, Filter::User, EventFlags::ADD | EventFlags::CLEAR)])?;
                Ok(Trigger { kq })
            }

            /// Fires the trigger. Wakes a blocked [`wait`](Trigger::wait).
            pub fn toggle(&self) -> io::Result<()> {
                self.kq.push(&[
                    Kevent::new(0, Filter::User, EventFlags::empty()).fflags(libc::NOTE_TRIGGER),
                ])
            }

            /// Blocks until the trigger fires, then resets it.
            pub fn wait(&self) -> io::Result<()> {
                let mut events = Events::with_capacity(1);
                self.kq.poll(&mut events, None)?;
                Ok(())
            }
        }

        impl AsRawFd for Trigger {
            fn as_raw_fd(&self) -> RawFd {
                self.kq.as_raw_fd()
            }
        }
    }
}
