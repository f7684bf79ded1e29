//! Typed convenience wrappers over POSIX system interfaces.
//!
//! Every operation delegates to a C library call, converting the
//! `-1`/`errno` convention into [`std::io::Result`] values and exposing the
//! underlying C structures through typed accessors.

#[macro_use]
mod macros;

pub mod addr;
pub mod dir;
pub mod dns;
pub mod fd;
pub mod ifaddrs;
pub mod poll;
pub mod pwd;
pub mod socket;
pub mod stat;
pub mod sys;

pub use addr::{Family, SocketAddress};
pub use dir::{Directory, Entry, EntryType};
pub use dns::{bindable, lookup, lookup_port, AddrList, Lookup, LookupError};
pub use fd::{AccessMode, Fd, FileFlags, SignalOwner};
pub use ifaddrs::{interfaces, Interface, InterfaceFlags};
pub use poll::{Event, Poller, Trigger};
pub use pwd::{Group, User};
pub use socket::{Kind, MsgFlags, Socket};
pub use stat::{FileStatus, Mode};
