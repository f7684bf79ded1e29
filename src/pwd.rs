//! User and group lookups over the reentrant `getpw*_r`/`getgr*_r` calls.
//!
//! Lookups copy every field out of the C result, so no borrow of the
//! lookup buffer escapes. A lookup that finds nothing is `Ok(None)`; a
//! non-zero return from the C call is an error with that value as errno.

use std::ffi::{CStr, CString, OsStr};
use std::io;
use std::mem;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::ptr;

use crate::sys;

/// A `passwd` database entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    uid: libc::uid_t,
    gid: libc::gid_t,
    name: String,
    passwd: String,
    home: PathBuf,
    shell: PathBuf,
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "dragonfly",
    ))]
    class: String,
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "dragonfly",
    ))]
    change: libc::time_t,
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "dragonfly",
    ))]
    expire: libc::time_t,
}

impl User {
    pub fn from_uid(uid: libc::uid_t) -> io::Result<Option<User>> {
        lookup_passwd(|pw, buf, len, out| unsafe { libc::getpwuid_r(uid, pw, buf, len, out) })
    }

    pub fn from_name(name: &str) -> io::Result<Option<User>> {
        let cname = CString::new(name)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "name contains a nul byte"))?;
        lookup_passwd(|pw, buf, len, out| unsafe {
            libc::getpwnam_r(cname.as_ptr(), pw, buf, len, out)
        })
    }

    /// The user owning this process, from `getuid`.
    pub fn current() -> io::Result<User> {
        User::from_uid(unsafe { libc::getuid() })?
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no passwd entry for uid"))
    }

    /// The user this process is acting on behalf of, from `geteuid`.
    pub fn effective() -> io::Result<User> {
        User::from_uid(unsafe { libc::geteuid() })?
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no passwd entry for euid"))
    }

    pub fn uid(&self) -> libc::uid_t {
        self.uid
    }

    pub fn gid(&self) -> libc::gid_t {
        self.gid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The encrypted password field.
    pub fn passwd(&self) -> &str {
        &self.passwd
    }

    pub fn home(&self) -> &std::path::Path {
        &self.home
    }

    pub fn shell(&self) -> &std::path::Path {
        &self.shell
    }

    /// The user's primary group.
    pub fn primary_group(&self) -> io::Result<Option<Group>> {
        Group::from_gid(self.gid)
    }

    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "dragonfly",
    ))]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "dragonfly",
    ))]
    pub fn password_change_time(&self) -> libc::time_t {
        self.change
    }

    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "dragonfly",
    ))]
    pub fn expiration(&self) -> libc::time_t {
        self.expire
    }

    fn from_passwd(pw: &libc::passwd) -> User {
        User {
            uid: pw.pw_uid,
            gid: pw.pw_gid,
            name: owned_string(pw.pw_name),
            passwd: owned_string(pw.pw_passwd),
            home: owned_path(pw.pw_dir),
            shell: owned_path(pw.pw_shell),
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "dragonfly",
            ))]
            class: owned_string(pw.pw_class),
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "dragonfly",
            ))]
            change: pw.pw_change,
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "dragonfly",
            ))]
            expire: pw.pw_expire,
        }
    }
}

/// A `group` database entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    gid: libc::gid_t,
    name: String,
    members: Vec<String>,
}

impl Group {
    pub fn from_gid(gid: libc::gid_t) -> io::Result<Option<Group>> {
        lookup_group(|gr, buf, len, out| unsafe { libc::getgrgid_r(gid, gr, buf, len, out) })
    }

    pub fn from_name(name: &str) -> io::Result<Option<Group>> {
        let cname = CString::new(name)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "name contains a nul byte"))?;
        lookup_group(|gr, buf, len, out| unsafe {
            libc::getgrnam_r(cname.as_ptr(), gr, buf, len, out)
        })
    }

    /// The primary group of the current user, from `getgid`.
    pub fn current() -> io::Result<Group> {
        Group::from_gid(unsafe { libc::getgid() })?
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no group entry for gid"))
    }

    pub fn gid(&self) -> libc::gid_t {
        self.gid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    fn from_group(gr: &libc::group) -> Group {
        let mut members = Vec::new();
        let mut cur = gr.gr_mem;
        while !cur.is_null() {
            let member = unsafe { *cur };
            if member.is_null() {
                break;
            }
            members.push(owned_string(member));
            cur = unsafe { cur.add(1) };
        }
        Group {
            gid: gr.gr_gid,
            name: owned_string(gr.gr_name),
            members,
        }
    }
}

fn owned_string(ptr: *const libc::c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(ptr) }
            .to_string_lossy()
            .into_owned()
    }
}

fn owned_path(ptr: *const libc::c_char) -> PathBuf {
    if ptr.is_null() {
        PathBuf::new()
    } else {
        let bytes = unsafe { CStr::from_ptr(ptr) }.to_bytes();
        PathBuf::from(OsStr::from_bytes(bytes))
    }
}

fn lookup_passwd<F>(mut f: F) -> io::Result<Option<User>>
where
    F: FnMut(
        *mut libc::passwd,
        *mut libc::c_char,
        libc::size_t,
        *mut *mut libc::passwd,
    ) -> libc::c_int,
{
    let mut buf = vec![0 as libc::c_char; sys::passwd_buffer_size()];
    loop {
        let mut pw: libc::passwd = unsafe { mem::zeroed() };
        let mut result: *mut libc::passwd = ptr::null_mut();
        match f(&mut pw, buf.as_mut_ptr(), buf.len(), &mut result) {
            0 if result.is_null() => return Ok(None),
            0 => return Ok(Some(User::from_passwd(unsafe { &*result }))),
            libc::ERANGE => buf.resize(buf.len() * 2, 0),
            err => return Err(io::Error::from_raw_os_error(err)),
        }
    }
}

fn lookup_group<F>(mut f: F) -> io::Result<Option<Group>>
where
    F: FnMut(
        *mut libc::group,
        *mut libc::c_char,
        libc::size_t,
        *mut *mut libc::group,
    ) -> libc::c_int,
{
    let mut buf = vec![0 as libc::c_char; sys::group_buffer_size()];
    loop {
        let mut gr: libc::group = unsafe { mem::zeroed() };
        let mut result: *mut libc::group = ptr::null_mut();
        match f(&mut gr, buf.as_mut_ptr(), buf.len(), &mut result) {
            0 if result.is_null() => return Ok(None),
            0 => return Ok(Some(Group::from_group(unsafe { &*result }))),
            libc::ERANGE => buf.resize(buf.len() * 2, 0),
            err => return Err(io::Error::from_raw_os_error(err)),
        }
    }
}
