//! System limits and configuration, via `sysconf(3)`.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android"))] {
        unsafe fn errno_location() -> *mut libc::c_int {
            libc::__errno_location()
        }
    } else if #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "dragonfly",
    ))] {
        unsafe fn errno_location() -> *mut libc::c_int {
            libc::__error()
        }
    } else if #[cfg(any(target_os = "netbsd", target_os = "openbsd"))] {
        unsafe fn errno_location() -> *mut libc::c_int {
            libc::__errno()
        }
    } else {
        compile_error!("does not support this target OS");
    }
}

pub(crate) fn errno() -> libc::c_int {
    unsafe { *errno_location() }
}

pub(crate) fn clear_errno() {
    unsafe { *errno_location() = 0 }
}

/// A `sysconf` query. `None` means the system reports no determinate limit.
fn sysconf(name: libc::c_int) -> Option<i64> {
    let value = unsafe { libc::sysconf(name) };
    if value == -1 {
        None
    } else {
        Some(value as i64)
    }
}

pub fn page_size() -> Option<i64> {
    sysconf(libc::_SC_PAGESIZE)
}

pub fn physical_pages() -> Option<i64> {
    sysconf(libc::_SC_PHYS_PAGES)
}

pub fn cpus_configured() -> Option<i64> {
    sysconf(libc::_SC_NPROCESSORS_CONF)
}

pub fn cpus_online() -> Option<i64> {
    sysconf(libc::_SC_NPROCESSORS_ONLN)
}

pub fn clock_ticks() -> Option<i64> {
    sysconf(libc::_SC_CLK_TCK)
}

pub fn max_open_files() -> Option<i64> {
    sysconf(libc::_SC_OPEN_MAX)
}

pub fn max_child_processes() -> Option<i64> {
    sysconf(libc::_SC_CHILD_MAX)
}

pub fn max_args() -> Option<i64> {
    sysconf(libc::_SC_ARG_MAX)
}

pub fn max_host_name() -> Option<i64> {
    sysconf(libc::_SC_HOST_NAME_MAX)
}

pub fn max_login_name() -> Option<i64> {
    sysconf(libc::_SC_LOGIN_NAME_MAX)
}

pub fn max_tty_name() -> Option<i64> {
    sysconf(libc::_SC_TTY_NAME_MAX)
}

pub fn max_path() -> i64 {
    libc::PATH_MAX as i64
}

/// Starting buffer size for `getpw*_r` lookups.
pub(crate) fn passwd_buffer_size() -> usize {
    sysconf(libc::_SC_GETPW_R_SIZE_MAX)
        .map(|n| n as usize)
        .unwrap_or(1024)
}

/// Starting buffer size for `getgr*_r` lookups.
pub(crate) fn group_buffer_size() -> usize {
    sysconf(libc::_SC_GETGR_R_SIZE_MAX)
        .map(|n| n as usize)
        .unwrap_or(1024)
}
