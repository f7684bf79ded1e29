//! Directory enumeration over `opendir`/`readdir`.

use std::ffi::{CStr, CString, OsStr, OsString};
use std::fmt;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::sys;

/// The entry type from `dirent.d_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Unknown,
    Fifo,
    CharDevice,
    Directory,
    BlockDevice,
    Regular,
    Symlink,
    Socket,
    #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
    Whiteout,
}

impl EntryType {
    pub fn from_raw(raw: u8) -> EntryType {
        match raw {
            libc::DT_FIFO => EntryType::Fifo,
            libc::DT_CHR => EntryType::CharDevice,
            libc::DT_DIR => EntryType::Directory,
            libc::DT_BLK => EntryType::BlockDevice,
            libc::DT_REG => EntryType::Regular,
            libc::DT_LNK => EntryType::Symlink,
            libc::DT_SOCK => EntryType::Socket,
            #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
            libc::DT_WHT => EntryType::Whiteout,
            _ => EntryType::Unknown,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryType::Unknown => "unknown",
            EntryType::Fifo => "named pipe",
            EntryType::CharDevice => "character device",
            EntryType::Directory => "directory",
            EntryType::BlockDevice => "block device",
            EntryType::Regular => "regular",
            EntryType::Symlink => "symbolic link",
            EntryType::Socket => "socket",
            #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
            EntryType::Whiteout => "whiteout",
        };
        f.write_str(name)
    }
}

/// One directory entry. Name and metadata are copied out of the `dirent`.
#[derive(Debug, Clone)]
pub struct Entry {
    base: PathBuf,
    name: OsString,
    ino: u64,
    kind: EntryType,
}

impl Entry {
    fn new(base: &Path, ent: &libc::dirent) -> Entry {
        let name = unsafe { CStr::from_ptr(ent.d_name.as_ptr()) };
        cfg_if::cfg_if! {
            if #[cfg(any(
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly",
            ))] {
                let ino = ent.d_fileno as u64;
            } else {
                let ino = ent.d_ino as u64;
            }
        }
        Entry {
            base: base.to_path_buf(),
            name: OsStr::from_bytes(name.to_bytes()).to_os_string(),
            ino,
            kind: EntryType::from_raw(ent.d_type),
        }
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Inode number of the entry.
    pub fn ino(&self) -> u64 {
        self.ino
    }

    pub fn file_type(&self) -> EntryType {
        self.kind
    }

    /// The directory path joined with the entry name.
    pub fn path(&self) -> PathBuf {
        self.base.join(&self.name)
    }
}

/// An open directory stream. Iterating yields entries in readdir order,
/// including `.` and `..`; the stream is closed on drop.
pub struct Directory {
    dir: *mut libc::DIR,
    base: PathBuf,
}

impl Directory {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Directory> {
        let base = path.as_ref().to_path_buf();
        let cpath = CString::new(base.as_os_str().as_bytes())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a nul byte"))?;
        let dir = unsafe { libc::opendir(cpath.as_ptr()) };
        if dir.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(Directory { dir, base })
    }

    /// All entries of `path` collected at once.
    pub fn entries<P: AsRef<Path>>(path: P) -> io::Result<Vec<Entry>> {
        Directory::open(path)?.collect()
    }

    /// Scans `path` for an entry with the given name.
    pub fn find<P: AsRef<Path>>(path: P, name: &OsStr) -> io::Result<Option<Entry>> {
        for entry in Directory::open(path)? {
            let entry = entry?;
            if entry.name() == name {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}

impl Iterator for Directory {
    type Item = io::Result<Entry>;

    fn next(&mut self) -> Option<io::Result<Entry>> {
        // readdir reports both end-of-stream and failure with a null return;
        // only errno tells them apart.
        sys::clear_errno();
        let ent = unsafe { libc::readdir(self.dir) };
        if ent.is_null() {
            return match sys::errno() {
                0 => None,
                _ => Some(Err(io::Error::last_os_error())),
            };
        }
        Some(Ok(Entry::new(&self.base, unsafe { &*ent })))
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory").field("base", &self.base).finish()
    }
}

impl Drop for Directory {
    fn drop(&mut self) {
        unsafe { libc::closedir(self.dir) };
    }
}
