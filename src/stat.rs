//! File status over `stat`/`lstat`/`fstat`.

use std::ffi::CString;
use std::fmt;
use std::io;
use std::mem;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bitflags::bitflags;

use crate::pwd::User;

bitflags! {
    /// Permission bits of `st_mode`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Mode: libc::mode_t {
        const SETUID = libc::S_ISUID;
        const SETGID = libc::S_ISGID;
        const STICKY = libc::S_ISVTX;
        const OWNER_READ = libc::S_IRUSR;
        const OWNER_WRITE = libc::S_IWUSR;
        const OWNER_EXEC = libc::S_IXUSR;
        const GROUP_READ = libc::S_IRGRP;
        const GROUP_WRITE = libc::S_IWGRP;
        const GROUP_EXEC = libc::S_IXGRP;
        const OTHER_READ = libc::S_IROTH;
        const OTHER_WRITE = libc::S_IWOTH;
        const OTHER_EXEC = libc::S_IXOTH;
    }
}

impl fmt::Display for Mode {
    /// The `rwxrwxrwx` rendering of the permission bits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let triplets = [
            (Mode::OWNER_READ, Mode::OWNER_WRITE, Mode::OWNER_EXEC),
            (Mode::GROUP_READ, Mode::GROUP_WRITE, Mode::GROUP_EXEC),
            (Mode::OTHER_READ, Mode::OTHER_WRITE, Mode::OTHER_EXEC),
        ];
        for (r, w, x) in triplets.iter() {
            write!(
                f,
                "{}{}{}",
                if self.contains(*r) { "r" } else { "-" },
                if self.contains(*w) { "w" } else { "-" },
                if self.contains(*x) { "x" } else { "-" },
            )?;
        }
        Ok(())
    }
}

/// A `stat` structure with typed accessors.
#[derive(Clone, Copy)]
pub struct FileStatus {
    stat: libc::stat,
}

impl FileStatus {
    /// Status of the file at `path`, following symlinks.
    pub fn of<P: AsRef<Path>>(path: P) -> io::Result<FileStatus> {
        let path = cpath(path.as_ref())?;
        let mut stat = unsafe { mem::zeroed() };
        syscall!(stat(path.as_ptr(), &mut stat))?;
        Ok(FileStatus { stat })
    }

    /// Status of the link itself, via `lstat`.
    pub fn of_link<P: AsRef<Path>>(path: P) -> io::Result<FileStatus> {
        let path = cpath(path.as_ref())?;
        let mut stat = unsafe { mem::zeroed() };
        syscall!(lstat(path.as_ptr(), &mut stat))?;
        Ok(FileStatus { stat })
    }

    /// Status of an open descriptor, via `fstat`.
    pub fn of_fd(fd: RawFd) -> io::Result<FileStatus> {
        let mut stat = unsafe { mem::zeroed() };
        syscall!(fstat(fd, &mut stat))?;
        Ok(FileStatus { stat })
    }

    pub fn device(&self) -> u64 {
        self.stat.st_dev as u64
    }

    pub fn inode(&self) -> u64 {
        self.stat.st_ino as u64
    }

    /// The raw `st_mode`, type bits included.
    pub fn mode(&self) -> libc::mode_t {
        self.stat.st_mode
    }

    /// The permission bits of `st_mode`.
    pub fn permissions(&self) -> Mode {
        Mode::from_bits_truncate(self.stat.st_mode)
    }

    pub fn hard_links(&self) -> u64 {
        self.stat.st_nlink as u64
    }

    pub fn uid(&self) -> libc::uid_t {
        self.stat.st_uid
    }

    pub fn gid(&self) -> libc::gid_t {
        self.stat.st_gid
    }

    /// Resolves the owning uid against the passwd database.
    pub fn owner(&self) -> io::Result<Option<User>> {
        User::from_uid(self.stat.st_uid)
    }

    pub fn size(&self) -> u64 {
        self.stat.st_size as u64
    }

    pub fn block_size(&self) -> u64 {
        self.stat.st_blksize as u64
    }

    pub fn blocks(&self) -> u64 {
        self.stat.st_blocks as u64
    }

    pub fn accessed(&self) -> SystemTime {
        timestamp(self.stat.st_atime, self.stat.st_atime_nsec as i64)
    }

    pub fn modified(&self) -> SystemTime {
        timestamp(self.stat.st_mtime, self.stat.st_mtime_nsec as i64)
    }

    /// Last status change (`st_ctime`), not creation.
    pub fn changed(&self) -> SystemTime {
        timestamp(self.stat.st_ctime, self.stat.st_ctime_nsec as i64)
    }

    fn is_type(&self, mask: libc::mode_t) -> bool {
        self.stat.st_mode & libc::S_IFMT == mask
    }

    pub fn is_regular(&self) -> bool {
        self.is_type(libc::S_IFREG)
    }

    pub fn is_directory(&self) -> bool {
        self.is_type(libc::S_IFDIR)
    }

    pub fn is_symlink(&self) -> bool {
        self.is_type(libc::S_IFLNK)
    }

    pub fn is_socket(&self) -> bool {
        self.is_type(libc::S_IFSOCK)
    }

    pub fn is_fifo(&self) -> bool {
        self.is_type(libc::S_IFIFO)
    }

    pub fn is_block_device(&self) -> bool {
        self.is_type(libc::S_IFBLK)
    }

    pub fn is_char_device(&self) -> bool {
        self.is_type(libc::S_IFCHR)
    }

    /// The raw structure, for fields without a typed accessor.
    pub fn as_raw(&self) -> &libc::stat {
        &self.stat
    }
}

impl PartialEq for FileStatus {
    fn eq(&self, other: &FileStatus) -> bool {
        self.stat.st_dev == other.stat.st_dev && self.stat.st_ino == other.stat.st_ino
    }
}

impl Eq for FileStatus {}

impl fmt::Debug for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStatus")
            .field("dev", &self.device())
            .field("ino", &self.inode())
            .field("size", &self.size())
            .field("mode", &format_args!("{:o}", self.mode()))
            .finish()
    }
}

fn timestamp(sec: libc::time_t, nsec: i64) -> SystemTime {
    if sec >= 0 {
        UNIX_EPOCH + Duration::new(sec as u64, nsec as u32)
    } else {
        // nsec counts forward from the (negative) second boundary.
        UNIX_EPOCH - Duration::from_secs(-(sec as i64) as u64) + Duration::new(0, nsec as u32)
    }
}

fn cpath(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a nul byte"))
}
