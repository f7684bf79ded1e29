use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::AsRawFd;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use poskit::{FileStatus, Mode};

#[test]
fn regular_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data");
    fs::write(&path, b"twelve bytes").unwrap();

    let status = FileStatus::of(&path).unwrap();
    assert!(status.is_regular());
    assert!(!status.is_directory());
    assert!(!status.is_socket());
    assert_eq!(status.size(), 12);
    assert!(status.hard_links() >= 1);
    assert_eq!(status.uid(), unsafe { libc::getuid() });
}

#[test]
fn directory() {
    let dir = tempfile::tempdir().unwrap();
    let status = FileStatus::of(dir.path()).unwrap();
    assert!(status.is_directory());
    assert!(!status.is_regular());
}

#[test]
fn permissions_display() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked");
    fs::write(&path, b"").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

    let status = FileStatus::of(&path).unwrap();
    assert_eq!(status.permissions(), Mode::OWNER_READ | Mode::OWNER_WRITE);
    assert_eq!(status.permissions().to_string(), "rw-------");

    fs::set_permissions(&path, fs::Permissions::from_mode(0o754)).unwrap();
    assert_eq!(FileStatus::of(&path).unwrap().permissions().to_string(), "rwxr-xr--");
}

#[test]
fn symlink_vs_target() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("target");
    let link = dir.path().join("link");
    fs::write(&target, b"x").unwrap();
    std::os::unix::fs::symlink(&target, &link).unwrap();

    // of() follows the link, of_link() does not.
    assert!(FileStatus::of(&link).unwrap().is_regular());
    assert!(FileStatus::of_link(&link).unwrap().is_symlink());
}

#[test]
fn fd_and_path_agree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data");
    fs::write(&path, b"abc").unwrap();
    let file = fs::File::open(&path).unwrap();

    let by_path = FileStatus::of(&path).unwrap();
    let by_fd = FileStatus::of_fd(file.as_raw_fd()).unwrap();
    // Equality is identity: same device, same inode.
    assert_eq!(by_path, by_fd);
    assert_eq!(by_path.inode(), by_fd.inode());
}

#[test]
fn pre_epoch_timestamp_keeps_nanoseconds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old");
    fs::write(&path, b"").unwrap();

    // sec = -1 plus half a second forward is half a second before the epoch.
    let ts = libc::timespec {
        tv_sec: -1,
        tv_nsec: 500_000_000,
    };
    let cpath = CString::new(path.as_os_str().as_bytes()).unwrap();
    let res = unsafe { libc::utimensat(libc::AT_FDCWD, cpath.as_ptr(), [ts, ts].as_ptr(), 0) };
    assert_eq!(res, 0);

    let status = FileStatus::of(&path).unwrap();
    assert_eq!(status.modified(), UNIX_EPOCH - Duration::from_millis(500));
}

#[test]
fn modified_is_recent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh");
    let before = SystemTime::now() - std::time::Duration::from_secs(60);
    fs::write(&path, b"now").unwrap();

    let status = FileStatus::of(&path).unwrap();
    assert!(status.modified() > before);
    assert!(status.changed() > before);
}

#[test]
fn missing_path_is_err() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileStatus::of(dir.path().join("absent")).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn owner_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let status = FileStatus::of(dir.path()).unwrap();
    let owner = status.owner().unwrap().expect("uid resolves");
    assert_eq!(owner.uid(), status.uid());
}
