use std::fs;
use std::io::{IoSlice, IoSliceMut, Read, Seek, SeekFrom, Write};
use std::os::unix::io::AsRawFd;

use poskit::{AccessMode, Family, Fd, FileFlags, Kind, MsgFlags, SignalOwner, Socket};

#[test]
fn nonblocking_toggle() {
    let (a, _b) = Socket::pair(Family::Unix, Kind::Stream, 0).unwrap();
    assert!(!a.status_flags().unwrap().contains(FileFlags::NONBLOCK));

    a.set_nonblocking(true).unwrap();
    assert!(a.status_flags().unwrap().contains(FileFlags::NONBLOCK));

    a.set_nonblocking(false).unwrap();
    assert!(!a.status_flags().unwrap().contains(FileFlags::NONBLOCK));
}

#[test]
fn access_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data");
    fs::write(&path, b"x").unwrap();

    let read_only = fs::File::open(&path).unwrap();
    assert_eq!(read_only.access_mode().unwrap(), AccessMode::ReadOnly);

    let write_only = fs::OpenOptions::new().write(true).open(&path).unwrap();
    assert_eq!(write_only.access_mode().unwrap(), AccessMode::WriteOnly);

    let both = fs::OpenOptions::new().read(true).write(true).open(&path).unwrap();
    assert_eq!(both.access_mode().unwrap(), AccessMode::ReadWrite);
}

#[test]
fn positioned_io_leaves_cursor() {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b"0123456789").unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    let mut buf = [0u8; 4];
    let n = file.read_at(&mut buf, 4).unwrap();
    assert_eq!(n, 4);
    assert_eq!(&buf, b"4567");

    file.write_at(b"XY", 2).unwrap();

    // The file cursor was never moved by pread/pwrite.
    let mut all = String::new();
    file.read_to_string(&mut all).unwrap();
    assert_eq!(all, "01XY456789");
}

#[test]
fn vectored_io_over_socketpair() {
    let (a, b) = Socket::pair(Family::Unix, Kind::Stream, 0).unwrap();

    let n = a
        .write_vectored(&[IoSlice::new(b"hello "), IoSlice::new(b"world")])
        .unwrap();
    assert_eq!(n, 11);

    let mut head = [0u8; 6];
    let mut tail = [0u8; 5];
    let n = b
        .read_vectored(&mut [IoSliceMut::new(&mut head), IoSliceMut::new(&mut tail)])
        .unwrap();
    assert_eq!(n, 11);
    assert_eq!(&head, b"hello ");
    assert_eq!(&tail, b"world");
}

#[test]
fn bytes_readable() {
    let (a, b) = Socket::pair(Family::Unix, Kind::Stream, 0).unwrap();
    assert_eq!(b.bytes_readable().unwrap(), 0);

    a.send(b"pending", MsgFlags::empty()).unwrap();
    assert_eq!(b.bytes_readable().unwrap(), 7);

    let mut buf = [0u8; 7];
    b.recv(&mut buf, MsgFlags::empty()).unwrap();
    assert_eq!(b.bytes_readable().unwrap(), 0);
}

#[test]
fn append_flag_visible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .unwrap();
    assert!(file.status_flags().unwrap().contains(FileFlags::APPEND));
}

#[test]
fn signal_owner_defaults_to_no_process() {
    let (a, _b) = Socket::pair(Family::Unix, Kind::Stream, 0).unwrap();
    // No owner has been set, so F_GETOWN reports process 0.
    assert_eq!(a.signal_owner().unwrap(), SignalOwner::Process(0));
}

#[test]
fn raw_fd_passthrough() {
    let (a, _b) = Socket::pair(Family::Unix, Kind::Stream, 0).unwrap();
    // The trait is blanket-implemented for anything AsRawFd.
    assert!(a.as_raw_fd() >= 0);
}
