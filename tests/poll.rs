use std::os::unix::io::AsRawFd;
use std::thread;
use std::time::Duration;

use poskit::{Event, Family, Kind, MsgFlags, Poller, Socket, Trigger};

#[test]
fn readable_event_carries_key() {
    let poller = Poller::new().unwrap();
    let (a, b) = Socket::pair(Family::Unix, Kind::Stream, 0).unwrap();

    poller.insert(b.as_raw_fd()).unwrap();
    poller.interest(b.as_raw_fd(), 7, true, false).unwrap();

    a.send(b"wake", MsgFlags::empty()).unwrap();

    let mut events: Vec<Event> = Vec::new();
    let n = poller
        .wait(&mut events, Some(Duration::from_secs(5)))
        .unwrap();
    assert_eq!(n, 1);
    assert_eq!(events[0].key, 7);
    assert!(events[0].readable);
    assert!(!events[0].writable);

    poller.remove(b.as_raw_fd()).unwrap();
}

#[test]
fn oneshot_until_rearmed() {
    let poller = Poller::new().unwrap();
    let (a, b) = Socket::pair(Family::Unix, Kind::Stream, 0).unwrap();

    poller.insert(b.as_raw_fd()).unwrap();
    poller.interest(b.as_raw_fd(), 1, true, false).unwrap();
    a.send(b"x", MsgFlags::empty()).unwrap();

    let mut events = Vec::new();
    poller
        .wait(&mut events, Some(Duration::from_secs(5)))
        .unwrap();
    assert_eq!(events.len(), 1);

    // Still readable, but the registration fired once and is disarmed.
    events.clear();
    let n = poller
        .wait(&mut events, Some(Duration::from_millis(100)))
        .unwrap();
    assert_eq!(n, 0);

    // Re-arming reports it again.
    poller.interest(b.as_raw_fd(), 1, true, false).unwrap();
    let n = poller
        .wait(&mut events, Some(Duration::from_secs(5)))
        .unwrap();
    assert_eq!(n, 1);
}

#[test]
fn writable_event() {
    let poller = Poller::new().unwrap();
    let (_a, b) = Socket::pair(Family::Unix, Kind::Stream, 0).unwrap();

    poller.insert(b.as_raw_fd()).unwrap();
    poller.interest(b.as_raw_fd(), 3, false, true).unwrap();

    let mut events = Vec::new();
    poller
        .wait(&mut events, Some(Duration::from_secs(5)))
        .unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].writable);
}

#[test]
fn reserved_key_rejected() {
    let poller = Poller::new().unwrap();
    let (_a, b) = Socket::pair(Family::Unix, Kind::Stream, 0).unwrap();
    poller.insert(b.as_raw_fd()).unwrap();

    let err = poller
        .interest(b.as_raw_fd(), usize::MAX, true, false)
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}

#[test]
fn notify_wakes_wait() {
    let poller = std::sync::Arc::new(Poller::new().unwrap());

    let waker = poller.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        waker.notify().unwrap();
    });

    let mut events = Vec::new();
    let n = poller
        .wait(&mut events, Some(Duration::from_secs(10)))
        .unwrap();
    // The wakeup itself is not reported as an event.
    assert_eq!(n, 0);
    handle.join().unwrap();
}

#[test]
fn wait_times_out() {
    let poller = Poller::new().unwrap();
    let mut events = Vec::new();
    let start = std::time::Instant::now();
    let n = poller
        .wait(&mut events, Some(Duration::from_millis(80)))
        .unwrap();
    assert_eq!(n, 0);
    assert!(start.elapsed() >= Duration::from_millis(70));
}

#[test]
fn trigger_wakes_across_threads() {
    let trigger = std::sync::Arc::new(Trigger::new().unwrap());

    let firer = trigger.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        firer.toggle().unwrap();
    });

    trigger.wait().unwrap();
    handle.join().unwrap();
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod epoll {
    use super::*;
    use poskit::poll::epoll::{Epoll, EpollFlags, Events};

    #[test]
    fn typed_surface() {
        let epoll = Epoll::new().unwrap();
        let (a, b) = Socket::pair(Family::Unix, Kind::Stream, 0).unwrap();

        epoll.add(b.as_raw_fd(), 42, EpollFlags::IN).unwrap();
        a.send(b"x", MsgFlags::empty()).unwrap();

        let mut events = Events::with_capacity(8);
        let n = epoll
            .wait(&mut events, Some(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(n, 1);

        let (key, flags) = events.iter().next().unwrap();
        assert_eq!(key, 42);
        assert!(flags.contains(EpollFlags::IN));

        epoll.delete(b.as_raw_fd()).unwrap();
    }
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly",
))]
mod kqueue {
    use super::*;
    use poskit::poll::kqueue::{EventFlags, Events, Filter, KQueue, Kevent};

    #[test]
    fn typed_surface() {
        let kq = KQueue::new().unwrap();
        let (a, b) = Socket::pair(Family::Unix, Kind::Stream, 0).unwrap();

        kq.push(&[
            Kevent::new(b.as_raw_fd() as usize, Filter::Read, EventFlags::ADD).udata(42),
        ])
        .unwrap();
        a.send(b"x", MsgFlags::empty()).unwrap();

        let mut events = Events::with_capacity(8);
        let n = kq.poll(&mut events, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(n, 1);

        let ev = events.iter().next().unwrap();
        assert_eq!(ev.key(), 42);
        assert_eq!(ev.filter(), Some(Filter::Read));
    }
}
