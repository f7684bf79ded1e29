use poskit::{interfaces, sys, Family};

#[test]
fn basic_limits_present() {
    assert!(sys::page_size().unwrap() >= 4096);
    assert!(sys::cpus_online().unwrap() >= 1);
    assert!(sys::cpus_configured().unwrap() >= sys::cpus_online().unwrap());
    assert!(sys::clock_ticks().unwrap() > 0);
    assert!(sys::max_open_files().unwrap() > 0);
    assert!(sys::max_path() > 0);
}

#[test]
fn physical_memory_nonzero() {
    let pages = sys::physical_pages().unwrap();
    let page = sys::page_size().unwrap();
    assert!(pages.checked_mul(page).unwrap() > 0);
}

#[test]
fn interfaces_enumerate() {
    let list = interfaces().unwrap();
    assert!(!list.is_empty());
    for iface in &list {
        assert!(!iface.name().is_empty());
    }
}

#[test]
fn loopback_interface() {
    // Every POSIX host has a loopback; find its IPv4 record if present.
    let list = interfaces().unwrap();
    let lo = list.iter().find(|i| i.is_loopback());
    let lo = match lo {
        Some(lo) => lo,
        None => return,
    };
    assert!(lo.is_up());
    assert!(!lo.is_point_to_point());
    if let Some(addr) = lo.address() {
        if addr.family() == Family::Inet {
            assert!(addr.is_loopback());
        }
    }
}

#[test]
fn broadcast_requires_flag() {
    for iface in interfaces().unwrap() {
        if iface.broadcast().is_some() {
            assert!(iface.supports_broadcast());
        }
        if iface.destination().is_some() {
            assert!(iface.is_point_to_point());
        }
    }
}
