use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::Path;

use poskit::{Family, SocketAddress};

#[test]
fn inet_roundtrip() {
    let addr = SocketAddress::inet(Ipv4Addr::new(127, 0, 0, 1), 8080);
    assert_eq!(addr.family(), Family::Inet);
    assert_eq!(addr.port(), Some(8080));
    assert_eq!(addr.ip(), Some(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))));
    assert!(addr.is_loopback());
    assert!(!addr.is_unspecified());
    assert_eq!(
        addr.to_socket_addr(),
        Some("127.0.0.1:8080".parse::<SocketAddr>().unwrap())
    );
}

#[test]
fn inet6_roundtrip() {
    let ip = Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1);
    let addr = SocketAddress::inet6(ip, 443);
    assert_eq!(addr.family(), Family::Inet6);
    assert_eq!(addr.port(), Some(443));
    assert_eq!(addr.ip(), Some(IpAddr::V6(ip)));
    assert!(addr.is_loopback());
}

#[test]
fn new_dispatches_on_ip_kind() {
    let v4 = SocketAddress::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);
    assert_eq!(v4.family(), Family::Inet);
    assert!(v4.is_unspecified());

    let v6 = SocketAddress::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0);
    assert_eq!(v6.family(), Family::Inet6);
    assert!(v6.is_unspecified());
}

#[test]
fn set_port() {
    let mut addr = SocketAddress::inet(Ipv4Addr::LOCALHOST, 80);
    addr.set_port(8081);
    assert_eq!(addr.port(), Some(8081));
}

#[test]
fn unix_path_roundtrip() {
    let addr = SocketAddress::unix("/tmp/poskit.sock").unwrap();
    assert_eq!(addr.family(), Family::Unix);
    assert_eq!(addr.path().as_deref(), Some(Path::new("/tmp/poskit.sock")));
    assert_eq!(addr.port(), None);
    assert_eq!(addr.ip(), None);
    // socklen covers the family field plus the path bytes.
    assert!(addr.socklen() as usize > "/tmp/poskit.sock".len());
}

#[test]
fn unix_path_too_long() {
    let long = "/tmp/".to_string() + &"x".repeat(200);
    assert!(SocketAddress::unix(&long).is_err());
}

#[test]
fn equality_ignores_padding() {
    let a = SocketAddress::inet(Ipv4Addr::new(10, 0, 0, 1), 53);
    let b = SocketAddress::inet(Ipv4Addr::new(10, 0, 0, 1), 53);
    let c = SocketAddress::inet(Ipv4Addr::new(10, 0, 0, 2), 53);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, SocketAddress::unix("/tmp/a").unwrap());
}

#[test]
fn from_std_socket_addr() {
    let std_addr: SocketAddr = "192.168.1.7:9000".parse().unwrap();
    let addr = SocketAddress::from(std_addr);
    assert_eq!(addr.to_socket_addr(), Some(std_addr));
}

#[test]
fn same_subnet_v4() {
    let a = SocketAddress::inet(Ipv4Addr::new(192, 168, 1, 10), 0);
    let b = SocketAddress::inet(Ipv4Addr::new(192, 168, 1, 200), 0);
    let c = SocketAddress::inet(Ipv4Addr::new(192, 168, 2, 10), 0);
    assert!(a.same_subnet(&b, 24));
    assert!(!a.same_subnet(&c, 24));
    assert!(a.same_subnet(&c, 16));
    // A zero-length prefix matches everything in the family.
    assert!(a.same_subnet(&c, 0));
}

#[test]
fn same_subnet_v6() {
    let a = SocketAddress::inet6("2001:db8::1".parse().unwrap(), 0);
    let b = SocketAddress::inet6("2001:db8::ffff".parse().unwrap(), 0);
    let c = SocketAddress::inet6("2001:db9::1".parse().unwrap(), 0);
    assert!(a.same_subnet(&b, 64));
    assert!(!a.same_subnet(&c, 32));
}

#[test]
fn same_subnet_mixed_families() {
    let v4 = SocketAddress::inet(Ipv4Addr::LOCALHOST, 0);
    let v6 = SocketAddress::inet6(Ipv6Addr::LOCALHOST, 0);
    assert!(!v4.same_subnet(&v6, 8));
}

#[test]
fn sock_addr_interop() {
    let addr = SocketAddress::inet(Ipv4Addr::new(127, 0, 0, 1), 8080);
    let sock_addr = addr.to_sock_addr().unwrap();
    assert_eq!(sock_addr.as_socket(), addr.to_socket_addr());
    assert_eq!(SocketAddress::from(&sock_addr), addr);
}

#[test]
fn display() {
    let addr = SocketAddress::inet(Ipv4Addr::new(127, 0, 0, 1), 8080);
    assert_eq!(addr.to_string(), "inet 127.0.0.1:8080");
    let unix = SocketAddress::unix("/run/app.sock").unwrap();
    assert_eq!(unix.to_string(), "unix /run/app.sock");
}
