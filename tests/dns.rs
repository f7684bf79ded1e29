use std::net::{IpAddr, Ipv4Addr};

use poskit::{lookup, lookup_port, Family, Kind, Lookup, LookupError, SocketAddress};

// Only numeric resolutions here; nothing leaves the host.

#[test]
fn numeric_host_and_port() {
    let options = Lookup::new().numeric_host().kind(Kind::Stream);
    let list = lookup_port("127.0.0.1", 8080, &options).unwrap();
    assert!(!list.addrs.is_empty());

    let addr = &list.addrs[0];
    assert_eq!(addr.ip(), Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    assert_eq!(addr.port(), Some(8080));
}

#[test]
fn numeric_service() {
    let options = Lookup::new().numeric_host().kind(Kind::Stream);
    let list = lookup("127.0.0.1", "443", &options).unwrap();
    assert!(list.addrs.iter().all(|a| a.port() == Some(443)));
}

#[test]
fn family_filter() {
    let options = Lookup::new()
        .numeric_host()
        .family(Family::Inet)
        .kind(Kind::Datagram);
    let list = lookup_port("127.0.0.1", 53, &options).unwrap();
    assert!(list.addrs.iter().all(|a| a.family() == Family::Inet));
}

#[test]
fn ipv6_numeric() {
    let options = Lookup::new().numeric_host().kind(Kind::Stream);
    let list = lookup_port("::1", 80, &options).unwrap();
    let addr = &list.addrs[0];
    assert_eq!(addr.family(), Family::Inet6);
    assert!(addr.is_loopback());
}

#[test]
fn non_numeric_host_rejected() {
    let options = Lookup::new().numeric_host();
    let err = lookup_port("definitely-not-an-address.invalid", 80, &options).unwrap_err();
    // AI_NUMERICHOST refusal surfaces as NotFound or InvalidName depending
    // on the resolver.
    assert!(matches!(
        err,
        LookupError::NotFound | LookupError::InvalidName | LookupError::Other(_)
    ));
}

#[test]
fn max_records_caps_the_list() {
    let options = Lookup::new().numeric_host().max_records(1);
    let list = lookup_port("127.0.0.1", 80, &options).unwrap();
    assert_eq!(list.addrs.len(), 1);
}

#[test]
fn results_are_socket_addresses() {
    let options = Lookup::new().numeric_host().kind(Kind::Stream);
    let list = lookup_port("127.0.0.1", 22, &options).unwrap();
    let expected = SocketAddress::inet(Ipv4Addr::LOCALHOST, 22);
    assert!(list.addrs.contains(&expected));
}
