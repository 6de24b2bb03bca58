use std::net::SocketAddr;

use ntpdial::adapters::resolver::NTP_PORT;
use ntpdial::{Dial, Network, ProbeError, UdpDialer};

#[tokio::test]
async fn udp4_dial_without_local_address_leaves_source_to_os() {
    let dialer = UdpDialer::new(Network::Udp4);
    let endpoints = dialer.resolve("", "127.0.0.1:123").await.unwrap();
    assert_eq!(endpoints.local, None);
    assert_eq!(endpoints.bind_addr(), "0.0.0.0:0".parse::<SocketAddr>().unwrap());

    let socket = dialer.dial("", "127.0.0.1:123").await.unwrap();
    assert_eq!(
        socket.peer_addr().unwrap(),
        "127.0.0.1:123".parse::<SocketAddr>().unwrap()
    );
    assert!(socket.local_addr().unwrap().is_ipv4());
}

#[tokio::test]
async fn local_address_is_pinned_with_os_assigned_port() {
    let dialer = UdpDialer::new(Network::Udp4);
    let socket = dialer.dial("127.0.0.1", "127.0.0.1:123").await.unwrap();
    let local = socket.local_addr().unwrap();
    assert_eq!(local.ip().to_string(), "127.0.0.1");
    assert_ne!(local.port(), 0);
}

#[tokio::test]
async fn missing_port_defaults_to_ntp() {
    let dialer = UdpDialer::new(Network::Udp);
    let endpoints = dialer.resolve("", "127.0.0.1").await.unwrap();
    assert_eq!(endpoints.remote.port(), NTP_PORT);
}

#[tokio::test]
async fn udp6_resolves_only_ipv6() {
    let dialer = UdpDialer::new(Network::Udp6);
    let endpoints = dialer.resolve("::1", "[::1]:123").await.unwrap();
    assert!(endpoints.remote.is_ipv6());
    assert!(endpoints.local.unwrap().is_ipv6());
    assert_eq!(endpoints.local.unwrap().port(), 0);

    let err = dialer.dial("", "127.0.0.1:123").await.unwrap_err();
    assert!(matches!(err, ProbeError::Resolve(_)), "{err}");
}

#[tokio::test]
async fn udp4_rejects_ipv6_remote() {
    let dialer = UdpDialer::new(Network::Udp4);
    let err = dialer.dial("", "[::1]:123").await.unwrap_err();
    assert_eq!(err.kind(), "AddressResolutionError");
}

#[tokio::test]
async fn mixed_families_fail_before_any_socket() {
    let dialer = UdpDialer::new(Network::Udp);
    let err = dialer.dial("127.0.0.1", "[::1]:123").await.unwrap_err();
    assert!(err.to_string().contains("family mismatch"), "{err}");

    let err = dialer.dial("::1", "127.0.0.1:123").await.unwrap_err();
    assert!(matches!(err, ProbeError::Resolve(_)));
}

#[tokio::test]
async fn local_address_with_port_is_rejected() {
    let dialer = UdpDialer::new(Network::Udp4);
    let err = dialer.dial("127.0.0.1:5000", "127.0.0.1:123").await.unwrap_err();
    assert!(matches!(err, ProbeError::Resolve(_)));
}

#[tokio::test]
async fn unparsable_remote_port_is_a_resolution_error() {
    let dialer = UdpDialer::new(Network::Udp4);
    let err = dialer.dial("", "127.0.0.1:http").await.unwrap_err();
    assert!(matches!(err, ProbeError::Resolve(_)));
}

#[tokio::test]
async fn unassigned_local_address_is_a_transport_error() {
    let dialer = UdpDialer::new(Network::Udp4);
    // TEST-NET-1, never assigned to a local interface
    let err = dialer.dial("192.0.2.123", "127.0.0.1:123").await.unwrap_err();
    assert_eq!(err.kind(), "TransportCreationError");
}

#[tokio::test]
async fn repeated_dials_are_independent() {
    let dialer = UdpDialer::new(Network::Udp4);
    let first = dialer.dial("", "127.0.0.1:123").await.unwrap();
    let second = dialer.dial("", "127.0.0.1:123").await.unwrap();
    assert_eq!(first.peer_addr().unwrap(), second.peer_addr().unwrap());
    assert_ne!(
        first.local_addr().unwrap().port(),
        second.local_addr().unwrap().port()
    );
    assert_eq!(dialer.network(), Network::Udp4);
}

#[cfg(feature = "network-tests")]
#[tokio::test]
async fn resolves_public_hostname_under_udp4() {
    let dialer = UdpDialer::new(Network::Udp4);
    let endpoints = dialer.resolve("", "pool.ntp.org").await.unwrap();
    assert!(endpoints.remote.is_ipv4());
}
