use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::lookup_host;

use crate::domain::ntp::Network;
use crate::error::ProbeError;

/// Port used when a remote address does not carry one.
pub const NTP_PORT: u16 = 123;

/// Local and remote socket addresses of one dial attempt, same IP family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    /// `None` leaves the choice of local address to the OS.
    pub local: Option<SocketAddr>,
    pub remote: SocketAddr,
}

impl Endpoints {
    /// Address the transport binds to. The port is always OS-assigned.
    pub fn bind_addr(&self) -> SocketAddr {
        self.local.unwrap_or_else(|| match self.remote.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        })
    }
}

/// Split an address into host and port text.
///
/// A bracketed host (`[2001:db8::1]:123`) or a bare IPv6 literal keeps its
/// colons; otherwise the last colon separates the port.
fn split_host_port(addr: &str) -> Result<(&str, Option<&str>), ProbeError> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(ProbeError::Resolve("empty address".into()));
    }

    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| ProbeError::Resolve(format!("missing ']' in '{addr}'")))?;
        match tail {
            "" => (host, None),
            _ => match tail.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None => {
                    return Err(ProbeError::Resolve(format!(
                        "unexpected '{tail}' after ']' in '{addr}'"
                    )));
                }
            },
        }
    } else if addr.parse::<Ipv6Addr>().is_ok() {
        (addr, None)
    } else {
        match addr.rsplit_once(':') {
            None => (addr, None),
            Some((host, _)) if host.contains(':') => {
                return Err(ProbeError::Resolve(format!(
                    "IPv6 address with a port must be bracketed: '{addr}'"
                )));
            }
            Some((host, port)) => (host, Some(port)),
        }
    };

    if host.is_empty() {
        return Err(ProbeError::Resolve(format!("missing host in '{addr}'")));
    }
    Ok((host, port))
}

/// Port of a remote address, 123 when absent. Port 0 cannot be queried.
fn remote_port(addr: &str, port: Option<&str>) -> Result<u16, ProbeError> {
    match port {
        None => Ok(NTP_PORT),
        Some(text) => text
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ProbeError::Resolve(format!("invalid port '{text}' in '{addr}'"))),
    }
}

/// Keep the addresses `network` allows. `udp` orders IPv4 before IPv6.
pub fn filter_family(network: Network, addrs: impl IntoIterator<Item = SocketAddr>) -> Vec<SocketAddr> {
    let (v4, v6): (Vec<_>, Vec<_>) = addrs.into_iter().partition(|a| a.is_ipv4());
    match network {
        Network::Udp4 => v4,
        Network::Udp6 => v6,
        Network::Udp => v4.into_iter().chain(v6).collect(),
    }
}

/// Resolve `host` and keep only the addresses of the configured family.
pub async fn lookup(network: Network, host: &str, port: u16) -> Result<Vec<SocketAddr>, ProbeError> {
    let addrs = lookup_host((host, port))
        .await
        .map_err(|e| ProbeError::Resolve(format!("DNS resolution failed for '{host}': {e}")))?;

    let filtered = filter_family(network, addrs);
    if filtered.is_empty() {
        return Err(match network {
            Network::Udp4 => ProbeError::Resolve(format!("No IPv4 address found for '{host}'")),
            Network::Udp6 => ProbeError::Resolve(format!("No IPv6 address found for '{host}'")),
            Network::Udp => ProbeError::Resolve(format!("No IP address found for '{host}'")),
        });
    }
    Ok(filtered)
}

/// Resolve both ends of a dial under one network family.
///
/// An empty `local` leaves the local side unresolved. When both sides are
/// given, the first local/remote pair sharing an IP family wins; no such pair
/// is a resolution error.
pub async fn resolve_endpoints(
    network: Network,
    local: &str,
    remote: &str,
) -> Result<Endpoints, ProbeError> {
    let (remote_host, port) = split_host_port(remote)?;
    let remotes = lookup(network, remote_host, remote_port(remote, port)?).await?;

    if local.trim().is_empty() {
        return Ok(Endpoints {
            local: None,
            remote: remotes[0],
        });
    }

    let (local_host, local_port) = split_host_port(local)?;
    if local_port.is_some() {
        return Err(ProbeError::Resolve(format!(
            "local address '{local}' must not carry a port"
        )));
    }
    let locals = lookup(network, local_host, 0).await?;

    locals
        .iter()
        .find_map(|l| {
            remotes
                .iter()
                .find(|r| r.is_ipv4() == l.is_ipv4())
                .map(|r| Endpoints {
                    local: Some(*l),
                    remote: *r,
                })
        })
        .ok_or_else(|| {
            ProbeError::Resolve(format!(
                "address family mismatch between local '{local}' and remote '{remote}'"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_names_and_ipv4_literals() {
        assert_eq!(
            split_host_port("pool.ntp.org:4123").unwrap(),
            ("pool.ntp.org", Some("4123"))
        );
        assert_eq!(split_host_port(" 192.0.2.1 ").unwrap(), ("192.0.2.1", None));
    }

    #[test]
    fn ipv6_keeps_its_colons() {
        assert_eq!(
            split_host_port("[2001:db8::1]:4123").unwrap(),
            ("2001:db8::1", Some("4123"))
        );
        assert_eq!(split_host_port("[::1]").unwrap(), ("::1", None));
        assert_eq!(split_host_port("2001:db8::1").unwrap(), ("2001:db8::1", None));
        assert!(split_host_port("2001:db8::zz:123").is_err());
    }

    #[test]
    fn malformed_addresses_are_resolution_errors() {
        for addr in ["", ":123", "[::1", "[::1]x", "[]:123"] {
            let err = split_host_port(addr).unwrap_err();
            assert_eq!(err.kind(), "AddressResolutionError", "addr {addr:?}");
        }
    }

    #[test]
    fn remote_port_defaults_and_range() {
        assert_eq!(remote_port("h", None).unwrap(), NTP_PORT);
        assert_eq!(remote_port("h:1123", Some("1123")).unwrap(), 1123);
        for bad in ["0", "99999", "abc", ""] {
            assert!(matches!(
                remote_port("h", Some(bad)),
                Err(ProbeError::Resolve(_))
            ));
        }
    }

    #[test]
    fn filter_family_orders_v4_first_for_udp() {
        let v6: SocketAddr = "[::1]:123".parse().unwrap();
        let v4: SocketAddr = "127.0.0.1:123".parse().unwrap();
        assert_eq!(filter_family(Network::Udp, [v6, v4]), vec![v4, v6]);
        assert_eq!(filter_family(Network::Udp4, [v6, v4]), vec![v4]);
        assert_eq!(filter_family(Network::Udp6, [v6, v4]), vec![v6]);
    }

    #[test]
    fn bind_addr_matches_remote_family() {
        let e = Endpoints {
            local: None,
            remote: "[::1]:123".parse().unwrap(),
        };
        assert_eq!(e.bind_addr(), "[::]:0".parse::<SocketAddr>().unwrap());
        let e = Endpoints {
            local: None,
            remote: "127.0.0.1:123".parse().unwrap(),
        };
        assert_eq!(e.bind_addr(), "0.0.0.0:0".parse::<SocketAddr>().unwrap());
    }
}
