//! Network identity helpers
//!
//! Finds a free listening port and the address other devices on the LAN
//! should use to reach this host.

use std::net::{IpAddr, Ipv4Addr, TcpListener};

/// Number of consecutive ports tried by [`find_available_port`]
pub const PORT_SCAN_RANGE: u16 = 100;

/// Find the first bindable port in `[start, start + PORT_SCAN_RANGE)` on all interfaces
pub fn find_available_port(start: u16) -> Option<u16> {
    find_available_port_on(IpAddr::V4(Ipv4Addr::UNSPECIFIED), start)
}

/// Find the first bindable port in `[start, start + PORT_SCAN_RANGE)` on `addr`
///
/// Each test listener is dropped immediately, so the port is only known to
/// have been free at the time of the scan. Port 0 is skipped since binding it
/// always succeeds with an ephemeral port.
pub fn find_available_port_on(addr: IpAddr, start: u16) -> Option<u16> {
    (0..PORT_SCAN_RANGE)
        .filter_map(|offset| start.checked_add(offset))
        .filter(|&port| port != 0)
        .find(|&port| TcpListener::bind((addr, port)).is_ok())
}

/// Resolve the host's LAN-facing IPv4 address
///
/// Interfaces are enumerated on every call so the answer tracks network
/// changes (Wi-Fi reconnects, DHCP renewals).
pub fn get_local_ip() -> Option<Ipv4Addr> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => first_lan_ipv4(interfaces.iter().map(|iface| iface.ip())),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to enumerate network interfaces");
            None
        }
    }
}

/// Pick the first non-loopback IPv4 address
pub fn first_lan_ipv4<I>(addrs: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = IpAddr>,
{
    addrs.into_iter().find_map(|addr| match addr {
        IpAddr::V4(v4) if !v4.is_loopback() => Some(v4),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn test_first_lan_ipv4_skips_loopback_and_v6() {
        let addrs = vec![
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::V6("fe80::1".parse().unwrap()),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 23)),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
        ];
        assert_eq!(first_lan_ipv4(addrs), Some(Ipv4Addr::new(192, 168, 1, 23)));
    }

    #[test]
    fn test_first_lan_ipv4_none() {
        let addrs = vec![
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            IpAddr::V4(Ipv4Addr::new(127, 0, 1, 1)),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
        ];
        assert_eq!(first_lan_ipv4(addrs), None);
        assert_eq!(first_lan_ipv4(Vec::new()), None);
    }

    #[test]
    fn test_find_available_port_skips_bound_port() {
        let occupied = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
        let taken = occupied.local_addr().unwrap().port();

        let port = find_available_port(taken).expect("a free port in range");
        assert_ne!(port, taken);
        assert!(port > taken);
        assert!(u32::from(port) < u32::from(taken) + u32::from(PORT_SCAN_RANGE));
    }

    #[test]
    fn test_find_available_port_result_is_bindable() {
        let port = find_available_port_on(IpAddr::V4(Ipv4Addr::LOCALHOST), 20000).unwrap();
        assert!((20000..20000 + PORT_SCAN_RANGE).contains(&port));
        // The scan listener must have been released.
        assert!(TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok());
    }

    #[test]
    fn test_find_available_port_never_returns_zero() {
        let port = find_available_port_on(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        assert_ne!(port, Some(0));
    }

    #[test]
    fn test_find_available_port_clipped_at_max() {
        // Only 65535 itself is in range; the scan must not wrap around.
        if let Some(port) = find_available_port_on(IpAddr::V4(Ipv4Addr::LOCALHOST), u16::MAX) {
            assert_eq!(port, u16::MAX);
        }
    }
}
