//! Host name resolution and IP-mode address selection.

use std::io;
use std::net::{IpAddr, ToSocketAddrs};

/// Resolves host names to addresses.
pub trait HostResolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }
        let addrs = (host, 0u16).to_socket_addrs()?;
        Ok(addrs.map(|a| a.ip()).collect())
    }
}

/// Address families the proxy listens on and talks to (`zimbraIPMode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpMode {
    Both,
    Ipv4,
    Ipv6,
}

impl IpMode {
    /// Unset means `both`; any value other than `both` or `ipv4` is ipv6.
    pub fn from_attr(value: Option<&str>) -> Self {
        let value = value.unwrap_or("both");
        if value.eq_ignore_ascii_case("both") {
            IpMode::Both
        } else if value.eq_ignore_ascii_case("ipv4") {
            IpMode::Ipv4
        } else {
            IpMode::Ipv6
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IpMode::Both => "both",
            IpMode::Ipv4 => "ipv4",
            IpMode::Ipv6 => "ipv6",
        }
    }

    /// Pick the address to use for a host under this mode.
    pub fn select(&self, addrs: &[IpAddr]) -> Option<IpAddr> {
        match self {
            IpMode::Ipv4 => addrs.iter().find(|a| a.is_ipv4()).copied(),
            IpMode::Ipv6 => addrs.iter().find(|a| a.is_ipv6()).copied(),
            IpMode::Both => addrs
                .iter()
                .find(|a| a.is_ipv4())
                .or_else(|| addrs.first())
                .copied(),
        }
    }
}

/// Resolve `host` and pick one address for `mode`.
pub fn lookup_target_ip(
    resolver: &dyn HostResolver,
    mode: IpMode,
    host: &str,
) -> Result<IpAddr, String> {
    let addrs = resolver
        .resolve(host)
        .map_err(|e| format!("cannot resolve {host}: {e}"))?;
    mode.select(&addrs)
        .ok_or_else(|| format!("{host} has no {} address", mode.as_str()))
}

/// `ip:port`, or `[ip]:port` for IPv6.
pub fn format_host_port(ip: IpAddr, port: i32) -> String {
    match ip {
        IpAddr::V4(v4) => format!("{v4}:{port}"),
        IpAddr::V6(v6) => format!("[{v6}]:{port}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeResolver(HashMap<&'static str, Vec<IpAddr>>);

    impl HostResolver for FakeResolver {
        fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
            self.0
                .get(host)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "unknown host"))
        }
    }

    fn dual_stack() -> FakeResolver {
        FakeResolver(HashMap::from([(
            "mbs1",
            vec!["::1".parse().unwrap(), "10.0.0.5".parse().unwrap()],
        )]))
    }

    #[test]
    fn test_select_by_mode() {
        let r = dual_stack();
        assert_eq!(
            lookup_target_ip(&r, IpMode::Ipv4, "mbs1").unwrap(),
            "10.0.0.5".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            lookup_target_ip(&r, IpMode::Ipv6, "mbs1").unwrap(),
            "::1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            lookup_target_ip(&r, IpMode::Both, "mbs1").unwrap(),
            "10.0.0.5".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_unknown_host_is_error() {
        assert!(lookup_target_ip(&dual_stack(), IpMode::Both, "ghost").is_err());
    }

    #[test]
    fn test_format_host_port() {
        assert_eq!(format_host_port("10.0.0.5".parse().unwrap(), 11211), "10.0.0.5:11211");
        assert_eq!(format_host_port("::1".parse().unwrap(), 7072), "[::1]:7072");
    }

    #[test]
    fn test_ip_mode_from_attr() {
        assert_eq!(IpMode::from_attr(Some("BOTH")), IpMode::Both);
        assert_eq!(IpMode::from_attr(Some("ipv4")), IpMode::Ipv4);
        assert_eq!(IpMode::from_attr(Some("ipv6")), IpMode::Ipv6);
        assert_eq!(IpMode::from_attr(None), IpMode::Both);
    }

    #[test]
    fn test_system_resolver_accepts_literals() {
        let ips = SystemResolver.resolve("127.0.0.1").unwrap();
        assert_eq!(ips, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }
}
