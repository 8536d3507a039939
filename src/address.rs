//! Validated device addresses.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// The UDP endpoint of a WiZ device.
///
/// A `DeviceAddress` can only be built through validation, so holding one
/// means the host is an IP literal and the port lies in `1..=65535`.
///
/// # Examples
///
/// ```
/// use lumina::DeviceAddress;
///
/// let addr = DeviceAddress::parse("192.168.1.20", "38899").unwrap();
/// assert_eq!(addr.port(), 38899);
///
/// assert!(DeviceAddress::parse("", "38899").is_err());
/// assert!(DeviceAddress::parse("192.168.1.20", "0").is_err());
/// assert!(DeviceAddress::parse("bulb.local", "38899").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SocketAddr", into = "SocketAddr")]
pub struct DeviceAddress {
    ip: IpAddr,
    port: u16,
}

impl DeviceAddress {
    /// Well-known UDP port WiZ devices listen on.
    pub const DEFAULT_PORT: u16 = 38899;

    /// Validate a host and port given as text (user input, config, CLI flags).
    pub fn parse(host: &str, port: &str) -> Result<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(Error::invalid_address(host, "IP address cannot be empty"));
        }
        let ip = IpAddr::from_str(host)
            .map_err(|_| Error::invalid_address(host, "host is not an IP address literal"))?;

        let port = port.trim();
        if port.is_empty() {
            return Err(Error::invalid_address(port, "port cannot be empty"));
        }
        // Parse wide so that 65536 is reported as out of range rather than as garbage.
        let port_num: u64 = port
            .parse()
            .map_err(|_| Error::invalid_address(port, "port must be a number"))?;
        let port = u16::try_from(port_num)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| Error::invalid_address(&port_num.to_string(), "port must be between 1 and 65535"))?;

        Ok(DeviceAddress { ip, port })
    }

    /// Build an address from an already parsed IP.
    pub fn new(ip: IpAddr, port: u16) -> Result<Self> {
        if port == 0 {
            return Err(Error::invalid_address(
                &SocketAddr::new(ip, port).to_string(),
                "port must be between 1 and 65535",
            ));
        }
        Ok(DeviceAddress { ip, port })
    }

    /// An address on the default WiZ port.
    pub fn with_default_port(ip: IpAddr) -> Self {
        DeviceAddress {
            ip,
            port: Self::DEFAULT_PORT,
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.socket_addr().fmt(f)
    }
}

impl TryFrom<SocketAddr> for DeviceAddress {
    type Error = Error;

    fn try_from(addr: SocketAddr) -> Result<Self> {
        DeviceAddress::new(addr.ip(), addr.port())
    }
}

impl From<DeviceAddress> for SocketAddr {
    fn from(addr: DeviceAddress) -> Self {
        addr.socket_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ipv4_and_ipv6() {
        let v4 = DeviceAddress::parse("10.0.0.7", "38899").unwrap();
        assert_eq!(v4.to_string(), "10.0.0.7:38899");

        let v6 = DeviceAddress::parse("::1", "1").unwrap();
        assert_eq!(v6.to_string(), "[::1]:1");
    }

    #[test]
    fn test_port_boundaries() {
        assert!(DeviceAddress::parse("10.0.0.7", "0").is_err());
        assert!(DeviceAddress::parse("10.0.0.7", "65536").is_err());
        assert_eq!(DeviceAddress::parse("10.0.0.7", "1").unwrap().port(), 1);
        assert_eq!(DeviceAddress::parse("10.0.0.7", "65535").unwrap().port(), 65535);
    }

    #[test]
    fn test_rejects_bad_input() {
        for (host, port) in [
            ("", "38899"),
            ("   ", "38899"),
            ("wiz-bulb", "38899"),
            ("300.1.1.1", "38899"),
            ("10.0.0.7", ""),
            ("10.0.0.7", "-1"),
            ("10.0.0.7", "port"),
            ("10.0.0.7", "99999999999999999999999"),
        ] {
            let err = DeviceAddress::parse(host, port).unwrap_err();
            assert!(
                matches!(err, Error::InvalidAddress { .. }),
                "{host:?}:{port:?} gave {err}"
            );
        }
    }

    #[test]
    fn test_new_rejects_port_zero() {
        let ip: IpAddr = "10.0.0.7".parse().unwrap();
        assert!(DeviceAddress::new(ip, 0).is_err());
        assert_eq!(DeviceAddress::with_default_port(ip).port(), 38899);
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let addr = DeviceAddress::parse("10.0.0.7", "38899").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"10.0.0.7:38899\"");
        assert_eq!(serde_json::from_str::<DeviceAddress>(&json).unwrap(), addr);
        assert!(serde_json::from_str::<DeviceAddress>("\"10.0.0.7:0\"").is_err());
    }
}
