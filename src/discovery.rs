//! Device discovery via UDP broadcast.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::address::DeviceAddress;
use crate::errors::Error;
use crate::payload::Payload;
use crate::runtime::{self, DatagramSocket, Instant, UdpSocket};

type Result<T> = std::result::Result<T, Error>;

/// How long [`discover`] listens for replies by default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Where the discovery query is broadcast.
pub const BROADCAST_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(
    Ipv4Addr::BROADCAST,
    DeviceAddress::DEFAULT_PORT,
));

/// A WiZ device that answered a discovery query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Where the reply came from
    pub address: DeviceAddress,
    /// Hardware identifier (MAC) reported by the device
    pub mac: String,
    /// Short label such as `WiZ-a1b2`
    pub name: String,
}

impl DiscoveredDevice {
    /// Convert this discovered device into a command target.
    pub fn into_address(self) -> DeviceAddress {
        self.address
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum DeviceKey {
    Identifier(String),
    Address(SocketAddr),
}

/// A single discovery run.
///
/// Broadcasts one `getSystemConfig` query and collects every distinct reply
/// until the window closes. The window always runs to completion; there is
/// no early exit on the first answer.
#[derive(Debug, Clone)]
pub struct Scanner {
    target: SocketAddr,
    timeout: Duration,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Scanner {
            target: BROADCAST_ADDR,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Send the query somewhere other than the subnet broadcast address.
    pub fn target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        self
    }

    /// Length of the discovery window.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the scan.
    ///
    /// Setup failures (bind, enabling broadcast, sending the query) are
    /// returned as [`Error::Socket`]. Garbage replies are skipped. The window
    /// closing is the normal way out and yields whatever was collected.
    pub async fn scan(&self) -> Result<Vec<DiscoveredDevice>> {
        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
            .await
            .map_err(|e| Error::socket("bind", e))?;

        socket
            .set_broadcast(true)
            .map_err(|e| Error::socket("set_broadcast", e))?;

        let query = Payload::get_system_config().to_bytes()?;
        socket
            .send_to(&query, self.target)
            .await
            .map_err(|e| Error::socket("send_to", e))?;

        let mut discovered: HashMap<DeviceKey, DiscoveredDevice> = HashMap::new();
        let start = Instant::now();
        let mut buffer = [0u8; 4096];

        loop {
            let remaining = self.timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }
            match runtime::timeout(remaining, socket.recv_from(&mut buffer)).await {
                Err(_) => break,
                Ok(Err(e)) => return Err(Error::Discovery(e)),
                Ok(Ok((size, from))) => match parse_reply(&buffer[..size], from) {
                    Some((key, device)) => {
                        debug!("discovered {} at {}", device.name, device.address);
                        discovered.insert(key, device);
                    }
                    None => debug!("ignoring {size} byte reply from {from}"),
                },
            }
        }

        let mut devices: Vec<_> = discovered.into_values().collect();
        devices.sort_by(|a, b| (a.address.ip(), &a.mac).cmp(&(b.address.ip(), &b.mac)));
        Ok(devices)
    }
}

/// Discover WiZ devices on the local network.
///
/// # Examples
///
/// ```no_run
/// use lumina::discovery;
///
/// # async fn run() -> Result<(), lumina::Error> {
/// let devices = discovery::discover(discovery::DEFAULT_TIMEOUT).await?;
/// for device in devices {
///     println!("{} - {}", device.name, device.address);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn discover(timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
    Scanner::new().timeout(timeout).scan().await
}

fn parse_reply(bytes: &[u8], from: SocketAddr) -> Option<(DeviceKey, DiscoveredDevice)> {
    let json: Value = serde_json::from_slice(bytes).ok()?;
    let mac = extract_mac(&json)?;
    let address = DeviceAddress::try_from(from).ok()?;

    let key = if mac.is_empty() {
        DeviceKey::Address(from)
    } else {
        DeviceKey::Identifier(mac.clone())
    };
    let device = DiscoveredDevice {
        address,
        name: display_name(&mac),
        mac,
    };
    Some((key, device))
}

fn extract_mac(json: &Value) -> Option<String> {
    json.get("result")
        .and_then(|r| r.get("mac"))
        .and_then(|m| m.as_str())
        .map(String::from)
}

fn display_name(mac: &str) -> String {
    let chars: Vec<char> = mac.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("WiZ-{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn silent_listener() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap()
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("a8bb50d46a1c"), "WiZ-6a1c");
        assert_eq!(display_name("1c"), "WiZ-1c");
        assert_eq!(display_name(""), "WiZ-");
    }

    #[test]
    fn test_parse_reply_requires_result_mac() {
        let from: SocketAddr = "10.0.0.9:38899".parse().unwrap();

        assert!(parse_reply(b"not json", from).is_none());
        assert!(parse_reply(br#"{"error":{"code":-32601}}"#, from).is_none());
        assert!(parse_reply(br#"{"result":{"mac":17}}"#, from).is_none());

        let (key, device) =
            parse_reply(br#"{"method":"getSystemConfig","result":{"mac":"a8bb50d46a1c"}}"#, from)
                .unwrap();
        assert_eq!(key, DeviceKey::Identifier("a8bb50d46a1c".into()));
        assert_eq!(device.address.to_string(), "10.0.0.9:38899");
        assert_eq!(device.name, "WiZ-6a1c");
    }

    #[test]
    fn test_empty_mac_is_keyed_by_address() {
        let from: SocketAddr = "10.0.0.9:38899".parse().unwrap();
        let (key, _) = parse_reply(br#"{"result":{"mac":""}}"#, from).unwrap();
        assert_eq!(key, DeviceKey::Address(from));
    }

    #[tokio::test]
    async fn test_no_responders_waits_for_window() {
        let listener = silent_listener().await;
        let window = Duration::from_millis(300);

        let start = Instant::now();
        let devices = Scanner::new()
            .target(listener.local_addr().unwrap())
            .timeout(window)
            .scan()
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert!(devices.is_empty());
        assert!(elapsed >= window, "returned after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "hung for {elapsed:?}");
    }

    #[tokio::test]
    async fn test_deduplicates_by_identifier() {
        let bulb = silent_listener().await;
        let target = bulb.local_addr().unwrap();

        let responder = runtime::spawn(async move {
            let mut buf = [0u8; 512];
            let (n, scanner) = bulb.recv_from(&mut buf).await.unwrap();
            let query: Value = serde_json::from_slice(&buf[..n]).unwrap();
            assert_eq!(query["method"], "getSystemConfig");

            let replies: [&[u8]; 4] = [
                br#"{"result":{"mac":"a8bb50d46a1c"}}"#,
                b"\x00\xffgarbage",
                br#"{"result":{"mac":"a8bb50d46a1c","rssi":-60}}"#,
                br#"{"result":{"mac":"d8a011223344"}}"#,
            ];
            for reply in replies {
                bulb.send_to(reply, scanner).await.unwrap();
            }
        });

        let devices = Scanner::new()
            .target(target)
            .timeout(Duration::from_millis(500))
            .scan()
            .await
            .unwrap();
        responder.await;

        let macs: Vec<_> = devices.iter().map(|d| d.mac.as_str()).collect();
        assert_eq!(macs, ["a8bb50d46a1c", "d8a011223344"]);
        assert_eq!(devices[0].name, "WiZ-6a1c");
        assert_eq!(devices[0].address.socket_addr(), target);
    }
}
