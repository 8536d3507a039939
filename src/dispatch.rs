//! Fire-and-forget command delivery with bounded retries.

use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use log::{debug, warn};

use crate::address::DeviceAddress;
use crate::errors::Error;
use crate::payload::Payload;
use crate::runtime::{self, DatagramSocket, UdpSocket};

type Result<T> = std::result::Result<T, Error>;

/// Delivers one encoded datagram to one endpoint, exactly once per call.
///
/// The [`Dispatcher`] owns retrying; a transport only reports whether a
/// single attempt wrote the whole datagram.
pub trait Transport: Send + Sync {
    fn send_datagram(
        &self,
        target: SocketAddr,
        datagram: &[u8],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Real UDP transport: a fresh socket per attempt, no reply awaited.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpTransport;

impl UdpTransport {
    /// Per-attempt deadline for the write to complete.
    pub const WRITE_DEADLINE: Duration = Duration::from_secs(2);
}

impl Transport for UdpTransport {
    async fn send_datagram(&self, target: SocketAddr, datagram: &[u8]) -> Result<()> {
        let local = match target {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| Error::socket("bind", e))?;

        socket
            .connect(target)
            .await
            .map_err(|e| Error::socket("connect", e))?;

        let written = runtime::timeout(Self::WRITE_DEADLINE, socket.send(datagram))
            .await
            .map_err(|_| {
                Error::socket(
                    "send",
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "write deadline exceeded"),
                )
            })?
            .map_err(|e| Error::socket("send", e))?;

        if written != datagram.len() {
            return Err(Error::socket(
                "send",
                std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    format!("short write: {written} of {} bytes", datagram.len()),
                ),
            ));
        }
        Ok(())
    }
}

/// Sends commands to devices, retrying transient failures.
///
/// Up to [`Dispatcher::MAX_ATTEMPTS`] attempts are made. After failed attempt
/// `n` the dispatcher waits `n * BACKOFF_STEP` before trying again, so a
/// total failure waits 100ms and then 200ms. Nothing is awaited from the
/// device: success means the datagram left this host.
///
/// # Examples
///
/// ```no_run
/// use lumina::{DeviceAddress, Dispatcher, Payload, PowerMode};
///
/// # async fn run() -> Result<(), lumina::Error> {
/// let bulb = DeviceAddress::parse("192.168.1.20", "38899")?;
/// Dispatcher::new()
///     .send(&bulb, &Payload::set_state(PowerMode::On))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dispatcher<T = UdpTransport> {
    transport: T,
}

impl Dispatcher<UdpTransport> {
    pub fn new() -> Self {
        Dispatcher {
            transport: UdpTransport,
        }
    }
}

impl<T: Transport> Dispatcher<T> {
    pub const MAX_ATTEMPTS: u32 = 3;
    pub const BACKOFF_STEP: Duration = Duration::from_millis(100);

    /// Use a custom transport.
    pub fn with_transport(transport: T) -> Self {
        Dispatcher { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Validate a textual host and port, then [`send`](Self::send).
    ///
    /// An invalid address fails with [`Error::InvalidAddress`] before any
    /// socket is opened.
    pub async fn send_to(&self, host: &str, port: &str, payload: &Payload) -> Result<()> {
        let address = DeviceAddress::parse(host, port)?;
        self.send(&address, payload).await
    }

    /// Deliver `payload` to `address`.
    ///
    /// Encoding failures are returned immediately. Transport failures are
    /// retried; once attempts are exhausted the most recent failure is
    /// returned inside [`Error::DispatchFailed`].
    pub async fn send(&self, address: &DeviceAddress, payload: &Payload) -> Result<()> {
        let datagram = payload.to_bytes()?;
        let target = address.socket_addr();

        let mut attempt = 1;
        loop {
            match self.transport.send_datagram(target, &datagram).await {
                Ok(()) => {
                    debug!(
                        "sent {} to {} (attempt {})",
                        payload.method(),
                        address,
                        attempt
                    );
                    return Ok(());
                }
                Err(e) if attempt >= Self::MAX_ATTEMPTS => {
                    warn!("giving up on {} to {}: {}", payload.method(), address, e);
                    return Err(Error::DispatchFailed {
                        address: address.to_string(),
                        attempts: attempt,
                        last_error: Box::new(e),
                    });
                }
                Err(e) => {
                    debug!(
                        "attempt {}/{} to {} failed: {}",
                        attempt,
                        Self::MAX_ATTEMPTS,
                        address,
                        e
                    );
                    runtime::sleep(Self::BACKOFF_STEP * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Transports that stand in for the network in tests.

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records every datagram instead of sending it.
    #[derive(Debug, Clone, Default)]
    pub struct CaptureTransport {
        sent: Arc<Mutex<Vec<(SocketAddr, Vec<u8>)>>>,
    }

    impl CaptureTransport {
        pub fn sent(&self) -> Vec<(SocketAddr, Vec<u8>)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn sent_json(&self) -> Vec<serde_json::Value> {
            self.sent()
                .iter()
                .map(|(_, bytes)| serde_json::from_slice(bytes).unwrap())
                .collect()
        }
    }

    impl Transport for CaptureTransport {
        async fn send_datagram(&self, target: SocketAddr, datagram: &[u8]) -> Result<()> {
            self.sent.lock().unwrap().push((target, datagram.to_vec()));
            Ok(())
        }
    }

    /// Fails the first `failures` attempts, then succeeds.
    #[derive(Debug, Clone, Default)]
    pub struct FlakyTransport {
        pub failures: u32,
        pub attempts: Arc<AtomicU32>,
    }

    impl FlakyTransport {
        pub fn failing(failures: u32) -> Self {
            FlakyTransport {
                failures,
                attempts: Arc::new(AtomicU32::new(0)),
            }
        }

        pub fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl Transport for FlakyTransport {
        async fn send_datagram(&self, _target: SocketAddr, _datagram: &[u8]) -> Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failures {
                Err(Error::socket(
                    "connect",
                    std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        format!("refused on attempt {attempt}"),
                    ),
                ))
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::runtime::Instant;
    use crate::types::PowerMode;

    fn loopback(port: u16) -> DeviceAddress {
        DeviceAddress::parse("127.0.0.1", &port.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_exhausts_attempts_with_backoff() {
        let transport = FlakyTransport::failing(u32::MAX);
        let dispatcher = Dispatcher::with_transport(transport.clone());

        let start = Instant::now();
        let err = dispatcher
            .send(&loopback(38899), &Payload::set_state(PowerMode::On))
            .await
            .unwrap_err();
        let elapsed = start.elapsed();

        assert_eq!(transport.attempts(), 3);
        assert!(elapsed >= Duration::from_millis(300), "waited {elapsed:?}");
        match err {
            Error::DispatchFailed {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.to_string().contains("attempt 3"), "{last_error}");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let transport = FlakyTransport::failing(2);
        let dispatcher = Dispatcher::with_transport(transport.clone());

        dispatcher
            .send(&loopback(38899), &Payload::set_state(PowerMode::Off))
            .await
            .unwrap();
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn test_first_success_sends_once() {
        let transport = CaptureTransport::default();
        let dispatcher = Dispatcher::with_transport(transport.clone());
        let addr = loopback(4000);

        dispatcher
            .send(&addr, &Payload::set_state(PowerMode::On))
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, addr.socket_addr());
        assert_eq!(sent[0].1, br#"{"method":"setState","params":{"state":true}}"#);
    }

    #[tokio::test]
    async fn test_invalid_address_never_touches_network() {
        let transport = FlakyTransport::failing(0);
        let dispatcher = Dispatcher::with_transport(transport.clone());

        for (host, port) in [("", "38899"), ("10.0.0.7", "65536"), ("lamp", "38899")] {
            let err = dispatcher
                .send_to(host, port, &Payload::set_state(PowerMode::On))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidAddress { .. }), "{err}");
        }
        assert_eq!(transport.attempts(), 0);

        dispatcher
            .send_to("10.0.0.7", "38899", &Payload::set_state(PowerMode::On))
            .await
            .unwrap();
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_udp_transport_delivers_datagram() {
        let listener = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = loopback(listener.local_addr().unwrap().port());

        Dispatcher::new()
            .send(&addr, &Payload::set_state(PowerMode::Off))
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        let (n, _) = runtime::timeout(Duration::from_secs(2), listener.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], br#"{"method":"setState","params":{"state":false}}"#);
    }
}
