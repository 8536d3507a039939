//! Async runtime seam.
//!
//! The rest of the crate only talks to sockets, timers and tasks through this
//! module, so the dispatcher, the discovery scanner and the inline sleep timer
//! never name tokio directly. [`DatagramSocket`] is the socket abstraction;
//! [`sleep`], [`timeout`] and [`spawn`] cover timers and background tasks.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

mod tokio_impl;

pub use tokio_impl::*;

/// Trait for async UDP socket operations.
///
/// Every dispatch and discovery call binds its own socket through this trait
/// and drops it when done; nothing is pooled.
pub trait DatagramSocket: Send + Sync + Sized {
    /// Bind to the specified local address.
    fn bind(addr: SocketAddr) -> impl Future<Output = io::Result<Self>> + Send;

    /// Fix the remote peer for [`DatagramSocket::send`].
    fn connect(&self, addr: SocketAddr) -> impl Future<Output = io::Result<()>> + Send;

    /// Send one datagram to the connected peer.
    fn send(&self, buf: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Send one datagram to a specific address.
    fn send_to(&self, buf: &[u8], addr: SocketAddr)
    -> impl Future<Output = io::Result<usize>> + Send;

    /// Receive one datagram and its source address.
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    /// Enable or disable broadcast mode.
    fn set_broadcast(&self, broadcast: bool) -> io::Result<()>;
}

/// Sleep for the specified duration.
pub async fn sleep(duration: Duration) {
    sleep_impl(duration).await
}

/// Run a future with a timeout.
///
/// Returns `Err(TimedOut)` if the timeout expires before the future completes.
pub async fn timeout<F, T>(duration: Duration, future: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    timeout_impl(duration, future).await
}

/// Error returned when a timeout expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut;

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation timed out")
    }
}

impl std::error::Error for TimedOut {}

/// A measurement of monotonically increasing time.
#[derive(Debug, Clone, Copy)]
pub struct Instant(InstantInner);

impl Instant {
    /// Returns the current instant.
    pub fn now() -> Self {
        Instant(InstantInner::now())
    }

    /// Returns the duration elapsed since this instant was created.
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}
