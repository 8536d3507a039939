//! The command surface used by interactive front-ends.

use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};

use crate::address::DeviceAddress;
use crate::discovery::{self, DiscoveredDevice};
use crate::dispatch::{Dispatcher, Transport, UdpTransport};
use crate::errors::Error;
use crate::payload::Payload;
use crate::scheduler::{DeferredAction, Mode, PendingTimer, Scheduled, Scheduler};
use crate::types::{Brightness, Color, PowerMode};

type Result<T> = std::result::Result<T, Error>;

/// Issues commands on behalf of one interactive session.
///
/// A session may have at most one inline sleep timer pending at a time.
/// There is no way to cancel it; it is cleared once it has fired.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use lumina::{Brightness, Color, Controller, DeviceAddress};
///
/// # async fn run() -> Result<(), lumina::Error> {
/// let bulb = DeviceAddress::parse("192.168.1.20", "38899")?;
/// let mut controller = Controller::new();
///
/// controller.set_power(&bulb, true).await?;
/// controller
///     .set_color(&bulb, &Color::from_hex("#006994")?, &Brightness::new())
///     .await?;
/// controller.schedule_off(&bulb, Duration::from_secs(15 * 60), true)?;
/// # Ok(())
/// # }
/// ```
pub struct Controller<T = UdpTransport> {
    dispatcher: Dispatcher<T>,
    scheduler: Scheduler<T>,
    pending: Option<PendingTimer>,
}

impl Default for Controller<UdpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller<UdpTransport> {
    pub fn new() -> Self {
        Self::with_dispatcher(Dispatcher::new())
    }
}

impl<T: Transport + Clone + 'static> Controller<T> {
    pub fn with_dispatcher(dispatcher: Dispatcher<T>) -> Self {
        Controller {
            scheduler: Scheduler::new(dispatcher.clone()),
            dispatcher,
            pending: None,
        }
    }

    /// Launch detached timers from `program` instead of the current executable.
    pub fn worker_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.scheduler = self.scheduler.worker_program(program);
        self
    }

    pub async fn set_power(&self, address: &DeviceAddress, on: bool) -> Result<()> {
        self.send(address, Payload::set_state(PowerMode::from(on)))
            .await
    }

    pub async fn set_color(
        &self,
        address: &DeviceAddress,
        color: &Color,
        brightness: &Brightness,
    ) -> Result<()> {
        self.send(address, Payload::color(color, brightness)).await
    }

    pub async fn set_brightness(
        &self,
        address: &DeviceAddress,
        brightness: &Brightness,
    ) -> Result<()> {
        self.send(address, Payload::brightness(brightness)).await
    }

    pub async fn discover(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
        discovery::discover(timeout).await
    }

    /// Turn `address` off after `delay`.
    ///
    /// With `detached` the timer is handed to a background worker process
    /// and survives this session; the delay is rounded up to whole minutes.
    /// Otherwise an inline timer runs inside this process and fails with
    /// [`Error::TimerPending`] while another inline timer is still waiting.
    pub fn schedule_off(
        &mut self,
        address: &DeviceAddress,
        delay: Duration,
        detached: bool,
    ) -> Result<()> {
        let mode = if detached { Mode::Detached } else { Mode::Inline };
        if mode == Mode::Inline && self.timer_pending() {
            return Err(Error::TimerPending);
        }

        match self
            .scheduler
            .schedule(DeferredAction::power_off(*address, delay, mode))?
        {
            Scheduled::Inline(timer) => self.pending = Some(timer),
            Scheduled::Detached { pid } => {
                info!("sleep timer for {address} handed to worker pid {pid}")
            }
        }
        Ok(())
    }

    /// Whether an inline timer is still waiting to fire.
    pub fn timer_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// The result of the inline timer, if it has fired and was not yet collected.
    pub async fn take_finished_timer(&mut self) -> Option<Result<()>> {
        if self.timer_pending() {
            return None;
        }
        Some(self.pending.take()?.wait().await)
    }

    /// Wait for the inline timer to fire. Returns `None` if none was scheduled.
    pub async fn wait_timer(&mut self) -> Option<Result<()>> {
        Some(self.pending.take()?.wait().await)
    }

    async fn send(&self, address: &DeviceAddress, payload: Payload) -> Result<()> {
        let res = self.dispatcher.send(address, &payload).await;
        if let Err(e) = &res {
            warn!("{} to {} failed: {}", payload.method(), address, e);
        }
        res
    }
}
