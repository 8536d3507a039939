//! Deferred power commands (sleep timers).

use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::address::DeviceAddress;
use crate::dispatch::{Dispatcher, Transport};
use crate::errors::Error;
use crate::payload::Payload;
use crate::runtime::{self, JoinHandle};
use crate::types::PowerMode;
use crate::worker::{self, WorkerSpec};

type Result<T> = std::result::Result<T, Error>;

/// Where a deferred action waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A timer task inside the current process; lost if the process exits.
    Inline,
    /// A detached copy of the program that outlives the current process.
    Detached,
}

/// One power command to issue once, after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredAction {
    pub delay: Duration,
    pub target: DeviceAddress,
    pub power: PowerMode,
    pub mode: Mode,
}

impl DeferredAction {
    /// The sleep-timer action: switch `target` off after `delay`.
    pub fn power_off(target: DeviceAddress, delay: Duration, mode: Mode) -> Self {
        DeferredAction {
            delay,
            target,
            power: PowerMode::Off,
            mode,
        }
    }

    /// The worker invocation for this action. The delay is rounded up to
    /// whole minutes.
    pub fn worker_spec(&self) -> WorkerSpec {
        WorkerSpec {
            minutes: worker::whole_minutes(self.delay),
            address: self.target,
            power: self.power,
        }
    }
}

/// An inline timer that has not been collected yet.
///
/// Awaiting it yields the result of the single dispatch the timer performs.
pub struct PendingTimer {
    action: DeferredAction,
    handle: JoinHandle<Result<()>>,
}

impl PendingTimer {
    pub fn action(&self) -> &DeferredAction {
        &self.action
    }

    /// Whether the timer has fired and its dispatch completed.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the timer to fire and return the dispatch result.
    pub async fn wait(self) -> Result<()> {
        self.handle.await
    }
}

/// Outcome of scheduling a [`DeferredAction`].
pub enum Scheduled {
    Inline(PendingTimer),
    Detached { pid: u32 },
}

/// Runs deferred actions.
#[derive(Debug, Clone)]
pub struct Scheduler<T = crate::dispatch::UdpTransport> {
    dispatcher: Dispatcher<T>,
    worker_program: Option<PathBuf>,
}

impl<T: Transport + Clone + 'static> Scheduler<T> {
    pub fn new(dispatcher: Dispatcher<T>) -> Self {
        Scheduler {
            dispatcher,
            worker_program: None,
        }
    }

    /// Launch detached workers from `program` instead of the current executable.
    pub fn worker_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.worker_program = Some(program.into());
        self
    }

    pub fn schedule(&self, action: DeferredAction) -> Result<Scheduled> {
        match action.mode {
            Mode::Inline => Ok(Scheduled::Inline(self.start_inline(action))),
            Mode::Detached => {
                let program = match &self.worker_program {
                    Some(program) => program.clone(),
                    None => std::env::current_exe().map_err(Error::Spawn)?,
                };
                let pid = action.worker_spec().spawn_detached(&program)?;
                Ok(Scheduled::Detached { pid })
            }
        }
    }

    fn start_inline(&self, action: DeferredAction) -> PendingTimer {
        debug!(
            "inline timer: {:?} -> {} in {:?}",
            action.power, action.target, action.delay
        );
        let dispatcher = self.dispatcher.clone();
        let handle = runtime::spawn(async move {
            runtime::sleep(action.delay).await;
            dispatcher
                .send(&action.target, &Payload::set_state(action.power))
                .await
        });
        PendingTimer { action, handle }
    }
}
