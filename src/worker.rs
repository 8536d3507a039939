//! Detached sleep-timer worker.
//!
//! A timer that must outlive the interactive session is handed to a fresh,
//! backgrounded copy of the `lumina` binary. The worker's command line is the
//! whole of its state: `--timer <minutes> --ip <host> --port <port> [--off]`.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::address::DeviceAddress;
use crate::dispatch::{Dispatcher, Transport};
use crate::errors::Error;
use crate::payload::Payload;
use crate::runtime;
use crate::types::PowerMode;

type Result<T> = std::result::Result<T, Error>;

/// A fully resolved timer job: wait `minutes`, then switch `address` to `power`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSpec {
    pub minutes: u64,
    pub address: DeviceAddress,
    pub power: PowerMode,
}

impl WorkerSpec {
    /// Validate raw worker flags. A zero delay is raised to one minute.
    ///
    /// The address goes through the same checks as any dispatch target, so
    /// a bad invocation fails here, before the sleep starts.
    pub fn from_flags(minutes: u64, ip: &str, port: &str, off: bool) -> Result<Self> {
        Ok(WorkerSpec {
            minutes: minutes.max(1),
            address: DeviceAddress::parse(ip, port)?,
            power: if off { PowerMode::Off } else { PowerMode::On },
        })
    }

    /// Command-line arguments that reproduce this job in a worker process.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--timer".into(),
            self.minutes.to_string().into(),
            "--ip".into(),
            self.address.ip().to_string().into(),
            "--port".into(),
            self.address.port().to_string().into(),
        ];
        if self.power == PowerMode::Off {
            args.push("--off".into());
        }
        args
    }

    pub fn delay(&self) -> Duration {
        minutes_to_delay(self.minutes)
    }

    /// Sleep for the configured delay, then send the single power command.
    pub async fn run<T: Transport>(&self, dispatcher: &Dispatcher<T>) -> Result<()> {
        info!(
            "timer worker sleeping {}m before {:?} -> {}",
            self.minutes, self.power, self.address
        );
        runtime::sleep(self.delay()).await;
        dispatcher
            .send(&self.address, &Payload::set_state(self.power))
            .await
    }

    /// Launch `program` as a detached worker for this job.
    ///
    /// The child gets its own process group, so signals aimed at the
    /// caller's group (Ctrl-C, terminal hangup) never reach it. The caller
    /// does not wait for it; a background thread reaps it on exit so a
    /// long-lived front-end does not collect zombies. Returns the child's
    /// process id.
    pub fn spawn_detached(&self, program: &Path) -> Result<u32> {
        let mut command = Command::new(program);
        command
            .args(self.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        detach(&mut command);

        let child = command.spawn().map_err(Error::Spawn)?;
        let pid = child.id();
        info!(
            "spawned timer worker pid {} ({}m -> {})",
            pid, self.minutes, self.address
        );
        reap(child);
        Ok(pid)
    }
}

/// Convert a minute count to a delay, saturating at [`Duration`]'s range.
pub fn minutes_to_delay(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Round a delay up to whole minutes, never below one.
pub fn whole_minutes(delay: Duration) -> u64 {
    let secs = delay
        .as_secs()
        .saturating_add(u64::from(delay.subsec_nanos() > 0));
    secs.div_ceil(60).max(1)
}

fn reap(mut child: Child) {
    let pid = child.id();
    let spawned = thread::Builder::new()
        .name(format!("reap-{pid}"))
        .spawn(move || match child.wait() {
            Ok(status) => debug!("timer worker pid {pid} exited: {status}"),
            Err(e) => debug!("timer worker pid {pid} could not be reaped: {e}"),
        });
    if let Err(e) = spawned {
        debug!("no reaper thread for timer worker pid {pid}: {e}");
    }
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_command: &mut Command) {}
