//! Command-line surface of the `lumina` binary.
//!
//! The binary has two roles. With `--timer N` it is a sleep-timer worker:
//! wait N minutes, send one power command, exit. Otherwise it runs one of the
//! [`Command`]s against the device given by `--ip`/`--port` or the saved
//! [`Config`](crate::Config).

use clap::{Parser, Subcommand};

use crate::address::DeviceAddress;
use crate::errors::Error;
use crate::worker::WorkerSpec;

#[derive(Parser, Debug)]
#[command(name = "lumina", version)]
#[command(about = "Control WiZ smart lights from the command line", long_about = None)]
pub struct Cli {
    /// Target device IP address (default: saved config or $WIZ_IP)
    #[arg(long, global = true)]
    pub ip: Option<String>,

    /// Target device UDP port (default: 38899)
    #[arg(long, global = true)]
    pub port: Option<String>,

    /// Sleep timer in minutes; if >0 wait, send a power command and exit
    #[arg(long, default_value_t = 0)]
    pub timer: u64,

    /// With --timer, turn the light off instead of on
    #[arg(long)]
    pub off: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Turn the light on
    On,

    /// Turn the light off
    Off,

    /// Set color from a hex string such as "#CBA6F7"
    Color {
        /// Hex color, with or without a leading '#'
        hex: String,
        /// Brightness level (0-100)
        #[arg(short, long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(0..=100))]
        dimming: u8,
    },

    /// Set brightness (0-100)
    Brightness {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },

    /// Discover WiZ lights on the network
    Discover {
        /// Discovery window in seconds
        #[arg(short, long, default_value_t = 3)]
        timeout: u64,
    },

    /// Turn the light off after a number of minutes
    Sleep {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        minutes: u64,
        /// Keep this process running instead of handing off to a background worker
        #[arg(long)]
        inline: bool,
    },

    /// Save --ip/--port as the default device
    SaveConfig,
}

impl Cli {
    /// The timer job requested with `--timer`, if any.
    ///
    /// A missing `--ip` is treated as empty and fails validation.
    pub fn worker_spec(&self) -> Option<Result<WorkerSpec, Error>> {
        if self.timer == 0 {
            return None;
        }
        let port = DeviceAddress::DEFAULT_PORT.to_string();
        Some(WorkerSpec::from_flags(
            self.timer,
            self.ip.as_deref().unwrap_or(""),
            self.port.as_deref().unwrap_or(&port),
            self.off,
        ))
    }
}
