//! # lumina
//!
//! Control WiZ smart bulbs on the local network over their UDP JSON protocol.
//!
//! The crate covers the parts of a light controller that talk to the network
//! or outlive the user's session:
//!
//! - **Commands**: build `setState` / `setPilot` payloads with [`Payload`] and
//!   deliver them with [`Dispatcher`], which retries failed sends.
//! - **Discovery**: find bulbs with a broadcast query via [`discover`].
//! - **Sleep timers**: switch a bulb off later, either inside the running
//!   process or from a detached worker process that keeps running after the
//!   front-end exits (see [`Scheduler`]).
//!
//! Front-ends drive all three through [`Controller`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use lumina::{Brightness, Color, Controller, DeviceAddress};
//!
//! # async fn run() -> Result<(), lumina::Error> {
//! let bulb = DeviceAddress::parse("192.168.1.100", "38899")?;
//! let controller = Controller::new();
//!
//! controller.set_power(&bulb, true).await?;
//! controller
//!     .set_color(&bulb, &Color::from_hex("#CBA6F7")?, &Brightness::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Communication
//!
//! All communication with WiZ bulbs occurs over UDP, by default on port
//! 38899. Control commands are fire-and-forget: replies are never awaited, so
//! a successful send does not prove the bulb changed state.

mod address;
pub mod cli;
pub mod config;
mod controller;
pub mod discovery;
mod dispatch;
mod errors;
mod payload;
pub mod runtime;
mod scheduler;
mod types;
pub mod worker;

// Re-export public API
pub use address::DeviceAddress;
pub use config::Config;
pub use controller::Controller;
pub use discovery::{DiscoveredDevice, Scanner, discover};
pub use dispatch::{Dispatcher, Transport, UdpTransport};
pub use errors::Error;
pub use payload::{Method, Payload, Pilot};
pub use scheduler::{DeferredAction, Mode, PendingTimer, Scheduled, Scheduler};
pub use types::{Brightness, Color, PowerMode, hex_to_channels};
pub use worker::WorkerSpec;
