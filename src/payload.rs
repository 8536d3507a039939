//! Wire payloads for WiZ lights.
//!
//! Every command is a JSON object of the form `{"method": ..., "params": {...}}`.
//! Instead of a free-form parameter map, each method is a variant of
//! [`Payload`] with exactly the parameters that method accepts, so a
//! malformed key cannot be produced.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::errors::Error;
use crate::types::{Brightness, Color, PowerMode};

type Result<T> = std::result::Result<T, Error>;

/// The method vocabulary understood by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum Method {
    SetState,
    SetPilot,
    GetSystemConfig,
}

/// Parameters of a `setPilot` command.
///
/// Unset fields are left out of the encoded payload entirely.
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Pilot {
    pub(crate) r: Option<u8>,
    pub(crate) g: Option<u8>,
    pub(crate) b: Option<u8>,
    pub(crate) dimming: Option<u8>,
}

impl Pilot {
    /// Create an empty pilot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the RGB color.
    pub fn color(&mut self, color: &Color) -> &mut Self {
        self.r = Some(color.red);
        self.g = Some(color.green);
        self.b = Some(color.blue);
        self
    }

    /// Set the brightness level.
    pub fn brightness(&mut self, brightness: &Brightness) -> &mut Self {
        self.dimming = Some(brightness.value);
        self
    }

    pub fn get_color(&self) -> Option<Color> {
        match (self.r, self.g, self.b) {
            (Some(r), Some(g), Some(b)) => Some(Color::rgb(r, g, b)),
            _ => None,
        }
    }

    pub fn get_brightness(&self) -> Option<Brightness> {
        self.dimming.and_then(Brightness::create)
    }
}

/// A command to send to a WiZ light.
///
/// # Examples
///
/// ```
/// use lumina::{Payload, PowerMode};
///
/// let payload = Payload::set_state(PowerMode::On);
/// assert_eq!(
///     payload.to_json().unwrap(),
///     r#"{"method":"setState","params":{"state":true}}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Payload {
    /// Switch the light on or off.
    SetState { state: bool },
    /// Change color and/or brightness.
    SetPilot(Pilot),
    /// Ask a device to describe itself; used as the discovery query.
    GetSystemConfig {},
}

impl Payload {
    pub fn set_state(power: PowerMode) -> Self {
        Payload::SetState {
            state: power.is_on(),
        }
    }

    pub fn set_pilot(pilot: Pilot) -> Self {
        Payload::SetPilot(pilot)
    }

    /// A `setPilot` carrying both color and brightness.
    pub fn color(color: &Color, brightness: &Brightness) -> Self {
        let mut pilot = Pilot::new();
        pilot.color(color).brightness(brightness);
        Payload::SetPilot(pilot)
    }

    /// A `setPilot` carrying brightness only.
    pub fn brightness(brightness: &Brightness) -> Self {
        let mut pilot = Pilot::new();
        pilot.brightness(brightness);
        Payload::SetPilot(pilot)
    }

    pub fn get_system_config() -> Self {
        Payload::GetSystemConfig {}
    }

    pub fn method(&self) -> Method {
        match self {
            Payload::SetState { .. } => Method::SetState,
            Payload::SetPilot(_) => Method::SetPilot,
            Payload::GetSystemConfig {} => Method::GetSystemConfig,
        }
    }

    /// Compact JSON encoding, as sent on the wire.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Encoding)
    }

    /// The exact datagram bytes for this payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Encoding)
    }
}

impl From<PowerMode> for Payload {
    fn from(power: PowerMode) -> Self {
        Payload::set_state(power)
    }
}

impl From<Pilot> for Payload {
    fn from(pilot: Pilot) -> Self {
        Payload::SetPilot(pilot)
    }
}
