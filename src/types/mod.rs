//! Value types for light control parameters.

mod brightness;
mod color;
mod power;

pub use brightness::Brightness;
pub use color::{Color, hex_to_channels};
pub use power::PowerMode;
