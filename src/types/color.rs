//! RGB colors and hex color parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// An RGB color with red, green, and blue channels (0-255 each).
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Color {
    /// Create a color with the given RGB values.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Decode a hex color such as `#0069FF` or `0069ff`.
    ///
    /// The leading `#` is optional and digits are case-insensitive. Anything
    /// other than exactly six hex digits is rejected; there is no alpha channel.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumina::Color;
    ///
    /// let teal = Color::from_hex("#006994").unwrap();
    /// assert_eq!(teal.channels(), (0, 105, 148));
    ///
    /// assert!(Color::from_hex("#FFF").is_err());
    /// assert!(Color::from_hex("#FF000080").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, Error> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidColorFormat(hex.to_string()));
        }

        // All six bytes are ASCII hex digits, so slicing on byte offsets is safe.
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| Error::InvalidColorFormat(hex.to_string()))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// The `(r, g, b)` channel triple.
    pub fn channels(&self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }
}

/// Convert a hex color string to its `(r, g, b)` channel values.
pub fn hex_to_channels(hex: &str) -> Result<(u8, u8, u8), Error> {
    Color::from_hex(hex).map(|c| c.channels())
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}
