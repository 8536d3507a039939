//! Brightness control for WiZ lights.

use serde::{Deserialize, Serialize};

/// Brightness (`dimming`) level from 0 to 100 percent.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Default for Brightness {
    fn default() -> Self {
        Self::new()
    }
}

impl Brightness {
    const MAX: u8 = 100;

    /// Full brightness.
    pub fn new() -> Self {
        Brightness { value: Self::MAX }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is above 100.
    ///
    /// ```
    /// use lumina::Brightness;
    ///
    /// assert_eq!(Brightness::create(0).unwrap().value(), 0);
    /// assert!(Brightness::create(101).is_none());
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Brightness { value })
    }

    /// Clamps values above 100 down to 100.
    pub fn saturating(value: u8) -> Self {
        Brightness {
            value: value.min(Self::MAX),
        }
    }
}
