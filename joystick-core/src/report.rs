//! Joystick report: the 2-byte value sent to the host.

use core::ops::{BitAnd, BitOr};

/// Arcade stick direction bits, carried in the first report byte.
///
/// The low nibble maps to the HID D-pad usages in the report descriptor.
/// The high nibble is passed through as received.
///
/// # Example
///
/// ```
/// use joystick_core::Stick;
///
/// let stick = Stick::UP | Stick::LEFT;
/// assert!(stick.contains(Stick::UP));
/// assert!(!stick.contains(Stick::DOWN));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stick(pub u8);

impl Stick {
    pub const UP: Self = Self(1 << 0);
    pub const DOWN: Self = Self(1 << 1);
    pub const RIGHT: Self = Self(1 << 2);
    pub const LEFT: Self = Self(1 << 3);

    /// Lever centered.
    pub const CENTERED: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn contains(self, direction: Stick) -> bool {
        (self.0 & direction.0) == direction.0
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl BitOr for Stick {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for Stick {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

/// A single joystick input report.
///
/// Wire shape is exactly two bytes: `[stick, button]`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoystickReport {
    /// Stick byte (see [`Stick`] for the direction bits).
    pub stick: u8,
    /// Button bitfield, one bit per button.
    pub button: u8,
}

impl JoystickReport {
    /// Size of the report in bytes.
    pub const SIZE: usize = 2;

    /// All-zero report. Also the state before any byte has been received.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            stick: 0,
            button: 0,
        }
    }

    #[must_use]
    pub const fn new(stick: u8, button: u8) -> Self {
        Self { stick, button }
    }

    /// Wire representation, stick first.
    #[must_use]
    pub const fn as_bytes(&self) -> [u8; Self::SIZE] {
        [self.stick, self.button]
    }

    #[inline]
    #[must_use]
    pub const fn stick(&self) -> Stick {
        Stick(self.stick)
    }

    /// True if any field differs from `other`.
    #[inline]
    #[must_use]
    pub const fn differs_from(&self, other: &Self) -> bool {
        ((self.stick ^ other.stick) | (self.button ^ other.button)) != 0
    }
}
