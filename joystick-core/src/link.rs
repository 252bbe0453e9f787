//! USB link state shared between the device stack, the byte receiver and
//! the report scheduler.
//!
//! The device stack drives transitions through the `on_*` callbacks; every
//! other context only reads. State is kept in atomics so the callbacks can
//! run in whichever task or interrupt the USB stack uses.

use portable_atomic::{AtomicU32, AtomicU8, Ordering};

/// USB device state as seen by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Not attached, or disabled by the stack.
    Disconnected,
    /// Attached and enumerating; no configuration selected yet.
    Enumerating,
    /// The host has selected a configuration. Reports may flow.
    Configured,
}

impl DeviceState {
    const fn to_raw(self) -> u8 {
        match self {
            DeviceState::Disconnected => 0,
            DeviceState::Enumerating => 1,
            DeviceState::Configured => 2,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => DeviceState::Enumerating,
            2 => DeviceState::Configured,
            _ => DeviceState::Disconnected,
        }
    }
}

/// USB link state machine.
///
/// ```text
/// Disconnected --connect--> Enumerating --configured--> Configured
///      ^                        ^   |                       |
///      |                        +---+------reset------------+
///      +-----------------------disconnect-------------------+
/// ```
///
/// # Example
///
/// ```
/// use joystick_core::{DeviceState, UsbLink};
///
/// let link = UsbLink::new();
/// link.on_connect();
/// link.on_configuration_changed();
/// assert_eq!(link.state(), DeviceState::Configured);
/// link.on_disconnect();
/// assert_eq!(link.state(), DeviceState::Disconnected);
/// ```
pub struct UsbLink {
    state: AtomicU8,
    /// Bumped on every transition into Configured.
    generation: AtomicU32,
}

impl UsbLink {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(DeviceState::Disconnected.to_raw()),
            generation: AtomicU32::new(0),
        }
    }

    /// Current link state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> DeviceState {
        DeviceState::from_raw(self.state.load(Ordering::Acquire))
    }

    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.state() == DeviceState::Configured
    }

    /// Number of configuration events seen so far.
    ///
    /// A consumer that remembers the last value it acted on can detect a new
    /// configuration even if the link never left `Configured`.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Bus attached; enumeration begins.
    pub fn on_connect(&self) {
        self.set(DeviceState::Enumerating);
    }

    /// Bus detached or the device was disabled.
    pub fn on_disconnect(&self) {
        self.set(DeviceState::Disconnected);
    }

    /// Bus reset: the host will enumerate again.
    ///
    /// Ignored while disconnected.
    pub fn on_reset(&self) {
        if self.state() != DeviceState::Disconnected {
            self.set(DeviceState::Enumerating);
        }
    }

    /// The host selected a configuration.
    pub fn on_configuration_changed(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.set(DeviceState::Configured);
    }

    /// The host deselected the configuration (SET_CONFIGURATION 0).
    pub fn on_deconfigured(&self) {
        if self.state() == DeviceState::Configured {
            self.set(DeviceState::Enumerating);
        }
    }

    #[inline]
    fn set(&self, state: DeviceState) {
        self.state.store(state.to_raw(), Ordering::Release);
    }
}

impl Default for UsbLink {
    fn default() -> Self {
        Self::new()
    }
}
