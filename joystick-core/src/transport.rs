//! USB transport seam: the endpoint primitives the scheduler drives.

use crate::link::DeviceState;

/// USB endpoint address (direction bit included, e.g. `0x81` for IN 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointAddress(pub u8);

impl EndpointAddress {
    const IN_BIT: u8 = 0x80;

    /// IN endpoint with the given number.
    #[must_use]
    pub const fn from_in(number: u8) -> Self {
        Self(Self::IN_BIT | (number & 0x0F))
    }
}

/// Parameters for the one-time configuration of the interrupt IN endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointConfig {
    pub address: EndpointAddress,
    /// Maximum packet size in bytes.
    pub max_packet_size: u16,
    /// Host polling interval in milliseconds.
    pub poll_interval_ms: u8,
}

impl EndpointConfig {
    /// Interrupt IN endpoint for joystick reports.
    #[must_use]
    pub const fn interrupt_in(number: u8, max_packet_size: u16, poll_interval_ms: u8) -> Self {
        Self {
            address: EndpointAddress::from_in(number),
            max_packet_size,
            poll_interval_ms,
        }
    }
}

/// Error type for endpoint writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitError {
    /// Endpoint is disabled (device not configured or bus reset).
    Disabled,
    /// Report larger than the endpoint's max packet size.
    BufferOverflow,
}

/// Endpoint primitives provided by the USB device stack.
///
/// The calls mirror a polled device stack: check the link, select the
/// endpoint, check that the host has taken the previous packet, stream the
/// report in, then finalize the packet. None of them may block.
pub trait HidTransport {
    /// Current USB link state.
    fn device_state(&self) -> DeviceState;

    /// Count of configuration events, see [`UsbLink::generation`].
    ///
    /// [`UsbLink::generation`]: crate::UsbLink::generation
    fn configuration_generation(&self) -> u32;

    /// Make `address` the target of the following endpoint calls.
    fn select_endpoint(&mut self, address: EndpointAddress);

    /// True if the selected endpoint can take a new packet.
    fn endpoint_ready_for_write(&self) -> bool;

    /// Append bytes to the pending packet of the selected endpoint.
    fn write_stream(&mut self, bytes: &[u8]);

    /// Hand the pending packet to the host.
    fn finalize_transmission(&mut self);

    /// Configure an endpoint after the host selected a configuration.
    fn configure_endpoint(&mut self, config: &EndpointConfig);
}
