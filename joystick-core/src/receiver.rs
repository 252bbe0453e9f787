//! Receive-side front end: feeds serial bytes into the ring buffer.

use crate::link::UsbLink;
use crate::ring::Producer;

/// Error type for the serial receive path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveError {
    /// UART/communication I/O error.
    Io,
    /// UART framing error.
    Framing,
    /// Hardware receive FIFO overrun.
    Overrun,
    /// Line break detected.
    Break,
    /// Parity error.
    Parity,
}

/// What happened to a byte handed to [`ByteReceiver::on_byte`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveOutcome {
    /// Byte appended to the ring buffer.
    Stored,
    /// Link not configured; byte discarded.
    LinkDown,
    /// Ring buffer full; byte dropped and counted.
    Dropped,
}

/// Accepts bytes from the serial port, one at a time.
///
/// Bytes are only buffered while the USB link is configured. Anything
/// received before the host has configured the device (or after it went
/// away) would otherwise surface as a stale report later.
pub struct ByteReceiver<'r> {
    producer: Producer<'r>,
    link: &'r UsbLink,
}

impl<'r> ByteReceiver<'r> {
    #[must_use]
    pub fn new(producer: Producer<'r>, link: &'r UsbLink) -> Self {
        Self { producer, link }
    }

    /// Handle one received byte. Never blocks.
    pub fn on_byte(&mut self, byte: u8) -> ReceiveOutcome {
        if !self.link.is_configured() {
            return ReceiveOutcome::LinkDown;
        }

        match self.producer.insert(byte) {
            Ok(()) => ReceiveOutcome::Stored,
            Err(_) => ReceiveOutcome::Dropped,
        }
    }

    /// Bytes dropped so far because the ring buffer was full.
    #[inline]
    #[must_use]
    pub fn overflows(&self) -> u32 {
        self.producer.overflows()
    }
}
