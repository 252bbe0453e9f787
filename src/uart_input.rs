//! UART byte source feeding the ring buffer.
//!
//! Reads the raw serial stream one byte at a time. There is no framing:
//! every two bytes form one `(stick, button)` report, and the pairing is
//! done later by the report assembler.
//!
//! # Pins
//!
//! Uses UART1:
//! - GPIO 8: TX (unused)
//! - GPIO 9: RX

use embassy_rp::uart::{Async, Error as UartError, UartRx};
use joystick_core::{ByteReceiver, ReceiveError, ReceiveOutcome};

/// Convert UART errors to [`ReceiveError`].
///
/// This is a helper function instead of a `From` impl to avoid orphan rule issues
/// (both `UartError` and `ReceiveError` are defined in external crates).
#[inline]
fn uart_error_to_receive_error(e: UartError) -> ReceiveError {
    match e {
        UartError::Framing => ReceiveError::Framing,
        UartError::Overrun => ReceiveError::Overrun,
        UartError::Break => ReceiveError::Break,
        UartError::Parity => ReceiveError::Parity,
        _ => ReceiveError::Io,
    }
}

/// Serial receiver bound to the producer side of the ring buffer.
pub struct UartByteSource<'d> {
    rx: UartRx<'d, Async>,
    receiver: ByteReceiver<'d>,
}

impl<'d> UartByteSource<'d> {
    #[must_use]
    pub fn new(rx: UartRx<'d, Async>, receiver: ByteReceiver<'d>) -> Self {
        Self { rx, receiver }
    }

    /// Wait for the next byte and hand it to the ring buffer.
    pub async fn receive(&mut self) -> Result<ReceiveOutcome, ReceiveError> {
        let mut byte = [0u8; 1];
        self.rx
            .read(&mut byte)
            .await
            .map_err(uart_error_to_receive_error)?;

        Ok(self.receiver.on_byte(byte[0]))
    }

    /// Bytes dropped because the ring buffer was full.
    #[inline]
    #[must_use]
    pub fn overflows(&self) -> u32 {
        self.receiver.overflows()
    }
}
