//! UART to USB HID joystick bridge for RP2040.
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Receives a raw byte stream over UART (115200 baud, 8N1)
//! 2. Buffers it in a 16-byte ring buffer (8 reports)
//! 3. Sends every byte pair as a 2-byte `(stick, button)` USB HID joystick report
//!
//! When no new pair is available the last report is repeated, so the host
//! always sees the most recent input.
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | UART1 TX | 8    | Unused |
//! | UART1 RX | 9    | Serial receive (report bytes) |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with four tasks:
//!
//! - **USB Task**: Runs the USB device stack; link callbacks update [`UsbLink`]
//! - **UART Task**: Reads bytes and inserts them into the ring buffer
//! - **Report Task**: Ticks the [`ReportScheduler`] and yields, forever
//! - **Writer Task**: Sends packets staged by the scheduler to the HID endpoint
//!
//! # Modules
//!
//! - [`config`]: Baud rate, USB identity, endpoint and buffer sizes
//! - [`uart_input`]: UART byte source ([`UartByteSource`])
//! - [`usb_output`]: embassy-usb glue ([`EmbassyHidTransport`], [`ReportWriter`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

// Ensure mutually exclusive panic handlers
#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features - they define conflicting panic handlers");

// Re-export core types for convenience
pub use joystick_core::{
    answer_get_report, ByteReceiver, DeviceState, EndpointConfig, HidTransport, JoystickReport,
    ReceiveError, ReceiveOutcome, ReportAssembler, ReportScheduler, RingBuffer, Stick,
    TickOutcome, TransmitError, UsbLink,
};

pub mod config;
pub mod uart_input;
pub mod usb_output;

pub use uart_input::UartByteSource;
pub use usb_output::{
    configure_usb_hid, EmbassyHidTransport, JoystickRequestHandler, LinkHandler, PacketChannel,
    ReportWriter, SharedAssembler,
};
