//! Compile-time configuration: serial link, USB identity and buffer depth.
//!
//! Everything tunable lives here so `main.rs` and the USB glue read the same
//! values.

use joystick_core::{EndpointConfig, JoystickReport};

// UART

/// Serial link speed (8N1, no flow control).
pub const UART_BAUDRATE: u32 = 115_200;

// USB

/// USB VID/PID - the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0001;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "Rust Joystick";
pub const USB_PRODUCT: &str = "UART-to-Joystick Bridge";
pub const USB_SERIAL_NUMBER: &str = "001";

/// Bus power request in mA.
pub const USB_MAX_POWER_MA: u16 = 100;

/// Control endpoint packet size.
pub const USB_CONTROL_PACKET_SIZE: u8 = 64;

/// Max packet size of the report endpoint. Also the HidWriter buffer size.
pub const REPORT_PACKET_SIZE: usize = 8;

/// Interrupt IN endpoint 1, polled every millisecond.
pub const REPORT_ENDPOINT: EndpointConfig =
    EndpointConfig::interrupt_in(1, REPORT_PACKET_SIZE as u16, 1);

// Ring buffer

/// Whole reports the ring buffer can hold before bytes are dropped.
pub const REPORTS_BUFFERED: usize = 8;

/// Ring buffer capacity in bytes.
pub const RING_CAPACITY: usize = JoystickReport::SIZE * REPORTS_BUFFERED;

// Logging

/// Minimum spacing between "bytes dropped" warnings.
pub const OVERFLOW_LOG_INTERVAL_MS: u64 = 1_000;
