//! Platform-agnostic core of the UART-to-joystick bridge.
//!
//! This crate holds everything that does not touch hardware: the byte ring
//! buffer shared between the serial receive context and the USB context,
//! the report assembler, the USB link state machine and the polled report
//! scheduler. It builds `no_std` for the firmware and with `std` on the host
//! for testing.
//!
//! # Overview
//!
//! - [`ring`]: SPSC byte FIFO over caller-owned storage ([`RingBuffer`])
//! - [`receiver`]: receive-side entry point ([`ByteReceiver`])
//! - [`report`]: the 2-byte report ([`JoystickReport`])
//! - [`assembler`]: bytes to reports with sticky fallback ([`ReportAssembler`])
//! - [`link`]: USB link state machine ([`UsbLink`])
//! - [`transport`]: endpoint primitives of the USB stack ([`HidTransport`])
//! - [`scheduler`]: polled transmission ([`ReportScheduler`])
//!
//! # Data Flow
//!
//! ```text
//! UART byte -> ByteReceiver -> RingBuffer -> ReportAssembler -> ReportScheduler -> endpoint
//! ```
//!
//! # Example
//!
//! ```rust
//! use joystick_core::{ByteReceiver, JoystickReport, ReportAssembler, RingBuffer, UsbLink};
//! use portable_atomic::AtomicU8;
//!
//! let link = UsbLink::new();
//! link.on_connect();
//! link.on_configuration_changed();
//!
//! let storage = [const { AtomicU8::new(0) }; 2 * 8];
//! let mut ring = RingBuffer::new(&storage);
//! let (producer, consumer) = ring.split();
//! let mut receiver = ByteReceiver::new(producer, &link);
//! let mut assembler = ReportAssembler::new(consumer);
//!
//! receiver.on_byte(0x05);
//! receiver.on_byte(0x01);
//! assert_eq!(assembler.next(), (JoystickReport::new(0x05, 0x01), true));
//! assert_eq!(assembler.next(), (JoystickReport::new(0x05, 0x01), false));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod assembler;
pub mod link;
pub mod receiver;
pub mod report;
pub mod ring;
pub mod scheduler;
pub mod transport;

// Re-export main types at crate root
pub use assembler::ReportAssembler;
pub use link::{DeviceState, UsbLink};
pub use receiver::{ByteReceiver, ReceiveError, ReceiveOutcome};
pub use report::{JoystickReport, Stick};
pub use ring::{Consumer, Producer, RingBuffer};
pub use scheduler::{answer_get_report, ReportScheduler, TickOutcome};
pub use transport::{EndpointAddress, EndpointConfig, HidTransport, TransmitError};
