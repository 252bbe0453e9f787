//! USB HID joystick output on top of embassy-usb.
//!
//! embassy-usb drives enumeration in its own task and exposes async
//! endpoints, while the report scheduler expects polled primitives. The glue
//! here bridges the two:
//!
//! - [`LinkHandler`] turns device-stack callbacks into [`UsbLink`] transitions.
//! - [`EmbassyHidTransport`] implements [`HidTransport`] for the scheduler. A
//!   finalized packet goes into a one-slot channel and marks the endpoint busy.
//! - [`ReportWriter`] owns the `HidWriter`, sends each packet, and frees the
//!   endpoint once the host has taken it.
//! - [`JoystickRequestHandler`] answers HID GET_REPORT on the control pipe.

use core::cell::RefCell;

use defmt::{debug, error, info, warn};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_usb::class::hid::{HidWriter, ReportId, RequestHandler, State};
use embassy_usb::control::OutResponse;
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Handler};
use heapless::Vec;
use joystick_core::{
    answer_get_report, DeviceState, EndpointAddress, EndpointConfig, HidTransport,
    ReportAssembler, TransmitError, UsbLink,
};
use portable_atomic::{AtomicBool, Ordering};

use crate::config::{REPORT_ENDPOINT, REPORT_PACKET_SIZE};

/// USB driver for the RP2040 peripheral.
pub type UsbDriver = Driver<'static, USB>;

/// One packet for the report endpoint.
pub type Packet = Vec<u8, REPORT_PACKET_SIZE>;

/// Hand-off from the scheduler to the [`ReportWriter`]. One packet in flight.
pub type PacketChannel = Channel<CriticalSectionRawMutex, Packet, 1>;

/// Assembler shared by the report task and the control-request handler.
pub type SharedAssembler = Mutex<CriticalSectionRawMutex, RefCell<ReportAssembler<'static>>>;

/// HID Joystick Report Descriptor.
///
/// Matches the 2-byte report `[stick, button]`:
/// - byte 0: D-pad Up/Down/Right/Left in bits 0-3, 4 bits padding
/// - byte 1: buttons 1-8
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x04, // Usage (Joystick)
    0xA1, 0x01, // Collection (Application)
    //
    // --- Stick ---
    0x09, 0x90, //   Usage (D-pad Up)
    0x09, 0x91, //   Usage (D-pad Down)
    0x09, 0x92, //   Usage (D-pad Right)
    0x09, 0x93, //   Usage (D-pad Left)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x95, 0x04, //   Report Count (4)
    0x75, 0x01, //   Report Size (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x04, //   Report Size (4)
    0x81, 0x03, //   Input (Constant, Variable, Absolute)
    //
    // --- Buttons (8 buttons) ---
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x08, //   Usage Maximum (Button 8)
    0x95, 0x08, //   Report Count (8)
    0x75, 0x01, //   Report Size (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    0xC0, // End Collection
];

/// Forwards device-stack lifecycle callbacks to the [`UsbLink`].
pub struct LinkHandler {
    link: &'static UsbLink,
}

impl LinkHandler {
    #[must_use]
    pub const fn new(link: &'static UsbLink) -> Self {
        Self { link }
    }
}

impl Handler for LinkHandler {
    fn enabled(&mut self, enabled: bool) {
        if enabled {
            info!("USB connected, enumerating");
            self.link.on_connect();
        } else {
            info!("USB disconnected");
            self.link.on_disconnect();
        }
    }

    fn reset(&mut self) {
        debug!("USB bus reset");
        self.link.on_reset();
    }

    fn configured(&mut self, configured: bool) {
        if configured {
            info!("USB configured");
            self.link.on_configuration_changed();
        } else {
            info!("USB deconfigured");
            self.link.on_deconfigured();
        }
    }

    fn suspended(&mut self, suspended: bool) {
        debug!("USB suspended: {}", suspended);
    }
}

/// [`HidTransport`] over embassy-usb.
///
/// The endpoint counts as ready for a write while no packet is in flight,
/// i.e. the [`ReportWriter`] has finished handing the previous one to the
/// host.
pub struct EmbassyHidTransport {
    link: &'static UsbLink,
    in_flight: &'static AtomicBool,
    packets: Sender<'static, CriticalSectionRawMutex, Packet, 1>,
    selected: Option<EndpointAddress>,
    staged: Packet,
}

impl EmbassyHidTransport {
    #[must_use]
    pub fn new(
        link: &'static UsbLink,
        in_flight: &'static AtomicBool,
        packets: Sender<'static, CriticalSectionRawMutex, Packet, 1>,
    ) -> Self {
        Self {
            link,
            in_flight,
            packets,
            selected: None,
            staged: Vec::new(),
        }
    }
}

impl HidTransport for EmbassyHidTransport {
    fn device_state(&self) -> DeviceState {
        self.link.state()
    }

    fn configuration_generation(&self) -> u32 {
        self.link.generation()
    }

    fn select_endpoint(&mut self, address: EndpointAddress) {
        if self.selected != Some(address) {
            self.staged.clear();
            self.selected = Some(address);
        }
    }

    fn endpoint_ready_for_write(&self) -> bool {
        self.selected == Some(REPORT_ENDPOINT.address) && !self.in_flight.load(Ordering::Acquire)
    }

    fn write_stream(&mut self, bytes: &[u8]) {
        if self.staged.extend_from_slice(bytes).is_err() {
            warn!(
                "Packet exceeds {} bytes, dropping {} bytes",
                REPORT_PACKET_SIZE,
                bytes.len()
            );
        }
    }

    fn finalize_transmission(&mut self) {
        let packet = core::mem::take(&mut self.staged);
        self.in_flight.store(true, Ordering::Release);
        if self.packets.try_send(packet).is_err() {
            // Only reachable if the writer never cleared the flag.
            error!("Report channel full, packet dropped");
        }
    }

    fn configure_endpoint(&mut self, config: &EndpointConfig) {
        // embassy-usb allocates endpoints when the device is built; the
        // configuration here has to match what `configure_usb_hid` requested.
        if *config != REPORT_ENDPOINT {
            warn!("Endpoint config {:?} differs from allocated {:?}", config, REPORT_ENDPOINT);
        }
        self.staged.clear();
        info!(
            "Interrupt endpoint {=u8:#x} ready: {} bytes, every {} ms",
            config.address.0,
            config.max_packet_size,
            config.poll_interval_ms
        );
    }
}

/// Map embassy-usb endpoint errors to [`TransmitError`].
#[inline]
fn endpoint_error_to_transmit_error(e: EndpointError) -> TransmitError {
    match e {
        EndpointError::BufferOverflow => TransmitError::BufferOverflow,
        EndpointError::Disabled => TransmitError::Disabled,
    }
}

/// Owns the HID writer and sends the packets staged by the transport.
pub struct ReportWriter<'d> {
    writer: HidWriter<'static, UsbDriver, REPORT_PACKET_SIZE>,
    packets: Receiver<'d, CriticalSectionRawMutex, Packet, 1>,
    in_flight: &'d AtomicBool,
}

impl<'d> ReportWriter<'d> {
    #[must_use]
    pub fn new(
        writer: HidWriter<'static, UsbDriver, REPORT_PACKET_SIZE>,
        packets: Receiver<'d, CriticalSectionRawMutex, Packet, 1>,
        in_flight: &'d AtomicBool,
    ) -> Self {
        Self {
            writer,
            packets,
            in_flight,
        }
    }

    /// Write one packet. Frees the endpoint whether or not the write succeeded.
    pub async fn send(&mut self, packet: &[u8]) -> Result<(), TransmitError> {
        let result = self
            .writer
            .write(packet)
            .await
            .map_err(endpoint_error_to_transmit_error);
        self.in_flight.store(false, Ordering::Release);
        result
    }

    /// Forward packets to the host indefinitely.
    pub async fn run(&mut self) -> ! {
        self.writer.ready().await;
        info!("USB HID ready, forwarding reports...");

        loop {
            let packet = self.packets.receive().await;
            if let Err(e) = self.send(&packet).await {
                error!("Report write failed: {:?}", e);
            }
        }
    }
}

/// HID request handler.
///
/// GET_REPORT is answered from the shared assembler; output reports are
/// accepted and ignored.
pub struct JoystickRequestHandler {
    assembler: &'static SharedAssembler,
}

impl JoystickRequestHandler {
    #[must_use]
    pub const fn new(assembler: &'static SharedAssembler) -> Self {
        Self { assembler }
    }
}

impl RequestHandler for JoystickRequestHandler {
    fn get_report(&mut self, _id: ReportId, buf: &mut [u8]) -> Option<usize> {
        self.assembler
            .lock(|assembler| answer_get_report(&mut assembler.borrow_mut(), buf))
    }

    fn set_report(&mut self, _id: ReportId, _data: &[u8]) -> OutResponse {
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, _id: Option<ReportId>, _duration_ms: u32) {}

    fn get_idle_ms(&mut self, _id: Option<ReportId>) -> Option<u32> {
        None
    }
}

/// Configure the USB HID class in the USB builder.
///
/// Returns the HID writer for the report endpoint.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
    request_handler: &'d mut JoystickRequestHandler,
) -> HidWriter<'d, Driver<'d, USB>, REPORT_PACKET_SIZE> {
    let config = embassy_usb::class::hid::Config {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: Some(request_handler),
        poll_ms: REPORT_ENDPOINT.poll_interval_ms,
        max_packet_size: REPORT_ENDPOINT.max_packet_size,
        hid_subclass: embassy_usb::class::hid::HidSubclass::No,
        hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::None,
    };

    HidWriter::new(builder, state, config)
}
