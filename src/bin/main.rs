#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::{error, info, trace, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{UART1, USB};
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant};
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig, UsbDevice};
use portable_atomic::{AtomicBool, AtomicU8};
use static_cell::StaticCell;
use uart_to_joystick::config::{
    OVERFLOW_LOG_INTERVAL_MS, REPORT_ENDPOINT, RING_CAPACITY, UART_BAUDRATE,
    USB_CONTROL_PACKET_SIZE, USB_MANUFACTURER, USB_MAX_POWER_MA, USB_PID, USB_PRODUCT,
    USB_SERIAL_NUMBER, USB_VID,
};
use uart_to_joystick::usb_output::UsbDriver;
use uart_to_joystick::{
    configure_usb_hid, ByteReceiver, EmbassyHidTransport, JoystickRequestHandler, LinkHandler,
    PacketChannel, ReceiveOutcome, ReportAssembler, ReportScheduler, ReportWriter, RingBuffer,
    SharedAssembler, TickOutcome, UartByteSource, UsbLink,
};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// USB link state, written by the device stack callbacks.
static USB_LINK: UsbLink = UsbLink::new();

/// Set while a report packet is waiting for the host.
static PACKET_IN_FLIGHT: AtomicBool = AtomicBool::new(false);
static PACKETS: PacketChannel = Channel::new();

/// Ring buffer between the UART task and the report task.
static RING_STORAGE: [AtomicU8; RING_CAPACITY] = [const { AtomicU8::new(0) }; RING_CAPACITY];
static RING: StaticCell<RingBuffer<'static>> = StaticCell::new();
static ASSEMBLER: StaticCell<SharedAssembler> = StaticCell::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state and handlers.
static HID_STATE: StaticCell<State> = StaticCell::new();
static LINK_HANDLER: StaticCell<LinkHandler> = StaticCell::new();
static REQUEST_HANDLER: StaticCell<JoystickRequestHandler> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("UART-to-Joystick starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Ring buffer ---
    let ring = RING.init(RingBuffer::new(&RING_STORAGE));
    let (producer, consumer) = ring.split();
    let assembler: &'static SharedAssembler =
        ASSEMBLER.init(Mutex::new(RefCell::new(ReportAssembler::new(consumer))));

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = UART_BAUDRATE;

    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (_tx, rx) = uart.split();
    let uart_source = UartByteSource::new(rx, ByteReceiver::new(producer, &USB_LINK));

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(USB_VID, USB_PID);
    usb_config.manufacturer = Some(USB_MANUFACTURER);
    usb_config.product = Some(USB_PRODUCT);
    usb_config.serial_number = Some(USB_SERIAL_NUMBER);
    usb_config.max_power = USB_MAX_POWER_MA;
    usb_config.max_packet_size_0 = USB_CONTROL_PACKET_SIZE;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );
    builder.handler(LINK_HANDLER.init(LinkHandler::new(&USB_LINK)));

    // Configure HID class
    let hid_state = HID_STATE.init(State::new());
    let request_handler = REQUEST_HANDLER.init(JoystickRequestHandler::new(assembler));
    let hid_writer = configure_usb_hid(&mut builder, hid_state, request_handler);

    // Build the USB device
    let usb_device = builder.build();

    let report_writer = ReportWriter::new(hid_writer, PACKETS.receiver(), &PACKET_IN_FLIGHT);
    let transport = EmbassyHidTransport::new(&USB_LINK, &PACKET_IN_FLIGHT, PACKETS.sender());
    let scheduler = ReportScheduler::new(REPORT_ENDPOINT);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(uart_task(uart_source).unwrap());
    spawner.spawn(writer_task(report_writer).unwrap());
    spawner.spawn(report_task(scheduler, transport, assembler).unwrap());

    info!("UART-to-Joystick initialized, waiting for host...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) {
    device.run().await;
}

/// UART task - the receive side of the ring buffer.
#[embassy_executor::task]
async fn uart_task(mut source: UartByteSource<'static>) {
    loop {
        match source.receive().await {
            Ok(ReceiveOutcome::Stored) => {}
            Ok(outcome) => trace!("Byte not buffered: {:?}", outcome),
            Err(e) => error!("UART error: {:?}", e),
        }
    }
}

/// Writer task - hands staged packets to the HID endpoint.
#[embassy_executor::task]
async fn writer_task(mut writer: ReportWriter<'static>) {
    writer.run().await;
}

/// Report task - polls the scheduler, then yields to the USB stack.
#[embassy_executor::task]
async fn report_task(
    mut scheduler: ReportScheduler,
    mut transport: EmbassyHidTransport,
    assembler: &'static SharedAssembler,
) {
    let log_interval = Duration::from_millis(OVERFLOW_LOG_INTERVAL_MS);
    let mut dropped_logged = 0u32;
    let mut next_overflow_check = Instant::now();

    loop {
        let outcome =
            assembler.lock(|assembler| scheduler.tick(&mut assembler.borrow_mut(), &mut transport));
        if let TickOutcome::Sent {
            report,
            changed: true,
        } = outcome
        {
            trace!("Report changed: {:?}", report);
        }

        if Instant::now() >= next_overflow_check {
            let dropped = assembler.lock(|assembler| assembler.borrow().overflows());
            if dropped != dropped_logged {
                warn!(
                    "Ring buffer full, {} bytes dropped",
                    dropped.wrapping_sub(dropped_logged)
                );
                dropped_logged = dropped;
            }
            next_overflow_check = Instant::now() + log_interval;
        }

        yield_now().await;
    }
}
