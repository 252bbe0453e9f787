//! ReportScheduler: polled report transmission over a [`HidTransport`].

use crate::assembler::ReportAssembler;
use crate::link::DeviceState;
use crate::report::JoystickReport;
use crate::transport::{EndpointConfig, HidTransport};

/// What a single [`ReportScheduler::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Link not configured; nothing was touched.
    LinkDown,
    /// Host has not taken the previous report yet.
    EndpointBusy,
    /// A report was written to the endpoint.
    Sent {
        report: JoystickReport,
        /// Whether the report differs from the previous one. Informational
        /// only; unchanged reports are sent as well.
        changed: bool,
    },
}

/// Sends one report per tick whenever the reporting endpoint is free.
///
/// The scheduler is meant to be called in a tight loop alongside the USB
/// stack's own task. Each tick is bounded and never waits.
pub struct ReportScheduler {
    endpoint: EndpointConfig,
    /// Configuration generation the endpoint was last configured for.
    configured_generation: u32,
}

impl ReportScheduler {
    #[must_use]
    pub const fn new(endpoint: EndpointConfig) -> Self {
        Self {
            endpoint,
            configured_generation: 0,
        }
    }

    /// Run one polling step.
    pub fn tick<T: HidTransport>(
        &mut self,
        assembler: &mut ReportAssembler<'_>,
        transport: &mut T,
    ) -> TickOutcome {
        if transport.device_state() != DeviceState::Configured {
            return TickOutcome::LinkDown;
        }

        let generation = transport.configuration_generation();
        if generation != self.configured_generation {
            transport.configure_endpoint(&self.endpoint);
            self.configured_generation = generation;
        }

        transport.select_endpoint(self.endpoint.address);
        if !transport.endpoint_ready_for_write() {
            return TickOutcome::EndpointBusy;
        }

        let (report, changed) = assembler.next();
        transport.write_stream(&report.as_bytes());
        transport.finalize_transmission();

        TickOutcome::Sent { report, changed }
    }
}

/// Answer a HID GET_REPORT control request.
///
/// Uses the same assembler as the interrupt endpoint, so a report fetched
/// over the control pipe is not sent again on the interrupt pipe. Returns
/// the number of bytes written, or `None` if `buf` cannot hold a report.
pub fn answer_get_report(assembler: &mut ReportAssembler<'_>, buf: &mut [u8]) -> Option<usize> {
    let out = buf.get_mut(..JoystickReport::SIZE)?;
    let (report, _changed) = assembler.next();
    out.copy_from_slice(&report.as_bytes());
    Some(JoystickReport::SIZE)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::ring::RingBuffer;
    use portable_atomic::AtomicU8;
    use crate::transport::EndpointAddress;
    use std::vec::Vec;

    /// Records every call the scheduler makes.
    #[derive(Default)]
    struct MockTransport {
        state: Option<DeviceState>,
        generation: u32,
        ready: bool,
        selected: Option<EndpointAddress>,
        pending: Vec<u8>,
        sent: Vec<Vec<u8>>,
        configured: Vec<EndpointConfig>,
        calls: usize,
    }

    impl MockTransport {
        fn configured() -> Self {
            Self {
                state: Some(DeviceState::Configured),
                generation: 1,
                ready: true,
                ..Self::default()
            }
        }
    }

    impl HidTransport for MockTransport {
        fn device_state(&self) -> DeviceState {
            self.state.unwrap_or(DeviceState::Disconnected)
        }

        fn configuration_generation(&self) -> u32 {
            self.generation
        }

        fn select_endpoint(&mut self, address: EndpointAddress) {
            self.calls += 1;
            self.selected = Some(address);
        }

        fn endpoint_ready_for_write(&self) -> bool {
            self.ready
        }

        fn write_stream(&mut self, bytes: &[u8]) {
            self.calls += 1;
            self.pending.extend_from_slice(bytes);
        }

        fn finalize_transmission(&mut self) {
            self.calls += 1;
            self.sent.push(core::mem::take(&mut self.pending));
        }

        fn configure_endpoint(&mut self, config: &EndpointConfig) {
            self.calls += 1;
            self.configured.push(*config);
        }
    }

    const ENDPOINT: EndpointConfig = EndpointConfig::interrupt_in(1, 8, 1);

    #[test]
    fn test_tick_does_nothing_while_link_down() {
        let storage = [const { AtomicU8::new(0) }; 16];
        let mut ring = RingBuffer::new(&storage);
        let (mut producer, consumer) = ring.split();
        let mut assembler = ReportAssembler::new(consumer);
        let mut scheduler = ReportScheduler::new(ENDPOINT);

        producer.insert(0x05).unwrap();
        producer.insert(0x01).unwrap();

        for state in [DeviceState::Disconnected, DeviceState::Enumerating] {
            let mut transport = MockTransport {
                state: Some(state),
                ready: true,
                ..MockTransport::default()
            };
            assert_eq!(
                scheduler.tick(&mut assembler, &mut transport),
                TickOutcome::LinkDown
            );
            assert_eq!(transport.calls, 0);
        }
        assert_eq!(assembler.buffered(), 2);
    }

    #[test]
    fn test_tick_sends_report_in_wire_order() {
        let storage = [const { AtomicU8::new(0) }; 16];
        let mut ring = RingBuffer::new(&storage);
        let (mut producer, consumer) = ring.split();
        let mut assembler = ReportAssembler::new(consumer);
        let mut scheduler = ReportScheduler::new(ENDPOINT);
        let mut transport = MockTransport::configured();

        producer.insert(0x05).unwrap();
        producer.insert(0x01).unwrap();

        let outcome = scheduler.tick(&mut assembler, &mut transport);
        assert_eq!(
            outcome,
            TickOutcome::Sent {
                report: JoystickReport::new(0x05, 0x01),
                changed: true,
            }
        );
        assert_eq!(transport.selected, Some(EndpointAddress(0x81)));
        assert_eq!(transport.sent, [[0x05, 0x01]]);
    }

    #[test]
    fn test_tick_skips_when_endpoint_busy() {
        let storage = [const { AtomicU8::new(0) }; 16];
        let mut ring = RingBuffer::new(&storage);
        let (mut producer, consumer) = ring.split();
        let mut assembler = ReportAssembler::new(consumer);
        let mut scheduler = ReportScheduler::new(ENDPOINT);
        let mut transport = MockTransport {
            ready: false,
            ..MockTransport::configured()
        };

        producer.insert(0x05).unwrap();
        producer.insert(0x01).unwrap();

        assert_eq!(
            scheduler.tick(&mut assembler, &mut transport),
            TickOutcome::EndpointBusy
        );
        assert!(transport.sent.is_empty());
        assert_eq!(assembler.buffered(), 2);

        transport.ready = true;
        let _ = scheduler.tick(&mut assembler, &mut transport);
        assert_eq!(transport.sent, [[0x05, 0x01]]);
    }

    #[test]
    fn test_unchanged_reports_are_still_sent() {
        let storage = [const { AtomicU8::new(0) }; 16];
        let mut ring = RingBuffer::new(&storage);
        let (_producer, consumer) = ring.split();
        let mut assembler = ReportAssembler::new(consumer);
        let mut scheduler = ReportScheduler::new(ENDPOINT);
        let mut transport = MockTransport::configured();

        for _ in 0..3 {
            assert_eq!(
                scheduler.tick(&mut assembler, &mut transport),
                TickOutcome::Sent {
                    report: JoystickReport::neutral(),
                    changed: false,
                }
            );
        }
        assert_eq!(transport.sent.len(), 3);
    }

    #[test]
    fn test_endpoint_configured_once_per_configuration() {
        let storage = [const { AtomicU8::new(0) }; 16];
        let mut ring = RingBuffer::new(&storage);
        let (_producer, consumer) = ring.split();
        let mut assembler = ReportAssembler::new(consumer);
        let mut scheduler = ReportScheduler::new(ENDPOINT);
        let mut transport = MockTransport::configured();

        for _ in 0..4 {
            let _ = scheduler.tick(&mut assembler, &mut transport);
        }
        assert_eq!(transport.configured, [ENDPOINT]);

        // Host re-enumerates.
        transport.state = Some(DeviceState::Disconnected);
        let _ = scheduler.tick(&mut assembler, &mut transport);
        transport.state = Some(DeviceState::Configured);
        transport.generation = 2;
        let _ = scheduler.tick(&mut assembler, &mut transport);
        let _ = scheduler.tick(&mut assembler, &mut transport);
        assert_eq!(transport.configured, [ENDPOINT, ENDPOINT]);
    }

    #[test]
    fn test_get_report_shares_assembler_state() {
        let storage = [const { AtomicU8::new(0) }; 16];
        let mut ring = RingBuffer::new(&storage);
        let (mut producer, consumer) = ring.split();
        let mut assembler = ReportAssembler::new(consumer);
        let mut scheduler = ReportScheduler::new(ENDPOINT);
        let mut transport = MockTransport::configured();

        for byte in [0x01, 0x02, 0x03, 0x04] {
            producer.insert(byte).unwrap();
        }

        let mut buf = [0u8; 8];
        assert_eq!(answer_get_report(&mut assembler, &mut buf), Some(2));
        assert_eq!(&buf[..2], &[0x01, 0x02]);

        let _ = scheduler.tick(&mut assembler, &mut transport);
        assert_eq!(transport.sent, [[0x03, 0x04]]);
    }

    #[test]
    fn test_get_report_rejects_short_buffer() {
        let storage = [const { AtomicU8::new(0) }; 16];
        let mut ring = RingBuffer::new(&storage);
        let (mut producer, consumer) = ring.split();
        let mut assembler = ReportAssembler::new(consumer);

        producer.insert(0x01).unwrap();
        producer.insert(0x02).unwrap();

        let mut buf = [0u8; 1];
        assert_eq!(answer_get_report(&mut assembler, &mut buf), None);
        assert_eq!(assembler.buffered(), 2);
    }
}
