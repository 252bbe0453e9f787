//! ReportAssembler: turns buffered bytes into joystick reports.

use crate::report::JoystickReport;
use crate::ring::Consumer;

/// Builds [`JoystickReport`]s from the consumer half of the ring buffer.
///
/// Every call to [`next`](Self::next) produces a report: two fresh bytes if
/// at least two are buffered, otherwise the previous report again. A lone
/// byte is never paired with a stale value; it stays buffered until its
/// partner arrives.
pub struct ReportAssembler<'r> {
    consumer: Consumer<'r>,
    /// Last emitted report (`prev_stick`, `prev_button`).
    prev: JoystickReport,
}

impl<'r> ReportAssembler<'r> {
    /// Create an assembler draining `consumer`. The previous report starts
    /// out neutral.
    #[must_use]
    pub fn new(consumer: Consumer<'r>) -> Self {
        Self {
            consumer,
            prev: JoystickReport::neutral(),
        }
    }

    /// Produce the next report and whether it differs from the previous one.
    ///
    /// Never blocks. When starved of input this repeats the last report with
    /// `changed == false`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> (JoystickReport, bool) {
        let report = match self.take_pair() {
            Some(report) => report,
            None => self.prev,
        };

        let changed = report.differs_from(&self.prev);
        self.prev = report;
        (report, changed)
    }

    fn take_pair(&mut self) -> Option<JoystickReport> {
        if self.consumer.count() < JoystickReport::SIZE {
            return None;
        }

        let stick = self.consumer.remove()?;
        let button = self.consumer.remove()?;
        Some(JoystickReport { stick, button })
    }

    /// The last report returned by [`next`](Self::next).
    #[inline]
    #[must_use]
    pub fn previous(&self) -> JoystickReport {
        self.prev
    }

    /// Bytes waiting in the ring buffer.
    #[inline]
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.consumer.count()
    }

    /// Bytes the receive side had to drop because the ring buffer was full.
    #[inline]
    #[must_use]
    pub fn overflows(&self) -> u32 {
        self.consumer.overflows()
    }
}
