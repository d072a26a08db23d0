//! Log-based report sink adapter.
//!
//! Implements [`ReportSink`] by writing the tilt attribute record to the
//! ESP-IDF logger (UART / USB-CDC).  On a bench board with no coordinator
//! this is where queued reports end up.

use log::info;

use crate::app::ports::ReportSink;
use crate::app::state::TiltPercentage;
use crate::protocol::TiltAttributeReport;

/// Adapter that logs every tilt report to the serial console.
pub struct LogReportSink;

impl LogReportSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogReportSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for LogReportSink {
    fn report_tilt(&self, tilt: TiltPercentage) {
        info!(
            "REPORT | tilt={} | frame={:02x?}",
            tilt,
            TiltAttributeReport::new(tilt).encode()
        );
    }
}
