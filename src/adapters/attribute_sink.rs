//! Attribute report sink.
//!
//! Implements [`ReportSink`] by queueing a [`TiltAttributeReport`] on
//! [`REPORT_CHANNEL`] for the protocol stack to publish.  Never blocks: if
//! the stack has fallen behind, the report is dropped and the next settle
//! or reconnect publishes a fresh value.

use log::{debug, warn};

use crate::app::ports::ReportSink;
use crate::app::state::TiltPercentage;
use crate::protocol::TiltAttributeReport;
use crate::protocol::channels::REPORT_CHANNEL;

pub struct ChannelReportSink;

impl ChannelReportSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChannelReportSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for ChannelReportSink {
    fn report_tilt(&self, tilt: TiltPercentage) {
        match REPORT_CHANNEL.try_send(TiltAttributeReport::new(tilt)) {
            Ok(()) => debug!("Queued tilt report {}", tilt),
            Err(_) => warn!("Report channel full, tilt {} dropped", tilt),
        }
    }
}
