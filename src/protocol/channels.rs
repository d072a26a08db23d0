//! Inter-task channels between the protocol stack and the control loop.
//!
//! Uses `embassy-sync` bounded MPMC channels so the radio callback context,
//! the console reader and the motion task can all hand data to the control
//! loop without heap allocation.
//!
//! ```text
//! ┌──────────────┐  ZclMessage          ┌──────────────┐
//! │ Protocol     │─────────────────────▶│ Control loop │
//! │ stack        │◀─────────────────────│ / motion task│
//! └──────────────┘  TiltAttributeReport └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use super::{TiltAttributeReport, ZclMessage};

/// Channel depth for inbound command messages.
const CMD_DEPTH: usize = 8;

/// Channel depth for outbound attribute reports.
const REPORT_DEPTH: usize = 8;

/// Inbound command channel: protocol stack → control loop.
pub static CMD_CHANNEL: Channel<CriticalSectionRawMutex, ZclMessage, CMD_DEPTH> = Channel::new();

/// Outbound report channel: reporting sink → protocol stack.
pub static REPORT_CHANNEL: Channel<CriticalSectionRawMutex, TiltAttributeReport, REPORT_DEPTH> =
    Channel::new();
