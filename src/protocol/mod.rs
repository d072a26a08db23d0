//! Window-covering protocol model.
//!
//! Maps Zigbee cluster commands onto [`ShadeCommand`]s and encodes the
//! outbound tilt attribute report.  The radio stack itself lives outside
//! this crate; it hands us [`ZclMessage`]s and drains encoded reports.
//!
//! Inbound command payload:
//! ```text
//! cluster 0x0102 ── cmd 0x00 UpOpen            (no payload)
//!                ├─ cmd 0x01 DownClose         (no payload)
//!                ├─ cmd 0x02 Stop              (no payload)
//!                └─ cmd 0x08 GoToTiltPercentage [u8 percentage]
//! ```
//!
//! Outbound attribute record:
//! ```text
//! ┌───────────────────┬──────────┬───────────┐
//! │ Attr id (2B, LE)  │ Type (1B)│ Value (1B)│
//! │ 0x0009            │ 0x20 u8  │ 0..=100   │
//! └───────────────────┴──────────┴───────────┘
//! ```

pub mod channels;

use core::fmt;

use heapless::Vec;

use crate::app::commands::ShadeCommand;
use crate::app::state::TiltPercentage;

/// Window Covering cluster.
pub const WINDOW_COVERING_CLUSTER_ID: u16 = 0x0102;

/// Window Covering cluster command identifiers.
pub mod cmd {
    pub const UP_OPEN: u8 = 0x00;
    pub const DOWN_CLOSE: u8 = 0x01;
    pub const STOP: u8 = 0x02;
    pub const GO_TO_TILT_PERCENTAGE: u8 = 0x08;
}

/// CurrentPositionTiltPercentage attribute.
pub const ATTR_CURRENT_POSITION_TILT_PERCENTAGE: u16 = 0x0009;

/// ZCL data type tag for `uint8`.
pub const ZCL_TYPE_U8: u8 = 0x20;

/// Largest command payload this device accepts.
pub const MAX_PAYLOAD: usize = 8;

// ───────────────────────────────────────────────────────────────
// Inbound
// ───────────────────────────────────────────────────────────────

/// One cluster-specific command delivered by the protocol stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZclMessage {
    pub cluster_id: u16,
    pub command_id: u8,
    pub payload: Vec<u8, MAX_PAYLOAD>,
}

impl ZclMessage {
    /// Build a message; `None` if `payload` exceeds [`MAX_PAYLOAD`].
    pub fn new(cluster_id: u16, command_id: u8, payload: &[u8]) -> Option<Self> {
        Some(Self {
            cluster_id,
            command_id,
            payload: Vec::from_slice(payload).ok()?,
        })
    }

    /// Window-covering message for a local command.
    pub fn window_covering(command: ShadeCommand) -> Self {
        let mut payload = Vec::new();
        let command_id = match command {
            ShadeCommand::Open => cmd::UP_OPEN,
            ShadeCommand::Close => cmd::DOWN_CLOSE,
            ShadeCommand::Stop => cmd::STOP,
            ShadeCommand::GoToTiltPercentage(v) => {
                // Capacity is MAX_PAYLOAD, never full here.
                let _ = payload.push(v);
                cmd::GO_TO_TILT_PERCENTAGE
            }
        };
        Self {
            cluster_id: WINDOW_COVERING_CLUSTER_ID,
            command_id,
            payload,
        }
    }
}

/// Why an inbound message was not mapped to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Message is for a cluster this device does not implement.
    UnsupportedCluster(u16),
    /// Window-covering command this device does not implement (lift, etc.).
    UnsupportedCommand(u8),
    /// Go-to-tilt without exactly one percentage byte.
    MalformedPayload,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedCluster(id) => write!(f, "unsupported cluster 0x{id:04x}"),
            Self::UnsupportedCommand(id) => write!(f, "unsupported command 0x{id:02x}"),
            Self::MalformedPayload => write!(f, "malformed payload"),
        }
    }
}

/// Map an inbound message onto a controller command.
pub fn decode(msg: &ZclMessage) -> Result<ShadeCommand, DecodeError> {
    if msg.cluster_id != WINDOW_COVERING_CLUSTER_ID {
        return Err(DecodeError::UnsupportedCluster(msg.cluster_id));
    }
    match msg.command_id {
        cmd::UP_OPEN => Ok(ShadeCommand::Open),
        cmd::DOWN_CLOSE => Ok(ShadeCommand::Close),
        cmd::STOP => Ok(ShadeCommand::Stop),
        cmd::GO_TO_TILT_PERCENTAGE => match msg.payload.as_slice() {
            [value] => Ok(ShadeCommand::GoToTiltPercentage(*value)),
            _ => Err(DecodeError::MalformedPayload),
        },
        other => Err(DecodeError::UnsupportedCommand(other)),
    }
}

// ───────────────────────────────────────────────────────────────
// Outbound
// ───────────────────────────────────────────────────────────────

/// Attribute report for the current tilt percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiltAttributeReport {
    pub tilt: TiltPercentage,
}

impl TiltAttributeReport {
    pub const ENCODED_LEN: usize = 4;

    pub fn new(tilt: TiltPercentage) -> Self {
        Self { tilt }
    }

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let [lo, hi] = ATTR_CURRENT_POSITION_TILT_PERCENTAGE.to_le_bytes();
        [lo, hi, ZCL_TYPE_U8, self.tilt.get()]
    }
}
