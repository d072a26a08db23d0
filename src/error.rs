//! Unified error type for the shade firmware.
//!
//! One `Copy` enum every subsystem converts into, so the dispatch path can
//! log any failure uniformly.  None of these are ever surfaced to the
//! network: the protocol layer only sees "command had no effect".

use core::fmt;

use crate::app::ports::{SpawnError, StoreError};
use crate::protocol::DecodeError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible controller operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Embedding misconfiguration (missing motor, zero time constant, ...).
    Config(&'static str),
    /// The position store failed.
    Store(StoreError),
    /// The motion task could not be created.
    Spawn(SpawnError),
    /// An inbound protocol message could not be mapped to a command.
    Decode(DecodeError),
    /// A running move did not retire within the configured bound.
    CancelTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Spawn(e) => write!(f, "spawn: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::CancelTimeout => write!(f, "previous move did not retire in time"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<SpawnError> for Error {
    fn from(e: SpawnError) -> Self {
        Self::Spawn(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
