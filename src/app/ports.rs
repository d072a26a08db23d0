//! Port traits — the hexagonal boundary between the shade core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ShadeController (domain)
//! ```
//!
//! Driven adapters (motor, store, reporter, clock, task spawner) implement
//! these traits.  The [`ShadeController`](super::service::ShadeController)
//! holds them as shared trait objects because the motion task runs on its
//! own thread and needs its own handle to each port.
//!
//! Every port takes `&self`: implementations that keep mutable state use
//! interior mutability and must be `Send + Sync`.

use super::state::TiltPercentage;

// ───────────────────────────────────────────────────────────────
// Motor port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Physical actuation: three zero-argument direction commands.
///
/// Each call asserts a direction and returns promptly; the core never
/// expects these to block for the duration of a move.
pub trait MotorPort: Send + Sync {
    /// Drive towards 100%.
    fn forward(&self);

    /// Drive towards 0%.
    fn backward(&self);

    /// De-energise the motor.
    fn stop(&self);
}

// ───────────────────────────────────────────────────────────────
// Position store port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Durable storage of the last settled tilt percentage.
///
/// Read once at controller construction, written once per settled move.
pub trait PositionStore: Send + Sync {
    /// Load the last settled position.
    /// Returns [`StoreError::NotFound`] on first boot.
    fn load(&self) -> Result<TiltPercentage, StoreError>;

    /// Persist a settled position.
    fn save(&self, tilt: TiltPercentage) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Reporting sink (driven adapter: domain → protocol layer)
// ───────────────────────────────────────────────────────────────

/// Publishes the current tilt percentage to the network view.
///
/// Best-effort and non-blocking; there is no error path back to the core.
pub trait ReportSink: Send + Sync {
    fn report_tilt(&self, tilt: TiltPercentage);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source plus the delay primitive used by polling loops.
///
/// Injected so tests can run the drive loop on simulated time.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin (monotonic).
    fn now_ms(&self) -> u64;

    /// Block the calling task for roughly `ms` milliseconds.
    fn sleep_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Task spawner port
// ───────────────────────────────────────────────────────────────

/// Boxed body of a background task.
pub type TaskFn = Box<dyn FnOnce() + Send + 'static>;

/// Creates the background task that runs one drive loop.
pub trait TaskSpawner: Send + Sync {
    /// Start `task` on a new task/thread named `name`.
    ///
    /// On error the task body is dropped without running.
    fn spawn(&self, name: &'static str, task: TaskFn) -> Result<(), SpawnError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`PositionStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No position has been stored yet (first boot).
    NotFound,
    /// Stored record is outside `0..=100` or has the wrong shape.
    Corrupted,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`TaskSpawner::spawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// The scheduler could not allocate the task (stack / TCB exhaustion).
    OutOfResources,
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "position not found"),
            Self::Corrupted => write!(f, "stored position corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for SpawnError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfResources => write!(f, "out of resources"),
        }
    }
}
