//! Motion task manager — one timed, cancellable drive at a time.
//!
//! ```text
//!  IDLE_NO_TASK ──start_move──▶ DRIVING ──duration elapsed──▶ SETTLED   (stop, report, save)
//!                                  │
//!                                  └──cancel flag observed──▶ CANCELLED (stop, no save)
//! ```
//!
//! Position is dead-reckoned: while a move runs, the background task
//! recomputes the live estimate from elapsed time on every tick.  A new
//! request never starts a drive until the previous one has fully retired
//! (motor stopped, slot released), so the motor never sees two direction
//! commands without an intervening stop.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::config::ShadeConfig;
use crate::error::{Error, Result};

use super::ports::{Clock, MotorPort, PositionStore, ReportSink, TaskSpawner};
use super::state::TiltPercentage;

/// Name given to the background drive task.
const MOTION_TASK_NAME: &str = "shade-motion\0";

// ───────────────────────────────────────────────────────────────
// Motion slot
// ───────────────────────────────────────────────────────────────

/// Single-owner cell guarding the one allowed in-flight move.
///
/// `active` stands in for the task handle, `cancel` is the cooperative
/// cancellation flag.  The requester is the only one that acquires; the
/// running task is the only one that releases.
#[derive(Debug, Default)]
pub struct MotionSlot {
    active: AtomicBool,
    cancel: AtomicBool,
}

impl MotionSlot {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            cancel: AtomicBool::new(false),
        }
    }

    /// Claim the slot for a new move.  Returns `false` if a move is still active.
    pub fn try_acquire(&self) -> bool {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.cancel.store(false, Ordering::Release);
        true
    }

    /// Ask the running move to stop at its next tick.
    pub fn signal_cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Retire the move: clears the cancel flag, then frees the slot.
    pub fn release(&self) {
        self.cancel.store(false, Ordering::Release);
        self.active.store(false, Ordering::Release);
    }
}

// ───────────────────────────────────────────────────────────────
// Move request
// ───────────────────────────────────────────────────────────────

/// Motor direction of a move.  There is no "zero" direction: a request
/// with no distance to travel is never created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards 100%.
    Forward,
    /// Towards 0%.
    Backward,
}

impl Direction {
    pub fn sign(self) -> i32 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// One planned move, owned by the drive task for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub start: TiltPercentage,
    pub target: TiltPercentage,
    pub direction: Direction,
    /// `|target - start| * ms_per_tilt_percent`.
    pub duration_ms: u64,
    ms_per_tilt_percent: u32,
}

impl MoveRequest {
    /// Plan a move, or `None` when there is nothing to do
    /// (`start == target` or an unset time constant).
    pub fn plan(start: TiltPercentage, target: TiltPercentage, ms_per_tilt_percent: u32) -> Option<Self> {
        let delta = start.delta_to(target);
        if delta == 0 || ms_per_tilt_percent == 0 {
            return None;
        }
        let direction = if delta > 0 {
            Direction::Forward
        } else {
            Direction::Backward
        };
        Some(Self {
            start,
            target,
            direction,
            duration_ms: u64::from(delta.unsigned_abs()) * u64::from(ms_per_tilt_percent),
            ms_per_tilt_percent,
        })
    }

    /// Percentage points between start and target.
    pub fn distance(&self) -> u32 {
        self.start.delta_to(self.target).unsigned_abs()
    }

    /// Dead-reckoned position after `elapsed_ms` of driving.
    ///
    /// Never passes the target, even when a tick lands past `duration_ms`.
    pub fn estimate_at(&self, elapsed_ms: u64) -> TiltPercentage {
        let steps = (elapsed_ms / u64::from(self.ms_per_tilt_percent)).min(u64::from(self.distance()));
        TiltPercentage::clamped(i32::from(self.start.get()) + self.direction.sign() * steps as i32)
    }
}

// ───────────────────────────────────────────────────────────────
// Drive task
// ───────────────────────────────────────────────────────────────

/// How a drive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveOutcome {
    /// Full duration elapsed: position snapped to target, reported and stored.
    Settled,
    /// Cancel flag observed: motor stopped, partial estimate kept, nothing stored.
    Cancelled,
}

/// Everything the background task needs, cloned out of the manager at spawn time.
struct DriveTask {
    request: MoveRequest,
    tick_interval_ms: u32,
    slot: Arc<MotionSlot>,
    tilt: Arc<AtomicU8>,
    clock: Arc<dyn Clock>,
    motor: Arc<dyn MotorPort>,
    store: Arc<dyn PositionStore>,
    reporter: Option<Arc<dyn ReportSink>>,
}

impl DriveTask {
    fn run(self) -> MoveOutcome {
        let req = self.request;
        match req.direction {
            Direction::Forward => self.motor.forward(),
            Direction::Backward => self.motor.backward(),
        }
        let started_at = self.clock.now_ms();
        debug!(
            "Motion: {} -> {} ({:?}, {} ms)",
            req.start, req.target, req.direction, req.duration_ms
        );

        loop {
            if self.slot.cancel_requested() {
                self.motor.stop();
                info!(
                    "Motion: cancelled at {} (target was {})",
                    TiltPercentage::from(self.tilt.load(Ordering::Acquire)),
                    req.target
                );
                self.slot.release();
                return MoveOutcome::Cancelled;
            }

            let elapsed = self.clock.now_ms().saturating_sub(started_at);
            if elapsed >= req.duration_ms {
                break;
            }
            self.tilt
                .store(req.estimate_at(elapsed).get(), Ordering::Release);
            self.clock.sleep_ms(self.tick_interval_ms);
        }

        self.motor.stop();
        self.tilt.store(req.target.get(), Ordering::Release);
        info!("Motion: settled at {}", req.target);
        match &self.reporter {
            Some(reporter) => reporter.report_tilt(req.target),
            None => debug!("Motion: no report sink registered"),
        }
        if let Err(e) = self.store.save(req.target) {
            warn!("Motion: failed to persist {}: {}", req.target, e);
        }
        self.slot.release();
        MoveOutcome::Settled
    }
}

// ───────────────────────────────────────────────────────────────
// Manager
// ───────────────────────────────────────────────────────────────

/// Result of an accepted tilt request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// A drive task was created for this request.
    Started(MoveRequest),
    /// Already at the requested position; nothing was touched.
    AtTarget,
}

/// Owns the motion slot and the live tilt estimate.
pub struct MotionTaskManager {
    config: ShadeConfig,
    slot: Arc<MotionSlot>,
    tilt: Arc<AtomicU8>,
    clock: Arc<dyn Clock>,
    spawner: Arc<dyn TaskSpawner>,
    store: Arc<dyn PositionStore>,
    motor: Option<Arc<dyn MotorPort>>,
    reporter: Option<Arc<dyn ReportSink>>,
}

impl MotionTaskManager {
    pub fn new(
        config: ShadeConfig,
        initial: TiltPercentage,
        store: Arc<dyn PositionStore>,
        clock: Arc<dyn Clock>,
        spawner: Arc<dyn TaskSpawner>,
    ) -> Self {
        Self {
            config,
            slot: Arc::new(MotionSlot::new()),
            tilt: Arc::new(AtomicU8::new(initial.get())),
            clock,
            spawner,
            store,
            motor: None,
            reporter: None,
        }
    }

    // ── Wiring ────────────────────────────────────────────────

    pub fn set_motor(&mut self, motor: Arc<dyn MotorPort>) {
        self.motor = Some(motor);
    }

    pub fn set_reporter(&mut self, reporter: Arc<dyn ReportSink>) {
        self.reporter = Some(reporter);
    }

    pub fn set_ms_per_tilt_percent(&mut self, ms: u32) {
        self.config.ms_per_tilt_percent = ms;
    }

    pub fn config(&self) -> &ShadeConfig {
        &self.config
    }

    // ── Queries ───────────────────────────────────────────────

    /// Live estimate; may be mid-move.
    pub fn current_tilt(&self) -> TiltPercentage {
        TiltPercentage::from(self.tilt.load(Ordering::Acquire))
    }

    pub fn is_moving(&self) -> bool {
        self.slot.is_active()
    }

    /// Fails when a tilt command could not possibly run.
    pub fn check_ready(&self) -> Result<()> {
        if self.motor.is_none() {
            return Err(Error::Config("no motor callbacks registered"));
        }
        self.config.validate()
    }

    // ── Commands ──────────────────────────────────────────────

    /// Start a timed drive to `target`, preempting any move in flight.
    pub fn start_move(&self, target: TiltPercentage) -> Result<MoveStatus> {
        self.check_ready()?;
        let Some(motor) = self.motor.clone() else {
            return Err(Error::Config("no motor callbacks registered"));
        };
        // A move in flight is always retired, even one passing through `target`.
        if !self.is_moving() && self.current_tilt() == target {
            return Ok(MoveStatus::AtTarget);
        }

        self.retire_active()?;

        // The retired move may have stopped exactly on the new target.
        let start = self.current_tilt();
        let Some(request) = MoveRequest::plan(start, target, self.config.ms_per_tilt_percent) else {
            debug!("Motion: already at {} after retiring previous move", target);
            return Ok(MoveStatus::AtTarget);
        };

        // Requests are serialised by the controller, so the slot is free here
        // unless a second requester bypassed it.
        if !self.slot.try_acquire() {
            warn!("Motion: slot still held after retirement, dropping request");
            return Err(Error::CancelTimeout);
        }

        // The slot is claimed before spawning so the task's own release can
        // never race ahead of the claim.
        let task = DriveTask {
            request,
            tick_interval_ms: self.config.tick_interval_ms,
            slot: Arc::clone(&self.slot),
            tilt: Arc::clone(&self.tilt),
            clock: Arc::clone(&self.clock),
            motor,
            store: Arc::clone(&self.store),
            reporter: self.reporter.clone(),
        };
        if let Err(e) = self.spawner.spawn(
            MOTION_TASK_NAME,
            Box::new(move || {
                let target = task.request.target;
                let outcome = task.run();
                debug!("Motion: drive to {} ended {:?}", target, outcome);
            }),
        ) {
            self.slot.release();
            error!("Motion: failed to create drive task ({}), request dropped", e);
            return Err(e.into());
        }

        Ok(MoveStatus::Started(request))
    }

    /// Cancel the move in flight, if any, and wait for it to retire.
    /// Returns `true` if a move was halted.
    pub fn halt(&self) -> Result<bool> {
        self.retire_active()
    }

    /// Overwrite the rest position.  Only valid while no move is active.
    pub fn set_rest_tilt(&self, tilt: TiltPercentage) -> Result<()> {
        if self.slot.is_active() {
            return Err(Error::Config("cannot set rest position while moving"));
        }
        self.tilt.store(tilt.get(), Ordering::Release);
        self.store.save(tilt)?;
        Ok(())
    }

    /// Push the current estimate to the report sink.
    pub fn report_current(&self) {
        let tilt = self.current_tilt();
        match &self.reporter {
            Some(reporter) => {
                info!("Reporting tilt percentage: {}", tilt);
                reporter.report_tilt(tilt);
            }
            None => warn!("No report sink registered, tilt {} not reported", tilt),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Signal cancel and poll until the running task has released the slot.
    fn retire_active(&self) -> Result<bool> {
        if !self.slot.is_active() {
            return Ok(false);
        }
        self.slot.signal_cancel();

        let poll = self.config.cancel_poll_interval_ms.max(1);
        let mut waited: u32 = 0;
        while self.slot.is_active() {
            if waited >= self.config.cancel_timeout_ms {
                error!(
                    "Motion: previous move did not retire within {} ms",
                    self.config.cancel_timeout_ms
                );
                return Err(Error::CancelTimeout);
            }
            self.clock.sleep_ms(poll);
            waited = waited.saturating_add(poll);
        }
        Ok(true)
    }
}
