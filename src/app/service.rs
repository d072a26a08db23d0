//! Shade controller — the hexagonal core.
//!
//! [`ShadeController`] owns the discrete direction state, the transition
//! callbacks and the [`MotionTaskManager`].  It exposes a hardware-agnostic
//! API; every side effect goes through a port injected at construction or
//! registration time.
//!
//! ```text
//!  ZclMessage ──decode──▶ ┌────────────────────────┐ ──▶ MotorPort
//!                         │    ShadeController      │ ──▶ ReportSink
//!  ShadeCommand ────────▶ │  state · callbacks      │ ──▶ PositionStore
//!                         │  MotionTaskManager      │
//!                         └────────────────────────┘
//! ```
//!
//! All mutating requests are serialised by an internal lock, so the
//! controller can be shared between the protocol callback context and the
//! console without a second move ever racing the preemption handshake.

use core::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use crate::config::ShadeConfig;
use crate::error::Result;
use crate::protocol::{self, ZclMessage};

use super::commands::ShadeCommand;
use super::motion::{Direction, MotionTaskManager, MoveStatus};
use super::ports::{Clock, MotorPort, PositionStore, ReportSink, StoreError, TaskSpawner};
use super::state::{ShadeState, TiltPercentage};

/// User-visible state transition hook.
pub type TransitionCallback = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct TransitionCallbacks {
    on_open: Option<TransitionCallback>,
    on_close: Option<TransitionCallback>,
    on_stop: Option<TransitionCallback>,
}

// ───────────────────────────────────────────────────────────────
// ShadeController
// ───────────────────────────────────────────────────────────────

/// Façade over the motion manager plus the discrete state and callbacks.
pub struct ShadeController {
    motion: MotionTaskManager,
    state: AtomicU8,
    callbacks: TransitionCallbacks,
    command_lock: Mutex<()>,
}

impl ShadeController {
    /// Build the controller and restore the last settled position.
    ///
    /// A missing or unreadable record starts the shade at 0%.
    pub fn new(
        config: ShadeConfig,
        store: Arc<dyn PositionStore>,
        clock: Arc<dyn Clock>,
        spawner: Arc<dyn TaskSpawner>,
    ) -> Self {
        let initial = match store.load() {
            Ok(tilt) => {
                info!("Restored tilt percentage {}", tilt);
                tilt
            }
            Err(StoreError::NotFound) => {
                info!("No stored tilt percentage, starting at 0%");
                TiltPercentage::MIN
            }
            Err(e) => {
                warn!("Failed to load tilt percentage ({}), starting at 0%", e);
                TiltPercentage::MIN
            }
        };

        Self {
            motion: MotionTaskManager::new(config, initial, store, clock, spawner),
            state: AtomicU8::new(ShadeState::Idle as u8),
            callbacks: TransitionCallbacks::default(),
            command_lock: Mutex::new(()),
        }
    }

    // ── Registration ──────────────────────────────────────────

    pub fn register_motor(&mut self, motor: Arc<dyn MotorPort>) {
        self.motion.set_motor(motor);
    }

    pub fn register_reporter(&mut self, reporter: Arc<dyn ReportSink>) {
        self.motion.set_reporter(reporter);
    }

    pub fn on_shade_open(&mut self, f: impl Fn() + Send + Sync + 'static) {
        self.callbacks.on_open = Some(Box::new(f));
    }

    pub fn on_shade_close(&mut self, f: impl Fn() + Send + Sync + 'static) {
        self.callbacks.on_close = Some(Box::new(f));
    }

    pub fn on_shade_stop(&mut self, f: impl Fn() + Send + Sync + 'static) {
        self.callbacks.on_stop = Some(Box::new(f));
    }

    /// Change the motor time constant.  Applies to the next move.
    pub fn set_ms_per_tilt_percent(&mut self, ms: u32) {
        info!("ms per tilt percent set to {}", ms);
        self.motion.set_ms_per_tilt_percent(ms);
    }

    // ── Commands ──────────────────────────────────────────────

    /// Set the direction state and fire its transition callback.
    ///
    /// Notification only: no motion is started, and `Idle` does not halt
    /// a move in flight.
    pub fn set_state(&self, state: ShadeState) {
        self.state.store(state as u8, Ordering::Release);
        let (callback, name) = match state {
            ShadeState::Opening => (&self.callbacks.on_open, "open"),
            ShadeState::Closing => (&self.callbacks.on_close, "close"),
            ShadeState::Idle => (&self.callbacks.on_stop, "stop"),
        };
        match callback {
            Some(f) => f(),
            None => warn!("No {} callback registered", name),
        }
    }

    /// Go to `target` percent (clamped to 100), preempting any move in flight.
    ///
    /// A move in flight is retired even when its estimate already equals
    /// `target`.  Once a new drive starts, the direction state follows its
    /// direction; an idle shade at `target` changes nothing.  Transition
    /// callbacks are not fired here.
    pub fn set_tilt_percentage(&self, target: u8) -> Result<MoveStatus> {
        let _guard = self
            .command_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        self.motion.check_ready()?;
        let target = TiltPercentage::from(target);
        info!("Tilt {} -> {}", self.motion.current_tilt(), target);

        let status = self.motion.start_move(target)?;
        if let MoveStatus::Started(request) = &status {
            let state = match request.direction {
                Direction::Forward => ShadeState::Opening,
                Direction::Backward => ShadeState::Closing,
            };
            self.state.store(state as u8, Ordering::Release);
        }
        Ok(status)
    }

    /// Stop any move in flight without persisting its partial position.
    pub fn halt(&self) -> Result<bool> {
        let _guard = self
            .command_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let halted = self.motion.halt()?;
        if halted {
            info!("Move halted at {}", self.motion.current_tilt());
        }
        Ok(halted)
    }

    /// Declare the shade to be at `value` percent without moving it.
    ///
    /// Halts any move first, then stores and reports the new position.
    pub fn calibrate_tilt_percentage(&self, value: u8) -> Result<()> {
        let _guard = self
            .command_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.motion.halt()?;
        let tilt = TiltPercentage::from(value);
        self.motion.set_rest_tilt(tilt)?;
        info!("Calibrated tilt percentage to {}", tilt);
        self.motion.report_current();
        Ok(())
    }

    /// The protocol link came (back) up: report the current estimate once.
    pub fn on_connected(&self) {
        self.motion.report_current();
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Apply one decoded command.  Failures are logged, never propagated.
    pub fn handle_command(&self, cmd: ShadeCommand) {
        match cmd {
            ShadeCommand::Open => self.set_state(ShadeState::Opening),
            ShadeCommand::Close => self.set_state(ShadeState::Closing),
            ShadeCommand::Stop => self.set_state(ShadeState::Idle),
            ShadeCommand::GoToTiltPercentage(value) => {
                if let Err(e) = self.set_tilt_percentage(value) {
                    warn!("Go to tilt {} ignored: {}", value, e);
                }
            }
        }
    }

    /// Decode and apply one inbound protocol message.
    pub fn handle_message(&self, msg: &ZclMessage) {
        match protocol::decode(msg) {
            Ok(cmd) => self.handle_command(cmd),
            Err(e) => warn!(
                "Ignoring message (cluster 0x{:04x}, cmd 0x{:02x}): {}",
                msg.cluster_id, msg.command_id, e
            ),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Live tilt estimate; may be mid-move.
    pub fn get_tilt_percentage(&self) -> TiltPercentage {
        self.motion.current_tilt()
    }

    pub fn state(&self) -> ShadeState {
        ShadeState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_moving(&self) -> bool {
        self.motion.is_moving()
    }

    pub fn config(&self) -> &ShadeConfig {
        self.motion.config()
    }
}
