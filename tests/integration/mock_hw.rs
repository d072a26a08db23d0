//! Mock adapters for integration tests.
//!
//! Records every motor call and store write so tests can assert on the
//! full command history without touching real GPIO or flash.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use zbshade::app::ports::{
    Clock, MotorPort, PositionStore, ReportSink, SpawnError, StoreError, TaskFn, TaskSpawner,
};
use zbshade::app::service::ShadeController;
use zbshade::app::state::TiltPercentage;
use zbshade::config::ShadeConfig;
use zbshade::drivers::task_pin::{Core, ThreadSpawner};

// ── Motor call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCall {
    Forward,
    Backward,
    Stop,
}

#[derive(Default)]
pub struct MockMotor {
    calls: Mutex<Vec<MotorCall>>,
}

#[allow(dead_code)]
impl MockMotor {
    pub fn calls(&self) -> Vec<MotorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// True when every direction command is preceded by a stop (or is first).
    pub fn stop_between_directions(&self) -> bool {
        let calls = self.calls();
        let mut driving = false;
        for c in calls {
            match c {
                MotorCall::Forward | MotorCall::Backward => {
                    if driving {
                        return false;
                    }
                    driving = true;
                }
                MotorCall::Stop => driving = false,
            }
        }
        true
    }
}

impl MotorPort for MockMotor {
    fn forward(&self) {
        self.calls.lock().unwrap().push(MotorCall::Forward);
    }
    fn backward(&self) {
        self.calls.lock().unwrap().push(MotorCall::Backward);
    }
    fn stop(&self) {
        self.calls.lock().unwrap().push(MotorCall::Stop);
    }
}

// ── MemStore ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MemStore {
    value: Mutex<Option<TiltPercentage>>,
    writes: Mutex<Vec<TiltPercentage>>,
    load_error: Mutex<Option<StoreError>>,
    fail_saves: AtomicBool,
}

#[allow(dead_code)]
impl MemStore {
    pub fn with(tilt: u8) -> Self {
        let s = Self::default();
        *s.value.lock().unwrap() = Some(TiltPercentage::from(tilt));
        s
    }

    pub fn failing_load(err: StoreError) -> Self {
        let s = Self::default();
        *s.load_error.lock().unwrap() = Some(err);
        s
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<TiltPercentage> {
        self.writes.lock().unwrap().clone()
    }
}

impl PositionStore for MemStore {
    fn load(&self) -> Result<TiltPercentage, StoreError> {
        if let Some(e) = *self.load_error.lock().unwrap() {
            return Err(e);
        }
        self.value.lock().unwrap().ok_or(StoreError::NotFound)
    }

    fn save(&self, tilt: TiltPercentage) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::IoError);
        }
        *self.value.lock().unwrap() = Some(tilt);
        self.writes.lock().unwrap().push(tilt);
        Ok(())
    }
}

// ── Reporter ──────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<TiltPercentage>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<TiltPercentage> {
        self.reports.lock().unwrap().clone()
    }
}

impl ReportSink for RecordingReporter {
    fn report_tilt(&self, tilt: TiltPercentage) {
        self.reports.lock().unwrap().push(tilt);
    }
}

// ── SimClock ──────────────────────────────────────────────────

/// Virtual time.  `sleep_ms` advances the clock by `ms` and yields for a
/// real millisecond so other threads make progress.
#[derive(Default)]
pub struct SimClock {
    now: AtomicU64,
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep_ms(&self, ms: u32) {
        self.now.fetch_add(u64::from(ms), Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(1));
    }
}

// ── Spawners ──────────────────────────────────────────────────

/// Runs the drive loop to completion inside `spawn`, on the caller's thread.
pub struct InlineSpawner;

impl TaskSpawner for InlineSpawner {
    fn spawn(&self, _name: &'static str, task: TaskFn) -> Result<(), SpawnError> {
        task();
        Ok(())
    }
}

/// Always reports resource exhaustion.
pub struct FailingSpawner;

impl TaskSpawner for FailingSpawner {
    fn spawn(&self, _name: &'static str, _task: TaskFn) -> Result<(), SpawnError> {
        Err(SpawnError::OutOfResources)
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub const MS_PER_PERCENT: u32 = 10;

/// A controller wired to mocks, keeping handles to each mock.
pub struct Rig {
    pub shade: ShadeController,
    pub motor: Arc<MockMotor>,
    pub store: Arc<MemStore>,
    pub reporter: Arc<RecordingReporter>,
    pub clock: Arc<SimClock>,
}

#[allow(dead_code)]
impl Rig {
    /// Synchronous moves: every `set_tilt_percentage` settles before returning.
    pub fn inline(store: MemStore) -> Self {
        Self::build(store, Arc::new(InlineSpawner))
    }

    /// Moves run on a real background thread against virtual time.
    pub fn threaded(store: MemStore) -> Self {
        Self::build(store, Arc::new(ThreadSpawner::new(Core::App, 5, 4)))
    }

    pub fn build(store: MemStore, spawner: Arc<dyn TaskSpawner>) -> Self {
        let motor = Arc::new(MockMotor::default());
        let store = Arc::new(store);
        let reporter = Arc::new(RecordingReporter::default());
        let clock = Arc::new(SimClock::default());
        let mut shade = ShadeController::new(
            ShadeConfig::with_ms_per_tilt_percent(MS_PER_PERCENT),
            store.clone(),
            clock.clone(),
            spawner,
        );
        shade.register_motor(motor.clone());
        shade.register_reporter(reporter.clone());
        Self {
            shade,
            motor,
            store,
            reporter,
            clock,
        }
    }

    /// Block (real time) until the current move has retired.
    pub fn wait_idle(&self) {
        assert!(
            wait_until(Duration::from_secs(10), || !self.shade.is_moving()),
            "move did not settle"
        );
    }
}

/// Poll `cond` every millisecond until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    cond()
}

pub fn pct(v: u8) -> TiltPercentage {
    TiltPercentage::from(v)
}
