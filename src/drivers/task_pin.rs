//! Core-pinned thread spawning for the ESP32 dual-core.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a specific CPU core with explicit priority
//! and stack size. On non-ESP targets, falls back to plain thread spawn.
//!
//! # ESP-IDF Threading Model
//!
//! ESP-IDF implements `std::thread` via pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread. This means the config→spawn pair must not be
//! interleaved with other thread creation on the same thread.
//!
//! Unlike a bare `thread::spawn`, creation failure is returned as
//! [`SpawnError::OutOfResources`]: a motion task that cannot be created
//! drops the request, it must not take the firmware down.

use log::{info, warn};

use crate::app::ports::{SpawnError, TaskFn, TaskSpawner};

/// CPU core identifiers for the ESP32 dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU) — protocol stacks (Zigbee, console).
    Pro = 0,
    /// Core 1 (APP_CPU) — application / motion logic.
    App = 1,
}

/// Spawn a thread pinned to a specific core with explicit priority and stack.
///
/// The `name` parameter must be a null-terminated string (e.g. `"console\0"`).
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<std::thread::JoinHandle<()>, SpawnError> {
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as i32;
        cfg.thread_name = name.as_ptr() as *const _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            warn!("esp_pthread_set_cfg failed: {ret}");
            return Err(SpawnError::OutOfResources);
        }
    }

    let display_name = name.trim_end_matches('\0');
    info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name, core, priority, stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
        .map_err(|e| {
            warn!("Thread '{}' creation failed: {}", display_name, e);
            SpawnError::OutOfResources
        })
}

/// Simulation fallback — ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<std::thread::JoinHandle<()>, SpawnError> {
    let display_name = name.trim_end_matches('\0');
    info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        display_name, stack_kb
    );

    // Host threads need more headroom than the FreeRTOS budget (formatting, test harness).
    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size((stack_kb * 1024).max(64 * 1024))
        .spawn(f)
        .map_err(|e| {
            warn!("Thread '{}' creation failed: {}", display_name, e);
            SpawnError::OutOfResources
        })
}

// ───────────────────────────────────────────────────────────────
// TaskSpawner adapter
// ───────────────────────────────────────────────────────────────

/// [`TaskSpawner`] that runs each task on a detached, core-pinned thread.
#[derive(Debug, Clone, Copy)]
pub struct ThreadSpawner {
    core: Core,
    priority: u8,
    stack_kb: usize,
}

impl ThreadSpawner {
    pub fn new(core: Core, priority: u8, stack_kb: usize) -> Self {
        Self {
            core,
            priority,
            stack_kb,
        }
    }
}

impl TaskSpawner for ThreadSpawner {
    fn spawn(&self, name: &'static str, task: TaskFn) -> Result<(), SpawnError> {
        // Detached: the task signals completion through the motion slot.
        spawn_on_core(self.core, self.priority, self.stack_kb, name, task).map(|_| ())
    }
}
