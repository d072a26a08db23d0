//! zbShade Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HBridgeMotor   NvsPositionStore   SystemClock   ThreadSpawner │
//! │  (MotorPort)    (PositionStore)    (Clock)       (TaskSpawner) │
//! │  ChannelReportSink (ReportSink)    Console (UART line input)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          ShadeController (pure logic)                  │    │
//! │  │  state · callbacks · MotionTaskManager                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  CMD_CHANNEL ──▶ control loop ──▶ REPORT_CHANNEL               │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
use log::{error, info, warn};

use zbshade::adapters::attribute_sink::ChannelReportSink;
use zbshade::adapters::console::{self, ConsoleCommand};
use zbshade::adapters::log_sink::LogReportSink;
use zbshade::adapters::nvs::NvsPositionStore;
use zbshade::adapters::time::SystemClock;
use zbshade::app::ports::ReportSink;
use zbshade::app::service::ShadeController;
use zbshade::config::ShadeConfig;
use zbshade::drivers::hbridge::HBridgeMotor;
use zbshade::drivers::task_pin::{Core, ThreadSpawner, spawn_on_core};
use zbshade::pins;
use zbshade::protocol::channels::{CMD_CHANNEL, REPORT_CHANNEL};

/// Motor time constant for the stock gearbox, measured end-to-end.
const MS_PER_TILT_PERCENT: u32 = 100;

/// Control loop cadence.
const LOOP_INTERVAL_MS: u32 = 10;

/// Console commands that act on the controller directly (not via the protocol path).
static CONSOLE_CHANNEL: Channel<CriticalSectionRawMutex, ConsoleCommand, 4> = Channel::new();

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  zbShade v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Position store ─────────────────────────────────────
    let store = match NvsPositionStore::new() {
        Ok(s) => s,
        Err(e) => {
            error!("NVS init failed ({}), halting", e);
            return Err(anyhow::anyhow!("NVS init failed: {e}"));
        }
    };

    // ── 3. Motor + controller ─────────────────────────────────
    let config = ShadeConfig::with_ms_per_tilt_percent(MS_PER_TILT_PERCENT);
    config.validate().map_err(|e| anyhow::anyhow!("{e}"))?;

    // SAFETY: pin numbers come from `pins` and are not claimed elsewhere.
    let in1 = PinDriver::output(unsafe { AnyOutputPin::new(pins::MOTOR_IN1_GPIO) })?;
    let in2 = PinDriver::output(unsafe { AnyOutputPin::new(pins::MOTOR_IN2_GPIO) })?;
    let motor = Arc::new(HBridgeMotor::new(in1, in2));

    let clock = Arc::new(SystemClock::new());
    let spawner = Arc::new(ThreadSpawner::new(
        Core::App,
        config.task_priority,
        config.task_stack_kb,
    ));

    let mut shade = ShadeController::new(config, Arc::new(store), clock.clone(), spawner);
    shade.register_motor(motor);
    shade.register_reporter(Arc::new(ChannelReportSink::new()));
    shade.on_shade_open(|| info!("Shade: open"));
    shade.on_shade_close(|| info!("Shade: close"));
    shade.on_shade_stop(|| info!("Shade: stop"));

    // ── 4. Console reader ─────────────────────────────────────
    let console_clock = clock.clone();
    spawn_on_core(Core::Pro, 3, 4, "console\0", move || {
        loop {
            console::run(std::io::stdin().lock(), console_clock.as_ref(), |cmd| match cmd {
                ConsoleCommand::Message(msg) => {
                    if CMD_CHANNEL.try_send(msg).is_err() {
                        warn!("Console: command channel full");
                    }
                }
                other => {
                    if CONSOLE_CHANNEL.try_send(other).is_err() {
                        warn!("Console: console channel full");
                    }
                }
            });
            FreeRtos::delay_ms(LOOP_INTERVAL_MS);
        }
    })
    .map_err(|e| anyhow::anyhow!("console task: {e}"))?;

    info!("{}", console::HELP);
    let bench_sink = LogReportSink::new();
    shade.on_connected();

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        while let Ok(msg) = CMD_CHANNEL.try_receive() {
            shade.handle_message(&msg);
        }

        while let Ok(cmd) = CONSOLE_CHANNEL.try_receive() {
            match cmd {
                ConsoleCommand::Connected => shade.on_connected(),
                ConsoleCommand::Calibrate(v) => {
                    if let Err(e) = shade.calibrate_tilt_percentage(v) {
                        warn!("Calibrate failed: {}", e);
                    }
                }
                ConsoleCommand::Speed(ms) => {
                    if shade.is_moving() {
                        warn!("Speed change applies to the next move");
                    }
                    shade.set_ms_per_tilt_percent(ms);
                }
                ConsoleCommand::ShowConfig => match serde_json::to_string(shade.config()) {
                    Ok(json) => info!("{}", json),
                    Err(e) => warn!("Config serialise failed: {}", e),
                },
                ConsoleCommand::Help => info!("{}", console::HELP),
                // Routed to CMD_CHANNEL by the reader.
                ConsoleCommand::Message(msg) => shade.handle_message(&msg),
            }
        }

        // Stand-in for the Zigbee attribute report path.
        while let Ok(report) = REPORT_CHANNEL.try_receive() {
            bench_sink.report_tilt(report.tilt);
        }

        FreeRtos::delay_ms(LOOP_INTERVAL_MS);
    }
}
