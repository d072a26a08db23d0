//! Shade motor driver (two-input H-bridge, e.g. DRV8871 / L9110).
//!
//! | IN1 | IN2 | Motor                 |
//! |-----|-----|-----------------------|
//! |  1  |  0  | forward (towards 100%)|
//! |  0  |  1  | backward (towards 0%) |
//! |  0  |  0  | coast / stopped       |
//!
//! Generic over `embedded-hal` [`OutputPin`]s so the same driver runs on
//! ESP-IDF `PinDriver`s and on host mock pins.
//!
//! ## Safety contract
//!
//! Both inputs high (hard brake) is never produced: the inactive leg is
//! released before the active leg is asserted.  Pin errors are only
//! logged since the motor port has no error path.

use std::sync::{Mutex, PoisonError};

use embedded_hal::digital::{Error as _, OutputPin};
use log::warn;

use crate::app::ports::MotorPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Stopped,
    Forward,
    Backward,
}

struct Pins<A, B> {
    in1: A,
    in2: B,
    state: MotorState,
}

pub struct HBridgeMotor<A, B> {
    pins: Mutex<Pins<A, B>>,
}

impl<A: OutputPin, B: OutputPin> HBridgeMotor<A, B> {
    /// Take ownership of both inputs and drive them low.
    pub fn new(in1: A, in2: B) -> Self {
        let motor = Self {
            pins: Mutex::new(Pins {
                in1,
                in2,
                state: MotorState::Stopped,
            }),
        };
        motor.drive(MotorState::Stopped);
        motor
    }

    pub fn state(&self) -> MotorState {
        self.pins.lock().unwrap_or_else(PoisonError::into_inner).state
    }

    fn drive(&self, target: MotorState) {
        let mut p = self.pins.lock().unwrap_or_else(PoisonError::into_inner);
        let (r1, r2) = match target {
            MotorState::Forward => {
                let r2 = p.in2.set_low().map_err(|e| e.kind());
                (p.in1.set_high().map_err(|e| e.kind()), r2)
            }
            MotorState::Backward => {
                let r1 = p.in1.set_low().map_err(|e| e.kind());
                (r1, p.in2.set_high().map_err(|e| e.kind()))
            }
            MotorState::Stopped => (
                p.in1.set_low().map_err(|e| e.kind()),
                p.in2.set_low().map_err(|e| e.kind()),
            ),
        };
        if let Err(kind) = r1.and(r2) {
            warn!("H-bridge: pin write failed ({:?}) driving {:?}", kind, target);
        }
        p.state = target;
    }
}

impl<A, B> MotorPort for HBridgeMotor<A, B>
where
    A: OutputPin + Send,
    B: OutputPin + Send,
{
    fn forward(&self) {
        self.drive(MotorState::Forward);
    }

    fn backward(&self) {
        self.drive(MotorState::Backward);
    }

    fn stop(&self) {
        self.drive(MotorState::Stopped);
    }
}
