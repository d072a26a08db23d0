//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the rules of the tilt shade: the direction state,
//! the dead-reckoned position estimate and the single-move preemption
//! protocol.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod motion;
pub mod ports;
pub mod service;
pub mod state;
