//! Actuator drivers and task helpers.

pub mod hbridge;
pub mod task_pin;
