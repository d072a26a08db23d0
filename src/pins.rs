//! GPIO pin assignments for the shade controller board.
//!
//! Single source of truth — drivers reference this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Tilt motor driver (two-input H-bridge)
// ---------------------------------------------------------------------------

/// Digital output: H-bridge IN1 (HIGH = drive towards 100%).
pub const MOTOR_IN1_GPIO: i32 = 4;
/// Digital output: H-bridge IN2 (HIGH = drive towards 0%).
pub const MOTOR_IN2_GPIO: i32 = 5;
