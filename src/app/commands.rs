//! Inbound commands to the shade controller.
//!
//! These represent actions requested by the outside world (the Zigbee
//! window-covering cluster or the serial console) that the
//! [`ShadeController`](super::service::ShadeController) interprets and acts upon.

/// Commands that external adapters can send into the controller core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadeCommand {
    /// Up / open.  Fires the open callback; does not drive the motor.
    Open,

    /// Down / close.  Fires the close callback; does not drive the motor.
    Close,

    /// Stop.  Fires the stop callback; a running tilt move is left alone.
    Stop,

    /// Go to tilt percentage.  Values above 100 are clamped.
    GoToTiltPercentage(u8),
}
