//! Shade state and position model.
//!
//! [`ShadeState`] is the discrete direction state the controller reports;
//! [`TiltPercentage`] is the dead-reckoned position.  Both are small `Copy`
//! values so they can live in atomics shared with the motion task.

use core::fmt;

/// Discrete direction state of the covering.
///
/// Not persisted — always [`ShadeState::Idle`] after a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ShadeState {
    /// Up / open.
    Opening = 0,
    /// Down / close.
    Closing = 1,
    /// Stopped.
    #[default]
    Idle = 2,
}

impl ShadeState {
    /// Convert a raw discriminant back to `ShadeState`.
    /// Unknown values map to `Idle` (the safe rest state).
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Opening,
            1 => Self::Closing,
            2 => Self::Idle,
            _ => {
                debug_assert!(false, "invalid shade state: {raw}");
                Self::Idle
            }
        }
    }
}

/// Covering position between the two mechanical extremes, always in `0..=100`.
///
/// The inner value can only be built through the clamping constructors, so
/// holding a `TiltPercentage` is proof the bound holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TiltPercentage(u8);

impl TiltPercentage {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);

    /// Exact constructor: `None` when `value > 100`.
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Clamp any integer into `0..=100`.
    pub fn clamped(value: i32) -> Self {
        Self(value.clamp(0, i32::from(Self::MAX.0)) as u8)
    }

    /// Raw percentage.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Signed distance from `self` to `target`.
    pub fn delta_to(self, target: Self) -> i32 {
        i32::from(target.0) - i32::from(self.0)
    }
}

impl From<u8> for TiltPercentage {
    /// Saturating conversion: anything above 100 becomes 100.
    fn from(value: u8) -> Self {
        Self(value.min(Self::MAX.0))
    }
}

impl From<TiltPercentage> for u8 {
    fn from(value: TiltPercentage) -> Self {
        value.0
    }
}

impl fmt::Display for TiltPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
