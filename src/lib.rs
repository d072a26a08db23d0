//! zbShade firmware library.
//!
//! Exposes the pure-logic modules for integration testing and the
//! firmware binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod protocol;

// The ESP-IDF backends live behind cfg attributes inside these modules;
// on the host they fall back to simulation.
pub mod adapters;
pub mod drivers;
