//! Complementary PWM with programmable dead-time for the RP2040 microcontroller
//!
//! Drives the two pins of one PWM slice as a phase inverted pair for gate
//! drivers of half and full bridges. The slice counts in phase-correct mode,
//! channel B is inverted and delayed against channel A by a dead-time, so the
//! two switches of a leg are never on at the same time.
//!
//! All register access goes through [`reg::RegisterIo`]; use [`reg::Mmio`] on
//! the chip.
//!
//! NOTE This crate is still under active development. This API will remain volatile until 1.0.0

#![warn(missing_docs)]
#![cfg_attr(not(test), no_std)]

pub mod claims;
pub mod complementary;
pub mod config;
mod error;
pub mod power;
pub mod reg;
#[cfg(test)]
mod sim;
pub mod slice;
pub mod timing;
pub mod waveform;

pub use complementary::{ComplementaryPwm, State};
pub use config::ComplementaryConfig;
pub use error::Error;
