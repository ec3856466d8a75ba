use core::fmt;

use crate::slice::SliceId;

/// Error type for complementary PWM construction and pin handling.
///
/// Out-of-range duty cycles, dead-times and frequencies are not errors: they
/// are clamped, and the value actually programmed is reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The pin is odd or above 28, so it cannot be channel A of a slice
    InvalidPin(u8),
    /// Another driver already owns the slice behind this pin pair
    ResourceConflict(SliceId),
    /// A driver is bound to its pin pair for its whole lifetime
    PinReassignment {
        /// Pin the driver is bound to
        current: u8,
        /// Pin that was asked for
        requested: u8,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPin(pin) => write!(
                f,
                "gpio{} cannot drive channel A (pin must be even and at most 28)",
                pin
            ),
            Error::ResourceConflict(id) => {
                write!(f, "pwm slice {} is already in use", id.num())
            }
            Error::PinReassignment { current, requested } => write!(
                f,
                "driver is bound to gpio{}, cannot move it to gpio{}",
                current, requested
            ),
        }
    }
}
