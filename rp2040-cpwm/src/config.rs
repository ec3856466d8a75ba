//! Initial settings for a complementary pair

use fugit::{HertzU32, NanosDurationU32};

/// A struct holding the configuration for a complementary PWM pair.
///
/// The `Default` implementation implements the following values:
/// ```ignore
/// ComplementaryConfig {
///    frequency: HertzU32::from_raw(10_000),
///    duty: 0.5,
///    dead_time: NanosDurationU32::from_ticks(1_000),
///    start_immediately: false,
///}
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplementaryConfig {
    /// Output frequency of each channel.
    pub frequency: HertzU32,

    /// Fraction of the period channel A is high, clamped into `0.0..=1.0`.
    pub duty: f32,

    /// Non-overlap window between the channels, rounded up to whole counter ticks.
    pub dead_time: NanosDurationU32,

    /// Enable the slice as part of construction instead of waiting for
    /// [`start`](crate::ComplementaryPwm::start).
    pub start_immediately: bool,
}

impl ComplementaryConfig {
    /// Create a new instance of ComplementaryConfig, left stopped after construction
    pub const fn new(frequency: HertzU32, duty: f32, dead_time: NanosDurationU32) -> Self {
        ComplementaryConfig {
            frequency,
            duty,
            dead_time,
            start_immediately: false,
        }
    }

    /// Same configuration, but start the slice as soon as it is programmed
    pub const fn started(mut self) -> Self {
        self.start_immediately = true;
        self
    }
}

impl Default for ComplementaryConfig {
    fn default() -> Self {
        Self::new(
            HertzU32::from_raw(10_000),
            0.5,
            NanosDurationU32::from_ticks(1_000),
        )
    }
}
