//! Start/stop control of a power stage from push buttons
//!
//! [`PowerTransfer`] ties a [`ComplementaryPwm`] gate drive to an indicator
//! LED and to debounced start and stop buttons. Buttons are wired active-low
//! against a pull-up, so a press is a falling edge.
//!
//! ```no_run
//! # use core::convert::Infallible;
//! # struct Led;
//! # impl embedded_hal::digital::ErrorType for Led { type Error = Infallible; }
//! # impl embedded_hal::digital::OutputPin for Led {
//! #     fn set_low(&mut self) -> Result<(), Infallible> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Infallible> { Ok(()) }
//! # }
//! use fugit::{RateExtU32, TimerInstantU32};
//! use rp2040_cpwm::{claims::SliceClaims, power::{Debouncer, PowerTransfer}, reg::Mmio};
//!
//! static PWM_CLAIMS: SliceClaims = SliceClaims::new();
//!
//! let io = unsafe { Mmio::new() };
//! let mut power = PowerTransfer::new(io, &PWM_CLAIMS, 125.MHz(), 8, Led).unwrap();
//! let mut start_button = Debouncer::new(true);
//!
//! // from the GPIO interrupt handler
//! let now = TimerInstantU32::<1_000>::from_ticks(1_234);
//! if let Some(level) = start_button.update(false, now) {
//!     power.on_start_button(level).unwrap();
//! }
//! ```

use embedded_hal::digital::OutputPin;
use fugit::{HertzU32, MillisDurationU32, NanosDurationU32, TimerInstantU32};

use crate::claims::SliceClaims;
use crate::complementary::ComplementaryPwm;
use crate::config::ComplementaryConfig;
use crate::reg::RegisterIo;
use crate::Error;

/// Millisecond timestamp
pub type Millis = TimerInstantU32<1_000>;

/// Edge filter for a mechanical contact
///
/// An edge is accepted only if more than the debounce window has passed
/// since the last accepted edge, and only reported if it changes the level.
/// Elapsed time is taken modulo the 32 bit millisecond counter, so the filter
/// keeps working across timer wrap and after arbitrarily long idle periods.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window: MillisDurationU32,
    level: bool,
    last_edge: Option<Millis>,
}

impl Debouncer {
    /// Debounce window used by [`new`](Self::new)
    pub const DEFAULT_WINDOW: MillisDurationU32 = MillisDurationU32::from_ticks(30);

    /// Filter starting at `level`, with a 30 ms window
    pub const fn new(level: bool) -> Self {
        Self::with_window(level, Self::DEFAULT_WINDOW)
    }

    /// Filter starting at `level`, with a custom window
    pub const fn with_window(level: bool, window: MillisDurationU32) -> Self {
        Debouncer {
            window,
            level,
            last_edge: None,
        }
    }

    /// Feed a raw edge seen at `now`
    ///
    /// Returns the new level if the edge got through the filter and changed
    /// the level.
    pub fn update(&mut self, level: bool, now: Millis) -> Option<bool> {
        let settled = match self.last_edge {
            None => true,
            Some(last) => now.ticks().wrapping_sub(last.ticks()) > self.window.ticks(),
        };
        if !settled {
            return None;
        }
        self.last_edge = Some(now);
        if level == self.level {
            return None;
        }
        self.level = level;
        Some(level)
    }

    /// Last accepted level
    #[inline]
    pub fn level(&self) -> bool {
        self.level
    }
}

/// Gate drive plus running indicator for one power stage
pub struct PowerTransfer<'c, R: RegisterIo, L: OutputPin> {
    pwm: ComplementaryPwm<'c, R>,
    indicator: L,
}

impl<'c, R: RegisterIo, L: OutputPin> PowerTransfer<'c, R, L> {
    /// Gate drive settings of the bridge: 20 kHz, 50 %, 500 ns dead-time
    pub const DEFAULT_CONFIG: ComplementaryConfig = ComplementaryConfig::new(
        HertzU32::from_raw(20_000),
        0.5,
        NanosDurationU32::from_ticks(500),
    );

    /// Claim the gate pins with [`DEFAULT_CONFIG`](Self::DEFAULT_CONFIG)
    ///
    /// The stage starts stopped. The indicator is not driven until the first
    /// [`start`](Self::start) or [`stop`](Self::stop), so hand it in switched
    /// off.
    pub fn new(
        io: R,
        claims: &'c SliceClaims,
        sys_clk: HertzU32,
        pin_base: u8,
        indicator: L,
    ) -> Result<Self, Error> {
        let pwm = ComplementaryPwm::new(io, claims, sys_clk, pin_base, Self::DEFAULT_CONFIG)?;
        Ok(PowerTransfer { pwm, indicator })
    }

    /// Wrap an already configured gate drive
    ///
    /// The indicator is set to match the drive's current state. If that
    /// fails, the gate drive is dropped and therefore stopped.
    pub fn from_parts(pwm: ComplementaryPwm<'c, R>, indicator: L) -> Result<Self, L::Error> {
        let mut power = PowerTransfer { pwm, indicator };
        power.sync_indicator()?;
        Ok(power)
    }

    fn sync_indicator(&mut self) -> Result<(), L::Error> {
        if self.pwm.is_running() {
            self.indicator.set_high()
        } else {
            self.indicator.set_low()
        }
    }

    /// Start switching and light the indicator
    pub fn start(&mut self) -> Result<(), L::Error> {
        self.pwm.start();
        self.sync_indicator()
    }

    /// Stop switching and turn the indicator off
    pub fn stop(&mut self) -> Result<(), L::Error> {
        self.pwm.stop();
        self.sync_indicator()
    }

    /// Debounced level change of the start button
    pub fn on_start_button(&mut self, level: bool) -> Result<(), L::Error> {
        if level {
            return Ok(());
        }
        self.start()
    }

    /// Debounced level change of the stop button
    pub fn on_stop_button(&mut self, level: bool) -> Result<(), L::Error> {
        if level {
            return Ok(());
        }
        self.stop()
    }

    /// Whether the stage is switching
    #[inline]
    pub fn is_running(&self) -> bool {
        self.pwm.is_running()
    }

    /// The gate drive
    #[inline]
    pub fn pwm(&self) -> &ComplementaryPwm<'c, R> {
        &self.pwm
    }

    /// The gate drive, for changing frequency, duty or dead-time
    #[inline]
    pub fn pwm_mut(&mut self) -> &mut ComplementaryPwm<'c, R> {
        &mut self.pwm
    }

    /// Split back into the gate drive and the indicator
    pub fn free(self) -> (ComplementaryPwm<'c, R>, L) {
        (self.pwm, self.indicator)
    }
}
