//! Complementary PWM pair with dead-time
//!
//! A [`ComplementaryPwm`] drives the two pins of one slice as a phase
//! inverted pair: channel A is high for the duty fraction of the period,
//! channel B is its inverse, and a dead-time window in which both are off is
//! inserted around every transition. The slice counts in phase-correct
//! (center-aligned) mode, so the window is symmetric on both edges.
//!
//! ```no_run
//! use fugit::{ExtU32, RateExtU32};
//! use rp2040_cpwm::{claims::SliceClaims, reg::Mmio, ComplementaryConfig, ComplementaryPwm};
//!
//! static PWM_CLAIMS: SliceClaims = SliceClaims::new();
//!
//! // Safety: nothing else touches the PWM block
//! let io = unsafe { Mmio::new() };
//! let config = ComplementaryConfig::new(20.kHz(), 0.5, 500.nanos());
//! let mut pwm = ComplementaryPwm::new(io, &PWM_CLAIMS, 125.MHz(), 8, config).unwrap();
//!
//! pwm.start();
//! let achieved = pwm.set_dead_time(750.nanos()); // rounded up to whole ticks
//! pwm.set_duty(0.4);
//! pwm.stop();
//! ```
//!
//! Frequency changes are never applied to a live counter: [`set_frequency`]
//! stops the slice, reprograms divider, period, duty and dead-time, and
//! restarts it if it was running. Duty and dead-time changes are a single
//! write to the combined compare register and apply to a running slice
//! directly.
//!
//! Mutating calls are multi-step register sequences. If more than one task
//! can reach a driver, the caller has to serialize them.
//!
//! [`set_frequency`]: ComplementaryPwm::set_frequency

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use fugit::{HertzU32, NanosDurationU32};

use crate::claims::SliceClaims;
use crate::config::ComplementaryConfig;
use crate::reg::{csr, gpio_ctrl, RegisterIo, FUNCSEL_MASK, FUNCSEL_PWM};
use crate::slice::{Channel, PwmSlice};
use crate::timing::{ClockDivider, CounterSettings, TickClock};
use crate::waveform::Waveform;
use crate::Error;

/// Run state of the slice counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Counter disabled, both outputs parked with the switches off
    Stopped,
    /// Counter enabled in phase-correct mode with channel B inverted
    Running,
}

/// Complementary output on a pin pair, with programmable dead-time
///
/// The driver claims its slice in a [`SliceClaims`] registry for as long as
/// it lives. Dropping it stops the slice, parks both outputs (A low, B high
/// through its inversion, i.e. both switches off) and releases the claim.
pub struct ComplementaryPwm<'c, R: RegisterIo> {
    io: R,
    claims: &'c SliceClaims,
    slice: PwmSlice,
    clock: TickClock,
    waveform: Waveform,
    dead_time: NanosDurationU32,
    state: State,
}

impl<'c, R: RegisterIo> ComplementaryPwm<'c, R> {
    /// Claim the slice behind (`pin_base`, `pin_base + 1`) and program it
    ///
    /// `sys_clk` is the frequency of the clock feeding the PWM block. The
    /// slice is left stopped unless `config.start_immediately` is set.
    pub fn new(
        io: R,
        claims: &'c SliceClaims,
        sys_clk: HertzU32,
        pin_base: u8,
        config: ComplementaryConfig,
    ) -> Result<Self, Error> {
        let slice = PwmSlice::for_pin(pin_base)?;
        claims.claim(slice.id())?;

        let mut pwm = ComplementaryPwm {
            io,
            claims,
            slice,
            clock: TickClock::new(sys_clk, ClockDivider::MIN),
            waveform: Waveform::new(1),
            dead_time: config.dead_time,
            state: State::Stopped,
        };
        pwm.configure_slice();
        pwm.route_pins();
        pwm.waveform.set_duty(config.duty);
        pwm.program_counter(config.frequency);
        pwm.recompute_all();

        if config.start_immediately {
            pwm.start();
        }
        Ok(pwm)
    }

    /// Disabled, phase-correct, B inverted, both outputs parked
    fn configure_slice(&mut self) {
        self.io.write32(self.slice.csr(), csr::PH_CORRECT | csr::B_INV);
        self.io.write32(self.slice.cc(), 0);
    }

    fn route_pins(&mut self) {
        for channel in [Channel::A, Channel::B] {
            let ctrl = gpio_ctrl(self.slice.pin(channel));
            self.io.modify32(ctrl, |v| (v & !FUNCSEL_MASK) | FUNCSEL_PWM);
        }
    }

    /// Write divider and period for `frequency`. The slice must be stopped.
    fn program_counter(&mut self, frequency: HertzU32) {
        let settings = CounterSettings::solve(self.clock.sys_clk(), frequency);
        self.io.write32(self.slice.div(), settings.divider.to_register());
        self.io.write32(self.slice.top(), settings.top_register());
        self.io.write32(self.slice.ctr(), 0);
    }

    /// Re-derive tick timing, dead ticks and duty ticks from what the
    /// hardware now holds in DIV and TOP
    fn recompute_all(&mut self) {
        let divider = ClockDivider::from_register(self.io.read32(self.slice.div()));
        let top = self.io.read32(self.slice.top()) & 0xffff;
        let period_top = (top + 1).min(0xffff) as u16;

        self.clock = TickClock::new(self.clock.sys_clk(), divider);
        let dead_ticks = self.clock.dead_time_to_ticks(self.dead_time);
        self.waveform.retarget(period_top, dead_ticks);
        self.warn_if_truncated();
    }

    #[inline]
    fn write_compare(&mut self) {
        self.io.write32(self.slice.cc(), self.waveform.compare_value());
    }

    /// Push the current waveform to a running slice. A stopped slice keeps
    /// its outputs parked until [`start`](Self::start).
    fn apply_waveform(&mut self) {
        if self.state == State::Running {
            self.write_compare();
        }
        self.warn_if_truncated();
    }

    fn warn_if_truncated(&self) {
        #[cfg(feature = "defmt")]
        {
            if self.waveform.is_dead_time_truncated() {
                defmt::warn!(
                    "pwm slice {}: dead-time cut to {} ticks at the period",
                    self.slice.id().num(),
                    self.waveform.effective_dead_ticks()
                );
            }
        }
    }

    /// Enable the counter
    ///
    /// Writes the compare thresholds first, then sets enable, phase-correct
    /// mode and channel B inversion in one go. Does nothing if already running.
    pub fn start(&mut self) {
        if self.state == State::Running {
            return;
        }
        self.write_compare();
        self.io
            .set_bits(self.slice.csr(), csr::EN | csr::PH_CORRECT | csr::B_INV);
        self.state = State::Running;

        #[cfg(feature = "defmt")]
        defmt::debug!("pwm slice {}: running", self.slice.id().num());
    }

    /// Disable the counter and force both compare thresholds to zero
    ///
    /// With channel B inverted this leaves A low and B high, the off state of
    /// both switches. Duty and dead-time settings are kept for the next
    /// [`start`](Self::start).
    pub fn stop(&mut self) {
        self.io.clear_bits(self.slice.csr(), csr::EN);
        self.io.write32(self.slice.cc(), 0);

        #[cfg(feature = "defmt")]
        {
            if self.state == State::Running {
                defmt::debug!("pwm slice {}: stopped", self.slice.id().num());
            }
        }
        self.state = State::Stopped;
    }

    /// Change the output frequency
    ///
    /// A running slice is stopped for the duration of the change and
    /// restarted afterwards. Duty and dead-time are re-derived against the
    /// new period. Returns the frequency actually achieved.
    pub fn set_frequency(&mut self, frequency: HertzU32) -> HertzU32 {
        let was_running = self.state == State::Running;
        if was_running {
            self.stop();
        }

        self.program_counter(frequency);
        self.recompute_all();

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "pwm slice {}: {} Hz requested, div {}+{}/16, top {}",
            self.slice.id().num(),
            frequency.to_Hz(),
            self.clock.divider().integer(),
            self.clock.divider().fraction(),
            self.waveform.period_top()
        );

        if was_running {
            self.start();
        }
        self.frequency()
    }

    /// Change the duty fraction of channel A, clamped into `0.0..=1.0`
    ///
    /// Returns the duty actually achieved at the current period's resolution.
    pub fn set_duty(&mut self, fraction: f32) -> f32 {
        let achieved = self.waveform.set_duty(fraction);
        self.apply_waveform();
        achieved
    }

    /// Change the dead-time between the channels
    ///
    /// The request is rounded up to whole counter ticks, and cut short if
    /// channel B's threshold would run past the period. Returns the dead-time
    /// actually achieved.
    pub fn set_dead_time(&mut self, dead_time: NanosDurationU32) -> NanosDurationU32 {
        self.dead_time = dead_time;
        let dead_ticks = self.clock.dead_time_to_ticks(dead_time);
        self.waveform.set_dead_ticks(dead_ticks);
        self.apply_waveform();
        self.dead_time()
    }

    /// A driver stays bound to the pin pair it was created for
    ///
    /// Succeeds only for the current pin, anything else is refused without
    /// touching the hardware.
    pub fn reassign_pin(&mut self, pin_base: u8) -> Result<(), Error> {
        if pin_base == self.slice.pin_base() {
            Ok(())
        } else {
            Err(Error::PinReassignment {
                current: self.slice.pin_base(),
                requested: pin_base,
            })
        }
    }

    /// Run state
    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Whether the counter is enabled
    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    /// Output frequency derived from the divider and period in hardware
    pub fn frequency(&self) -> HertzU32 {
        self.clock.output_frequency(u32::from(self.waveform.period_top()))
    }

    /// Achieved duty fraction of channel A
    #[inline]
    pub fn duty(&self) -> f32 {
        self.waveform.duty()
    }

    /// Achieved dead-time, after rounding to ticks and truncation at the period
    pub fn dead_time(&self) -> NanosDurationU32 {
        self.clock.ticks_to_ns(self.waveform.effective_dead_ticks())
    }

    /// Dead-time as last requested
    #[inline]
    pub fn requested_dead_time(&self) -> NanosDurationU32 {
        self.dead_time
    }

    /// Achieved dead-time in counter ticks
    #[inline]
    pub fn dead_time_ticks(&self) -> u32 {
        self.waveform.effective_dead_ticks()
    }

    /// Duration of one counter tick, in nanoseconds
    #[inline]
    pub fn tick_duration_ns(&self) -> f32 {
        self.clock.tick_duration_ns()
    }

    /// Counter ticks per wrap
    #[inline]
    pub fn period_top(&self) -> u16 {
        self.waveform.period_top()
    }

    /// CC register value used while running
    #[inline]
    pub fn compare_value(&self) -> u32 {
        self.waveform.compare_value()
    }

    /// Slice and pin pair driven
    #[inline]
    pub fn slice(&self) -> &PwmSlice {
        &self.slice
    }

    /// Channel A pin
    #[inline]
    pub fn pin_base(&self) -> u8 {
        self.slice.pin_base()
    }
}

impl<R: RegisterIo> Drop for ComplementaryPwm<'_, R> {
    fn drop(&mut self) {
        self.stop();
        self.claims.release(self.slice.id());
    }
}

impl<R: RegisterIo> ErrorType for ComplementaryPwm<'_, R> {
    type Error = Infallible;
}

impl<R: RegisterIo> SetDutyCycle for ComplementaryPwm<'_, R> {
    fn max_duty_cycle(&self) -> u16 {
        self.waveform.period_top()
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.waveform.set_duty_ticks(duty);
        self.apply_waveform();
        Ok(())
    }
}

impl<R: RegisterIo> embedded_hal_0_2::PwmPin for ComplementaryPwm<'_, R> {
    type Duty = u16;

    fn disable(&mut self) {
        self.stop();
    }

    fn enable(&mut self) {
        self.start();
    }

    fn get_duty(&self) -> Self::Duty {
        self.waveform.duty_ticks()
    }

    fn get_max_duty(&self) -> Self::Duty {
        SetDutyCycle::max_duty_cycle(self)
    }

    fn set_duty(&mut self, duty: Self::Duty) {
        let _ = SetDutyCycle::set_duty_cycle(self, duty);
    }
}
