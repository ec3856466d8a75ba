//! Compare thresholds for a complementary pair
//!
//! In phase-correct mode channel A is high while the counter is below its
//! compare value. Channel B runs inverted with a compare value `dead_ticks`
//! above A's, so it only turns on `dead_ticks` after A turned off, and turns
//! off `dead_ticks` before A turns back on. Both edges of the period get the
//! same non-overlap window because the counter runs up and then down.
//!
//! ```text
//! counter  0 ....... duty ....... duty + dead ....... period_top
//! A        ‾‾‾‾‾‾‾‾‾‾‾‾|_____________________________________
//! B        ____________________________|‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾
//! ```

/// Clamp a duty fraction into `0.0..=1.0`
///
/// NaN maps to 0.0, so a bad calculation upstream switches the stage off
/// instead of on.
#[inline]
pub fn clamp_duty(fraction: f32) -> f32 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}

/// Pack channel A and channel B thresholds into one CC register value
#[inline]
pub const fn pack_compare(a: u16, b: u16) -> u32 {
    ((b as u32) << 16) | a as u32
}

/// Duty and dead-time of a complementary pair, in counter ticks
///
/// Every value here is relative to `period_top`. Moving to a new period with
/// [`retarget`](Waveform::retarget) recomputes the duty ticks from the
/// stored fraction; dead ticks have to be supplied again because their
/// conversion depends on the new clock divider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waveform {
    period_top: u16,
    duty_fraction: f32,
    duty_ticks: u16,
    dead_ticks: u32,
}

impl Waveform {
    /// An all-off waveform over a period of `period_top` ticks
    pub fn new(period_top: u16) -> Self {
        Waveform {
            period_top,
            duty_fraction: 0.0,
            duty_ticks: 0,
            dead_ticks: 0,
        }
    }

    /// Move to a new period, recomputing duty ticks and taking new dead ticks
    pub fn retarget(&mut self, period_top: u16, dead_ticks: u32) {
        self.period_top = period_top;
        self.dead_ticks = dead_ticks;
        self.duty_ticks = self.ticks_for(self.duty_fraction);
    }

    /// Set the duty fraction, clamped into `0.0..=1.0`
    ///
    /// Returns the achieved duty, see [`duty`](Waveform::duty).
    pub fn set_duty(&mut self, fraction: f32) -> f32 {
        self.duty_fraction = clamp_duty(fraction);
        self.duty_ticks = self.ticks_for(self.duty_fraction);
        self.duty()
    }

    /// Set channel A's threshold directly, capped at the period
    pub fn set_duty_ticks(&mut self, ticks: u16) -> f32 {
        self.duty_ticks = ticks.min(self.period_top);
        self.duty_fraction = self.duty();
        self.duty()
    }

    /// Set the requested dead-time in ticks
    ///
    /// Values pushing channel B's threshold past the period are kept as
    /// requested but truncated in [`compare_value`](Waveform::compare_value).
    #[inline]
    pub fn set_dead_ticks(&mut self, dead_ticks: u32) {
        self.dead_ticks = dead_ticks;
    }

    fn ticks_for(&self, fraction: f32) -> u16 {
        let ticks = (fraction * f32::from(self.period_top)) as u32;
        ticks.min(u32::from(self.period_top)) as u16
    }

    /// Ticks per counter wrap
    #[inline]
    pub fn period_top(&self) -> u16 {
        self.period_top
    }

    /// Channel A threshold
    #[inline]
    pub fn duty_ticks(&self) -> u16 {
        self.duty_ticks
    }

    /// Dead-time as requested, before truncation at the period
    #[inline]
    pub fn requested_dead_ticks(&self) -> u32 {
        self.dead_ticks
    }

    /// Channel B threshold, `duty + dead` capped at the period
    #[inline]
    pub fn compare_b(&self) -> u16 {
        let b = u32::from(self.duty_ticks).saturating_add(self.dead_ticks);
        b.min(u32::from(self.period_top)) as u16
    }

    /// Dead-time that actually separates the channels
    #[inline]
    pub fn effective_dead_ticks(&self) -> u32 {
        u32::from(self.compare_b() - self.duty_ticks)
    }

    /// Whether the cap at the period cut the requested dead-time short
    #[inline]
    pub fn is_dead_time_truncated(&self) -> bool {
        self.effective_dead_ticks() < self.dead_ticks
    }

    /// Value for the CC register, written in one go so neither channel ever
    /// sees the other's old threshold
    #[inline]
    pub fn compare_value(&self) -> u32 {
        pack_compare(self.duty_ticks, self.compare_b())
    }

    /// Achieved duty, as the fraction of the period channel A is high
    pub fn duty(&self) -> f32 {
        if self.period_top == 0 {
            return 0.0;
        }
        f32::from(self.duty_ticks) / f32::from(self.period_top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamping() {
        assert_eq!(clamp_duty(-0.3), 0.0);
        assert_eq!(clamp_duty(1.7), 1.0);
        assert_eq!(clamp_duty(0.25), 0.25);
        assert_eq!(clamp_duty(f32::NAN), 0.0);
        assert_eq!(clamp_duty(f32::INFINITY), 1.0);
    }

    #[test]
    fn half_duty_with_dead_time() {
        let mut wave = Waveform::new(6250);
        assert_eq!(wave.set_duty(0.5), 0.5);
        wave.set_dead_ticks(63);
        assert_eq!(wave.duty_ticks(), 3125);
        assert_eq!(wave.compare_b(), 3188);
        assert_eq!(wave.compare_value(), (3188 << 16) | 3125);
        assert_eq!(wave.effective_dead_ticks(), 63);
        assert!(!wave.is_dead_time_truncated());
    }

    #[test]
    fn out_of_range_duty_matches_bounds() {
        let mut wave = Waveform::new(6250);
        wave.set_dead_ticks(10);
        wave.set_duty(-0.3);
        let low = wave.compare_value();
        wave.set_duty(0.0);
        assert_eq!(wave.compare_value(), low);

        wave.set_duty(1.7);
        let high = wave.compare_value();
        wave.set_duty(1.0);
        assert_eq!(wave.compare_value(), high);
        assert_eq!(high, pack_compare(6250, 6250));
    }

    #[test]
    fn same_duty_same_compare() {
        let mut wave = Waveform::new(3125);
        wave.set_dead_ticks(5);
        wave.set_duty(0.37);
        let first = wave.compare_value();
        wave.set_duty(0.37);
        assert_eq!(wave.compare_value(), first);
    }

    #[test]
    fn dead_time_truncated_at_period() {
        let mut wave = Waveform::new(1000);
        wave.set_duty(0.95);
        wave.set_dead_ticks(100);
        assert_eq!(wave.duty_ticks(), 950);
        assert_eq!(wave.compare_b(), 1000);
        assert_eq!(wave.effective_dead_ticks(), 50);
        assert!(wave.is_dead_time_truncated());
        assert_eq!(wave.requested_dead_ticks(), 100);

        wave.set_dead_ticks(u32::MAX);
        assert_eq!(wave.compare_b(), 1000);
    }

    #[test]
    fn zero_dead_time_is_exact_complement() {
        let mut wave = Waveform::new(1000);
        wave.set_duty(0.4);
        wave.set_dead_ticks(0);
        assert_eq!(wave.compare_value(), pack_compare(400, 400));
    }

    #[test]
    fn duty_ticks_are_exact() {
        let mut wave = Waveform::new(3125);
        wave.set_duty_ticks(1562);
        assert_eq!(wave.duty_ticks(), 1562);
        wave.set_duty_ticks(u16::MAX);
        assert_eq!(wave.duty_ticks(), 3125);
        assert_eq!(wave.duty(), 1.0);
    }

    #[test]
    fn retarget_keeps_fraction() {
        let mut wave = Waveform::new(6250);
        wave.set_duty(0.5);
        wave.set_dead_ticks(63);
        wave.retarget(3125, 32);
        assert_eq!(wave.duty_ticks(), 1562);
        assert_eq!(wave.compare_b(), 1594);
        wave.retarget(6250, 63);
        assert_eq!(wave.duty(), 0.5);
    }
}
