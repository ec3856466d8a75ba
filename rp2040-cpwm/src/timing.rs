//! Counter tick timing
//!
//! The slice counter advances once every `clkdiv / f_sys` seconds, where
//! `clkdiv` is the 8.4 fixed point value of the DIV register. This module
//! converts between nanoseconds and counter ticks, and picks a divider and
//! wrap value for a requested output frequency.

use fugit::{HertzU32, NanosDurationU32};

/// `1e9 / 16`, so that `div16 * NS_PER_SIXTEENTH / f_sys` is one tick in nanoseconds
const NS_PER_SIXTEENTH: u64 = 62_500_000;

/// Largest period (TOP + 1) the solver will pick
///
/// Keeps TOP at or below 0xfffd so that a compare value equal to the period
/// still fits the 16-bit CC fields and means "always on".
pub const MAX_PERIOD_TOP: u32 = 65_534;

/// Slice clock divider, 8.4 fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockDivider {
    sixteenths: u16,
}

impl ClockDivider {
    /// Divide by 1, the counter runs at full system clock speed
    pub const MIN: Self = ClockDivider { sixteenths: 0x010 };
    /// Divide by 255 + 15/16, the largest programmable divider below 256
    pub const MAX: Self = ClockDivider { sixteenths: 0xfff };

    /// Divider of `sixteenths / 16`, clamped into [`MIN`](Self::MIN)..=[`MAX`](Self::MAX)
    pub const fn from_sixteenths(sixteenths: u32) -> Self {
        let sixteenths = if sixteenths < Self::MIN.sixteenths as u32 {
            Self::MIN.sixteenths
        } else if sixteenths > Self::MAX.sixteenths as u32 {
            Self::MAX.sixteenths
        } else {
            sixteenths as u16
        };
        ClockDivider { sixteenths }
    }

    /// Decode a raw DIV register value
    ///
    /// An integer part of 0 means 256, as on the hardware.
    pub const fn from_register(raw: u32) -> Self {
        let int = (raw >> 4) & 0xff;
        let frac = raw & 0x0f;
        let int = if int == 0 { 256 } else { int };
        ClockDivider {
            sixteenths: ((int << 4) | frac) as u16,
        }
    }

    /// Encode as a raw DIV register value
    #[inline]
    pub const fn to_register(self) -> u32 {
        self.sixteenths as u32 & 0xfff
    }

    /// Whole part of the divider
    #[inline]
    pub const fn integer(self) -> u16 {
        self.sixteenths >> 4
    }

    /// Fractional part of the divider, in sixteenths
    #[inline]
    pub const fn fraction(self) -> u8 {
        (self.sixteenths & 0x0f) as u8
    }

    /// The divider multiplied by 16
    #[inline]
    pub const fn sixteenths(self) -> u32 {
        self.sixteenths as u32
    }
}

/// Tick timing of one slice, derived from the system clock and the slice's divider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickClock {
    sys_clk: HertzU32,
    divider: ClockDivider,
}

impl TickClock {
    /// Timing for a slice dividing `sys_clk` by `divider`
    pub fn new(sys_clk: HertzU32, divider: ClockDivider) -> Self {
        let sys_clk = HertzU32::from_raw(sys_clk.to_Hz().max(1));
        TickClock { sys_clk, divider }
    }

    /// System clock the slice is fed from
    #[inline]
    pub fn sys_clk(&self) -> HertzU32 {
        self.sys_clk
    }

    /// Divider in use
    #[inline]
    pub fn divider(&self) -> ClockDivider {
        self.divider
    }

    /// Duration of one counter tick, in nanoseconds
    pub fn tick_duration_ns(&self) -> f32 {
        let clkdiv = self.divider.sixteenths() as f32 / 16.0;
        clkdiv / (self.sys_clk.to_Hz() as f32 / 1e9)
    }

    /// Smallest whole number of ticks lasting at least `dead_time`
    ///
    /// Saturates at `u32::MAX`, well beyond any period the counter supports.
    pub fn dead_time_to_ticks(&self, dead_time: NanosDurationU32) -> u32 {
        let num = u64::from(dead_time.ticks()) * u64::from(self.sys_clk.to_Hz());
        let den = u64::from(self.divider.sixteenths()) * NS_PER_SIXTEENTH;
        u32::try_from(num.div_ceil(den)).unwrap_or(u32::MAX)
    }

    /// Duration of `ticks` counter ticks, rounded up to whole nanoseconds
    pub fn ticks_to_ns(&self, ticks: u32) -> NanosDurationU32 {
        let sixteenths = u128::from(self.divider.sixteenths());
        let num = u128::from(ticks) * sixteenths * u128::from(NS_PER_SIXTEENTH);
        let ns = num.div_ceil(u128::from(self.sys_clk.to_Hz()));
        NanosDurationU32::from_ticks(u32::try_from(ns).unwrap_or(u32::MAX))
    }

    /// Output frequency of a center-aligned waveform with `period_top` ticks per half period
    ///
    /// Rounded to the nearest hertz.
    pub fn output_frequency(&self, period_top: u32) -> HertzU32 {
        let num = u64::from(self.sys_clk.to_Hz()) * 16;
        let den = u64::from(self.divider.sixteenths()) * u64::from(period_top.max(1)) * 2;
        HertzU32::from_raw(((num + den / 2) / den) as u32)
    }
}

/// Divider and period programmed for a requested frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSettings {
    /// Clock divider
    pub divider: ClockDivider,
    /// Ticks per counter wrap, i.e. TOP + 1
    pub period_top: u16,
}

impl CounterSettings {
    /// Pick a divider and period for a center-aligned output at `frequency`
    ///
    /// The counter has to wrap at twice the output frequency because phase
    /// correct mode takes two passes (up, then down) per output period. The
    /// period is grown by small prime factors taken out of the divider for
    /// as long as it fits, which gives the finest duty resolution the
    /// frequency allows. Frequencies outside the reachable range are clamped
    /// to the nearest reachable one; 0 Hz is treated as 1 Hz.
    pub fn solve(sys_clk: HertzU32, frequency: HertzU32) -> Self {
        let counter_hz = 2 * u64::from(frequency.to_Hz().max(1));
        let mut div16 = u64::from(sys_clk.to_Hz()) * 16 / counter_hz;
        let mut top: u32 = 1;

        loop {
            if div16 >= 16 * 5 && div16 % 5 == 0 && top * 5 <= MAX_PERIOD_TOP {
                div16 /= 5;
                top *= 5;
            } else if div16 >= 16 * 3 && div16 % 3 == 0 && top * 3 <= MAX_PERIOD_TOP {
                div16 /= 3;
                top *= 3;
            } else if div16 >= 16 * 2 && top * 2 <= MAX_PERIOD_TOP {
                div16 /= 2;
                top *= 2;
            } else {
                break;
            }
        }

        let div16 = div16.min(u64::from(ClockDivider::MAX.sixteenths())) as u32;
        CounterSettings {
            divider: ClockDivider::from_sixteenths(div16),
            period_top: top as u16,
        }
    }

    /// Raw TOP register value
    #[inline]
    pub fn top_register(&self) -> u32 {
        u32::from(self.period_top) - 1
    }
}
