//! Locating the PWM slice behind a GPIO pin pair
//!
//! Every slice drives two pins: channel A on the even pin and channel B on the
//! odd pin right above it. GPIO 0 to 15 map onto slices 0 to 7, GPIO 16 to 29
//! map onto slices 0 to 6 a second time (see
//! [section 4.5.2 of the RP2040 datasheet][section_4_5_2]).
//!
//! [section_4_5_2]: https://datasheets.raspberrypi.com/rp2040/rp2040-datasheet.pdf#pwm

use crate::reg::{offset, PWM_BASE, SLICE_STRIDE};
use crate::Error;

/// Highest GPIO that can be channel A of a slice
pub const MAX_PIN_BASE: u8 = 28;

/// Number of user GPIOs in bank 0
pub const NUM_GPIO: u8 = 30;

/// Value-level `struct` representing slice IDs
///
/// Always names one of the [`COUNT`](SliceId::COUNT) slices of the chip.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SliceId {
    num: u8,
}

impl SliceId {
    /// Number of PWM slices
    pub const COUNT: u8 = 8;

    /// Slice `num`, or `None` if the chip has no such slice
    #[inline]
    pub const fn new(num: u8) -> Option<Self> {
        if num < Self::COUNT {
            Some(SliceId { num })
        } else {
            None
        }
    }

    /// Slice driving `pin`, or `None` past the last GPIO
    ///
    /// Any pin of the pair maps to the same slice.
    #[inline]
    pub const fn for_pin(pin: u8) -> Option<Self> {
        if pin >= NUM_GPIO {
            return None;
        }
        let num = if pin < 16 { pin >> 1 } else { (pin - 16) >> 1 };
        Some(SliceId { num })
    }

    /// Slice number, `0..COUNT`
    #[inline]
    pub const fn num(self) -> u8 {
        self.num
    }

    /// Address of this slice's CSR register, the first of its register block
    #[inline]
    pub const fn register_base(self) -> u32 {
        PWM_BASE + self.num as u32 * SLICE_STRIDE
    }
}

/// Channel ids
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Channel A, compare value in the low half of CC
    A,
    /// Channel B, compare value in the high half of CC
    B,
}

/// A validated pin pair together with the slice that drives it
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PwmSlice {
    id: SliceId,
    pin_base: u8,
}

impl PwmSlice {
    /// Resolve the slice for the pair (`pin_base`, `pin_base + 1`)
    ///
    /// Fails if `pin_base` is odd, or so high that channel B would run past
    /// the last GPIO.
    pub fn for_pin(pin_base: u8) -> Result<Self, Error> {
        if pin_base % 2 != 0 || pin_base > MAX_PIN_BASE {
            return Err(Error::InvalidPin(pin_base));
        }
        let id = SliceId::for_pin(pin_base).ok_or(Error::InvalidPin(pin_base))?;
        Ok(PwmSlice { id, pin_base })
    }

    /// Slice id
    #[inline]
    pub fn id(&self) -> SliceId {
        self.id
    }

    /// Channel A pin
    #[inline]
    pub fn pin_base(&self) -> u8 {
        self.pin_base
    }

    /// GPIO driven by `channel`
    #[inline]
    pub fn pin(&self, channel: Channel) -> u8 {
        match channel {
            Channel::A => self.pin_base,
            Channel::B => self.pin_base + 1,
        }
    }

    /// Address of the slice's register block
    #[inline]
    pub fn register_base(&self) -> u32 {
        self.id.register_base()
    }

    /// Address of the register at `offset` inside the slice's block
    #[inline]
    pub(crate) fn reg(&self, offset: u32) -> u32 {
        self.register_base() + offset
    }

    #[inline]
    pub(crate) fn csr(&self) -> u32 {
        self.reg(offset::CSR)
    }

    #[inline]
    pub(crate) fn div(&self) -> u32 {
        self.reg(offset::DIV)
    }

    #[inline]
    pub(crate) fn ctr(&self) -> u32 {
        self.reg(offset::CTR)
    }

    #[inline]
    pub(crate) fn cc(&self) -> u32 {
        self.reg(offset::CC)
    }

    #[inline]
    pub(crate) fn top(&self) -> u32 {
        self.reg(offset::TOP)
    }
}
