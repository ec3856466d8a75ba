//! Register access for the PWM and IO_BANK0 blocks
//!
//! All hardware access in this crate goes through the [`RegisterIo`]
//! capability, so a driver can run against [`Mmio`] on the chip or against a
//! simulated register file on the host.
//!
//! See [section 4.5.3 of the RP2040 datasheet][section_4_5_3] for the PWM
//! register list.
//!
//! [section_4_5_3]: https://datasheets.raspberrypi.com/rp2040/rp2040-datasheet.pdf#tab-registerlist_pwm

use core::ptr::{read_volatile, write_volatile};

/// Base address of the PWM peripheral
pub const PWM_BASE: u32 = 0x4005_0000;

/// Distance between the register blocks of two neighbouring slices
pub const SLICE_STRIDE: u32 = 0x14;

/// Base address of the IO_BANK0 peripheral
pub const IO_BANK0_BASE: u32 = 0x4001_4000;

/// Register offsets inside one slice's register block
pub mod offset {
    /// Control and status
    pub const CSR: u32 = 0x00;
    /// Clock divider, 8.4 fixed point
    pub const DIV: u32 = 0x04;
    /// Counter
    pub const CTR: u32 = 0x08;
    /// Compare values, channel A in the low half and channel B in the high half
    pub const CC: u32 = 0x0c;
    /// Counter wrap value
    pub const TOP: u32 = 0x10;
}

/// Bits of the CSR register
pub mod csr {
    /// Slice enable
    pub const EN: u32 = 1 << 0;
    /// Phase-correct (center-aligned) counting
    pub const PH_CORRECT: u32 = 1 << 1;
    /// Invert channel A output
    pub const A_INV: u32 = 1 << 2;
    /// Invert channel B output
    pub const B_INV: u32 = 1 << 3;
}

pub(crate) const FUNCSEL_MASK: u32 = 0x1f;
pub(crate) const FUNCSEL_PWM: u32 = 4;

/// Address of the `GPIOn_CTRL` register for `pin`
#[inline]
pub const fn gpio_ctrl(pin: u8) -> u32 {
    IO_BANK0_BASE + 8 * pin as u32 + 4
}

/// 32-bit register access
///
/// Implementors only need to provide [`read32`](RegisterIo::read32) and
/// [`write32`](RegisterIo::write32). The bit helpers default to a
/// read-modify-write sequence; implementations backed by real hardware may
/// override them with single-write atomic aliases.
pub trait RegisterIo {
    /// Read the register at `addr`
    fn read32(&self, addr: u32) -> u32;

    /// Write `value` to the register at `addr`
    fn write32(&mut self, addr: u32, value: u32);

    /// Set `bits` in the register at `addr`, leaving the others untouched
    #[inline]
    fn set_bits(&mut self, addr: u32, bits: u32) {
        let value = self.read32(addr);
        self.write32(addr, value | bits);
    }

    /// Clear `bits` in the register at `addr`, leaving the others untouched
    #[inline]
    fn clear_bits(&mut self, addr: u32, bits: u32) {
        let value = self.read32(addr);
        self.write32(addr, value & !bits);
    }

    /// Read the register at `addr`, pass it through `f` and write the result back
    #[inline]
    fn modify32<F: FnOnce(u32) -> u32>(&mut self, addr: u32, f: F)
    where
        Self: Sized,
    {
        let value = self.read32(addr);
        self.write32(addr, f(value));
    }
}

impl<T: RegisterIo> RegisterIo for &mut T {
    #[inline]
    fn read32(&self, addr: u32) -> u32 {
        (**self).read32(addr)
    }

    #[inline]
    fn write32(&mut self, addr: u32, value: u32) {
        (**self).write32(addr, value)
    }

    #[inline]
    fn set_bits(&mut self, addr: u32, bits: u32) {
        (**self).set_bits(addr, bits)
    }

    #[inline]
    fn clear_bits(&mut self, addr: u32, bits: u32) {
        (**self).clear_bits(addr, bits)
    }
}

/// Memory-mapped register access on the RP2040
///
/// Bit set and clear operations use the atomic register aliases described in
/// [section 2.1.2 of the RP2040 datasheet][section_2_1_2], so they never race
/// with the other core or an interrupt touching other bits of the same
/// register.
///
/// [section_2_1_2]: https://datasheets.raspberrypi.com/rp2040/rp2040-datasheet.pdf#atomic-rwtype
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Create a new instance of [`Mmio`]
    ///
    /// # Safety
    ///
    /// Only valid on an RP2040. Every address handed to the resulting
    /// instance must be a PWM or IO_BANK0 register that is not concurrently
    /// owned by another driver.
    #[inline]
    pub const unsafe fn new() -> Self {
        Mmio { _private: () }
    }
}

impl RegisterIo for Mmio {
    #[inline]
    fn read32(&self, addr: u32) -> u32 {
        // Safety: `Mmio::new` requires `addr` to be a valid peripheral register
        unsafe { read_volatile(addr as *const u32) }
    }

    #[inline]
    fn write32(&mut self, addr: u32, value: u32) {
        // Safety: `Mmio::new` requires `addr` to be a valid peripheral register
        unsafe { write_volatile(addr as *mut u32, value) }
    }

    #[inline]
    fn set_bits(&mut self, addr: u32, bits: u32) {
        // Safety: PWM and IO_BANK0 registers provide the atomic set alias
        unsafe { write_volatile((addr + 0x2000) as *mut u32, bits) }
    }

    #[inline]
    fn clear_bits(&mut self, addr: u32, bits: u32) {
        // Safety: PWM and IO_BANK0 registers provide the atomic clear alias
        unsafe { write_volatile((addr + 0x3000) as *mut u32, bits) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimRegisters;

    #[test]
    fn gpio_ctrl_addresses() {
        assert_eq!(gpio_ctrl(0), 0x4001_4004);
        assert_eq!(gpio_ctrl(16), 0x4001_4084);
        assert_eq!(gpio_ctrl(29), 0x4001_40ec);
    }

    #[test]
    fn bit_helpers_preserve_other_bits() {
        let mut regs = SimRegisters::new();
        let addr = PWM_BASE + offset::CSR;
        regs.write32(addr, csr::B_INV);
        regs.set_bits(addr, csr::EN | csr::PH_CORRECT);
        assert_eq!(regs.read32(addr), csr::EN | csr::PH_CORRECT | csr::B_INV);
        regs.clear_bits(addr, csr::EN);
        assert_eq!(regs.read32(addr), csr::PH_CORRECT | csr::B_INV);
        regs.modify32(addr, |v| v & !csr::B_INV);
        assert_eq!(regs.read32(addr), csr::PH_CORRECT);
    }

    #[test]
    fn forwarding_through_mutable_reference() {
        fn poke<R: RegisterIo>(mut io: R) {
            io.write32(PWM_BASE + offset::CC, 0x0001_0002);
            io.set_bits(PWM_BASE + offset::CSR, csr::EN);
        }

        let mut regs = SimRegisters::new();
        poke(&mut regs);
        assert_eq!(regs.read32(PWM_BASE + offset::CC), 0x0001_0002);
        assert_eq!(regs.read32(PWM_BASE + offset::CSR), csr::EN);
    }
}
