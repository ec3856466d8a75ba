//! Simulated register file for host tests

use std::{cell::RefCell, collections::BTreeMap, rc::Rc, vec::Vec};

use crate::reg::{csr, offset, RegisterIo, PWM_BASE, SLICE_STRIDE};

const SLICES: u32 = 8;

/// One recorded register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Write {
    pub addr: u32,
    pub value: u32,
    /// Whether the owning slice's enable bit was set when the write landed
    pub slice_enabled: bool,
}

#[derive(Default)]
struct State {
    regs: BTreeMap<u32, u32>,
    log: Vec<Write>,
}

/// Register file shared between a driver under test and the test body
#[derive(Clone, Default)]
pub struct SimRegisters(Rc<RefCell<State>>);

fn slice_csr(addr: u32) -> Option<u32> {
    let end = PWM_BASE + SLICES * SLICE_STRIDE;
    if (PWM_BASE..end).contains(&addr) {
        Some(PWM_BASE + (addr - PWM_BASE) / SLICE_STRIDE * SLICE_STRIDE + offset::CSR)
    } else {
        None
    }
}

fn reset_value(addr: u32) -> u32 {
    match slice_csr(addr) {
        Some(csr_addr) if addr == csr_addr + offset::DIV => 0x10,
        Some(csr_addr) if addr == csr_addr + offset::TOP => 0xffff,
        _ => 0,
    }
}

impl SimRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write since construction or the last [`clear_log`](Self::clear_log)
    pub fn writes(&self) -> Vec<Write> {
        self.0.borrow().log.clone()
    }

    /// Writes to `addr` only
    pub fn writes_to(&self, addr: u32) -> Vec<Write> {
        self.0
            .borrow()
            .log
            .iter()
            .filter(|w| w.addr == addr)
            .copied()
            .collect()
    }

    pub fn clear_log(&self) {
        self.0.borrow_mut().log.clear();
    }
}

impl RegisterIo for SimRegisters {
    fn read32(&self, addr: u32) -> u32 {
        let state = self.0.borrow();
        state
            .regs
            .get(&addr)
            .copied()
            .unwrap_or_else(|| reset_value(addr))
    }

    fn write32(&mut self, addr: u32, value: u32) {
        let slice_enabled = slice_csr(addr)
            .map(|csr_addr| self.read32(csr_addr) & csr::EN != 0)
            .unwrap_or(false);
        let mut state = self.0.borrow_mut();
        state.log.push(Write {
            addr,
            value,
            slice_enabled,
        });
        state.regs.insert(addr, value);
    }
}
