// Licensed under the Apache-2.0 license

//! Memory-mapped register backends for the Gecko I2C block.
//!
//! The block is the same across silicon series except for how the peripheral is
//! enabled and how interrupt flags and enables are set or cleared:
//!
//! - Series 1 enables through `CTRL.EN`, has dedicated `IFS`/`IFC` registers and no
//!   atomic access to `IEN`, which is read-modify-written.
//! - Series 2 has a separate `EN` register and mirrors every register at `+0x1000`
//!   (bit set) and `+0x2000` (bit clear).
//!
//! [`RegisterLayout`] captures those differences; [`GeckoI2c`] implements the driver
//! traits once on top of it. [`DefaultLayout`] is Series 2 unless the `series1`
//! feature is enabled.

use core::marker::PhantomData;

use fugit::HertzU32;

use crate::i2c::common::{ClockRatio, I2cInterrupt};
use crate::i2c::traits::{I2cControllerBus, I2cHardwareCore};

const CTRL_EN: u32 = 1 << 0;
const CTRL_SLAVE: u32 = 1 << 1;
const CTRL_CLHR_SHIFT: u32 = 8;
const CTRL_CLHR_MASK: u32 = 0x3 << CTRL_CLHR_SHIFT;

const CMD_START: u32 = 1 << 0;
const CMD_STOP: u32 = 1 << 1;
const CMD_ACK: u32 = 1 << 2;
const CMD_NACK: u32 = 1 << 3;
const CMD_ABORT: u32 = 1 << 5;
const CMD_CLEARTX: u32 = 1 << 6;
const CMD_CLEARPC: u32 = 1 << 7;

const STATE_BUSY: u32 = 1 << 0;

const CLKDIV_MASK: u32 = 0x1ff;
const DATA_MASK: u32 = 0xff;

/// Raw access to one register block.
#[derive(Clone, Copy, Debug)]
pub struct Registers {
    base: *mut u32,
}

impl Registers {
    /// # Safety
    ///
    /// `base` must point at an I2C register block (or memory standing in for one)
    /// covering every offset of the layout in use, including the alias windows, and
    /// no other code may drive the same block concurrently.
    #[must_use]
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u32,
        }
    }

    #[inline]
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: `new` guarantees the block covers every layout offset.
        unsafe { core::ptr::read_volatile(self.base.byte_add(offset)) }
    }

    #[inline]
    fn write(&self, offset: usize, value: u32) {
        // SAFETY: `new` guarantees the block covers every layout offset.
        unsafe { core::ptr::write_volatile(self.base.byte_add(offset), value) }
    }

    #[inline]
    fn modify(&self, offset: usize, f: impl FnOnce(u32) -> u32) {
        let value = self.read(offset);
        self.write(offset, f(value));
    }
}

/// Register offsets and the set/clear mechanics of one silicon series.
pub trait RegisterLayout {
    const CTRL: usize;
    const CMD: usize;
    const STATE: usize;
    const CLKDIV: usize;
    const RXDATA: usize;
    const TXDATA: usize;
    const IF: usize;
    const IEN: usize;

    fn set_enabled(regs: &Registers, enable: bool);
    fn set_flags(regs: &Registers, mask: u32);
    fn clear_flags(regs: &Registers, mask: u32);
    fn set_enables(regs: &Registers, mask: u32);
    fn clear_enables(regs: &Registers, mask: u32);
}

/// Series 1 layout: `CTRL.EN`, `IFS`/`IFC`, read-modify-write `IEN`.
pub struct Series1;

impl Series1 {
    const IFS: usize = 0x038;
    const IFC: usize = 0x03c;
}

impl RegisterLayout for Series1 {
    const CTRL: usize = 0x000;
    const CMD: usize = 0x004;
    const STATE: usize = 0x008;
    const CLKDIV: usize = 0x010;
    const RXDATA: usize = 0x01c;
    const TXDATA: usize = 0x02c;
    const IF: usize = 0x034;
    const IEN: usize = 0x040;

    fn set_enabled(regs: &Registers, enable: bool) {
        regs.modify(Self::CTRL, |v| if enable { v | CTRL_EN } else { v & !CTRL_EN });
    }

    fn set_flags(regs: &Registers, mask: u32) {
        regs.write(Self::IFS, mask);
    }

    fn clear_flags(regs: &Registers, mask: u32) {
        regs.write(Self::IFC, mask);
    }

    fn set_enables(regs: &Registers, mask: u32) {
        regs.modify(Self::IEN, |v| v | mask);
    }

    fn clear_enables(regs: &Registers, mask: u32) {
        regs.modify(Self::IEN, |v| v & !mask);
    }
}

/// Series 2 layout: `EN` register and `_SET`/`_CLR` alias windows.
pub struct Series2;

impl Series2 {
    const EN: usize = 0x004;
    const SET_ALIAS: usize = 0x1000;
    const CLR_ALIAS: usize = 0x2000;
}

impl RegisterLayout for Series2 {
    const CTRL: usize = 0x008;
    const CMD: usize = 0x00c;
    const STATE: usize = 0x010;
    const CLKDIV: usize = 0x018;
    const RXDATA: usize = 0x024;
    const TXDATA: usize = 0x034;
    const IF: usize = 0x03c;
    const IEN: usize = 0x040;

    fn set_enabled(regs: &Registers, enable: bool) {
        regs.write(Self::EN, u32::from(enable));
    }

    fn set_flags(regs: &Registers, mask: u32) {
        regs.write(Self::IF + Self::SET_ALIAS, mask);
    }

    fn clear_flags(regs: &Registers, mask: u32) {
        regs.write(Self::IF + Self::CLR_ALIAS, mask);
    }

    fn set_enables(regs: &Registers, mask: u32) {
        regs.write(Self::IEN + Self::SET_ALIAS, mask);
    }

    fn clear_enables(regs: &Registers, mask: u32) {
        regs.write(Self::IEN + Self::CLR_ALIAS, mask);
    }
}

#[cfg(feature = "series1")]
pub type DefaultLayout = Series1;
#[cfg(not(feature = "series1"))]
pub type DefaultLayout = Series2;

/// A peripheral instance with a fixed base address.
pub trait Instance {
    const BASE: usize;
}

macro_rules! i2c_instances {
    ($($n:literal => $base:literal),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = "Ownership token for I2C" $n "."]
                pub struct [<I2c $n>] {
                    _private: (),
                }

                impl [<I2c $n>] {
                    /// # Safety
                    ///
                    /// Only one token per instance may be alive at a time.
                    #[must_use]
                    pub unsafe fn steal() -> Self {
                        Self { _private: () }
                    }
                }

                impl Instance for [<I2c $n>] {
                    const BASE: usize = $base;
                }
            )*
        }
    };
}

#[cfg(feature = "series1")]
i2c_instances! {
    0 => 0x4000_c000,
    1 => 0x4000_c400,
}

#[cfg(not(feature = "series1"))]
i2c_instances! {
    0 => 0x4a01_0000,
    1 => 0x4006_8000,
}

/// Register-level driver for one I2C peripheral.
pub struct GeckoI2c<L: RegisterLayout = DefaultLayout> {
    regs: Registers,
    ref_clock: HertzU32,
    _layout: PhantomData<L>,
}

impl<L: RegisterLayout> GeckoI2c<L> {
    /// Take ownership of an instance. `ref_clock` is the frequency of the
    /// peripheral clock as configured by the clock tree.
    pub fn new<I: Instance>(_instance: I, ref_clock: HertzU32) -> Self {
        // SAFETY: the token proves exclusive ownership of the block at `I::BASE`.
        let regs = unsafe { Registers::new(I::BASE) };
        Self::from_registers(regs, ref_clock)
    }

    #[must_use]
    pub fn from_registers(regs: Registers, ref_clock: HertzU32) -> Self {
        Self {
            regs,
            ref_clock,
            _layout: PhantomData,
        }
    }

    fn command(&self, cmd: u32) {
        self.regs.write(L::CMD, cmd);
    }
}

impl<L: RegisterLayout> I2cHardwareCore for GeckoI2c<L> {
    fn enable(&mut self, enable: bool) {
        L::set_enabled(&self.regs, enable);
    }

    fn reset(&mut self) {
        L::set_enabled(&self.regs, false);
        L::clear_enables(&self.regs, I2cInterrupt::all().bits());
        L::clear_flags(&self.regs, I2cInterrupt::all().bits());
        self.regs.write(L::CTRL, 0);
        self.regs.write(L::CLKDIV, 0);
        self.command(CMD_ABORT | CMD_CLEARTX | CMD_CLEARPC);
    }

    fn set_controller_mode(&mut self, controller: bool) {
        self.regs.modify(L::CTRL, |v| {
            if controller {
                v & !CTRL_SLAVE
            } else {
                v | CTRL_SLAVE
            }
        });
    }

    fn set_clock_ratio(&mut self, ratio: ClockRatio) {
        let field = (ratio as u32) << CTRL_CLHR_SHIFT;
        self.regs.modify(L::CTRL, |v| (v & !CTRL_CLHR_MASK) | field);
    }

    fn clock_ratio(&self) -> ClockRatio {
        match (self.regs.read(L::CTRL) & CTRL_CLHR_MASK) >> CTRL_CLHR_SHIFT {
            0 => ClockRatio::Standard,
            1 => ClockRatio::Asymmetric,
            _ => ClockRatio::Fast,
        }
    }

    fn set_clock_divider(&mut self, div: u16) {
        self.regs.write(L::CLKDIV, u32::from(div) & CLKDIV_MASK);
    }

    fn clock_divider(&self) -> u16 {
        // Masked to nine bits.
        (self.regs.read(L::CLKDIV) & CLKDIV_MASK) as u16
    }

    fn reference_clock(&self) -> u32 {
        self.ref_clock.raw()
    }

    fn enable_interrupts(&mut self, mask: I2cInterrupt) {
        L::set_enables(&self.regs, mask.bits());
    }

    fn disable_interrupts(&mut self, mask: I2cInterrupt) {
        L::clear_enables(&self.regs, mask.bits());
    }

    fn clear_interrupts(&mut self, mask: I2cInterrupt) {
        L::clear_flags(&self.regs, mask.bits());
    }

    fn set_interrupts(&mut self, mask: I2cInterrupt) {
        L::set_flags(&self.regs, mask.bits());
    }

    fn enabled_interrupts(&self) -> I2cInterrupt {
        I2cInterrupt::from_bits_truncate(self.regs.read(L::IEN))
    }

    fn pending_interrupts(&self) -> I2cInterrupt {
        I2cInterrupt::from_bits_truncate(self.regs.read(L::IF))
    }
}

impl<L: RegisterLayout> I2cControllerBus for GeckoI2c<L> {
    fn write_address(&mut self, byte: u8) {
        self.regs.write(L::TXDATA, u32::from(byte));
    }

    fn write_data(&mut self, byte: u8) {
        self.regs.write(L::TXDATA, u32::from(byte));
    }

    fn read_data(&mut self) -> u8 {
        (self.regs.read(L::RXDATA) & DATA_MASK) as u8
    }

    fn issue_start(&mut self) {
        self.command(CMD_START);
    }

    fn issue_repeated_start(&mut self) {
        // START while the bus is owned is sent as a repeated START.
        self.command(CMD_START);
    }

    fn issue_stop(&mut self) {
        self.command(CMD_STOP);
    }

    fn ack(&mut self) {
        self.command(CMD_ACK);
    }

    fn nack(&mut self) {
        self.command(CMD_NACK);
    }

    fn abort(&mut self) {
        self.command(CMD_ABORT);
    }

    fn clear_tx(&mut self) {
        self.command(CMD_CLEARTX);
    }

    fn is_busy(&self) -> bool {
        self.regs.read(L::STATE) & STATE_BUSY != 0
    }
}
