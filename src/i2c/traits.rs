// Licensed under the Apache-2.0 license

//! # I2C Register Access Traits
//!
//! The transfer sequencer never touches registers directly. It drives the peripheral
//! through the two traits below, which each register layout (and the test mock)
//! implements once. This keeps the state machine independent of the silicon series.
//!
//! ## Trait Hierarchy
//!
//! ```text
//! I2cHardwareCore (enable, mode, clocking, interrupt flags)
//!     └── I2cControllerBus (bus commands and data for controller-mode transfers)
//! ```

use crate::i2c::common::{ClockRatio, I2cInterrupt};

/// Peripheral-level control shared by every I2C operating mode.
///
/// The interrupt methods mirror the hardware registers one-to-one: `IEN` for the
/// enable mask and `IF` for the pending flags. How the set/clear is performed
/// (alias windows or read-modify-write) is up to the implementation.
pub trait I2cHardwareCore {
    /// Enable or disable the peripheral.
    fn enable(&mut self, enable: bool);

    /// Return all registers to their reset values.
    fn reset(&mut self);

    /// Select controller (`true`) or target (`false`) mode.
    fn set_controller_mode(&mut self, controller: bool);

    /// Program the SCL low/high ratio.
    fn set_clock_ratio(&mut self, ratio: ClockRatio);

    /// Currently programmed SCL low/high ratio.
    fn clock_ratio(&self) -> ClockRatio;

    /// Program the clock divider (`CLKDIV.DIV`).
    fn set_clock_divider(&mut self, div: u16);

    /// Currently programmed clock divider.
    fn clock_divider(&self) -> u16;

    /// Frequency of the clock feeding the peripheral, in Hz.
    fn reference_clock(&self) -> u32;

    /// Enable the given interrupt sources, leaving the others untouched.
    fn enable_interrupts(&mut self, mask: I2cInterrupt);

    /// Disable the given interrupt sources, leaving the others untouched.
    fn disable_interrupts(&mut self, mask: I2cInterrupt);

    /// Clear pending interrupt flags.
    fn clear_interrupts(&mut self, mask: I2cInterrupt);

    /// Set interrupt flags from software.
    fn set_interrupts(&mut self, mask: I2cInterrupt);

    /// Enabled interrupt sources.
    fn enabled_interrupts(&self) -> I2cInterrupt;

    /// Pending interrupt flags, whether enabled or not. Does not clear them.
    fn pending_interrupts(&self) -> I2cInterrupt;

    /// Pending flags that are also enabled, as seen by the interrupt handler.
    fn enabled_pending_interrupts(&self) -> I2cInterrupt {
        self.pending_interrupts() & self.enabled_interrupts()
    }
}

/// Controller-mode bus primitives used by the transfer sequencer.
pub trait I2cControllerBus: I2cHardwareCore {
    /// Load an address byte (already shifted, R/W bit included) for transmission.
    fn write_address(&mut self, byte: u8);

    /// Load a data byte for transmission.
    fn write_data(&mut self, byte: u8);

    /// Take the received data byte.
    fn read_data(&mut self) -> u8;

    /// Send a START condition.
    fn issue_start(&mut self);

    /// Send a repeated START condition (START while the bus is owned).
    fn issue_repeated_start(&mut self);

    /// Send a STOP condition.
    fn issue_stop(&mut self);

    /// ACK the byte just received.
    fn ack(&mut self);

    /// NACK the byte just received.
    fn nack(&mut self);

    /// Abort the current transmission and release the bus internally.
    fn abort(&mut self);

    /// Discard anything left in the transmit buffer.
    fn clear_tx(&mut self);

    /// Whether the controller currently considers the bus busy.
    fn is_busy(&self) -> bool;

    /// Bus events that have occurred, the sequencer's view of `IF`.
    fn status(&self) -> I2cInterrupt {
        self.pending_interrupts()
    }
}
