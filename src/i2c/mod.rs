// Licensed under the Apache-2.0 license

//! Gecko I2C driver module.
//!
//! Controller-mode transfers on the I2C peripheral of Gecko-family MCUs, for bare-metal
//! and `no_std` environments. The transfer sequencer is written against the register
//! access traits, so the same state machine drives either register layout and the
//! recording mock used by the tests.

pub mod clock;
pub mod common;
pub mod i2c_controller;
#[cfg(test)]
pub(crate) mod mock;
pub mod registers;
pub mod sequencer;
pub mod traits;
