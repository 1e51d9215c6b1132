// Licensed under the Apache-2.0 license

//! High-level I2C controller for Gecko-family MCUs.
//!
//! Wraps a register backend with its configuration and a logger. Transfers can be
//! driven three ways: step by step from the interrupt handler with
//! [`I2cController::transfer`], non-blocking with [`I2cController::poll`], or to
//! completion with [`I2cController::transfer_blocking`] and the `embedded_hal` traits.

use core::fmt::{self, Write as _};

use embedded_hal::i2c::{Operation, SevenBitAddress, TenBitAddress};
use fugit::HertzU32;
use heapless::String;

use crate::common::{LogLevel, Logger, NoOpLogger, LOG_MESSAGE_CAPACITY};
use crate::i2c::clock;
use crate::i2c::common::{Error, I2cConfig, I2cInterrupt, TransferReturn};
use crate::i2c::sequencer::{TransferSequence, TransferState};
use crate::i2c::traits::I2cControllerBus;

pub struct I2cController<H: I2cControllerBus, L: Logger = NoOpLogger> {
    pub hardware: H,
    pub config: I2cConfig,
    pub logger: L,
}

impl<H: I2cControllerBus, L: Logger> I2cController<H, L> {
    pub fn new(hardware: H, config: I2cConfig, logger: L) -> Self {
        Self {
            hardware,
            config,
            logger,
        }
    }

    /// Bring the peripheral up from `self.config`.
    ///
    /// All interrupt sources are disabled and cleared first, so a transfer left over
    /// from before the call can no longer raise events.
    pub fn init(&mut self) {
        self.hardware.enable(false);
        self.hardware.disable_interrupts(I2cInterrupt::all());
        self.hardware.clear_interrupts(I2cInterrupt::all());
        self.hardware.set_controller_mode(self.config.controller_mode);
        self.set_bus_frequency(self.config.target_frequency);
        self.hardware.enable(self.config.enable);

        let scl = self.bus_frequency().raw();
        self.log_fmt(LogLevel::Info, format_args!("i2c: scl {} Hz", scl));
    }

    /// Program the divider for the fastest SCL not above `target`, with the
    /// configured low/high ratio.
    pub fn set_bus_frequency(&mut self, target: HertzU32) {
        let ratio = self.config.clock_ratio;
        let div = clock::divider_for(self.reference_clock(), target.raw(), ratio);
        self.hardware.set_clock_ratio(ratio);
        self.hardware.set_clock_divider(div);
    }

    /// SCL frequency currently produced by the hardware.
    pub fn bus_frequency(&self) -> HertzU32 {
        HertzU32::from_raw(clock::scl_frequency(
            self.reference_clock(),
            self.hardware.clock_divider(),
            self.hardware.clock_ratio(),
        ))
    }

    fn reference_clock(&self) -> u32 {
        match self.config.ref_frequency.raw() {
            0 => self.hardware.reference_clock(),
            hz => hz,
        }
    }

    /// Validate `sequence` and start it. Completion is reported by [`Self::transfer`].
    pub fn transfer_init<'a>(
        &mut self,
        state: &mut TransferState<'a>,
        sequence: TransferSequence<'a>,
    ) -> TransferReturn {
        let address = sequence.address;
        let flags = sequence.flags;
        let ret = state.init(&mut self.hardware, sequence);
        if ret == TransferReturn::UsageFault {
            self.log_fmt(
                LogLevel::Error,
                format_args!("i2c: bad sequence {:#x} {:#x}", address, flags.bits()),
            );
        } else {
            self.log_fmt(
                LogLevel::Debug,
                format_args!("i2c: start {:#x} {:#x}", address, flags.bits()),
            );
        }
        ret
    }

    /// Handle pending bus events. Call from the interrupt handler, or keep calling
    /// while it returns [`TransferReturn::InProgress`].
    pub fn transfer(&mut self, state: &mut TransferState<'_>) -> TransferReturn {
        let ret = state.step(&mut self.hardware);
        match ret {
            TransferReturn::InProgress => {}
            TransferReturn::Done => self.logger.debug("i2c: done"),
            _ => self.log_fmt(LogLevel::Error, format_args!("i2c: failed {:?}", ret)),
        }
        ret
    }

    /// [`Self::transfer`] in `nb` form.
    pub fn poll(&mut self, state: &mut TransferState<'_>) -> nb::Result<(), Error> {
        match self.transfer(state) {
            TransferReturn::InProgress => Err(nb::Error::WouldBlock),
            TransferReturn::Done => Ok(()),
            ret => Err(nb::Error::Other(
                Error::from_return(ret, state.nack_source()).unwrap_or(Error::SoftwareFault),
            )),
        }
    }

    /// Run `sequence` to completion, polling without limit.
    pub fn transfer_blocking(&mut self, sequence: TransferSequence<'_>) -> Result<(), Error> {
        self.transfer_blocking_with_budget(sequence, None)
    }

    /// Run `sequence` to completion, giving up with [`Error::Timeout`] after `budget`
    /// polls that made no final progress.
    pub fn transfer_blocking_with_budget(
        &mut self,
        sequence: TransferSequence<'_>,
        budget: Option<u32>,
    ) -> Result<(), Error> {
        let mut state = TransferState::new();
        let ret = self.transfer_init(&mut state, sequence);
        if let Some(err) = Error::from_return(ret, state.nack_source()) {
            return Err(err);
        }

        let mut polls: u32 = 0;
        loop {
            match self.poll(&mut state) {
                Ok(()) => return Ok(()),
                Err(nb::Error::Other(err)) => return Err(err),
                Err(nb::Error::WouldBlock) => {}
            }
            if let Some(limit) = budget {
                polls += 1;
                if polls >= limit {
                    self.hardware.abort();
                    self.hardware.disable_interrupts(I2cInterrupt::TRANSFER);
                    self.hardware.clear_interrupts(I2cInterrupt::TRANSFER);
                    self.logger.error("i2c: timeout");
                    return Err(Error::Timeout);
                }
            }
        }
    }

    /// Map an `embedded_hal` operation list onto one of the four sequence types.
    fn run_operations(
        &mut self,
        address: u16,
        ten_bit: bool,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        let sequence = match operations {
            [] => return Ok(()),
            [Operation::Write(bytes)] => TransferSequence::write(address, bytes),
            [Operation::Read(buffer)] => TransferSequence::read(address, buffer),
            [Operation::Write(bytes), Operation::Read(buffer)] => {
                TransferSequence::write_read(address, bytes, buffer)
            }
            [Operation::Write(first), Operation::Write(second)] => {
                TransferSequence::write_write(address, first, second)
            }
            _ => {
                self.logger.error("i2c: unsupported operations");
                return Err(Error::UnsupportedOperation);
            }
        };
        let sequence = if ten_bit {
            sequence.ten_bit()
        } else {
            sequence
        };
        self.transfer_blocking(sequence)
    }

    fn log_fmt(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
        let mut msg: String<LOG_MESSAGE_CAPACITY> = String::new();
        // Overflow drops the rest of the message.
        let _ = msg.write_fmt(args);
        self.logger.log(level, &msg);
    }
}

impl<H: I2cControllerBus, L: Logger> embedded_hal::i2c::ErrorType for I2cController<H, L> {
    type Error = Error;
}

/// Supported operation lists are `[]`, `[Write]`, `[Read]`, `[Write, Read]` and
/// `[Write, Write]`; any other shape fails with [`Error::UnsupportedOperation`]
/// before touching the bus.
impl<H: I2cControllerBus, L: Logger> embedded_hal::i2c::I2c<SevenBitAddress>
    for I2cController<H, L>
{
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.run_operations(u16::from(address), false, operations)
    }
}

/// Same operation shapes as the 7-bit implementation.
impl<H: I2cControllerBus, L: Logger> embedded_hal::i2c::I2c<TenBitAddress>
    for I2cController<H, L>
{
    fn transaction(
        &mut self,
        address: TenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.run_operations(address, true, operations)
    }
}
