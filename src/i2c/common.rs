// Licensed under the Apache-2.0 license

//! Common types and constants for the Gecko I2C driver modules.
//!
//! This module provides shared definitions for configuration, transfer flags and
//! result codes, interrupt flag masks and error handling used across the driver.

use bitflags::bitflags;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use fugit::HertzU32;

/// Standard mode max frequency with the 4:4 low/high ratio.
///
/// Series 1 parts are characterized slightly below the 100 kHz limit of the bus.
#[cfg(feature = "series1")]
pub const FREQ_STANDARD_MAX: HertzU32 = HertzU32::from_raw(92_000);
/// Standard mode max frequency with the 4:4 low/high ratio.
#[cfg(not(feature = "series1"))]
pub const FREQ_STANDARD_MAX: HertzU32 = HertzU32::from_raw(100_000);

/// Fast mode max frequency with the 6:3 low/high ratio.
pub const FREQ_FAST_MAX: HertzU32 = HertzU32::from_raw(392_157);

/// Fast mode plus max frequency with the 11:6 low/high ratio.
pub const FREQ_FASTPLUS_MAX: HertzU32 = HertzU32::from_raw(987_167);

/// SCL low/high period ratio (`CTRL.CLHR`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ClockRatio {
    /// 4:4
    #[default]
    Standard = 0,
    /// 6:3
    Asymmetric = 1,
    /// 11:6
    Fast = 2,
}

impl ClockRatio {
    /// `N_low + N_high`, the number of prescaled clock cycles per SCL period.
    #[must_use]
    pub const fn low_high_sum(self) -> u32 {
        match self {
            ClockRatio::Standard => 4 + 4,
            ClockRatio::Asymmetric => 6 + 3,
            ClockRatio::Fast => 11 + 6,
        }
    }
}

pub struct I2cConfig {
    /// Enable the peripheral once initialization is complete.
    pub enable: bool,
    /// Controller (master) mode when `true`, target mode otherwise.
    pub controller_mode: bool,
    /// Reference clock used for the divider. Zero means "ask the hardware".
    pub ref_frequency: HertzU32,
    /// Upper bound for the SCL frequency.
    pub target_frequency: HertzU32,
    pub clock_ratio: ClockRatio,
}

impl Default for I2cConfig {
    fn default() -> Self {
        I2cConfigBuilder::new().build()
    }
}

pub struct I2cConfigBuilder {
    enable: bool,
    controller_mode: bool,
    ref_frequency: HertzU32,
    target_frequency: HertzU32,
    clock_ratio: ClockRatio,
}

impl Default for I2cConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enable: true,
            controller_mode: true,
            ref_frequency: HertzU32::from_raw(0),
            target_frequency: FREQ_STANDARD_MAX,
            clock_ratio: ClockRatio::Standard,
        }
    }
    #[must_use]
    pub fn enable(mut self, enable: bool) -> Self {
        self.enable = enable;
        self
    }
    #[must_use]
    pub fn controller_mode(mut self, enabled: bool) -> Self {
        self.controller_mode = enabled;
        self
    }
    #[must_use]
    pub fn ref_frequency(mut self, freq: HertzU32) -> Self {
        self.ref_frequency = freq;
        self
    }
    #[must_use]
    pub fn target_frequency(mut self, freq: HertzU32) -> Self {
        self.target_frequency = freq;
        self
    }
    #[must_use]
    pub fn clock_ratio(mut self, ratio: ClockRatio) -> Self {
        self.clock_ratio = ratio;
        self
    }
    /// Fast mode preset: 6:3 ratio at [`FREQ_FAST_MAX`].
    #[must_use]
    pub fn fast_mode(self) -> Self {
        self.clock_ratio(ClockRatio::Asymmetric).target_frequency(FREQ_FAST_MAX)
    }
    #[must_use]
    pub fn build(self) -> I2cConfig {
        I2cConfig {
            enable: self.enable,
            controller_mode: self.controller_mode,
            ref_frequency: self.ref_frequency,
            target_frequency: self.target_frequency,
            clock_ratio: self.clock_ratio,
        }
    }
}

bitflags! {
    /// Sequence type and addressing flags of a [`TransferSequence`].
    ///
    /// Exactly one of the four sequence types must be set.
    ///
    /// [`TransferSequence`]: crate::i2c::sequencer::TransferSequence
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TransferFlags: u16 {
        /// S + ADDR(W) + DATA0 + P
        const WRITE = 0x0001;
        /// S + ADDR(R) + DATA0 + P
        const READ = 0x0002;
        /// S + ADDR(W) + DATA0 + Sr + ADDR(R) + DATA1 + P
        const WRITE_READ = 0x0004;
        /// S + ADDR(W) + DATA0 + DATA1 + P
        const WRITE_WRITE = 0x0008;
        /// Use a 10-bit target address.
        const TEN_BIT_ADDR = 0x0010;
    }
}

/// The four mutually exclusive sequence types.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SequenceKind {
    Write,
    Read,
    WriteRead,
    WriteWrite,
}

impl TransferFlags {
    const SEQUENCE_MASK: Self = Self::WRITE
        .union(Self::READ)
        .union(Self::WRITE_READ)
        .union(Self::WRITE_WRITE);

    /// The sequence type, or `None` unless exactly one type bit (and nothing unknown) is set.
    #[must_use]
    pub fn kind(self) -> Option<SequenceKind> {
        if self.bits() & !Self::all().bits() != 0 {
            return None;
        }
        let kind = self.intersection(Self::SEQUENCE_MASK);
        if kind == Self::WRITE {
            Some(SequenceKind::Write)
        } else if kind == Self::READ {
            Some(SequenceKind::Read)
        } else if kind == Self::WRITE_READ {
            Some(SequenceKind::WriteRead)
        } else if kind == Self::WRITE_WRITE {
            Some(SequenceKind::WriteWrite)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_ten_bit(self) -> bool {
        self.contains(Self::TEN_BIT_ADDR)
    }
}

/// Result of one sequencer step.
///
/// Positive means the caller must step again, zero is success, negative values are errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(i8)]
pub enum TransferReturn {
    InProgress = 1,
    Done = 0,
    /// NACK received during transfer.
    Nack = -1,
    /// Misplaced START/STOP on the bus.
    BusErr = -2,
    /// Another controller won arbitration.
    ArbLost = -3,
    /// The sequence handed to `transfer_init` was invalid.
    UsageFault = -4,
    /// Stepped without an active transfer.
    SwFault = -5,
}

impl TransferReturn {
    #[must_use]
    pub const fn code(self) -> i8 {
        self as i8
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.code() <= 0
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        self.code() < 0
    }
}

bitflags! {
    /// Interrupt flag bits shared by `IF`, `IEN` and their set/clear registers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct I2cInterrupt: u32 {
        const START = 1 << 0;
        const RSTART = 1 << 1;
        const ADDR = 1 << 2;
        const TXC = 1 << 3;
        const TXBL = 1 << 4;
        const RXDATAV = 1 << 5;
        const ACK = 1 << 6;
        const NACK = 1 << 7;
        const MSTOP = 1 << 8;
        const ARBLOST = 1 << 9;
        const BUSERR = 1 << 10;
        const BUSHOLD = 1 << 11;
        const TXOF = 1 << 12;
        const RXUF = 1 << 13;
        const BITO = 1 << 14;
        const CLTO = 1 << 15;
        const SSTOP = 1 << 16;
        const RXFULL = 1 << 17;
        const CLERR = 1 << 18;
    }
}

impl I2cInterrupt {
    /// Fatal bus conditions.
    pub const ERRORS: Self = Self::ARBLOST.union(Self::BUSERR);

    /// Sources the controller-mode sequencer is driven by.
    pub const TRANSFER: Self = Self::ACK
        .union(Self::NACK)
        .union(Self::RXDATAV)
        .union(Self::ERRORS);
}

/// Driver error, the typed form of a failing [`TransferReturn`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Nack(NoAcknowledgeSource),
    BusError,
    ArbitrationLoss,
    UsageFault,
    SoftwareFault,
    /// The blocking helper ran out of its poll budget.
    Timeout,
    /// An `embedded_hal` operation list the sequencer cannot express.
    UnsupportedOperation,
}

impl Error {
    /// Map a terminal error code. `Nack` carries the phase it was observed in.
    #[must_use]
    pub fn from_return(ret: TransferReturn, nack_source: NoAcknowledgeSource) -> Option<Self> {
        match ret {
            TransferReturn::InProgress | TransferReturn::Done => None,
            TransferReturn::Nack => Some(Error::Nack(nack_source)),
            TransferReturn::BusErr => Some(Error::BusError),
            TransferReturn::ArbLost => Some(Error::ArbitrationLoss),
            TransferReturn::UsageFault => Some(Error::UsageFault),
            TransferReturn::SwFault => Some(Error::SoftwareFault),
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match *self {
            Error::Nack(source) => ErrorKind::NoAcknowledge(source),
            Error::BusError => ErrorKind::Bus,
            Error::ArbitrationLoss => ErrorKind::ArbitrationLoss,
            _ => ErrorKind::Other,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Nack(source) => write!(f, "nack ({source:?})"),
            Error::BusError => f.write_str("bus error"),
            Error::ArbitrationLoss => f.write_str("arbitration lost"),
            Error::UsageFault => f.write_str("invalid transfer sequence"),
            Error::SoftwareFault => f.write_str("no active transfer"),
            Error::Timeout => f.write_str("transfer timed out"),
            Error::UnsupportedOperation => f.write_str("unsupported operation sequence"),
        }
    }
}
