// Licensed under the Apache-2.0 license

//! Controller-mode transfer sequencer.
//!
//! A transfer is started with [`TransferState::init`], which validates the
//! [`TransferSequence`], sends START and the first address byte. Every following bus
//! event (ACK, NACK, received data, arbitration loss, bus error) is handled by one call
//! to [`TransferState::step`], usually from the peripheral's interrupt handler, until a
//! terminal [`TransferReturn`] comes back.
//!
//! ```text
//! Idle -> Address -> [TenBitSecondByte] -> {Transmit | Receive}
//!      -> [Sr -> ReAddress -> Receive] -> Idle
//! ```
//!
//! WRITE_READ always re-addresses with a repeated START, WRITE_WRITE continues into
//! the second buffer without one. Terminal results leave the transfer's interrupt
//! sources disabled and cleared, and any step taken afterwards reports `SwFault`.

use embedded_hal::i2c::NoAcknowledgeSource;

use crate::i2c::common::{I2cInterrupt, SequenceKind, TransferFlags, TransferReturn};
use crate::i2c::traits::I2cControllerBus;

const SEVEN_BIT_MAX: u16 = 0x7f;
const TEN_BIT_MAX: u16 = 0x3ff;
const TEN_BIT_HEADER: u8 = 0b1111_0000;

/// One data buffer of a sequence.
#[derive(Debug)]
pub enum Buffer<'a> {
    /// Bytes to send. May be empty.
    Tx(&'a [u8]),
    /// Storage for received bytes. Must not be empty.
    Rx(&'a mut [u8]),
}

impl Default for Buffer<'_> {
    fn default() -> Self {
        Buffer::Tx(&[])
    }
}

impl Buffer<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Buffer::Tx(data) => data.len(),
            Buffer::Rx(data) => data.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_tx(&self) -> bool {
        matches!(self, Buffer::Tx(_))
    }

    fn is_nonempty_rx(&self) -> bool {
        matches!(self, Buffer::Rx(data) if !data.is_empty())
    }
}

/// Complete description of one transaction, from START to STOP.
#[derive(Debug)]
pub struct TransferSequence<'a> {
    /// Un-shifted 7-bit or 10-bit target address.
    pub address: u16,
    pub flags: TransferFlags,
    /// Buffer 0 is always used, buffer 1 only by WRITE_READ and WRITE_WRITE.
    pub buffers: [Buffer<'a>; 2],
}

impl<'a> TransferSequence<'a> {
    #[must_use]
    pub fn new(address: u16, flags: TransferFlags, buffers: [Buffer<'a>; 2]) -> Self {
        Self {
            address,
            flags,
            buffers,
        }
    }

    /// S + ADDR(W) + `bytes` + P
    #[must_use]
    pub fn write(address: u16, bytes: &'a [u8]) -> Self {
        Self::new(
            address,
            TransferFlags::WRITE,
            [Buffer::Tx(bytes), Buffer::default()],
        )
    }

    /// S + ADDR(R) + `buffer` + P
    #[must_use]
    pub fn read(address: u16, buffer: &'a mut [u8]) -> Self {
        Self::new(
            address,
            TransferFlags::READ,
            [Buffer::Rx(buffer), Buffer::default()],
        )
    }

    /// S + ADDR(W) + `bytes` + Sr + ADDR(R) + `buffer` + P
    #[must_use]
    pub fn write_read(address: u16, bytes: &'a [u8], buffer: &'a mut [u8]) -> Self {
        Self::new(
            address,
            TransferFlags::WRITE_READ,
            [Buffer::Tx(bytes), Buffer::Rx(buffer)],
        )
    }

    /// S + ADDR(W) + `first` + `second` + P
    #[must_use]
    pub fn write_write(address: u16, first: &'a [u8], second: &'a [u8]) -> Self {
        Self::new(
            address,
            TransferFlags::WRITE_WRITE,
            [Buffer::Tx(first), Buffer::Tx(second)],
        )
    }

    /// Switch to 10-bit addressing.
    #[must_use]
    pub fn ten_bit(mut self) -> Self {
        self.flags |= TransferFlags::TEN_BIT_ADDR;
        self
    }

    /// The sequence type if the descriptor is usable, `None` for a usage fault.
    #[must_use]
    pub fn validate(&self) -> Option<SequenceKind> {
        let kind = self.flags.kind()?;
        let max_address = if self.flags.is_ten_bit() {
            TEN_BIT_MAX
        } else {
            SEVEN_BIT_MAX
        };
        if self.address > max_address {
            return None;
        }
        let [first, second] = &self.buffers;
        let shaped = match kind {
            SequenceKind::Write => first.is_tx(),
            SequenceKind::Read => first.is_nonempty_rx(),
            SequenceKind::WriteRead => first.is_tx() && second.is_nonempty_rx(),
            SequenceKind::WriteWrite => first.is_tx() && second.is_tx(),
        };
        shaped.then_some(kind)
    }

    /// First byte after a START.
    ///
    /// 10-bit addresses start with the `11110AA` header, whose R/W bit the caller
    /// decides: a 10-bit read must first send the full address as a write.
    fn header(&self, read: bool) -> u8 {
        let rw = u8::from(read);
        if self.flags.is_ten_bit() {
            let high = ((self.address >> 7) & 0x06) as u8;
            TEN_BIT_HEADER | high | rw
        } else {
            (((self.address & SEVEN_BIT_MAX) as u8) << 1) | rw
        }
    }

    /// Low eight bits of a 10-bit address, sent after the header.
    fn ten_bit_low(&self) -> u8 {
        (self.address & 0xff) as u8
    }
}

/// Where the sequencer is within the transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No transfer in flight.
    Idle,
    /// Waiting for the first address byte to be acknowledged.
    Address,
    /// Waiting for the second byte of a 10-bit address to be acknowledged.
    TenBitSecondByte,
    /// Waiting for the read address sent after a repeated START.
    ReAddress,
    /// Waiting for a data byte to be acknowledged.
    Transmit,
    /// Waiting for a data byte to arrive.
    Receive,
}

/// Per-instance sequencer state.
///
/// Holds the active sequence for the lifetime `'a` of its buffers. Nothing is read or
/// written through the buffers once a terminal status has been returned.
#[derive(Debug)]
pub struct TransferState<'a> {
    sequence: Option<TransferSequence<'a>>,
    kind: SequenceKind,
    phase: Phase,
    buffer: usize,
    index: usize,
    result: TransferReturn,
    nack_source: NoAcknowledgeSource,
}

impl Default for TransferState<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TransferState<'a> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sequence: None,
            kind: SequenceKind::Write,
            phase: Phase::Idle,
            buffer: 0,
            index: 0,
            result: TransferReturn::Done,
            nack_source: NoAcknowledgeSource::Unknown,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Most recent status of the held transfer. A rejected `init` does not change it.
    #[must_use]
    pub fn result(&self) -> TransferReturn {
        self.result
    }

    /// Phase in which the last NACK was received.
    #[must_use]
    pub fn nack_source(&self) -> NoAcknowledgeSource {
        self.nack_source
    }

    /// Index of the buffer currently being transferred.
    #[must_use]
    pub fn active_buffer(&self) -> usize {
        self.buffer
    }

    /// Bytes moved so far within the active buffer.
    #[must_use]
    pub fn byte_index(&self) -> usize {
        self.index
    }

    /// Hand the finished sequence, and with it the buffers, back to the caller.
    ///
    /// Returns `None` while a transfer is still in flight.
    pub fn release(&mut self) -> Option<TransferSequence<'a>> {
        if self.is_active() {
            None
        } else {
            self.sequence.take()
        }
    }

    /// Start a new transfer.
    ///
    /// An invalid sequence yields `UsageFault` and leaves both the hardware and this
    /// state untouched, including a transfer still in flight. Otherwise
    /// stale bus activity is aborted, the state is reset, the transfer's interrupt
    /// sources are enabled and START plus the first address byte go out.
    pub fn init<B>(&mut self, bus: &mut B, sequence: TransferSequence<'a>) -> TransferReturn
    where
        B: I2cControllerBus + ?Sized,
    {
        let Some(kind) = sequence.validate() else {
            return TransferReturn::UsageFault;
        };

        if bus.is_busy() {
            bus.abort();
        }
        bus.clear_tx();
        bus.clear_interrupts(I2cInterrupt::all());

        // A 7-bit plain read addresses for reading straight away.
        let header = sequence.header(kind == SequenceKind::Read && !sequence.flags.is_ten_bit());

        self.sequence = Some(sequence);
        self.kind = kind;
        self.buffer = 0;
        self.index = 0;
        self.nack_source = NoAcknowledgeSource::Unknown;
        self.phase = Phase::Address;
        self.result = TransferReturn::InProgress;

        bus.enable_interrupts(I2cInterrupt::TRANSFER);
        bus.write_address(header);
        bus.issue_start();

        TransferReturn::InProgress
    }

    /// Advance the transfer by one bus event.
    pub fn step<B>(&mut self, bus: &mut B) -> TransferReturn
    where
        B: I2cControllerBus + ?Sized,
    {
        if self.phase == Phase::Idle {
            return self.finish(bus, TransferReturn::SwFault);
        }

        let status = bus.status();

        // The bus now belongs to another controller: no STOP.
        if status.contains(I2cInterrupt::ARBLOST) {
            return self.finish(bus, TransferReturn::ArbLost);
        }
        if status.contains(I2cInterrupt::BUSERR) {
            bus.abort();
            return self.finish(bus, TransferReturn::BusErr);
        }

        match self.phase {
            Phase::Address | Phase::TenBitSecondByte | Phase::ReAddress => {
                self.on_address_event(bus, status)
            }
            Phase::Transmit => self.on_transmit_event(bus, status),
            Phase::Receive => self.on_receive_event(bus, status),
            Phase::Idle => self.finish(bus, TransferReturn::SwFault),
        }
    }

    fn on_address_event<B>(&mut self, bus: &mut B, status: I2cInterrupt) -> TransferReturn
    where
        B: I2cControllerBus + ?Sized,
    {
        if status.contains(I2cInterrupt::NACK) {
            bus.clear_interrupts(I2cInterrupt::NACK);
            self.nack_source = NoAcknowledgeSource::Address;
            bus.issue_stop();
            return self.finish(bus, TransferReturn::Nack);
        }
        if !status.contains(I2cInterrupt::ACK) {
            return TransferReturn::InProgress;
        }
        bus.clear_interrupts(I2cInterrupt::ACK);

        let ten_bit = self
            .sequence
            .as_ref()
            .is_some_and(|seq| seq.flags.is_ten_bit());

        match (self.phase, self.kind) {
            (Phase::Address, _) if ten_bit => {
                let Some(low) = self.sequence.as_ref().map(TransferSequence::ten_bit_low) else {
                    return self.finish(bus, TransferReturn::SwFault);
                };
                bus.write_address(low);
                self.phase = Phase::TenBitSecondByte;
                TransferReturn::InProgress
            }
            (Phase::TenBitSecondByte, SequenceKind::Read) => self.restart_for_read(bus),
            (Phase::Address, SequenceKind::Read) | (Phase::ReAddress, _) => {
                // Data may already be waiting alongside the ACK.
                self.phase = Phase::Receive;
                self.on_receive_event(bus, status)
            }
            _ => self.send_next(bus),
        }
    }

    fn on_transmit_event<B>(&mut self, bus: &mut B, status: I2cInterrupt) -> TransferReturn
    where
        B: I2cControllerBus + ?Sized,
    {
        if status.contains(I2cInterrupt::NACK) {
            bus.clear_interrupts(I2cInterrupt::NACK);
            self.nack_source = NoAcknowledgeSource::Data;
            bus.issue_stop();
            return self.finish(bus, TransferReturn::Nack);
        }
        if !status.contains(I2cInterrupt::ACK) {
            return TransferReturn::InProgress;
        }
        bus.clear_interrupts(I2cInterrupt::ACK);
        self.send_next(bus)
    }

    fn on_receive_event<B>(&mut self, bus: &mut B, status: I2cInterrupt) -> TransferReturn
    where
        B: I2cControllerBus + ?Sized,
    {
        if !status.contains(I2cInterrupt::RXDATAV) {
            // The controller NACKs the final byte itself; that is not a failure.
            if status.contains(I2cInterrupt::NACK) {
                bus.clear_interrupts(I2cInterrupt::NACK);
            }
            return TransferReturn::InProgress;
        }

        let byte = bus.read_data();
        let index = self.index;
        let remaining = match self
            .sequence
            .as_mut()
            .and_then(|seq| seq.buffers.get_mut(self.buffer))
        {
            Some(Buffer::Rx(data)) => {
                let len = data.len();
                data.get_mut(index).map(|slot| {
                    *slot = byte;
                    len - index - 1
                })
            }
            _ => None,
        };
        let Some(remaining) = remaining else {
            return self.finish(bus, TransferReturn::SwFault);
        };
        self.index += 1;

        if remaining > 0 {
            bus.ack();
            TransferReturn::InProgress
        } else {
            bus.nack();
            bus.issue_stop();
            self.finish(bus, TransferReturn::Done)
        }
    }

    /// Push the next byte, move on to the second buffer, or end the transaction.
    fn send_next<B>(&mut self, bus: &mut B) -> TransferReturn
    where
        B: I2cControllerBus + ?Sized,
    {
        loop {
            let next = match self
                .sequence
                .as_ref()
                .and_then(|seq| seq.buffers.get(self.buffer))
            {
                Some(Buffer::Tx(data)) => Some(data.get(self.index).copied()),
                _ => None,
            };
            let Some(next) = next else {
                return self.finish(bus, TransferReturn::SwFault);
            };

            if let Some(byte) = next {
                bus.write_data(byte);
                self.index += 1;
                self.phase = Phase::Transmit;
                return TransferReturn::InProgress;
            }

            if self.buffer == 0 {
                match self.kind {
                    SequenceKind::WriteWrite => {
                        self.buffer = 1;
                        self.index = 0;
                        continue;
                    }
                    SequenceKind::WriteRead => {
                        self.buffer = 1;
                        self.index = 0;
                        return self.restart_for_read(bus);
                    }
                    SequenceKind::Write | SequenceKind::Read => {}
                }
            }

            bus.issue_stop();
            return self.finish(bus, TransferReturn::Done);
        }
    }

    /// Sr + header with the read bit, then wait for the target to answer.
    fn restart_for_read<B>(&mut self, bus: &mut B) -> TransferReturn
    where
        B: I2cControllerBus + ?Sized,
    {
        let Some(header) = self.sequence.as_ref().map(|seq| seq.header(true)) else {
            return self.finish(bus, TransferReturn::SwFault);
        };
        bus.issue_repeated_start();
        bus.write_address(header);
        self.phase = Phase::ReAddress;
        TransferReturn::InProgress
    }

    fn finish<B>(&mut self, bus: &mut B, result: TransferReturn) -> TransferReturn
    where
        B: I2cControllerBus + ?Sized,
    {
        bus.disable_interrupts(I2cInterrupt::TRANSFER);
        bus.clear_interrupts(I2cInterrupt::TRANSFER);
        self.phase = Phase::Idle;
        self.result = result;
        result
    }
}
