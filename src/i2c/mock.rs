// Licensed under the Apache-2.0 license

//! Recording bus double for the sequencer and controller tests.
//!
//! Every register-level call is appended to `ops`. In scripted mode the test sets
//! `pending` by hand before each step. In responder mode the mock plays a target
//! device: address and data bytes are ACKed unless listed for NACK, and bytes from
//! `rx` are offered whenever the controller is ready to receive.

use std::collections::VecDeque;
use std::vec::Vec;

use crate::i2c::common::{ClockRatio, I2cInterrupt};
use crate::i2c::traits::{I2cControllerBus, I2cHardwareCore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Enable(bool),
    Reset,
    ControllerMode(bool),
    ClockRatio(ClockRatio),
    ClockDivider(u16),
    EnableInterrupts(I2cInterrupt),
    DisableInterrupts(I2cInterrupt),
    ClearInterrupts(I2cInterrupt),
    SetInterrupts(I2cInterrupt),
    WriteAddress(u8),
    WriteData(u8),
    ReadData(u8),
    Start,
    RepeatedStart,
    Stop,
    Ack,
    Nack,
    Abort,
    ClearTx,
}

pub struct MockBus {
    pub ops: Vec<BusOp>,
    pub pending: I2cInterrupt,
    pub enabled: I2cInterrupt,
    pub rx: VecDeque<u8>,
    pub busy: bool,
    pub ratio: ClockRatio,
    pub divider: u16,
    pub ref_clock: u32,
    pub responder: bool,
    /// Address bytes (R/W bit included) the responder NACKs.
    pub nack_addresses: Vec<u8>,
    /// Data byte index after which the responder NACKs, counted across the transfer.
    pub nack_data_at: Option<usize>,
    data_written: usize,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            pending: I2cInterrupt::empty(),
            enabled: I2cInterrupt::empty(),
            rx: VecDeque::new(),
            busy: false,
            ratio: ClockRatio::Standard,
            divider: 0,
            ref_clock: 38_400_000,
            responder: false,
            nack_addresses: Vec::new(),
            nack_data_at: None,
            data_written: 0,
        }
    }

    /// A mock that answers like a well-behaved target returning `rx` on reads.
    pub fn responder(rx: &[u8]) -> Self {
        let mut bus = Self::new();
        bus.responder = true;
        bus.rx = rx.iter().copied().collect();
        bus
    }

    pub fn count(&self, op: BusOp) -> usize {
        self.ops.iter().filter(|o| **o == op).count()
    }

    pub fn data_writes(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                BusOp::WriteData(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn address_writes(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                BusOp::WriteAddress(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    /// Bus commands and bytes only, without interrupt bookkeeping.
    pub fn bus_ops(&self) -> Vec<BusOp> {
        self.ops
            .iter()
            .copied()
            .filter(|op| {
                matches!(
                    op,
                    BusOp::WriteAddress(_)
                        | BusOp::WriteData(_)
                        | BusOp::ReadData(_)
                        | BusOp::Start
                        | BusOp::RepeatedStart
                        | BusOp::Stop
                        | BusOp::Ack
                        | BusOp::Nack
                )
            })
            .collect()
    }

    pub fn position(&self, op: BusOp) -> Option<usize> {
        self.ops.iter().position(|o| *o == op)
    }

    fn offer_rx(&mut self) {
        if self.responder && !self.rx.is_empty() {
            self.pending |= I2cInterrupt::RXDATAV;
        }
    }
}

impl I2cHardwareCore for MockBus {
    fn enable(&mut self, enable: bool) {
        self.ops.push(BusOp::Enable(enable));
    }

    fn reset(&mut self) {
        self.ops.push(BusOp::Reset);
        self.pending = I2cInterrupt::empty();
        self.enabled = I2cInterrupt::empty();
        self.divider = 0;
        self.ratio = ClockRatio::Standard;
    }

    fn set_controller_mode(&mut self, controller: bool) {
        self.ops.push(BusOp::ControllerMode(controller));
    }

    fn set_clock_ratio(&mut self, ratio: ClockRatio) {
        self.ops.push(BusOp::ClockRatio(ratio));
        self.ratio = ratio;
    }

    fn clock_ratio(&self) -> ClockRatio {
        self.ratio
    }

    fn set_clock_divider(&mut self, div: u16) {
        self.ops.push(BusOp::ClockDivider(div));
        self.divider = div;
    }

    fn clock_divider(&self) -> u16 {
        self.divider
    }

    fn reference_clock(&self) -> u32 {
        self.ref_clock
    }

    fn enable_interrupts(&mut self, mask: I2cInterrupt) {
        self.ops.push(BusOp::EnableInterrupts(mask));
        self.enabled |= mask;
    }

    fn disable_interrupts(&mut self, mask: I2cInterrupt) {
        self.ops.push(BusOp::DisableInterrupts(mask));
        self.enabled &= !mask;
    }

    fn clear_interrupts(&mut self, mask: I2cInterrupt) {
        self.ops.push(BusOp::ClearInterrupts(mask));
        self.pending &= !mask;
    }

    fn set_interrupts(&mut self, mask: I2cInterrupt) {
        self.ops.push(BusOp::SetInterrupts(mask));
        self.pending |= mask;
    }

    fn enabled_interrupts(&self) -> I2cInterrupt {
        self.enabled
    }

    fn pending_interrupts(&self) -> I2cInterrupt {
        self.pending
    }
}

impl I2cControllerBus for MockBus {
    fn write_address(&mut self, byte: u8) {
        self.ops.push(BusOp::WriteAddress(byte));
        if !self.responder {
            return;
        }
        if self.nack_addresses.contains(&byte) {
            self.pending |= I2cInterrupt::NACK;
        } else {
            self.pending |= I2cInterrupt::ACK;
            // A 7-bit read header, or a 10-bit header after a repeated START.
            if byte & 1 == 1 {
                self.offer_rx();
            }
        }
    }

    fn write_data(&mut self, byte: u8) {
        self.ops.push(BusOp::WriteData(byte));
        if !self.responder {
            return;
        }
        let index = self.data_written;
        self.data_written += 1;
        if self.nack_data_at == Some(index) {
            self.pending |= I2cInterrupt::NACK;
        } else {
            self.pending |= I2cInterrupt::ACK;
        }
    }

    fn read_data(&mut self) -> u8 {
        let byte = self.rx.pop_front().unwrap_or(0xff);
        self.ops.push(BusOp::ReadData(byte));
        self.pending &= !I2cInterrupt::RXDATAV;
        byte
    }

    fn issue_start(&mut self) {
        self.ops.push(BusOp::Start);
        self.busy = true;
    }

    fn issue_repeated_start(&mut self) {
        self.ops.push(BusOp::RepeatedStart);
    }

    fn issue_stop(&mut self) {
        self.ops.push(BusOp::Stop);
        self.busy = false;
    }

    fn ack(&mut self) {
        self.ops.push(BusOp::Ack);
        self.offer_rx();
    }

    fn nack(&mut self) {
        self.ops.push(BusOp::Nack);
    }

    fn abort(&mut self) {
        self.ops.push(BusOp::Abort);
        self.busy = false;
    }

    fn clear_tx(&mut self) {
        self.ops.push(BusOp::ClearTx);
    }

    fn is_busy(&self) -> bool {
        self.busy
    }
}
