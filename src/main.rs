// Licensed under the Apache-2.0 license

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicI32, Ordering};

use cortex_m_rt::entry;
use embedded_hal::i2c::I2c;
use fugit::HertzU32;
use panic_halt as _;

use gecko_i2c::common::{BufferLogger, LogLevel, Logger};
use gecko_i2c::i2c::common::{I2cConfigBuilder, FREQ_STANDARD_MAX};
use gecko_i2c::i2c::i2c_controller::I2cController;
use gecko_i2c::i2c::registers::{DefaultLayout, GeckoI2c, I2c0};
use gecko_i2c::i2c::sequencer::TransferSequence;

/// Peripheral clock after reset.
const PCLK: HertzU32 = HertzU32::MHz(19);

/// Si7021 humidity/temperature sensor.
const SENSOR_ADDR: u8 = 0x40;
/// Measure temperature, hold controller.
const CMD_MEASURE_TEMP: u8 = 0xe3;
/// Read firmware revision.
const CMD_FW_REVISION: [u8; 2] = [0x84, 0xb8];

const POLL_BUDGET: u32 = 100_000;

/// Last temperature reading in centi-degrees Celsius, for inspection from a debugger.
#[no_mangle]
pub static TEMPERATURE_CENTI_C: AtomicI32 = AtomicI32::new(i32::MIN);

static mut LOG: BufferLogger<16> = BufferLogger::new(LogLevel::Info);

fn centi_celsius(raw: [u8; 2]) -> i32 {
    let code = i32::from(u16::from_be_bytes(raw));
    ((17572 * code) >> 16) - 4685
}

#[entry]
fn main() -> ! {
    // SAFETY: the only handle to I2C0 in this program.
    let i2c0 = unsafe { I2c0::steal() };
    let hardware: GeckoI2c<DefaultLayout> = GeckoI2c::new(i2c0, PCLK);

    // SAFETY: single-threaded, no interrupt handler touches the log.
    let logger = unsafe { &mut *core::ptr::addr_of_mut!(LOG) };
    let config = I2cConfigBuilder::new()
        .target_frequency(FREQ_STANDARD_MAX)
        .build();
    let mut i2c = I2cController::new(hardware, config, logger);
    i2c.init();

    let mut revision = [0u8; 1];
    let sequence =
        TransferSequence::write_read(u16::from(SENSOR_ADDR), &CMD_FW_REVISION, &mut revision);
    if i2c
        .transfer_blocking_with_budget(sequence, Some(POLL_BUDGET))
        .is_err()
    {
        i2c.logger.error("si7021: not responding");
    }

    loop {
        let mut raw = [0u8; 2];
        match i2c.write_read(SENSOR_ADDR, &[CMD_MEASURE_TEMP], &mut raw) {
            Ok(()) => TEMPERATURE_CENTI_C.store(centi_celsius(raw), Ordering::Relaxed),
            Err(_) => i2c.logger.error("si7021: measurement failed"),
        }
        cortex_m::asm::wfi();
    }
}
