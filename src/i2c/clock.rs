// Licensed under the Apache-2.0 license

//! SCL clock divider arithmetic.
//!
//! The controller generates SCL as
//! `f_SCL = f_ref / ((N_low + N_high) * (DIV + 1) + 8)`,
//! where the constant 8 accounts for the synchronization cycles of the bus.

use crate::i2c::common::ClockRatio;

/// Largest value the `CLKDIV.DIV` field can hold.
pub const DIV_MAX: u16 = 0x1ff;

const SYNC_CYCLES: u32 = 8;

/// Smallest divider whose SCL frequency does not exceed `scl_hz`.
///
/// A zero `scl_hz` selects the slowest bus the divider allows. Requests the reference
/// clock cannot slow down to are clamped to [`DIV_MAX`], requests faster than the
/// reference allows give divider 0.
#[must_use]
pub fn divider_for(ref_hz: u32, scl_hz: u32, ratio: ClockRatio) -> u16 {
    if scl_hz == 0 {
        return DIV_MAX;
    }
    let n = u64::from(ratio.low_high_sum());
    let scl = u64::from(scl_hz);
    let Some(budget) = u64::from(ref_hz).checked_sub(u64::from(SYNC_CYCLES) * scl) else {
        return 0;
    };
    let per_div = n * scl;
    // div + 1 = ceil(budget / per_div)
    let div_plus_one = budget.div_ceil(per_div);
    let div = div_plus_one.saturating_sub(1);
    u16::try_from(div).map_or(DIV_MAX, |d| d.min(DIV_MAX))
}

/// SCL frequency produced by `div` for the given reference clock and ratio.
#[must_use]
pub fn scl_frequency(ref_hz: u32, div: u16, ratio: ClockRatio) -> u32 {
    let cycles = ratio.low_high_sum() * (u32::from(div) + 1) + SYNC_CYCLES;
    ref_hz / cycles
}
