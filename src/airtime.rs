//! Pure on-air duration math. No state, no I/O.

use crate::rate::{rate_of_index, SIFS_US};

/// Microseconds on air for one frame of `len` bytes at `rate_100kbps`.
///
/// `duration = 16 + 4 + 4 * ceil((16 + 8*len + 6) * 10 / (4 * rate))`
///
/// The 16 and 4 constants model preamble and signal-field overhead; the
/// ceiling term counts OFDM symbols.
pub fn duration(len: usize, rate_100kbps: u32) -> u64 {
    let numerator: u64 = (16 + 8 * len as u64 + 6) * 10;
    let denominator: u64 = 4 * rate_100kbps as u64;
    let symbols = div_ceil(numerator, denominator);
    16 + 4 + 4 * symbols
}

fn div_ceil(n: u64, d: u64) -> u64 {
    (n + d - 1) / d
}

/// Time to send and receive a 14-byte ack, always at the rate of index 0
/// ("a 14-byte ack at the lowest configured rate") regardless of the data
/// rate the attempt itself was sent at.
pub fn ack_time() -> u64 {
    let rate0 = rate_of_index(0).expect("rate index 0 is always defined");
    duration(14, rate0) + SIFS_US
}
