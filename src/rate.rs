//! Static PHY rate table and the fixed timing parameters the air-time
//! calculator builds on. Rate indices are the same small integer space the
//! MRR schedule uses: an out-of-range index is treated exactly like a
//! negative one, i.e. it terminates the walk.

/// Maximum number of (rate, attempt-count) pairs in one MRR schedule.
pub const N_RATES: usize = 4;

/// PHY rate in 100 kbps units, indexed 0..=7.
const RATE_TABLE_100KBPS: [u32; 8] = [60, 90, 120, 180, 240, 360, 480, 540];

pub const SLOT_TIME_US: u64 = 9;
pub const SIFS_US: u64 = 16;
pub const DIFS_US: u64 = 2 * SLOT_TIME_US + SIFS_US;

/// Looks up the PHY rate for `idx`, in 100 kbps units. `None` for any index
/// outside the table, including negative ones cast up from the MRR schedule.
pub fn rate_of_index(idx: i8) -> Option<u32> {
    if idx < 0 {
        return None;
    }
    RATE_TABLE_100KBPS.get(idx as usize).copied()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_indices() {
        assert_eq!(rate_of_index(0), Some(60));
        assert_eq!(rate_of_index(7), Some(540));
    }

    #[test]
    fn out_of_range_and_negative_terminate() {
        assert_eq!(rate_of_index(8), None);
        assert_eq!(rate_of_index(-1), None);
        assert_eq!(rate_of_index(i8::MIN), None);
    }
}
