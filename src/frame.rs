//! The frame and its MRR schedule. A frame is owned by exactly one queue
//! from submission to delivery; it carries no back-pointer to its queue or
//! to its sender's station object, only the sender's address.

use crate::address::Address;
use crate::error::Error;
use crate::rate::N_RATES;

/// Minimum payload length that contains a frame-control byte and a
/// destination address: 2 bytes frame control, 2 bytes duration/ID, 6
/// bytes address-1 (the destination this spec cares about).
pub const HEADER_LEN: usize = 10;
const DEST_OFFSET: usize = 4;

/// Extracts the access category and destination address from a raw
/// submission payload, per §4.3 steps 1-2: access category from the type
/// subfield of the frame-control byte (payload[0]), destination from
/// address-1 (the 6 bytes at `DEST_OFFSET`). Submissions whose payload is
/// too short to contain a header are a control-channel decode error.
pub fn parse_header(payload: &[u8]) -> Result<(AccessCategory, Address), Error> {
    if payload.len() < HEADER_LEN {
        return Err(Error::ControlChannelDecode(format!(
            "payload of {} bytes is too short to contain a frame header (need at least {HEADER_LEN})",
            payload.len()
        )));
    }
    let access_category = AccessCategory::classify(payload[0]);
    let dest = Address::new(
        payload[DEST_OFFSET..DEST_OFFSET + 6]
            .try_into()
            .expect("slice of exactly 6 bytes"),
    );
    Ok((access_category, dest))
}

bitflags::bitflags! {
    /// Status flags echoed back in TxStatus. Only the ack bit is defined;
    /// the rest of the word is reserved for future extension.
    pub struct Flags: u32 {
        const TX_STAT_ACK = 0b0000_0001;
    }
}

/// One (rate index, attempt count) pair in an MRR schedule. `idx < 0`
/// terminates the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MrrSlot {
    pub idx: i8,
    pub count: i8,
}

impl MrrSlot {
    pub const TERMINAL: MrrSlot = MrrSlot { idx: -1, count: -1 };

    pub const fn new(idx: i8, count: i8) -> Self {
        Self { idx, count }
    }

    pub fn is_terminal(&self) -> bool {
        self.idx < 0
    }
}

/// Fixed-size multi-rate-retry schedule, at most [`N_RATES`] entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MrrSchedule(pub [MrrSlot; N_RATES]);

impl MrrSchedule {
    pub fn new(slots: [MrrSlot; N_RATES]) -> Self {
        Self(slots)
    }

    pub fn empty() -> Self {
        Self([MrrSlot::TERMINAL; N_RATES])
    }

    pub fn slots(&self) -> &[MrrSlot; N_RATES] {
        &self.0
    }

    /// Truncates the schedule to the slot that succeeded: `count` is
    /// rewritten to the number of attempts actually used, and every later
    /// slot becomes terminal. Slots before `success_idx` are untouched.
    pub fn truncate_after_success(&mut self, success_idx: usize, attempts_used: i8) {
        self.0[success_idx].count = attempts_used;
        for slot in self.0.iter_mut().skip(success_idx + 1) {
            *slot = MrrSlot::TERMINAL;
        }
    }
}

/// Management vs. data access category; each station owns exactly one
/// queue of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessCategory {
    Management,
    Data,
}

impl AccessCategory {
    /// Classifies by the frame-control byte: management iff the type
    /// subfield (bits 2-3 of the first frame-control byte) is zero.
    pub fn classify(frame_control_byte: u8) -> Self {
        let type_bits = (frame_control_byte >> 2) & 0b11;
        if type_bits == 0 {
            AccessCategory::Management
        } else {
            AccessCategory::Data
        }
    }

    /// The frame-control byte `classify` would map back to this category,
    /// for tests that need to build a payload header.
    #[cfg(test)]
    fn frame_control_byte(self) -> u8 {
        match self {
            AccessCategory::Management => 0b0000_0000,
            AccessCategory::Data => 0b0000_1000,
        }
    }
}

/// Builds a payload whose header `parse_header` decodes back to `ac` and
/// `dest`, for tests exercising the control-channel/wire boundary.
#[cfg(test)]
pub fn test_payload(ac: AccessCategory, dest: Address, body: &[u8]) -> Vec<u8> {
    let mut payload = vec![ac.frame_control_byte(), 0, 0, 0];
    payload.extend_from_slice(&dest.bytes());
    payload.extend_from_slice(body);
    payload
}

/// An in-flight frame, owned by exactly one queue. Immutable payload,
/// mutable flags/MRR schedule (rewritten by the transmit simulator before
/// the frame is enqueued) and an absolute expiry on the monotonic clock.
#[derive(Debug, Clone)]
pub struct Frame {
    pub sender: Address,
    pub dest: Address,
    pub payload: Vec<u8>,
    pub cookie: u64,
    pub flags: Flags,
    pub mrr: MrrSchedule,
    pub access_category: AccessCategory,
    pub expiry: tokio::time::Instant,
    pub acked: bool,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Noack: management frames, or data frames whose destination is
    /// multicast/broadcast.
    pub fn is_noack(&self) -> bool {
        matches!(self.access_category, AccessCategory::Management) || self.dest.is_multicast()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classify_management_vs_data() {
        // type bits = 00 -> management
        assert_eq!(AccessCategory::classify(0b0000_0000), AccessCategory::Management);
        // type bits = 10 (data) at bits 2-3 -> 0b0000_1000
        assert_eq!(AccessCategory::classify(0b0000_1000), AccessCategory::Data);
    }

    #[test]
    fn truncate_after_success_clears_tail() {
        let mut mrr = MrrSchedule::new([
            MrrSlot::new(7, 2),
            MrrSlot::new(3, 3),
            MrrSlot::new(0, 1),
            MrrSlot::TERMINAL,
        ]);
        mrr.truncate_after_success(1, 1);
        assert_eq!(mrr.0[0], MrrSlot::new(7, 2));
        assert_eq!(mrr.0[1], MrrSlot::new(3, 1));
        assert_eq!(mrr.0[2], MrrSlot::TERMINAL);
        assert_eq!(mrr.0[3], MrrSlot::TERMINAL);
    }

    #[test]
    fn empty_schedule_is_all_terminal() {
        let mrr = MrrSchedule::empty();
        assert!(mrr.0.iter().all(|s| s.is_terminal()));
    }

    #[test]
    fn parse_header_extracts_category_and_dest() {
        let mut payload = vec![0b0000_1000, 0, 0, 0]; // data, duration unused
        payload.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0x00, 0x11, 0x22]); // addr1
        payload.extend_from_slice(&[1, 2, 3]); // frame body
        let (ac, dest) = parse_header(&payload).unwrap();
        assert_eq!(ac, AccessCategory::Data);
        assert_eq!(dest, Address::new([0xaa, 0xbb, 0xcc, 0x00, 0x11, 0x22]));
    }

    #[test]
    fn parse_header_rejects_short_payload() {
        assert!(parse_header(&[0u8; 9]).is_err());
    }
}
