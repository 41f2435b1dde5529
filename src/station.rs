//! Station and its two per-access-category queues.

use std::collections::VecDeque;

use crate::address::Address;
use crate::frame::{AccessCategory, Frame};

/// Default contention-window bounds.
pub const DATA_CW_MIN: u32 = 15;
pub const DATA_CW_MAX: u32 = 1023;
pub const MGMT_CW_MIN: u32 = 3;
pub const MGMT_CW_MAX: u32 = 7;

/// A FIFO of pending frames for one access category. Insertion order
/// equals non-decreasing expiry order: every frame's air-time is computed
/// against the queue's state at submission time, so later submissions
/// always get an expiry no earlier than the current tail.
#[derive(Debug, Default)]
pub struct Queue {
    pub cw_min: u32,
    pub cw_max: u32,
    frames: VecDeque<Frame>,
}

impl Queue {
    pub fn new(cw_min: u32, cw_max: u32) -> Self {
        Self {
            cw_min,
            cw_max,
            frames: VecDeque::new(),
        }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
    }

    pub fn head_expiry(&self) -> Option<tokio::time::Instant> {
        self.frames.front().map(|f| f.expiry)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Pops every frame at the head whose expiry has passed, stopping at
    /// the first non-expired head; does not scan further into the queue.
    pub fn drain_expired(&mut self, now: tokio::time::Instant) -> Vec<Frame> {
        let mut drained = Vec::new();
        while let Some(front) = self.frames.front() {
            if front.expiry <= now {
                drained.push(self.frames.pop_front().unwrap());
            } else {
                break;
            }
        }
        drained
    }
}

/// One simulated radio interface. Identity is its address; never moved
/// after creation, looked up only by address or borrowed handle.
#[derive(Debug)]
pub struct Station {
    pub address: Address,
    pub mgmt: Queue,
    pub data: Queue,
}

impl Station {
    pub fn new(address: Address, mgmt: Queue, data: Queue) -> Self {
        Self { address, mgmt, data }
    }

    pub fn queue(&self, ac: AccessCategory) -> &Queue {
        match ac {
            AccessCategory::Management => &self.mgmt,
            AccessCategory::Data => &self.data,
        }
    }

    pub fn queue_mut(&mut self, ac: AccessCategory) -> &mut Queue {
        match ac {
            AccessCategory::Management => &mut self.mgmt,
            AccessCategory::Data => &mut self.data,
        }
    }

    /// The earlier of the two queues' head expiries, if either is
    /// non-empty.
    pub fn earliest_expiry(&self) -> Option<tokio::time::Instant> {
        match (self.mgmt.head_expiry(), self.data.head_expiry()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::{Flags, MrrSchedule};
    use std::time::Duration;
    use tokio::time::Instant;

    fn mk_frame(expiry: Instant) -> Frame {
        Frame {
            sender: Address::new([1, 0, 0, 0, 0, 1]),
            dest: Address::new([1, 0, 0, 0, 0, 2]),
            payload: vec![0u8; 10],
            cookie: 0,
            flags: Flags::empty(),
            mrr: MrrSchedule::empty(),
            access_category: AccessCategory::Data,
            expiry,
            acked: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn drains_only_expired_heads_in_order() {
        let base = Instant::now();
        let mut q = Queue::new(DATA_CW_MIN, DATA_CW_MAX);
        q.push(mk_frame(base + Duration::from_micros(10)));
        q.push(mk_frame(base + Duration::from_micros(20)));
        q.push(mk_frame(base + Duration::from_micros(30)));

        let drained = q.drain_expired(base + Duration::from_micros(20));
        assert_eq!(drained.len(), 2);
        assert!(!q.is_empty());
        assert_eq!(q.head_expiry(), Some(base + Duration::from_micros(30)));
    }
}
