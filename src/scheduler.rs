//! The single process-wide timer. Rearm protocol: after
//! every enqueue and every drain, recompute the minimum head-of-queue
//! expiry across all stations and arm to it, or disarm if every queue is
//! empty. No heap is needed — the registry scan is O(#stations) and each
//! queue's head is always its earliest frame.

use tokio::time::Instant;

use crate::registry::Registry;

#[derive(Debug, Default)]
pub struct Scheduler {
    deadline: Option<Instant>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Recomputes the deadline from the registry. Call after every enqueue
    /// and after every delivery drain.
    pub fn rearm(&mut self, registry: &Registry) -> Option<Instant> {
        self.deadline = registry.next_expiry();
        self.deadline
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::address::Address;
    use crate::frame::{AccessCategory, Flags, MrrSchedule};
    use crate::station::{Queue, Station, DATA_CW_MAX, DATA_CW_MIN, MGMT_CW_MAX, MGMT_CW_MIN};
    use crate::Frame;
    use std::time::Duration;

    fn mk_frame(sender: Address, expiry: Instant) -> Frame {
        Frame {
            sender,
            dest: Address::sequential(99),
            payload: vec![],
            cookie: 0,
            flags: Flags::empty(),
            mrr: MrrSchedule::empty(),
            access_category: AccessCategory::Data,
            expiry,
            acked: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_when_all_queues_empty() {
        let mut reg = Registry::new();
        reg.insert(Station::new(
            Address::sequential(1),
            Queue::new(MGMT_CW_MIN, MGMT_CW_MAX),
            Queue::new(DATA_CW_MIN, DATA_CW_MAX),
        ))
        .unwrap();

        let mut sched = Scheduler::new();
        assert_eq!(sched.rearm(&reg), None);
        assert!(!sched.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn arms_to_minimum_across_stations() {
        let now = Instant::now();
        let mut reg = Registry::new();
        reg.insert(Station::new(
            Address::sequential(1),
            Queue::new(MGMT_CW_MIN, MGMT_CW_MAX),
            Queue::new(DATA_CW_MIN, DATA_CW_MAX),
        ))
        .unwrap();
        reg.insert(Station::new(
            Address::sequential(2),
            Queue::new(MGMT_CW_MIN, MGMT_CW_MAX),
            Queue::new(DATA_CW_MIN, DATA_CW_MAX),
        ))
        .unwrap();

        let t_a = now + Duration::from_micros(500);
        let t_b = now + Duration::from_micros(100);
        reg.get_mut(&Address::sequential(1))
            .unwrap()
            .data
            .push(mk_frame(Address::sequential(1), t_a));
        reg.get_mut(&Address::sequential(2))
            .unwrap()
            .data
            .push(mk_frame(Address::sequential(2), t_b));

        let mut sched = Scheduler::new();
        assert_eq!(sched.rearm(&reg), Some(t_b));
    }
}
