//! Delivery engine: drains every expired frame in scan
//! order, fans out receive events to matching peers, and reports tx
//! status back to the sender.

use tokio::time::Instant;

use crate::control::{ControlChannel, Deliver, TxStatus, RECEIVE_RATE_IDX, RECEIVE_SIGNAL_DBM, TX_SIGNAL_DBM};
use crate::frame::Flags;
use crate::frame::Frame;
use crate::registry::Registry;

/// Drains every station's mgmt-then-data queue heads that have expired by
/// `now`, in registry order. Stopping at the first non-expired head within
/// a queue is `Queue::drain_expired`'s job; this just visits queues in the
/// scan order specifies for tie-breaking.
fn drain_all_expired(registry: &mut Registry, now: Instant) -> Vec<Frame> {
    let mut drained = Vec::new();
    for station in registry.iter_mut() {
        drained.extend(station.mgmt.drain_expired(now));
        drained.extend(station.data.drain_expired(now));
    }
    drained
}

/// Emits the receive fan-out and tx-status for one delivered frame, then
/// releases it.
async fn deliver_one<C: ControlChannel + ?Sized>(frame: Frame, registry: &Registry, control: &C) {
    if frame.flags.contains(Flags::TX_STAT_ACK) {
        for station in registry.iter() {
            if station.address == frame.sender {
                continue;
            }
            let is_match = frame.dest.is_multicast() || station.address == frame.dest;
            if is_match {
                control
                    .send_deliver(Deliver {
                        receiver: station.address,
                        payload: frame.payload.clone(),
                        receive_rate_idx: RECEIVE_RATE_IDX,
                        receive_signal: RECEIVE_SIGNAL_DBM,
                    })
                    .await;
            }
        }
    }

    control
        .send_tx_status(TxStatus {
            sender: frame.sender,
            flags: frame.flags,
            tx_signal: TX_SIGNAL_DBM,
            mrr: frame.mrr,
            cookie: frame.cookie,
        })
        .await;
}

/// Runs one timer-fire delivery batch: drains everything expired by `now`
/// and emits the corresponding events, in scan order. Returns the number
/// of frames delivered.
pub async fn run_batch<C: ControlChannel + ?Sized>(
    registry: &mut Registry,
    control: &C,
    now: Instant,
) -> usize {
    let drained = drain_all_expired(registry, now);
    let count = drained.len();
    for frame in drained {
        deliver_one(frame, registry, control).await;
    }
    count
}
