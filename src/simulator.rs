//! The transmit simulator: walks an MRR schedule, draws per-attempt acks
//! against the channel model, accumulates on-air time, and produces a
//! frame ready to enqueue with its expiry set and its flags/MRR rewritten
//! to reflect the outcome. Pure given its inputs and an RNG — no I/O, no
//! shared state beyond what's passed in.

use rand::Rng;
use tokio::time::Instant;

use crate::address::Address;
use crate::airtime::{ack_time, duration};
use crate::channel::ChannelModel;
use crate::frame::{AccessCategory, Flags, Frame, MrrSchedule};
use crate::rate::{rate_of_index, DIFS_US, SLOT_TIME_US};

/// A decoded inbound submission, before air-time accounting has assigned
/// it an expiry. `dest`/`access_category` are already derived from the
/// wire `Submit`'s payload header (`frame::parse_header`) by the caller;
/// `flags` is the submitted flags word, carried through untouched except
/// for the ack bit the walk below may add.
#[derive(Debug, Clone)]
pub struct Submission {
    pub sender: Address,
    pub dest: Address,
    pub payload: Vec<u8>,
    pub cookie: u64,
    pub mrr: MrrSchedule,
    pub access_category: AccessCategory,
    pub flags: Flags,
}

/// Walks `submission`'s MRR schedule against `channel` and `rng`, and
/// returns the frame the simulator would enqueue: its flags and MRR
/// schedule rewritten to reflect the outcome, its expiry set to
/// `now + send_time`.
pub fn simulate(
    submission: Submission,
    cw_min: u32,
    cw_max: u32,
    channel: &dyn ChannelModel,
    snr_db: f64,
    rng: &mut impl Rng,
    now: Instant,
) -> Frame {
    let len = submission.payload.len();
    let noack = is_noack(submission.access_category, submission.dest);

    let mut send_time_us: u64 = 0;
    let mut cw = cw_min;
    let mut acked = false;
    let mut mrr = submission.mrr;
    let mut success: Option<(usize, i8)> = None;

    'slots: for (i, slot) in mrr.0.iter().enumerate() {
        if slot.is_terminal() {
            break;
        }
        let rate = match rate_of_index(slot.idx) {
            Some(r) => r,
            None => break,
        };
        let p_err = channel.error_prob(snr_db, slot.idx, len);

        for attempt in 0..slot.count.max(0) {
            send_time_us += DIFS_US + duration(len, rate);

            if noack {
                acked = true;
                success = Some((i, attempt + 1));
                break 'slots;
            }

            if attempt > 0 {
                send_time_us += (cw as u64 * SLOT_TIME_US) / 2;
                cw = cw_max.min((cw << 1) + 1);
            }

            let draw: f64 = rng.gen();
            if draw > p_err {
                acked = true;
                success = Some((i, attempt + 1));
                break 'slots;
            } else {
                send_time_us += ack_time();
            }
        }
    }

    let mut flags = submission.flags;
    if acked {
        flags |= Flags::TX_STAT_ACK;
        if let Some((idx, attempts_used)) = success {
            mrr.truncate_after_success(idx, attempts_used);
        }
    }

    Frame {
        sender: submission.sender,
        dest: submission.dest,
        payload: submission.payload,
        cookie: submission.cookie,
        flags,
        mrr,
        access_category: submission.access_category,
        expiry: now + std::time::Duration::from_micros(send_time_us),
        acked,
    }
}

fn is_noack(ac: AccessCategory, dest: Address) -> bool {
    matches!(ac, AccessCategory::Management) || dest.is_multicast()
}
