//! Binary framing for the three control-channel message kinds, used by
//! [`crate::control::UnixDgramTransport`]. This is the userspace stand-in
//! for the real kernel control channel's wire format; a netlink transport
//! would replace this module without touching anything above the
//! [`crate::control::ControlChannel`] trait.

use crate::address::Address;
use crate::control::{Deliver, Submit, TxStatus};
use crate::error::Error;
use crate::frame::{Flags, MrrSchedule, MrrSlot};
use crate::rate::N_RATES;

const TAG_SUBMIT: u8 = 1;
const TAG_DELIVER: u8 = 2;
const TAG_TX_STATUS: u8 = 3;

fn encode_mrr(mrr: &MrrSchedule, out: &mut Vec<u8>) {
    for slot in mrr.slots() {
        out.push(slot.idx as u8);
        out.push(slot.count as u8);
    }
}

fn decode_mrr(buf: &[u8]) -> Result<MrrSchedule, Error> {
    if buf.len() < N_RATES * 2 {
        return Err(Error::ControlChannelDecode("truncated mrr schedule".into()));
    }
    let mut slots = [MrrSlot::TERMINAL; N_RATES];
    for i in 0..N_RATES {
        slots[i] = MrrSlot::new(buf[i * 2] as i8, buf[i * 2 + 1] as i8);
    }
    Ok(MrrSchedule::new(slots))
}

/// Wire layout mirrors spec §6's Submit field list exactly: sender,
/// submitted flags, MRR, cookie, payload. Access category and destination
/// are not on the wire — they're derived from the payload's frame header
/// by `frame::parse_header` once a `Submit` reaches the simulator.
pub fn encode_submit(msg: &Submit) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + msg.payload.len());
    out.push(TAG_SUBMIT);
    out.extend_from_slice(&msg.sender.bytes());
    out.extend_from_slice(&msg.flags.bits().to_le_bytes());
    out.extend_from_slice(&msg.cookie.to_le_bytes());
    encode_mrr(&msg.mrr, &mut out);
    out.extend_from_slice(&(msg.payload.len() as u16).to_le_bytes());
    out.extend_from_slice(&msg.payload);
    out
}

pub fn decode_submit(buf: &[u8]) -> Result<Submit, Error> {
    let mut pos = 0usize;
    let need = |pos: usize, n: usize| -> Result<(), Error> {
        if buf.len() < pos + n {
            Err(Error::ControlChannelDecode("truncated submit message".into()))
        } else {
            Ok(())
        }
    };

    need(pos, 1)?;
    if buf[pos] != TAG_SUBMIT {
        return Err(Error::ControlChannelDecode("unexpected message tag".into()));
    }
    pos += 1;

    need(pos, 6)?;
    let sender = Address::new(buf[pos..pos + 6].try_into().unwrap());
    pos += 6;

    need(pos, 4)?;
    let flags_bits = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap());
    let flags = Flags::from_bits_truncate(flags_bits);
    pos += 4;

    need(pos, 8)?;
    let cookie = u64::from_le_bytes(buf[pos..pos + 8].try_into().unwrap());
    pos += 8;

    need(pos, N_RATES * 2)?;
    let mrr = decode_mrr(&buf[pos..pos + N_RATES * 2])?;
    pos += N_RATES * 2;

    need(pos, 2)?;
    let payload_len = u16::from_le_bytes(buf[pos..pos + 2].try_into().unwrap()) as usize;
    pos += 2;

    need(pos, payload_len)?;
    let payload = buf[pos..pos + payload_len].to_vec();

    Ok(Submit {
        sender,
        payload,
        flags,
        mrr,
        cookie,
    })
}

pub fn encode_deliver(msg: &Deliver) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + msg.payload.len());
    out.push(TAG_DELIVER);
    out.extend_from_slice(&msg.receiver.bytes());
    out.push(msg.receive_rate_idx as u8);
    out.extend_from_slice(&msg.receive_signal.to_le_bytes());
    out.extend_from_slice(&(msg.payload.len() as u16).to_le_bytes());
    out.extend_from_slice(&msg.payload);
    out
}

pub fn decode_deliver(buf: &[u8]) -> Result<Deliver, Error> {
    if buf.len() < 11 || buf[0] != TAG_DELIVER {
        return Err(Error::ControlChannelDecode("malformed deliver message".into()));
    }
    let receiver = Address::new(buf[1..7].try_into().unwrap());
    let receive_rate_idx = buf[7] as i8;
    let receive_signal = i16::from_le_bytes(buf[8..10].try_into().unwrap());
    let payload_len = u16::from_le_bytes(buf[10..12].try_into().unwrap()) as usize;
    if buf.len() < 12 + payload_len {
        return Err(Error::ControlChannelDecode("truncated deliver payload".into()));
    }
    Ok(Deliver {
        receiver,
        payload: buf[12..12 + payload_len].to_vec(),
        receive_rate_idx,
        receive_signal,
    })
}

pub fn encode_tx_status(msg: &TxStatus) -> Vec<u8> {
    let mut out = Vec::with_capacity(32);
    out.push(TAG_TX_STATUS);
    out.extend_from_slice(&msg.sender.bytes());
    out.extend_from_slice(&msg.flags.bits().to_le_bytes());
    out.extend_from_slice(&msg.tx_signal.to_le_bytes());
    encode_mrr(&msg.mrr, &mut out);
    out.extend_from_slice(&msg.cookie.to_le_bytes());
    out
}

pub fn decode_tx_status(buf: &[u8]) -> Result<TxStatus, Error> {
    if buf.len() < 1 + 6 + 4 + 2 + N_RATES * 2 + 8 || buf[0] != TAG_TX_STATUS {
        return Err(Error::ControlChannelDecode("malformed tx status message".into()));
    }
    let mut pos = 1usize;
    let sender = Address::new(buf[pos..pos + 6].try_into().unwrap());
    pos += 6;
    let flags_bits = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap());
    let flags = Flags::from_bits_truncate(flags_bits);
    pos += 4;
    let tx_signal = i16::from_le_bytes(buf[pos..pos + 2].try_into().unwrap());
    pos += 2;
    let mrr = decode_mrr(&buf[pos..pos + N_RATES * 2])?;
    pos += N_RATES * 2;
    let cookie = u64::from_le_bytes(buf[pos..pos + 8].try_into().unwrap());
    Ok(TxStatus { sender, flags, tx_signal, mrr, cookie })
}
