//! The control-channel adapter: the contract crossing the boundary to the
//! kernel driver, plus two transports. `ChannelTransport` is an in-process
//! `mpsc` pair used by the supervisor's own tests and by any embedder that
//! drives the simulator without a real kernel module loaded.
//! `UnixDgramTransport` is the realistic external-facing transport; a real
//! wireless-medium daemon talks to the kernel over generic netlink, and a
//! Unix datagram socket is the documented userspace stand-in for
//! integration testing (see DESIGN.md).

use std::path::Path;

use async_trait::async_trait;
use tokio::net::UnixDatagram;
use tokio::sync::mpsc;

use crate::address::Address;
use crate::error::Result;
use crate::frame::{Flags, MrrSchedule};
use crate::wire;

/// Inbound: a frame handed to the simulator by the driver. Per spec §6,
/// the wire contract is exactly (sender, payload, flags, MRR, cookie) —
/// access category and destination are not separate fields, they're
/// derived from the payload's frame header (`frame::parse_header`).
#[derive(Debug, Clone)]
pub struct Submit {
    pub sender: Address,
    pub payload: Vec<u8>,
    pub flags: Flags,
    pub mrr: MrrSchedule,
    pub cookie: u64,
}

/// Outbound: a receive-side copy delivered to a matching peer.
#[derive(Debug, Clone)]
pub struct Deliver {
    pub receiver: Address,
    pub payload: Vec<u8>,
    pub receive_rate_idx: i8,
    pub receive_signal: i16,
}

/// Outbound: the final transmit status reported back to the sender.
#[derive(Debug, Clone)]
pub struct TxStatus {
    pub sender: Address,
    pub flags: Flags,
    pub tx_signal: i16,
    pub mrr: MrrSchedule,
    pub cookie: u64,
}

/// Design-fixed signal constants: no per-link path loss modeling in this
/// version. Parameterizing per (sender, receiver) pair is the documented
/// extension point.
pub const RECEIVE_SIGNAL_DBM: i16 = -40;
pub const TX_SIGNAL_DBM: i16 = -40;
pub const RECEIVE_RATE_IDX: i8 = 0;

#[async_trait]
pub trait ControlChannel: Send {
    async fn recv_submit(&mut self) -> Option<Submit>;
    async fn send_deliver(&self, msg: Deliver);
    async fn send_tx_status(&self, msg: TxStatus);
}

/// An in-process transport: the "kernel" stand-in for tests and for
/// embedding the simulator in another async program.
pub struct ChannelTransport {
    submit_rx: mpsc::Receiver<Submit>,
    deliver_tx: mpsc::Sender<Deliver>,
    tx_status_tx: mpsc::Sender<TxStatus>,
}

/// The handle the driver side holds to submit frames and read outbound
/// events, split from the transport as its own cloneable handle so a
/// driver can submit frames from multiple tasks at once.
#[derive(Clone)]
pub struct ChannelTransportHandle {
    pub submit_tx: mpsc::Sender<Submit>,
}

impl ChannelTransportHandle {
    pub async fn submit(&self, msg: Submit) {
        let _ = self.submit_tx.send(msg).await;
    }
}

pub struct ChannelTransportEvents {
    pub deliver_rx: mpsc::Receiver<Deliver>,
    pub tx_status_rx: mpsc::Receiver<TxStatus>,
}

impl ChannelTransport {
    pub fn pair(
        capacity: usize,
    ) -> (ChannelTransport, ChannelTransportHandle, ChannelTransportEvents) {
        let (submit_tx, submit_rx) = mpsc::channel(capacity);
        let (deliver_tx, deliver_rx) = mpsc::channel(capacity);
        let (tx_status_tx, tx_status_rx) = mpsc::channel(capacity);
        (
            ChannelTransport { submit_rx, deliver_tx, tx_status_tx },
            ChannelTransportHandle { submit_tx },
            ChannelTransportEvents { deliver_rx, tx_status_rx },
        )
    }
}

#[async_trait]
impl ControlChannel for ChannelTransport {
    async fn recv_submit(&mut self) -> Option<Submit> {
        self.submit_rx.recv().await
    }

    async fn send_deliver(&self, msg: Deliver) {
        let _ = self.deliver_tx.send(msg).await;
    }

    async fn send_tx_status(&self, msg: TxStatus) {
        let _ = self.tx_status_tx.send(msg).await;
    }
}

/// The real external-facing transport: a connected Unix datagram socket
/// framed with [`crate::wire`]. Stands in for the kernel driver's control
/// channel without requiring netlink privileges; swapping in a genetlink
/// transport means implementing [`ControlChannel`] again, nothing above it
/// changes.
pub struct UnixDgramTransport {
    socket: UnixDatagram,
}

impl UnixDgramTransport {
    /// Binds to `bind_path` and connects to `peer_path`, so `send`/`recv`
    /// can be used directly instead of tracking a peer address per call.
    pub fn bind(bind_path: impl AsRef<Path>, peer_path: impl AsRef<Path>) -> Result<Self> {
        let socket = UnixDatagram::bind(bind_path)?;
        socket.connect(peer_path)?;
        Ok(Self { socket })
    }
}

#[async_trait]
impl ControlChannel for UnixDgramTransport {
    async fn recv_submit(&mut self) -> Option<Submit> {
        let mut buf = [0u8; 4096];
        loop {
            let n = match self.socket.recv(&mut buf).await {
                Ok(n) => n,
                Err(err) => {
                    log::warn!("control channel closed: {err}");
                    return None;
                }
            };
            match wire::decode_submit(&buf[..n]) {
                Ok(submit) => return Some(submit),
                Err(err) => {
                    log::warn!("dropping malformed submission: {err}");
                    continue;
                }
            }
        }
    }

    async fn send_deliver(&self, msg: Deliver) {
        let bytes = wire::encode_deliver(&msg);
        if let Err(err) = self.socket.send(&bytes).await {
            log::warn!("failed to send deliver event: {err}");
        }
    }

    async fn send_tx_status(&self, msg: TxStatus) {
        let bytes = wire::encode_tx_status(&msg);
        if let Err(err) = self.socket.send(&bytes).await {
            log::warn!("failed to send tx status event: {err}");
        }
    }
}
