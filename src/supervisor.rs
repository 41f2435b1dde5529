//! The supervisor loop: a single `tokio::select!` that multiplexes the
//! control channel and the scheduling timer. No per-frame tasks or timers
//! are spawned; the event loop owns the registry, the scheduler, the PRNG
//! and the control channel outright.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use slog::{info, o, warn, Logger};
use tokio::time::Instant;

use crate::address::Address;
use crate::channel::{ChannelModel, LogisticChannelModel};
use crate::control::{ControlChannel, Submit};
use crate::delivery;
use crate::error::Result;
use crate::frame;
use crate::registry::Registry;
use crate::scheduler::Scheduler;
use crate::settings::Settings;
use crate::simulator::{self, Submission};
use crate::station::{Queue, Station};

pub struct Supervisor {
    registry: Registry,
    scheduler: Scheduler,
    control: Box<dyn ControlChannel>,
    channel_model: Box<dyn ChannelModel>,
    rng: StdRng,
    default_snr_db: f64,
    snr_overrides: HashMap<Address, f64>,
}

impl Supervisor {
    pub fn new(settings: &Settings, control: Box<dyn ControlChannel>) -> Result<Self> {
        let mut registry = Registry::new();
        let mut snr_overrides = HashMap::new();

        for station_cfg in &settings.stations {
            let (mgmt_min, mgmt_max) = station_cfg.mgmt_cw();
            let (data_min, data_max) = station_cfg.data_cw();
            let station = Station::new(
                station_cfg.address,
                Queue::new(mgmt_min, mgmt_max),
                Queue::new(data_min, data_max),
            );
            registry
                .insert(station)
                .map_err(|addr| crate::error::Error::config(format!("duplicate address {addr}")))?;
            if let Some(snr) = station_cfg.snr_db {
                snr_overrides.insert(station_cfg.address, snr);
            }
        }

        Ok(Self {
            registry,
            scheduler: Scheduler::new(),
            control,
            channel_model: Box::new(LogisticChannelModel::default()),
            rng: StdRng::seed_from_u64(settings.seed()),
            default_snr_db: settings.snr_db,
            snr_overrides,
        })
    }

    fn snr_for(&self, address: &Address) -> f64 {
        self.snr_overrides
            .get(address)
            .copied()
            .unwrap_or(self.default_snr_db)
    }

    pub async fn run(&mut self, shutdown: triggered::Listener, logger: &Logger) -> Result {
        let logger = logger.new(o!("module" => "supervisor"));
        info!(logger, "starting"; "stations" => self.registry.len());

        loop {
            let deadline = self.scheduler.deadline();
            tokio::select! {
                _ = shutdown.clone() => {
                    info!(logger, "shutting down; dropping queued frames without tx status");
                    return Ok(());
                }
                maybe_submit = self.control.recv_submit() => {
                    match maybe_submit {
                        Some(submit) => self.handle_submit(submit, &logger).await,
                        None => {
                            warn!(logger, "control channel closed; stopping");
                            return Ok(());
                        }
                    }
                }
                _ = sleep_until_deadline(deadline) => {
                    self.handle_timer_fire(&logger).await;
                }
            }
        }
    }

    async fn handle_submit(&mut self, submit: Submit, logger: &Logger) {
        if !self.registry.contains(&submit.sender) {
            warn!(logger, "dropping submission from unknown sender"; "sender" => submit.sender);
            return;
        }

        let (access_category, dest) = match frame::parse_header(&submit.payload) {
            Ok(header) => header,
            Err(err) => {
                warn!(logger, "dropping malformed submission"; "sender" => submit.sender, "error" => err.to_string());
                return;
            }
        };

        let snr_db = self.snr_for(&submit.sender);
        let now = Instant::now();

        let station = self.registry.get(&submit.sender).expect("checked above");
        let queue = station.queue(access_category);
        let (cw_min, cw_max) = (queue.cw_min, queue.cw_max);

        let submission = Submission {
            sender: submit.sender,
            dest,
            payload: submit.payload,
            cookie: submit.cookie,
            mrr: submit.mrr,
            access_category,
            flags: submit.flags,
        };

        let frame = simulator::simulate(
            submission,
            cw_min,
            cw_max,
            self.channel_model.as_ref(),
            snr_db,
            &mut self.rng,
            now,
        );

        let ac = frame.access_category;
        let station = self
            .registry
            .get_mut(&submit.sender)
            .expect("checked above");
        station.queue_mut(ac).push(frame);

        self.scheduler.rearm(&self.registry);
    }

    async fn handle_timer_fire(&mut self, logger: &Logger) {
        let now = Instant::now();
        let delivered = delivery::run_batch(&mut self.registry, self.control.as_ref(), now).await;
        if delivered > 0 {
            slog::debug!(logger, "delivered expired frames"; "count" => delivered);
        }
        self.scheduler.rearm(&self.registry);
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(instant) => tokio::time::sleep_until(instant).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::control::ChannelTransport;
    use crate::frame::{test_payload, AccessCategory, Flags, MrrSchedule, MrrSlot};
    use crate::settings::{LogConfig, Settings};
    use slog::Discard;

    fn settings_with(addresses: &[u8]) -> Settings {
        Settings {
            log: LogConfig::default(),
            control_channel: None,
            seed: Some(1),
            snr_db: 20.0,
            stations: addresses
                .iter()
                .map(|n| crate::settings::StationConfig {
                    address: Address::sequential(*n),
                    mgmt_cw_min: None,
                    mgmt_cw_max: None,
                    data_cw_min: None,
                    data_cw_max: None,
                    snr_db: None,
                })
                .collect(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_sender_is_dropped_without_tx_status() {
        let settings = settings_with(&[1, 2]);
        let (transport, handle, mut events) = ChannelTransport::pair(8);
        let mut supervisor = Supervisor::new(&settings, Box::new(transport)).unwrap();
        let logger = Logger::root(Discard, o!());

        handle
            .submit(Submit {
                sender: Address::sequential(99),
                payload: test_payload(AccessCategory::Data, Address::sequential(1), &[]),
                flags: Flags::empty(),
                mrr: MrrSchedule::empty(),
                cookie: 1,
            })
            .await;

        let submit = supervisor.control.recv_submit().await.unwrap();
        supervisor.handle_submit(submit, &logger).await;

        assert!(events.tx_status_rx.try_recv().is_err());
        assert_eq!(supervisor.registry.len(), 2);
    }

    /// A payload too short to contain a frame header is a control-channel
    /// decode error: dropped and logged, no TxStatus emitted.
    #[tokio::test(start_paused = true)]
    async fn payload_without_a_header_is_dropped_without_tx_status() {
        let settings = settings_with(&[1, 2]);
        let (transport, _handle, mut events) = ChannelTransport::pair(8);
        let mut supervisor = Supervisor::new(&settings, Box::new(transport)).unwrap();
        let logger = Logger::root(Discard, o!());

        supervisor
            .handle_submit(
                Submit {
                    sender: Address::sequential(1),
                    payload: vec![0u8; 4],
                    flags: Flags::empty(),
                    mrr: MrrSchedule::empty(),
                    cookie: 5,
                },
                &logger,
            )
            .await;

        assert!(events.tx_status_rx.try_recv().is_err());
        assert!(!supervisor.scheduler.is_armed());
    }

    /// Access category and destination come from the submission payload's
    /// header, not from any out-of-band field: a management frame-control
    /// byte routes to the mgmt queue even though the payload's destination
    /// octets point elsewhere.
    #[tokio::test(start_paused = true)]
    async fn access_category_and_dest_are_derived_from_payload_header() {
        let settings = settings_with(&[1, 2]);
        let (transport, _handle, _events) = ChannelTransport::pair(8);
        let mut supervisor = Supervisor::new(&settings, Box::new(transport)).unwrap();
        let logger = Logger::root(Discard, o!());

        let payload = test_payload(AccessCategory::Management, Address::sequential(2), &[]);
        supervisor
            .handle_submit(
                Submit {
                    sender: Address::sequential(1),
                    payload,
                    flags: Flags::empty(),
                    mrr: MrrSchedule::new([
                        MrrSlot::new(0, 1),
                        MrrSlot::TERMINAL,
                        MrrSlot::TERMINAL,
                        MrrSlot::TERMINAL,
                    ]),
                    cookie: 9,
                },
                &logger,
            )
            .await;

        let station = supervisor.registry.get(&Address::sequential(1)).unwrap();
        assert!(!station.mgmt.is_empty());
        assert!(station.data.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_then_timer_fire_delivers_and_rearms() {
        let settings = settings_with(&[1, 2]);
        let (transport, _handle, mut events) = ChannelTransport::pair(8);
        let mut supervisor = Supervisor::new(&settings, Box::new(transport)).unwrap();
        let logger = Logger::root(Discard, o!());

        let submit = Submit {
            sender: Address::sequential(1),
            payload: test_payload(AccessCategory::Data, Address::sequential(2), &[0u8; 20]),
            flags: Flags::empty(),
            mrr: MrrSchedule::new([
                MrrSlot::new(0, 1),
                MrrSlot::TERMINAL,
                MrrSlot::TERMINAL,
                MrrSlot::TERMINAL,
            ]),
            cookie: 77,
        };
        supervisor.handle_submit(submit, &logger).await;
        assert!(supervisor.scheduler.is_armed());

        let deadline = supervisor.scheduler.deadline().unwrap();
        tokio::time::sleep_until(deadline).await;
        supervisor.handle_timer_fire(&logger).await;

        let status = events.tx_status_rx.recv().await.unwrap();
        assert_eq!(status.cookie, 77);
        assert!(!supervisor.scheduler.is_armed());
    }

    /// Two stations submit around the same time; the timer rearms to the
    /// earlier of the two expiries, delivers that one first, then rearms to
    /// the later one.
    #[tokio::test(start_paused = true)]
    async fn two_interleaved_stations_deliver_in_expiry_order() {
        let settings = settings_with(&[1, 2, 3]);
        let (transport, _handle, mut events) = ChannelTransport::pair(8);
        let mut supervisor = Supervisor::new(&settings, Box::new(transport)).unwrap();
        let logger = Logger::root(Discard, o!());

        let noack_mrr = || {
            MrrSchedule::new([
                MrrSlot::new(0, 1),
                MrrSlot::TERMINAL,
                MrrSlot::TERMINAL,
                MrrSlot::TERMINAL,
            ])
        };

        supervisor
            .handle_submit(
                Submit {
                    sender: Address::sequential(1),
                    payload: test_payload(AccessCategory::Data, Address::sequential(3), &[0u8; 20]),
                    flags: Flags::empty(),
                    mrr: noack_mrr(),
                    cookie: 1,
                },
                &logger,
            )
            .await;
        supervisor
            .handle_submit(
                Submit {
                    sender: Address::sequential(2),
                    payload: test_payload(AccessCategory::Data, Address::sequential(3), &[0u8; 20]),
                    flags: Flags::empty(),
                    mrr: noack_mrr(),
                    cookie: 2,
                },
                &logger,
            )
            .await;

        let first_deadline = supervisor.scheduler.deadline().unwrap();
        tokio::time::sleep_until(first_deadline).await;
        supervisor.handle_timer_fire(&logger).await;

        let first_status = events.tx_status_rx.recv().await.unwrap();
        assert!(supervisor.scheduler.is_armed(), "second station still queued");
        let second_deadline = supervisor.scheduler.deadline().unwrap();
        assert!(second_deadline >= first_deadline);

        tokio::time::sleep_until(second_deadline).await;
        supervisor.handle_timer_fire(&logger).await;
        let second_status = events.tx_status_rx.recv().await.unwrap();

        assert_ne!(first_status.cookie, second_status.cookie);
        assert_eq!(
            [first_status.cookie, second_status.cookie]
                .iter()
                .collect::<std::collections::HashSet<_>>()
                .len(),
            2
        );
        assert!(!supervisor.scheduler.is_armed());
    }
}
