//! Configuration file reader. Read once at startup via the `config` crate.
//! Validation (duplicate addresses, too few stations) happens here and is
//! fatal.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{Error, Result};
use crate::station::{DATA_CW_MAX, DATA_CW_MIN, MGMT_CW_MAX, MGMT_CW_MIN};

/// A run is not meaningfully a "medium" with fewer than two stations.
pub const MIN_STATIONS: usize = 2;

/// Default seed used when the config doesn't pin one, so an unconfigured
/// run is still deterministic across invocations.
pub const DEFAULT_SEED: u64 = 0x6d65_6469_756d_2021; // "medium !" in ascii-ish hex

/// Default SNR used for the channel-model oracle when a station doesn't
/// override it. Per-link SNR is a design-fixed constant in this version;
/// `StationConfig::snr_db` is the documented extension point.
pub const DEFAULT_SNR_DB: f64 = 20.0;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationConfig {
    pub address: Address,
    #[serde(default)]
    pub mgmt_cw_min: Option<u32>,
    #[serde(default)]
    pub mgmt_cw_max: Option<u32>,
    #[serde(default)]
    pub data_cw_min: Option<u32>,
    #[serde(default)]
    pub data_cw_max: Option<u32>,
    #[serde(default)]
    pub snr_db: Option<f64>,
}

impl StationConfig {
    pub fn mgmt_cw(&self) -> (u32, u32) {
        (
            self.mgmt_cw_min.unwrap_or(MGMT_CW_MIN),
            self.mgmt_cw_max.unwrap_or(MGMT_CW_MAX),
        )
    }

    pub fn data_cw(&self) -> (u32, u32) {
        (
            self.data_cw_min.unwrap_or(DATA_CW_MIN),
            self.data_cw_max.unwrap_or(DATA_CW_MAX),
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogDestination {
    Term,
    Syslog,
}

impl Default for LogDestination {
    fn default() -> Self {
        LogDestination::Term
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub destination: LogDestination,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            destination: LogDestination::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlChannelConfig {
    pub bind: String,
    pub peer: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub control_channel: Option<ControlChannelConfig>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_snr_db")]
    pub snr_db: f64,
    pub stations: Vec<StationConfig>,
}

fn default_snr_db() -> f64 {
    DEFAULT_SNR_DB
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(true));
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.stations.len() < MIN_STATIONS {
            return Err(Error::config(format!(
                "config must list at least {MIN_STATIONS} stations, found {}",
                self.stations.len()
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for station in &self.stations {
            if !seen.insert(station.address) {
                return Err(Error::config(format!(
                    "duplicate station address {}",
                    station.address
                )));
            }
        }
        Ok(())
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// Writes a skeleton config for `n` stations to `path`, for the CLI's
    /// `-o PATH N` flag.
    pub fn write_skeleton(path: impl AsRef<Path>, n: u8) -> Result<()> {
        let stations = (1..=n)
            .map(|i| StationConfig {
                address: Address::sequential(i),
                mgmt_cw_min: None,
                mgmt_cw_max: None,
                data_cw_min: None,
                data_cw_max: None,
                snr_db: None,
            })
            .collect();
        let skeleton = Settings {
            log: LogConfig::default(),
            control_channel: None,
            seed: Some(DEFAULT_SEED),
            snr_db: DEFAULT_SNR_DB,
            stations,
        };
        let toml = toml::to_string_pretty(&skeleton)
            .map_err(|err| Error::custom(format!("failed to render skeleton config: {err}")))?;
        std::fs::write(path, toml)?;
        Ok(())
    }
}
