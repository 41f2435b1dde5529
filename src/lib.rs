pub mod address;
pub mod airtime;
pub mod channel;
pub mod cli;
pub mod control;
pub mod delivery;
pub mod error;
pub mod frame;
pub mod logger;
pub mod rate;
pub mod registry;
pub mod scheduler;
pub mod settings;
pub mod simulator;
pub mod station;
pub mod supervisor;
pub mod wire;

pub use address::Address;
pub use error::{Error, Result};
pub use frame::Frame;
pub use settings::Settings;
