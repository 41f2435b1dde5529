use thiserror::Error;

pub type Result<T = ()> = std::result::Result<T, Error>;

/// Error taxonomy per the simulator's fault model: configuration and timer
/// errors are fatal at startup/runtime, the rest are logged and the
/// triggering event is abandoned.
#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("control channel decode error: {0}")]
    ControlChannelDecode(String),
    #[error("submission from unknown sender {0}")]
    UnknownSender(crate::address::Address),
    #[error("failed to arm scheduling timer: {0}")]
    TimerArm(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn custom<E: std::fmt::Display>(msg: E) -> Self {
        Self::Other(msg.to_string())
    }

    pub fn config<E: std::fmt::Display>(msg: E) -> Self {
        Self::Config(msg.to_string())
    }

    /// True for the error classes the design marks fatal (config, timer arm).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::TimerArm(_))
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
