//! Structured logging setup: `slog` + `slog-async` draining to either a
//! terminal or syslog, with the `slog-scope`/`slog-stdlog` bridge so any
//! dependency using the `log` facade is captured through the same pipe.

use slog::{o, Drain, Level, Logger};

use crate::settings::{LogConfig, LogDestination};

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "critical" => Level::Critical,
        "error" => Level::Error,
        "warning" | "warn" => Level::Warning,
        "info" => Level::Info,
        "debug" => Level::Debug,
        "trace" => Level::Trace,
        _ => Level::Info,
    }
}

/// Builds the root logger and installs the `log` crate bridge. Returns the
/// logger plus a guard that must be kept alive for the duration of the
/// process (dropping it flushes the async drain).
pub fn build(config: &LogConfig) -> (Logger, slog_scope::GlobalLoggerGuard) {
    let level = parse_level(&config.level);

    let logger = match config.destination {
        LogDestination::Term => {
            let decorator = slog_term::TermDecorator::new().build();
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            let drain = slog::LevelFilter::new(drain, level).fuse();
            let drain = slog_async::Async::new(drain).build().fuse();
            Logger::root(drain, o!())
        }
        LogDestination::Syslog => {
            let drain = slog_syslog::unix_3164(slog_syslog::Facility::LOG_DAEMON)
                .expect("failed to open syslog");
            let drain = slog::LevelFilter::new(drain, level).fuse();
            let drain = slog_async::Async::new(drain).build().fuse();
            Logger::root(drain, o!())
        }
    };

    let guard = slog_scope::set_global_logger(logger.clone());
    slog_stdlog::init().expect("failed to install log bridge");
    (logger, guard)
}
