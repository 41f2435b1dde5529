use std::path::PathBuf;

use slog::{info, o};
use structopt::StructOpt;
use wmediumd::cli::{Command, Opt};
use wmediumd::control::{ChannelTransport, ControlChannel, UnixDgramTransport};
use wmediumd::settings::Settings;
use wmediumd::{logger, supervisor::Supervisor};

fn main() {
    let opt = Opt::from_args();

    let command = match opt.command() {
        Ok(command) => command,
        Err(message) => {
            eprintln!("wmediumd: {message}");
            std::process::exit(1);
        }
    };

    let exit_code = match command {
        Command::WriteSkeleton { path, stations } => write_skeleton(&path, stations),
        Command::Run { config } => run(config),
    };

    std::process::exit(exit_code);
}

fn write_skeleton(path: &PathBuf, stations: u8) -> i32 {
    match Settings::write_skeleton(path, stations) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("wmediumd: {err}");
            1
        }
    }
}

fn run(config_path: PathBuf) -> i32 {
    let settings = match Settings::load(&config_path) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("wmediumd: {err}");
            return 1;
        }
    };

    let (root_logger, _guard) = logger::build(&settings.log);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("wmediumd: failed to start runtime: {err}");
            return 1;
        }
    };

    runtime.block_on(async_main(settings, root_logger))
}

async fn async_main(settings: Settings, logger: slog::Logger) -> i32 {
    let (trigger, shutdown) = triggered::trigger();

    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined1()) {
        Ok(mut sigusr1) => {
            let logger = logger.new(o!("module" => "signal"));
            tokio::spawn(async move {
                sigusr1.recv().await;
                info!(logger, "received SIGUSR1, requesting shutdown");
                trigger.trigger();
            });
        }
        Err(err) => {
            eprintln!("wmediumd: failed to install SIGUSR1 handler: {err}");
            return 1;
        }
    }

    let control: Box<dyn ControlChannel> = match &settings.control_channel {
        Some(cfg) => match UnixDgramTransport::bind(&cfg.bind, &cfg.peer) {
            Ok(transport) => Box::new(transport),
            Err(err) => {
                eprintln!("wmediumd: failed to bind control channel: {err}");
                return 1;
            }
        },
        None => {
            // No control channel configured: run with an in-process
            // transport with no driver attached on the other end, so the
            // daemon idles until shut down. Useful for smoke-testing a
            // config file without a kernel module loaded.
            let (transport, _handle, _events) = ChannelTransport::pair(16);
            Box::new(transport)
        }
    };

    let mut supervisor = match Supervisor::new(&settings, control) {
        Ok(supervisor) => supervisor,
        Err(err) => {
            eprintln!("wmediumd: {err}");
            return 1;
        }
    };

    match supervisor.run(shutdown, &logger).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("wmediumd: {err}");
            1
        }
    }
}
