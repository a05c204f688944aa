// SPDX-License-Identifier: GPL-2.0
//! hidraw-relay
//!
//! Sends an 8-byte unlock key to a hidraw device as a feature report and then
//! copies the device's data stream to stdout until a read or write fails.
//!
//! Usage:
//!   hidraw-relay <k1> <k2> <k3> <k4> <k5> <k6> <k7> <k8> <device>

use std::convert::Infallible;
use std::io;
use std::process::ExitCode;

use tracing::debug;

use hidraw_relay::cli::Cli;
use hidraw_relay::{unlock_and_relay, HidrawDevice, RelayError};

fn setup_logging(default_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries device data, so logs go to stderr
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<Infallible, RelayError> {
    let key = cli.unlock_key()?;
    let config = cli.relay_config();
    debug!("Relay config: {:?}", config);

    let device = HidrawDevice::open(&cli.device)?;
    let stdout = io::stdout().lock();

    unlock_and_relay(device, &cli.device, &key, stdout, config)
}

fn main() -> ExitCode {
    // Arity errors print usage and exit(2) here, before any device is touched
    let cli = Cli::parse_args();
    setup_logging(cli.log_level());

    let err = match run(&cli) {
        Ok(never) => match never {},
        Err(e) => e,
    };

    debug!("{:?}", err);
    eprintln!("{}: {}", env!("CARGO_BIN_NAME"), err);
    ExitCode::from(err.exit_code())
}
