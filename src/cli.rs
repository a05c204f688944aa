// SPDX-License-Identifier: GPL-2.0
// CLI definitions using clap

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::Result;
use crate::key::{KeyParseMode, UnlockKey, KEY_LEN};
use crate::relay::{RelayConfig, BUFFER_SIZE, ZERO_READ_BACKOFF};

/// Positional arguments: the key values plus the device path
pub const POSITIONAL_COUNT: usize = KEY_LEN + 1;

/// Unlock a hidraw device with a feature report and relay its data to stdout
#[derive(Parser, Debug)]
#[command(name = "hidraw-relay")]
#[command(author, version, about)]
pub struct Cli {
    /// Eight key bytes as decimal values (k1 .. k8)
    #[arg(value_name = "KEY", num_args = KEY_LEN, required = true, allow_hyphen_values = true)]
    pub keys: Vec<String>,

    /// hidraw device node, e.g. /dev/hidraw0
    #[arg(value_name = "DEVICE")]
    pub device: PathBuf,

    /// Reject key values that are not decimal numbers instead of using 0
    #[arg(long)]
    pub strict: bool,

    /// Pause after an empty read, in milliseconds (0 = no pause)
    #[arg(long, value_name = "MS", default_value_t = ZERO_READ_BACKOFF.as_millis() as u64)]
    pub zero_read_backoff_ms: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse the process arguments, exiting with usage on error
    pub fn parse_args() -> Self {
        Self::try_parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Parse `args` (program name first).
    ///
    /// Exactly nine arguments are always the keys and the device, whatever
    /// they look like: `-v` or `--` in a key slot is a key value, not a flag.
    /// Flags are only recognized in front of the keys of a longer command line.
    pub fn try_parse_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        if args.len() == POSITIONAL_COUNT + 1 {
            args.insert(1, OsString::from("--"));
        }
        Self::try_parse_from(args)
    }

    pub fn key_parse_mode(&self) -> KeyParseMode {
        if self.strict {
            KeyParseMode::Strict
        } else {
            KeyParseMode::Permissive
        }
    }

    /// Parse the key tokens according to `--strict`
    pub fn unlock_key(&self) -> Result<UnlockKey> {
        UnlockKey::parse(self.keys.as_slice(), self.key_parse_mode())
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            buffer_size: BUFFER_SIZE,
            zero_read_backoff: Duration::from_millis(self.zero_read_backoff_ms),
        }
    }

    /// Default log level for the `-v` count; `RUST_LOG` takes precedence
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
