// SPDX-License-Identifier: GPL-2.0
//! Relay error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that terminate the relay. None of them are retried.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Wrong arguments (arity is rejected by clap; this covers `--strict` key parsing)
    #[error("{0}")]
    Usage(String),

    #[error("Can't open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ioctl(HIDIOCSFEATURE) on {}: {source}", path.display())]
    Handshake {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read: {0}")]
    Read(#[source] io::Error),

    #[error("write: {0}")]
    Write(#[source] io::Error),

    /// The sink stopped accepting bytes partway through a chunk
    #[error("write: short write ({written} of {expected} bytes)")]
    PartialWrite { written: usize, expected: usize },
}

impl RelayError {
    /// Process exit code for this error.
    ///
    /// Usage errors share clap's code (2); every runtime failure exits with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            RelayError::Usage(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T, E = RelayError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_names_path_and_cause() {
        let err = RelayError::Open {
            path: PathBuf::from("/dev/hidraw9"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Can't open /dev/hidraw9: "), "{msg}");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn usage_exits_like_clap() {
        assert_eq!(RelayError::Usage("bad key".into()).exit_code(), 2);
    }

    #[test]
    fn partial_write_message() {
        let err = RelayError::PartialWrite {
            written: 3,
            expected: 8,
        };
        assert_eq!(err.to_string(), "write: short write (3 of 8 bytes)");
    }
}
