// SPDX-License-Identifier: GPL-2.0
//! Unlock handshake and the device → stdout relay loop
//!
//! The relay has no successful exit: it reads from the device and forwards
//! every chunk until a read or a write fails. The first failure ends it.

use std::convert::Infallible;
use std::io::{self, Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::error::{RelayError, Result};
use crate::hidraw::FeatureReport;
use crate::key::UnlockKey;

/// Transfer buffer capacity (bytes requested per read)
pub const BUFFER_SIZE: usize = 1024;

/// Pause after a zero-length read before reading again
pub const ZERO_READ_BACKOFF: Duration = Duration::from_millis(10);

/// Relay tuning
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bytes requested per read
    pub buffer_size: usize,
    /// Sleep after a zero-length read; zero means retry immediately
    pub zero_read_backoff: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            buffer_size: BUFFER_SIZE,
            zero_read_backoff: ZERO_READ_BACKOFF,
        }
    }
}

/// Counters kept while relaying
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Non-empty chunks forwarded in full
    pub chunks: u64,
    /// Bytes accepted by the sink
    pub bytes: u64,
    /// Reads that returned no data
    pub empty_reads: u64,
}

/// Send the unlock key to the device as feature report `[0x00, k1..k8]`.
///
/// Fire-and-forget: nothing is read back. `path` is only used in the error.
pub fn handshake<D: FeatureReport>(device: &mut D, path: &Path, key: &UnlockKey) -> Result<()> {
    let report = key.feature_report();
    debug!("Sending {}-byte unlock feature report", report.len());

    device
        .set_feature(&report)
        .map_err(|source| RelayError::Handshake {
            path: path.to_path_buf(),
            source,
        })
}

/// Handshake, then relay the device's data into `sink` until something fails.
///
/// Nothing reaches `sink` unless the handshake succeeded.
pub fn unlock_and_relay<D, W>(
    mut device: D,
    path: &Path,
    key: &UnlockKey,
    sink: W,
    config: RelayConfig,
) -> Result<Infallible>
where
    D: FeatureReport + Read,
    W: Write,
{
    handshake(&mut device, path, key)?;
    info!("Unlocked {}, relaying data", path.display());

    let mut relay = Relay::new(device, sink, config);
    let err = match relay.run() {
        Ok(never) => match never {},
        Err(e) => e,
    };

    let stats = relay.stats();
    info!(
        "Relay stopped after {} chunks ({} bytes, {} empty reads)",
        stats.chunks, stats.bytes, stats.empty_reads
    );
    Err(err)
}

/// Blocking read → write loop from `source` to `sink`
pub struct Relay<R, W> {
    source: R,
    sink: W,
    config: RelayConfig,
    stats: RelayStats,
}

impl<R: Read, W: Write> Relay<R, W> {
    pub fn new(source: R, sink: W, config: RelayConfig) -> Self {
        Self {
            source,
            sink,
            config,
            stats: RelayStats::default(),
        }
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Give back the source and sink
    pub fn into_inner(self) -> (R, W) {
        (self.source, self.sink)
    }

    /// Run until a read or write fails.
    pub fn run(&mut self) -> Result<Infallible> {
        // At least one byte per read, otherwise every read looks empty
        let mut buf = vec![0u8; self.config.buffer_size.max(1)];

        loop {
            let n = self.read_chunk(&mut buf)?;

            if n == 0 {
                // Not end-of-stream for a hidraw node; back off and read again
                self.stats.empty_reads += 1;
                trace!("Zero-length read #{}", self.stats.empty_reads);
                if !self.config.zero_read_backoff.is_zero() {
                    thread::sleep(self.config.zero_read_backoff);
                }
                continue;
            }

            trace!("Read {} bytes: {:02X?}", n, &buf[..n.min(16)]);
            self.forward(&buf[..n])?;
            self.stats.chunks += 1;
        }
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.source.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(RelayError::Read(e)),
            }
        }
    }

    /// Write the whole chunk, continuing after short writes, then flush.
    fn forward(&mut self, chunk: &[u8]) -> Result<()> {
        let mut written = 0;

        while written < chunk.len() {
            match self.sink.write(&chunk[written..]) {
                Ok(0) => {
                    return Err(RelayError::PartialWrite {
                        written,
                        expected: chunk.len(),
                    })
                }
                Ok(n) => {
                    if written + n < chunk.len() {
                        trace!("Short write: {} of {} bytes", written + n, chunk.len());
                    }
                    written += n;
                    self.stats.bytes += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(RelayError::Write(e)),
            }
        }

        self.sink.flush().map_err(RelayError::Write)
    }
}
