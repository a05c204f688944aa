// SPDX-License-Identifier: GPL-2.0
//! hidraw character device access
//!
//! Only the pieces the relay needs: open a node and push a feature report.
//! Data reads go through the plain `Read` impl on the device.

use std::fs::File;
use std::io::{self, Read};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use tracing::debug;

use crate::error::{RelayError, Result};

// HIDRAW ioctl definitions
// From linux/hidraw.h:
// #define HIDIOCSFEATURE(len) _IOC(_IOC_WRITE|_IOC_READ, 'H', 0x06, len)

const HIDRAW_MAGIC: u8 = b'H';
const HIDIOCSFEATURE_NR: u8 = 0x06;

/// Request code for `HIDIOCSFEATURE(len)`.
///
/// Direction: 2 bits at 30-31, Size: 14 bits at 16-29, Type: 8 bits at 8-15, Nr: 8 bits at 0-7
pub fn hidiocsfeature(len: usize) -> nix::sys::ioctl::ioctl_num_type {
    let dir: u32 = 3; // _IOC_WRITE | _IOC_READ
    let size = (len as u32) & 0x3FFF;
    let typ = HIDRAW_MAGIC as u32;
    let nr = HIDIOCSFEATURE_NR as u32;
    ((dir << 30) | (size << 16) | (typ << 8) | nr) as nix::sys::ioctl::ioctl_num_type
}

/// A device that accepts HID feature reports.
///
/// `report[0]` is the report ID; the length of the slice is the report length.
pub trait FeatureReport {
    fn set_feature(&mut self, report: &[u8]) -> io::Result<()>;
}

/// An open `/dev/hidrawN` node.
///
/// The file descriptor is closed when this is dropped.
#[derive(Debug)]
pub struct HidrawDevice {
    file: File,
    path: PathBuf,
}

impl HidrawDevice {
    /// Open a hidraw node for reading. The path is never created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening {}", path.display());

        let file = File::options()
            .read(true)
            .open(path)
            .map_err(|source| RelayError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeatureReport for HidrawDevice {
    fn set_feature(&mut self, report: &[u8]) -> io::Result<()> {
        // The kernel copies the report out of this buffer; it is not written back
        let mut buf = report.to_vec();
        let fd = self.file.as_raw_fd();

        let ret = unsafe { libc::ioctl(fd, hidiocsfeature(buf.len()), buf.as_mut_ptr()) };
        let sent = Errno::result(ret).map_err(io::Error::from)?;

        debug!(
            "HIDIOCSFEATURE({}) on {} returned {}",
            buf.len(),
            self.path.display(),
            sent
        );
        Ok(())
    }
}

impl Read for HidrawDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ioctl_numbers() {
        // Expected values from C:
        // HIDIOCSFEATURE(9) = 0xC0094806
        // HIDIOCSFEATURE(65) = 0xC0414806
        assert_eq!(hidiocsfeature(9) as u32, 0xC0094806, "SET_FEATURE(9) ioctl mismatch");
        assert_eq!(hidiocsfeature(65) as u32, 0xC0414806, "SET_FEATURE(65) ioctl mismatch");
    }

    #[test]
    fn open_missing_path_reports_path() {
        let err = HidrawDevice::open("/nonexistent/hidraw-relay-test").unwrap_err();
        match &err {
            RelayError::Open { path, source } => {
                assert_eq!(path, Path::new("/nonexistent/hidraw-relay-test"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("/nonexistent/hidraw-relay-test"));
    }

    #[test]
    fn feature_report_on_regular_file_fails() {
        // Any readable non-hidraw file: the ioctl must be refused (ENOTTY)
        let mut dev = HidrawDevice::open("/proc/self/status").unwrap();
        let err = dev.set_feature(&[0u8; 9]).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOTTY));
    }
}
