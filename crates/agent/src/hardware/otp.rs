//! OTP region exposed through the kernel nvmem interface.
//!
//! The fuse-programming driver presents the OTP block as a binary file;
//! the provisioning record occupies `len` bytes at `offset`.

use std::fs::OpenOptions;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;

use super::OtpMemory;
use crate::error::HardwareError;

/// Bytes reserved for the provisioning record (record plus NUL padding).
pub const OTP_REGION_LEN: usize = 64;

pub struct NvmemOtp {
    path: PathBuf,
    offset: u64,
    len: usize,
}

impl NvmemOtp {
    pub fn new(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            len: OTP_REGION_LEN,
        }
    }
}

impl OtpMemory for NvmemOtp {
    fn read(&self) -> Result<Vec<u8>, HardwareError> {
        let file = OpenOptions::new().read(true).open(&self.path)?;
        let mut buf = vec![0u8; self.len];
        file.read_exact_at(&mut buf, self.offset)?;
        Ok(buf)
    }

    fn write(&self, record: &[u8]) -> Result<(), HardwareError> {
        if record.len() > self.len {
            return Err(HardwareError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "record of {} bytes exceeds OTP region of {} bytes",
                    record.len(),
                    self.len
                ),
            )));
        }
        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.write_all_at(record, self.offset)?;
        file.sync_all()?;
        tracing::info!(path = %self.path.display(), bytes = record.len(), "OTP record written");
        Ok(())
    }

    fn erase(&self) -> Result<(), HardwareError> {
        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.write_all_at(&vec![0u8; self.len], self.offset)?;
        file.sync_all()?;
        tracing::warn!(path = %self.path.display(), "OTP region erased");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn blank_image(size: usize) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("create temp file");
        f.write_all(&vec![0u8; size]).expect("fill image");
        f
    }

    #[test]
    fn write_then_read_back_at_offset() {
        let image = blank_image(256);
        let otp = NvmemOtp::new(image.path(), 32);
        let record = b"6b1c5a2e-1f3d-4a7b-9c0d-001e06a1b2c3";

        otp.write(record).expect("write");
        let read = otp.read().expect("read");
        assert_eq!(&read[..record.len()], record);
        assert!(read[record.len()..].iter().all(|&b| b == 0));

        let whole = std::fs::read(image.path()).unwrap();
        assert!(whole[..32].iter().all(|&b| b == 0));
    }

    #[test]
    fn erase_zeroes_region() {
        let image = blank_image(128);
        let otp = NvmemOtp::new(image.path(), 0);
        otp.write(b"not a valid record").unwrap();
        otp.erase().expect("erase");
        assert!(otp.read().unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn oversized_record_is_rejected() {
        let image = blank_image(128);
        let otp = NvmemOtp::new(image.path(), 0);
        assert!(otp.write(&[b'a'; OTP_REGION_LEN + 1]).is_err());
    }

    #[test]
    fn missing_device_is_an_error() {
        let otp = NvmemOtp::new("/nonexistent/jig/nvmem", 0);
        assert!(otp.read().is_err());
    }
}
