//! One-time MAC address provisioning.
//!
//! OTP memory is inspected first: a record that verifies is reported as
//! is and never touched again. Otherwise a record is allocated from the
//! factory service, written, read back and verified. A failure after the
//! inspection erases the region before reporting, so the next run never
//! finds a half-written record.

use std::sync::Arc;

use jig_core::error::CoreError;
use jig_core::mac::{verify_record, MacAddress};

use crate::error::HardwareError;
use crate::hardware::{MacAllocator, OtpMemory};

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("OTP inspection failed: {0}")]
    Inspect(HardwareError),

    #[error("allocation failed: {0}")]
    Allocation(HardwareError),

    #[error("allocated record rejected: {0}")]
    Rejected(CoreError),

    #[error("OTP write failed: {0}")]
    Write(HardwareError),

    #[error("OTP read-back failed: {0}")]
    ReadBack(HardwareError),

    #[error("OTP verification failed: {0}")]
    Verify(CoreError),
}

/// Terminal states of a provisioning request.
#[derive(Debug)]
pub enum ProvisionOutcome {
    /// Nothing was written; the unit already carries this address.
    AlreadyProvisioned(MacAddress),
    /// The address was written and verified during this call.
    Provisioned(MacAddress),
    /// The unit stays unprovisioned. The region was erased unless its
    /// contents could not be read.
    Failed(ProvisionError),
}

pub struct ProvisioningWriter {
    otp: Arc<dyn OtpMemory>,
    allocator: Arc<dyn MacAllocator>,
    model: String,
}

impl ProvisioningWriter {
    pub fn new(
        otp: Arc<dyn OtpMemory>,
        allocator: Arc<dyn MacAllocator>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            otp,
            allocator,
            model: model.into(),
        }
    }

    /// Provision the unit unless it already holds a verified address.
    ///
    /// `current` is the cached address; OTP memory is still consulted when
    /// it is `None`, since the cache may come from a failed read.
    pub async fn provision(&self, current: Option<&MacAddress>) -> ProvisionOutcome {
        if let Some(mac) = current {
            tracing::debug!(mac = %mac, "MAC already provisioned, skipping write");
            return ProvisionOutcome::AlreadyProvisioned(mac.clone());
        }

        let existing = match self.otp.read() {
            Ok(raw) => raw,
            Err(e) => {
                // Unknown contents: erasing could destroy a fused record.
                tracing::error!(error = %e, "Cannot inspect OTP memory, not provisioning");
                return ProvisionOutcome::Failed(ProvisionError::Inspect(e));
            }
        };

        if existing.iter().any(|&b| b != 0) {
            match verify_record(&existing) {
                Ok(mac) => {
                    tracing::info!(mac = %mac, "OTP already holds a valid record");
                    return ProvisionOutcome::AlreadyProvisioned(mac);
                }
                Err(e) => {
                    // A crash between write and verify in an earlier run can
                    // leave a partial record behind.
                    tracing::warn!(error = %e, "Clearing stale OTP contents before write");
                    self.erase();
                }
            }
        }

        // From here on the region holds nothing worth keeping.
        match self.write_and_verify().await {
            Ok(mac) => {
                tracing::info!(mac = %mac, model = %self.model, "MAC provisioned");
                ProvisionOutcome::Provisioned(mac)
            }
            Err(e) => {
                tracing::error!(model = %self.model, error = %e, "MAC provisioning failed");
                self.erase();
                ProvisionOutcome::Failed(e)
            }
        }
    }

    async fn write_and_verify(&self) -> Result<MacAddress, ProvisionError> {
        let record = self
            .allocator
            .allocate(&self.model)
            .await
            .map_err(ProvisionError::Allocation)?;

        // Never burn a record that would fail verification anyway.
        verify_record(record.as_bytes()).map_err(ProvisionError::Rejected)?;

        self.otp
            .write(record.as_bytes())
            .map_err(ProvisionError::Write)?;

        let read_back = self.otp.read().map_err(ProvisionError::ReadBack)?;
        verify_record(&read_back).map_err(ProvisionError::Verify)
    }

    fn erase(&self) {
        if let Err(e) = self.otp.erase() {
            tracing::error!(error = %e, "OTP erase failed");
        }
    }
}
