//! Shared subprocess execution for the external tools (`ethtool`, `iperf3`).

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::error::HardwareError;

/// Run `program` with `args`, capturing stdout/stderr.
///
/// The child is killed if it outlives `timeout`. A non-zero exit status
/// is returned as [`HardwareError::CommandFailed`] unless `allow_failure`
/// is set, in which case the caller inspects the output itself.
pub async fn run_tool(
    program: &str,
    args: &[&str],
    timeout: Duration,
    allow_failure: bool,
) -> Result<Output, HardwareError> {
    tracing::debug!(program, ?args, "Running external tool");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(HardwareError::Timeout {
                program: program.to_string(),
                secs: timeout.as_secs(),
            })
        }
    };

    if !output.status.success() && !allow_failure {
        return Err(HardwareError::CommandFailed {
            program: program.to_string(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}
