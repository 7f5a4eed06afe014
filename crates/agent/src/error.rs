/// Errors raised by hardware collaborators (sysfs, subprocesses, OTP
/// memory, the MAC allocation service).
///
/// Handlers never surface these to the JIG host; they are logged and
/// folded into a fail response.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{program} failed (exit code {exit_code:?}): {stderr}")]
    CommandFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("MAC allocation service error ({status}): {body}")]
    AllocatorStatus { status: u16, body: String },

    #[error("Bandwidth peer busy or unreachable")]
    PeerBusy,
}
