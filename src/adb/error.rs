use crate::store::StoreError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for device bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// stderr fragments adb prints when it cannot talk to the device at all.
const TRANSPORT_MARKERS: &[&str] = &[
    "no devices/emulators found",
    "device offline",
    "device unauthorized",
    "device still authorizing",
    "error: closed",
    "protocol fault",
    "cannot connect to daemon",
];

/// stderr fragments for a pull whose remote file is not there.
const MISSING_REMOTE_MARKERS: &[&str] = &[
    "No such file or directory",
    "does not exist",
    "failed to stat remote object",
];

/// The error type for all device bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(
        "'{program}' could not be invoked: {source}. Install Android Platform Tools (https://developer.android.com/tools/adb) or point --adb at the binary."
    )]
    Unavailable {
        program: String,
        source: std::io::Error,
    },

    #[error("'{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Device '{device}' is unreachable: {stderr}")]
    DeviceUnreachable { device: String, stderr: String },

    #[error("'{command}' failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Local file {path:?} does not exist")]
    LocalFileMissing { path: PathBuf },

    #[error("Invalid base name '{name}': {reason}")]
    InvalidBaseName { name: String, reason: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BridgeError {
    /// Whether adb reported that it could not reach the device.
    pub fn is_transport_failure(&self) -> bool {
        match self {
            BridgeError::DeviceUnreachable { .. } => true,
            BridgeError::CommandFailed { stderr, .. } => stderr_is_transport_failure(stderr),
            _ => false,
        }
    }

    /// Whether a pull failed only because the remote file is absent.
    pub fn is_missing_remote_file(&self) -> bool {
        match self {
            BridgeError::CommandFailed { stderr, .. } => MISSING_REMOTE_MARKERS
                .iter()
                .any(|marker| stderr.contains(marker)),
            _ => false,
        }
    }

    /// Turn a transport-level `CommandFailed` into `DeviceUnreachable` for `device`.
    pub fn for_device(self, device: &str) -> Self {
        match self {
            BridgeError::CommandFailed { stderr, .. } if stderr_is_transport_failure(&stderr) => {
                BridgeError::DeviceUnreachable {
                    device: device.to_string(),
                    stderr,
                }
            }
            other => other,
        }
    }
}

fn stderr_is_transport_failure(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    TRANSPORT_MARKERS.iter().any(|marker| lower.contains(marker))
        || (lower.contains("device '") && lower.contains("not found"))
}
