// ADB module - device bridge built on the external `adb` binary
// Every command runs with a bounded timeout; timed-out children are killed.

pub mod error;
pub mod runner;
pub mod shell;
pub mod types;

#[cfg(test)]
mod fake;

// Re-export the main types and functions for easy access
pub use error::{BridgeError, BridgeResult};
pub use runner::AdbProcess;
pub use shell::DeviceBridge;
pub use types::{BridgeConfig, CommandRunner, DeviceId, InstalledApp, RemotePaths, Step};

#[cfg(test)]
pub(crate) use fake::{FakeRunner, Reply};
