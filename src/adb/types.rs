// Core device bridge types and traits
use super::error::BridgeResult;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Serial reported by `adb devices`. Only meaningful while the device stays connected.
pub type DeviceId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledApp {
    pub package_name: String,
    /// Display label, the package name when no better label could be resolved.
    pub app_name: String,
}

// Trait defining how adb invocations are executed (real process or scripted fake)
#[allow(async_fn_in_trait)]
pub trait CommandRunner: Send + Sync {
    /// Run `adb <args>` and return stdout. Must not outlive `timeout`.
    async fn run(&self, args: &[&str], timeout: Duration) -> BridgeResult<String>;
}

/// Outcome of a best-effort sub-step. A degraded step never fails the operation that ran it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Done(T),
    Degraded(String),
}

impl<T> Step<T> {
    /// Log the failure of `label` and record it as degraded.
    pub fn degraded(label: &str, reason: impl fmt::Display) -> Self {
        log::warn!("{label} skipped: {reason}");
        Step::Degraded(reason.to_string())
    }

    pub fn from_result<E: fmt::Display>(label: &str, result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Step::Done(value),
            Err(e) => Self::degraded(label, e),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Step::Done(value) => Some(value),
            Step::Degraded(_) => None,
        }
    }
}

/// Device-side mock locations for one package.
///
/// The app writes what it recorded to the `*_read` files and picks up mocks
/// from the `*_write` files, so pull and push intentionally use different names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePaths {
    pub responses_read: String,
    pub responses_write: String,
    pub storage_read: String,
    pub storage_write: String,
}

pub const RESPONSES_READ_FILE: &str = "msw-responses.json";
pub const RESPONSES_WRITE_FILE: &str = "msw-mock.json";
pub const STORAGE_READ_FILE: &str = "storage-records.json";
pub const STORAGE_WRITE_FILE: &str = "storage-mock.json";

impl RemotePaths {
    pub fn for_package(package_name: &str) -> Self {
        let dir = format!("/data/user/0/{package_name}/files");
        Self {
            responses_read: format!("{dir}/{RESPONSES_READ_FILE}"),
            responses_write: format!("{dir}/{RESPONSES_WRITE_FILE}"),
            storage_read: format!("{dir}/{STORAGE_READ_FILE}"),
            storage_write: format!("{dir}/{STORAGE_WRITE_FILE}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// adb binary, looked up on PATH when not absolute
    pub adb_path: String,
    pub device_list_timeout: Duration,
    pub package_list_timeout: Duration,
    /// Per-package label lookup while listing apps
    pub app_label_timeout: Duration,
    /// Everything else: root, pull, push, rm, am, monkey
    pub command_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            adb_path: "adb".to_string(),
            device_list_timeout: Duration::from_secs(5),
            package_list_timeout: Duration::from_secs(10),
            app_label_timeout: Duration::from_secs(2),
            command_timeout: Duration::from_secs(5),
        }
    }
}
