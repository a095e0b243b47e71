use super::error::{BridgeError, BridgeResult};
use super::runner::AdbProcess;
use super::types::{BridgeConfig, CommandRunner, DeviceId, InstalledApp, RemotePaths, Step};
use crate::store::model::{JSON_EXTENSION, ResponseFile, storage_filename};
use crate::store::{read_json, validate_filename};
use std::path::{Path, PathBuf};
use std::time::Duration;

const PACKAGE_PREFIX: &str = "package:";
const OFFLINE_MARKER: &str = "offline";
const LAUNCHER_CATEGORY: &str = "android.intent.category.LAUNCHER";

/// Issues adb commands against connected devices and parses their text output.
pub struct DeviceBridge<R: CommandRunner = AdbProcess> {
    runner: R,
    config: BridgeConfig,
}

impl DeviceBridge<AdbProcess> {
    pub fn from_config(config: BridgeConfig) -> Self {
        let runner = AdbProcess::new(config.adb_path.clone());
        Self { runner, config }
    }
}

impl<R: CommandRunner> DeviceBridge<R> {
    pub fn new(runner: R, config: BridgeConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn parse_devices(output: &str) -> Vec<DeviceId> {
        output
            .lines()
            .skip(1)
            .filter(|line| !line.trim().is_empty() && !line.contains(OFFLINE_MARKER))
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }

    pub fn parse_packages(output: &str) -> Vec<String> {
        output
            .lines()
            .filter_map(|line| line.strip_prefix(PACKAGE_PREFIX))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Label from a per-package lookup; `None` when no line names exactly this package.
    ///
    /// `pm list packages <filter>` matches substrings, so sibling packages such
    /// as `com.example.debug` show up in the lookup for `com.example`.
    pub fn parse_app_label(output: &str, package_name: &str) -> Option<String> {
        output
            .lines()
            .filter_map(|line| line.trim().strip_prefix(PACKAGE_PREFIX))
            .map(str::trim)
            .find(|label| *label == package_name)
            .map(str::to_string)
    }

    async fn run_on_device(
        &self,
        device: &str,
        args: &[&str],
        timeout: Duration,
    ) -> BridgeResult<String> {
        let mut full: Vec<&str> = Vec::with_capacity(args.len() + 2);
        full.extend(["-s", device]);
        full.extend_from_slice(args);
        self.runner
            .run(&full, timeout)
            .await
            .map_err(|e| e.for_device(device))
    }

    pub async fn list_connected_devices(&self) -> BridgeResult<Vec<DeviceId>> {
        let output = self
            .runner
            .run(&["devices"], self.config.device_list_timeout)
            .await?;
        let devices = Self::parse_devices(&output);
        log::info!("Found {} connected device(s)", devices.len());
        Ok(devices)
    }

    /// Third-party packages on `device`, sorted by display name.
    ///
    /// Never fails: a failed listing is logged and yields an empty list so the
    /// caller can keep going.
    pub async fn list_installed_apps(&self, device: &str) -> Vec<InstalledApp> {
        let output = match self
            .run_on_device(
                device,
                &["shell", "pm", "list", "packages", "-3"],
                self.config.package_list_timeout,
            )
            .await
        {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Listing packages on {device} failed: {e}");
                return Vec::new();
            }
        };

        let packages = Self::parse_packages(&output);
        if packages.is_empty() {
            log::info!("No third-party packages found on {device}");
            return Vec::new();
        }
        log::debug!("Found packages on {device}: {packages:?}");

        let mut apps = Vec::with_capacity(packages.len());
        for package_name in packages {
            let app_name = self
                .resolve_app_label(device, &package_name)
                .await
                .done()
                .unwrap_or_else(|| package_name.clone());
            apps.push(InstalledApp {
                package_name,
                app_name,
            });
        }
        apps.sort_by(|a, b| a.app_name.cmp(&b.app_name));
        apps
    }

    async fn resolve_app_label(&self, device: &str, package_name: &str) -> Step<String> {
        let lookup = self
            .run_on_device(
                device,
                &["shell", "pm", "list", "packages", "-3", package_name],
                self.config.app_label_timeout,
            )
            .await;
        match lookup {
            Ok(output) => match Self::parse_app_label(&output, package_name) {
                Some(label) => Step::Done(label),
                None => Step::degraded(
                    &format!("label lookup for {package_name}"),
                    "package not in lookup output",
                ),
            },
            Err(e) => Step::degraded(&format!("label lookup for {package_name}"), e),
        }
    }

    /// `adb root`. Production builds refuse it, which only degrades the step;
    /// a device that cannot be reached at all fails the caller.
    pub async fn escalate_root(&self, device: &str) -> BridgeResult<Step<()>> {
        match self
            .run_on_device(device, &["root"], self.config.command_timeout)
            .await
        {
            Ok(_) => Ok(Step::Done(())),
            Err(e @ (BridgeError::DeviceUnreachable { .. } | BridgeError::Unavailable { .. })) => {
                Err(e)
            }
            Err(e) => Ok(Step::degraded(&format!("adb root on {device}"), e)),
        }
    }

    /// Copy a remote file to `local`. `Ok(false)` when the remote file does not exist.
    async fn pull_file(&self, device: &str, remote: &str, local: &Path) -> BridgeResult<bool> {
        let local_str = local.to_string_lossy();
        match self
            .run_on_device(
                device,
                &["pull", remote, local_str.as_ref()],
                self.config.command_timeout,
            )
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_missing_remote_file() => {
                log::info!("{remote} not present on {device}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn push_file(&self, device: &str, local: &Path, remote: &str) -> BridgeResult<()> {
        let local_str = local.to_string_lossy();
        self.run_on_device(
            device,
            &["push", local_str.as_ref(), remote],
            self.config.command_timeout,
        )
        .await
        .map(|_| ())
    }

    /// Pull the recorded responses (and optionally storage) of `package_name` into `dest_dir`.
    ///
    /// Files land as `<base>.json` and `<base>-storage.json`. A missing remote
    /// response file yields an empty result; storage problems are only logged.
    pub async fn pull_mock_files(
        &self,
        device: &str,
        package_name: &str,
        dest_dir: &Path,
        base_name: &str,
        include_storage: bool,
    ) -> BridgeResult<Vec<ResponseFile>> {
        let base = normalize_base_name(base_name)?;
        log::info!("Pulling mocks of {package_name} from {device} as {base}{JSON_EXTENSION}");

        self.escalate_root(device).await?;

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|source| BridgeError::Io {
                path: dest_dir.to_path_buf(),
                source,
            })?;

        let remote = RemotePaths::for_package(package_name);
        let filename = format!("{base}{JSON_EXTENSION}");
        let local = dest_dir.join(&filename);

        let mut pulled = Vec::new();
        if self.pull_file(device, &remote.responses_read, &local).await? {
            match read_json(&local)? {
                Some(data) => pulled.push(ResponseFile::new(filename.clone(), data)),
                None => log::warn!("adb reported success but {} is missing", local.display()),
            }
        }

        if include_storage {
            let storage_name = storage_filename(&filename);
            let storage_local = dest_dir.join(&storage_name);
            let step = Step::from_result(
                &format!("storage pull for {package_name}"),
                self.pull_storage(device, &remote.storage_read, &storage_local)
                    .await,
            );
            if let Some(Some(data)) = step.done() {
                pulled.push(ResponseFile::new(storage_name, data));
            }
        }

        log::info!("Pulled {} file(s) from {device}", pulled.len());
        Ok(pulled)
    }

    async fn pull_storage(
        &self,
        device: &str,
        remote: &str,
        local: &Path,
    ) -> BridgeResult<Option<serde_json::Value>> {
        if !self.pull_file(device, remote, local).await? {
            return Ok(None);
        }
        Ok(read_json(local)?)
    }

    /// Push `<local_dir>/<filename>` to the device, plus its storage sibling if present.
    pub async fn push_mock_file(
        &self,
        device: &str,
        package_name: &str,
        local_dir: &Path,
        filename: &str,
    ) -> BridgeResult<()> {
        validate_filename(filename)?;
        let local = local_dir.join(filename);
        if !local_exists(&local).await? {
            return Err(BridgeError::LocalFileMissing { path: local });
        }

        self.escalate_root(device).await?;

        let remote = RemotePaths::for_package(package_name);
        log::info!(
            "Pushing {} to {device}:{}",
            local.display(),
            remote.responses_write
        );
        self.push_file(device, &local, &remote.responses_write)
            .await?;

        let storage_local: PathBuf = local_dir.join(storage_filename(filename));
        if local_exists(&storage_local).await? {
            Step::from_result(
                &format!("storage push for {package_name}"),
                self.push_file(device, &storage_local, &remote.storage_write)
                    .await,
            );
        } else {
            log::debug!("No storage file next to {filename}");
        }
        Ok(())
    }

    /// Remove the pushed mock files from the device. Missing files are fine.
    pub async fn clean_device_files(&self, device: &str, package_name: &str) -> BridgeResult<()> {
        let remote = RemotePaths::for_package(package_name);
        log::info!("Cleaning mock files of {package_name} on {device}");
        self.run_on_device(
            device,
            &[
                "shell",
                "rm",
                "-f",
                remote.responses_write.as_str(),
                remote.storage_write.as_str(),
            ],
            self.config.command_timeout,
        )
        .await
        .map(|_| ())
    }

    /// Force-stop then launch the package. Does not wait for the app to come up.
    pub async fn restart_app(&self, device: &str, package_name: &str) -> BridgeResult<()> {
        log::info!("Restarting {package_name} on {device}");
        self.run_on_device(
            device,
            &["shell", "am", "force-stop", package_name],
            self.config.command_timeout,
        )
        .await?;
        self.run_on_device(
            device,
            &[
                "shell",
                "monkey",
                "-p",
                package_name,
                "-c",
                LAUNCHER_CATEGORY,
                "1",
            ],
            self.config.command_timeout,
        )
        .await?;
        Ok(())
    }
}

async fn local_exists(path: &Path) -> BridgeResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|source| BridgeError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Accept `session1` or `session1.json`; reject anything that is not a bare file stem.
fn normalize_base_name(base_name: &str) -> BridgeResult<String> {
    let base = base_name
        .trim()
        .strip_suffix(JSON_EXTENSION)
        .unwrap_or(base_name.trim());
    let reason = if base.is_empty() {
        Some("must not be empty")
    } else if base.contains(['/', '\\']) || base.contains("..") {
        Some("must not contain path separators or '..'")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(BridgeError::InvalidBaseName {
            name: base_name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(base.to_string()),
    }
}
