//! Caller-facing API: device operations resolved against the mock store's save directory.

use crate::adb::{
    AdbProcess, BridgeConfig, BridgeResult, CommandRunner, DeviceBridge, DeviceId, InstalledApp,
};
use crate::store::{ConfigRepository, JsonConfigFile, MockStore, ResponseFile};

/// Device bridge plus mock store. Operations are meant to be awaited one at a time.
pub struct MockSync<R: CommandRunner = AdbProcess, C: ConfigRepository = JsonConfigFile> {
    bridge: DeviceBridge<R>,
    store: MockStore<C>,
}

impl MockSync<AdbProcess, JsonConfigFile> {
    pub fn from_config(bridge_config: BridgeConfig, store: MockStore<JsonConfigFile>) -> Self {
        Self::new(DeviceBridge::from_config(bridge_config), store)
    }
}

impl<R: CommandRunner, C: ConfigRepository> MockSync<R, C> {
    pub fn new(bridge: DeviceBridge<R>, store: MockStore<C>) -> Self {
        Self { bridge, store }
    }

    pub fn bridge(&self) -> &DeviceBridge<R> {
        &self.bridge
    }

    pub fn store(&self) -> &MockStore<C> {
        &self.store
    }

    pub async fn list_connected_devices(&self) -> BridgeResult<Vec<DeviceId>> {
        self.bridge.list_connected_devices().await
    }

    pub async fn list_installed_apps(&self, device: &str) -> Vec<InstalledApp> {
        self.bridge.list_installed_apps(device).await
    }

    /// Pull into the current save directory as `<base_name>.json` (+ `-storage.json`).
    pub async fn pull_mock_files(
        &self,
        device: &str,
        package_name: &str,
        base_name: &str,
        include_storage: bool,
    ) -> BridgeResult<Vec<ResponseFile>> {
        let dir = self.store.save_path()?;
        self.bridge
            .pull_mock_files(device, package_name, &dir, base_name, include_storage)
            .await
    }

    pub async fn push_mock_file(
        &self,
        device: &str,
        package_name: &str,
        filename: &str,
    ) -> BridgeResult<()> {
        let dir = self.store.save_path()?;
        self.bridge
            .push_mock_file(device, package_name, &dir, filename)
            .await
    }

    /// Push then restart so the app picks up the new mocks.
    pub async fn push_and_restart(
        &self,
        device: &str,
        package_name: &str,
        filename: &str,
    ) -> BridgeResult<()> {
        self.push_mock_file(device, package_name, filename).await?;
        self.restart_app(device, package_name).await
    }

    pub async fn clean_device_files(&self, device: &str, package_name: &str) -> BridgeResult<()> {
        self.bridge.clean_device_files(device, package_name).await
    }

    pub async fn restart_app(&self, device: &str, package_name: &str) -> BridgeResult<()> {
        self.bridge.restart_app(device, package_name).await
    }
}
