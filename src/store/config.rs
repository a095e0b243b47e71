//! Save-path configuration: a single-record JSON document re-read on every access.

use super::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const APP_HOME_ENV: &str = "MOCK_BRIDGE_HOME";
const APP_DIR_NAME: &str = ".mock-bridge";
const CONFIG_FILE_NAME: &str = "config.json";
const RESPONSES_DIR_NAME: &str = "responses";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(rename = "savePath")]
    pub save_path: PathBuf,
}

/// Storage for the configuration record.
pub trait ConfigRepository: Send + Sync {
    /// `Ok(None)` when no configuration has been written yet.
    fn load(&self) -> StoreResult<Option<StoreConfig>>;
    fn store(&self, config: &StoreConfig) -> StoreResult<()>;
}

/// Configuration kept as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigRepository for JsonConfigFile {
    fn load(&self) -> StoreResult<Option<StoreConfig>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::from_read(&self.path, e)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::ConfigCorrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn store(&self, config: &StoreConfig) -> StoreResult<()> {
        let mut buf = serde_json::to_string_pretty(config).map_err(|source| {
            StoreError::ConfigCorrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        buf.push('\n');
        write_atomic(&self.path, buf.as_bytes())
    }
}

/// In-memory configuration, for tests and embedding callers.
#[derive(Debug, Default)]
pub struct MemoryConfig {
    inner: Mutex<Option<StoreConfig>>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_save_path(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Mutex::new(Some(StoreConfig {
                save_path: path.into(),
            })),
        }
    }
}

impl ConfigRepository for MemoryConfig {
    fn load(&self) -> StoreResult<Option<StoreConfig>> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn store(&self, config: &StoreConfig) -> StoreResult<()> {
        *self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(config.clone());
        Ok(())
    }
}

/// Where the application keeps its configuration document and default save directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub app_dir: PathBuf,
}

impl AppPaths {
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
        }
    }

    /// `$MOCK_BRIDGE_HOME`, falling back to `<home>/.mock-bridge`.
    pub fn discover() -> StoreResult<Self> {
        if let Some(dir) = std::env::var_os(APP_HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(dir));
        }
        homedir::my_home()
            .ok()
            .flatten()
            .map(|home| Self::new(home.join(APP_DIR_NAME)))
            .ok_or(StoreError::HomeDirectoryNotFound)
    }

    pub fn config_file(&self) -> PathBuf {
        self.app_dir.join(CONFIG_FILE_NAME)
    }

    pub fn default_save_path(&self) -> PathBuf {
        self.app_dir.join(RESPONSES_DIR_NAME)
    }
}

/// Write via a sibling temp file and rename so readers never see a partial document.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::from_write(parent, e))?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    fs::write(&tmp_path, contents).map_err(|e| StoreError::from_write(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::from_write(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = JsonConfigFile::new(temp.path().join("config.json"));
        assert_eq!(repo.load().expect("load"), None);
    }

    #[test]
    fn store_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = JsonConfigFile::new(temp.path().join("nested").join("config.json"));
        let cfg = StoreConfig {
            save_path: PathBuf::from("/tmp/mocks"),
        };
        repo.store(&cfg).expect("store");
        assert_eq!(repo.load().expect("load"), Some(cfg));
    }

    #[test]
    fn document_uses_save_path_field() {
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = JsonConfigFile::new(temp.path().join("config.json"));
        repo.store(&StoreConfig {
            save_path: PathBuf::from("/data/mocks"),
        })
        .expect("store");
        let raw = fs::read_to_string(repo.path()).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value, serde_json::json!({"savePath": "/data/mocks"}));
    }

    #[test]
    fn corrupt_document_is_config_corrupt() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").expect("write");
        let err = JsonConfigFile::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::ConfigCorrupt { .. }));
    }

    #[test]
    fn memory_config_round_trips() {
        let repo = MemoryConfig::new();
        assert_eq!(repo.load().unwrap(), None);
        let cfg = StoreConfig {
            save_path: PathBuf::from("/x"),
        };
        repo.store(&cfg).unwrap();
        assert_eq!(repo.load().unwrap(), Some(cfg));
    }

    #[test]
    fn app_paths_layout() {
        let paths = AppPaths::new("/home/qa/.mock-bridge");
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/home/qa/.mock-bridge/config.json")
        );
        assert_eq!(
            paths.default_save_path(),
            PathBuf::from("/home/qa/.mock-bridge/responses")
        );
    }
}
