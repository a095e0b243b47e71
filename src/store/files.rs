use super::config::{ConfigRepository, StoreConfig, write_atomic};
use super::error::{StoreError, StoreResult};
use super::model::{
    EndpointKey, JSON_EXTENSION, MockSet, ResponseEntry, ResponseFile, join_storage,
    storage_filename,
};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Owns the save directory and the response/storage files inside it.
///
/// The configured directory is read from the repository on every call, so an
/// external edit of the configuration document is picked up immediately.
pub struct MockStore<C: ConfigRepository> {
    config: C,
    default_save_path: PathBuf,
}

impl<C: ConfigRepository> MockStore<C> {
    pub fn new(config: C, default_save_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            default_save_path: default_save_path.into(),
        }
    }

    /// Current save directory. Writes the default configuration (and creates
    /// the default directory) on first access.
    pub fn save_path(&self) -> StoreResult<PathBuf> {
        if let Some(cfg) = self.config.load()? {
            return Ok(cfg.save_path);
        }
        log::info!(
            "No configuration yet, using default save path {}",
            self.default_save_path.display()
        );
        fs::create_dir_all(&self.default_save_path)
            .map_err(|e| StoreError::from_write(&self.default_save_path, e))?;
        self.config.store(&StoreConfig {
            save_path: self.default_save_path.clone(),
        })?;
        Ok(self.default_save_path.clone())
    }

    /// Point the store at `path`, creating it if needed. Existing files are not moved.
    ///
    /// A relative `path` is stored resolved against the current directory.
    pub fn set_save_path(&self, path: &Path) -> StoreResult<()> {
        fs::create_dir_all(path).map_err(|e| StoreError::from_write(path, e))?;
        let save_path = std::path::absolute(path).map_err(|e| StoreError::from_read(path, e))?;
        self.config.store(&StoreConfig {
            save_path: save_path.clone(),
        })?;
        log::info!("Save path set to {}", save_path.display());
        Ok(())
    }

    /// Raw listing: every parsable `*.json` file in the save directory, with
    /// `-storage.json` files as separate entries. Use [`MockStore::list_mock_sets`]
    /// for the listing where storage files are attached to their owners.
    ///
    /// Unreadable or invalid files are logged and skipped.
    pub fn list_response_files(&self) -> StoreResult<Vec<ResponseFile>> {
        let dir = self.save_path()?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Save directory {} does not exist", dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::from_read(&dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry in {}: {e}", dir.display());
                    continue;
                }
            };
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if !filename.ends_with(JSON_EXTENSION) {
                continue;
            }
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match read_json(&path) {
                Ok(Some(data)) => files.push(ResponseFile::new(filename, data)),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping {filename}: {e}"),
            }
        }
        log::debug!("Listed {} JSON files in {}", files.len(), dir.display());
        Ok(files)
    }

    /// Response files with their storage attachments folded in.
    pub fn list_mock_sets(&self) -> StoreResult<Vec<MockSet>> {
        Ok(join_storage(self.list_response_files()?))
    }

    /// `Ok(None)` when the file does not exist.
    pub fn response_file(&self, filename: &str) -> StoreResult<Option<ResponseFile>> {
        validate_filename(filename)?;
        let path = self.save_path()?.join(filename);
        Ok(read_json(&path)?.map(|data| ResponseFile::new(filename, data)))
    }

    /// Replace the whole file with `data`, pretty-printed with two-space indent.
    pub fn save_response_file(&self, filename: &str, data: &Value) -> StoreResult<()> {
        validate_filename(filename)?;
        let dir = self.save_path()?;
        fs::create_dir_all(&dir).map_err(|e| StoreError::from_write(&dir, e))?;
        let path = dir.join(filename);
        let mut contents =
            serde_json::to_string_pretty(data).map_err(|source| StoreError::InvalidJson {
                path: path.clone(),
                source,
            })?;
        contents.push('\n');
        write_atomic(&path, contents.as_bytes())?;
        log::info!("Saved {}", path.display());
        Ok(())
    }

    pub fn storage_file(&self, response_filename: &str) -> StoreResult<Option<Value>> {
        validate_filename(response_filename)?;
        Ok(self
            .response_file(&storage_filename(response_filename))?
            .map(|f| f.data))
    }

    pub fn save_storage_file(&self, response_filename: &str, data: &Value) -> StoreResult<()> {
        validate_filename(response_filename)?;
        self.save_response_file(&storage_filename(response_filename), data)
    }

    /// Insert or replace one endpoint, creating the file if it does not exist yet.
    pub fn upsert_endpoint(
        &self,
        filename: &str,
        key: &EndpointKey,
        entry: &ResponseEntry,
    ) -> StoreResult<()> {
        let path = self.save_path()?.join(filename);
        let mut endpoints = self.endpoint_object(filename)?;
        let value = serde_json::to_value(entry)
            .map_err(|source| StoreError::InvalidJson { path, source })?;
        endpoints.insert(key.to_string(), value);
        self.save_response_file(filename, &Value::Object(endpoints))
    }

    /// Returns whether the endpoint existed. The file is only rewritten when it did.
    pub fn remove_endpoint(&self, filename: &str, key: &EndpointKey) -> StoreResult<bool> {
        let mut endpoints = self.endpoint_object(filename)?;
        if endpoints.remove(&key.to_string()).is_none() {
            return Ok(false);
        }
        self.save_response_file(filename, &Value::Object(endpoints))?;
        Ok(true)
    }

    fn endpoint_object(&self, filename: &str) -> StoreResult<Map<String, Value>> {
        match self.response_file(filename)? {
            None => Ok(Map::new()),
            Some(ResponseFile {
                data: Value::Object(map),
                ..
            }) => Ok(map),
            Some(_) => Err(StoreError::NotAnObject {
                filename: filename.to_string(),
            }),
        }
    }
}

/// Read and parse a JSON file. `Ok(None)` when it does not exist.
pub fn read_json(path: &Path) -> StoreResult<Option<Value>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::from_read(path, e)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| StoreError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })
}

/// A mock filename is a bare `*.json` name inside the save directory.
pub fn validate_filename(filename: &str) -> StoreResult<()> {
    let reason = if !filename.ends_with(JSON_EXTENSION) || filename.len() == JSON_EXTENSION.len()
    {
        Some("must be a non-empty name ending in .json")
    } else if filename.contains(['/', '\\']) || filename.contains("..") {
        Some("must not contain path separators or '..'")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(StoreError::InvalidFilename {
            filename: filename.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::config::{JsonConfigFile, MemoryConfig};
    use serde_json::json;

    fn store_in(dir: &Path) -> MockStore<MemoryConfig> {
        MockStore::new(MemoryConfig::with_save_path(dir), dir.join("unused-default"))
    }

    #[test]
    fn first_access_writes_default_config_and_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config_path = temp.path().join("app").join("config.json");
        let default_dir = temp.path().join("app").join("responses");
        let store = MockStore::new(JsonConfigFile::new(&config_path), &default_dir);

        assert_eq!(store.save_path().expect("save path"), default_dir);
        assert!(default_dir.is_dir());
        assert!(config_path.is_file());
    }

    #[test]
    fn set_save_path_then_get_returns_it_and_creates_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = MockStore::new(MemoryConfig::new(), temp.path().join("default"));
        let target = temp.path().join("a").join("b");

        store.set_save_path(&target).expect("set");
        assert_eq!(store.save_path().expect("get"), target);
        assert!(target.is_dir());
    }

    #[test]
    fn relative_save_path_is_stored_absolute() {
        let cwd_temp = tempfile::Builder::new()
            .prefix("rel-save")
            .tempdir_in(".")
            .expect("tempdir in cwd");
        let relative = PathBuf::from(cwd_temp.path().file_name().expect("name")).join("mocks");
        let config = tempfile::tempdir().expect("tempdir");
        let config_path = config.path().join("config.json");
        let store = MockStore::new(JsonConfigFile::new(&config_path), config.path().join("d"));

        store.set_save_path(&relative).expect("set");

        let stored = store.save_path().expect("get");
        assert!(stored.is_absolute(), "{stored:?}");
        assert_eq!(stored, std::env::current_dir().expect("cwd").join(&relative));
        let document: Value =
            serde_json::from_str(&fs::read_to_string(&config_path).expect("read")).expect("json");
        assert!(Path::new(document["savePath"].as_str().expect("savePath")).is_absolute());
    }

    #[test]
    fn save_path_is_reread_each_call() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config_path = temp.path().join("config.json");
        let store = MockStore::new(JsonConfigFile::new(&config_path), temp.path().join("d"));
        store.set_save_path(&temp.path().join("first")).expect("set");

        fs::write(&config_path, r#"{"savePath": "/elsewhere"}"#).expect("edit");
        assert_eq!(store.save_path().expect("get"), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn corrupt_config_surfaces_as_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config_path = temp.path().join("config.json");
        fs::write(&config_path, "garbage").expect("write");
        let store = MockStore::new(JsonConfigFile::new(&config_path), temp.path().join("d"));
        assert!(matches!(
            store.save_path(),
            Err(StoreError::ConfigCorrupt { .. })
        ));
    }

    #[test]
    fn save_then_get_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        let data = json!({"GET /users": {"status": 200, "headers": {}, "body": []}});

        store.save_response_file("api.json", &data).expect("save");
        let file = store.response_file("api.json").expect("get").expect("present");
        assert_eq!(file.filename, "api.json");
        assert_eq!(file.data, data);
    }

    #[test]
    fn saved_file_is_two_space_pretty_printed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        store
            .save_response_file("p.json", &json!({"GET /a": {"status": 204}}))
            .expect("save");
        let raw = fs::read_to_string(temp.path().join("p.json")).expect("read");
        assert!(raw.starts_with("{\n  \"GET /a\": {\n    \"status\": 204"));
    }

    #[test]
    fn save_creates_missing_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("not-yet");
        let store = store_in(&dir);
        store.save_response_file("x.json", &json!({})).expect("save");
        assert!(dir.join("x.json").is_file());
    }

    #[test]
    fn get_missing_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        assert!(store.response_file("nope.json").expect("get").is_none());
    }

    #[test]
    fn get_invalid_json_is_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("bad.json"), "{ oops").expect("write");
        let store = store_in(temp.path());
        assert!(matches!(
            store.response_file("bad.json"),
            Err(StoreError::InvalidJson { .. })
        ));
    }

    #[test]
    fn rejects_bad_filenames() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        for name in ["api.txt", ".json", "../api.json", "a/b.json"] {
            assert!(
                matches!(
                    store.save_response_file(name, &json!({})),
                    Err(StoreError::InvalidFilename { .. })
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn listing_skips_invalid_and_non_json() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("good.json"), r#"{"GET /a": {"status": 200}}"#).unwrap();
        fs::write(temp.path().join("also.json"), "{}").unwrap();
        fs::write(temp.path().join("broken.json"), "{ nope").unwrap();
        fs::write(temp.path().join("notes.txt"), "hello").unwrap();
        let store = store_in(temp.path());

        let mut names: Vec<String> = store
            .list_response_files()
            .expect("list")
            .into_iter()
            .map(|f| f.filename)
            .collect();
        names.sort();
        assert_eq!(names, vec!["also.json", "good.json"]);
    }

    #[test]
    fn listing_missing_directory_is_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(&temp.path().join("gone"));
        assert!(store.list_response_files().expect("list").is_empty());
    }

    #[test]
    fn mock_sets_fold_storage_into_owner() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        store.save_response_file("s1.json", &json!({})).unwrap();
        store.save_storage_file("s1.json", &json!({"k": "v"})).unwrap();
        store.save_response_file("s2.json", &json!({})).unwrap();

        let mut sets = store.list_mock_sets().expect("list");
        sets.sort_by(|a, b| a.file.filename.cmp(&b.file.filename));
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].file.filename, "s1.json");
        assert_eq!(sets[0].storage, Some(json!({"k": "v"})));
        assert_eq!(sets[1].file.filename, "s2.json");
        assert!(!sets[1].has_storage());
        assert!(sets.iter().all(|s| !s.file.is_storage()));
    }

    #[test]
    fn storage_file_read_back() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        assert_eq!(store.storage_file("s.json").unwrap(), None);
        store.save_storage_file("s.json", &json!({"user": 1})).unwrap();
        assert!(temp.path().join("s-storage.json").is_file());
        assert_eq!(store.storage_file("s.json").unwrap(), Some(json!({"user": 1})));
    }

    #[test]
    fn upsert_and_remove_endpoint() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        store
            .save_response_file("api.json", &json!({"GET /keep": {"status": 200, "body": 1}}))
            .unwrap();

        let key = EndpointKey::new("post", "/login");
        let entry = ResponseEntry::new(401, json!({"error": "nope"}));
        store.upsert_endpoint("api.json", &key, &entry).unwrap();

        let file = store.response_file("api.json").unwrap().unwrap();
        assert_eq!(file.data["GET /keep"]["body"], json!(1));
        assert_eq!(file.endpoints().unwrap()["POST /login"], entry);

        assert!(store.remove_endpoint("api.json", &key).unwrap());
        assert!(!store.remove_endpoint("api.json", &key).unwrap());
        let file = store.response_file("api.json").unwrap().unwrap();
        assert!(file.endpoint(&key).is_none());
        assert!(file.data.get("GET /keep").is_some());
    }

    #[test]
    fn upsert_creates_missing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        let key = EndpointKey::new("GET", "/health");
        store
            .upsert_endpoint("new.json", &key, &ResponseEntry::new(200, json!("ok")))
            .unwrap();
        let file = store.response_file("new.json").unwrap().unwrap();
        assert_eq!(file.data["GET /health"]["status"], json!(200));
    }
}
