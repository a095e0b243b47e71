// Data types for mock response files and their storage attachments
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

pub const JSON_EXTENSION: &str = ".json";
pub const STORAGE_SUFFIX: &str = "-storage.json";

/// One mocked HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEntry {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Value,
    /// Fields the mobile app may understand that this tool does not edit.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResponseEntry {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            status_text: None,
            headers: BTreeMap::new(),
            body,
            extra: Map::new(),
        }
    }
}

/// Endpoint key as stored in a response file: `"<METHOD> <PATH>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey {
    pub method: String,
    pub path: String,
}

impl EndpointKey {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.trim().to_ascii_uppercase(),
            path: path.trim().to_string(),
        }
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

impl FromStr for EndpointKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once(char::is_whitespace) {
            Some((method, path)) if !method.is_empty() && !path.trim().is_empty() => {
                Ok(Self {
                    method: method.to_string(),
                    path: path.trim().to_string(),
                })
            }
            _ => Err(format!(
                "endpoint key '{s}' must have the form '<METHOD> <PATH>'"
            )),
        }
    }
}

/// A JSON document in the save directory. For response files `data` maps
/// endpoint keys to response entries; storage files hold an opaque object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFile {
    pub filename: String,
    pub data: Value,
}

impl ResponseFile {
    pub fn new(filename: impl Into<String>, data: Value) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }

    /// Typed view of the endpoint mapping.
    pub fn endpoints(&self) -> Result<BTreeMap<String, ResponseEntry>, serde_json::Error> {
        BTreeMap::<String, ResponseEntry>::deserialize(&self.data)
    }

    pub fn endpoint(&self, key: &EndpointKey) -> Option<&Value> {
        self.data.get(key.to_string())
    }

    pub fn is_storage(&self) -> bool {
        is_storage_filename(&self.filename)
    }
}

/// A response file joined with its `<base>-storage.json` attachment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockSet {
    #[serde(flatten)]
    pub file: ResponseFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<Value>,
}

impl MockSet {
    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }
}

pub fn is_storage_filename(filename: &str) -> bool {
    filename.len() > STORAGE_SUFFIX.len() && filename.ends_with(STORAGE_SUFFIX)
}

/// `api.json` -> `api-storage.json`
pub fn storage_filename(response_filename: &str) -> String {
    let base = response_filename
        .strip_suffix(JSON_EXTENSION)
        .unwrap_or(response_filename);
    format!("{base}{STORAGE_SUFFIX}")
}

/// `api-storage.json` -> `api.json`
pub fn response_filename_for_storage(storage_filename: &str) -> Option<String> {
    storage_filename
        .strip_suffix(STORAGE_SUFFIX)
        .filter(|base| !base.is_empty())
        .map(|base| format!("{base}{JSON_EXTENSION}"))
}

/// Attach storage files to the response file they belong to.
///
/// A storage file is folded into its owner only when `<base>.json` is part of
/// `files` and is not itself a storage file; orphaned storage files stay in
/// the listing as plain entries. Input order is preserved.
pub fn join_storage(files: Vec<ResponseFile>) -> Vec<MockSet> {
    let present: HashMap<String, usize> = files
        .iter()
        .enumerate()
        .map(|(idx, f)| (f.filename.clone(), idx))
        .collect();

    let mut storage_for: HashMap<usize, Value> = HashMap::new();
    let mut attached: Vec<bool> = vec![false; files.len()];
    for (idx, file) in files.iter().enumerate() {
        if let Some(owner) = response_filename_for_storage(&file.filename)
            && !is_storage_filename(&owner)
            && let Some(&owner_idx) = present.get(&owner)
        {
            storage_for.insert(owner_idx, file.data.clone());
            attached[idx] = true;
        }
    }

    files
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !attached[*idx])
        .map(|(idx, file)| MockSet {
            file,
            storage: storage_for.remove(&idx),
        })
        .collect()
}
