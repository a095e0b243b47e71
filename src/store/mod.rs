// Mock store - local JSON response files and the persisted save path.
// Every operation re-reads the configuration document; nothing is cached.

pub mod config;
pub mod error;
pub mod files;
pub mod model;

pub use config::{AppPaths, ConfigRepository, JsonConfigFile, MemoryConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use files::{MockStore, read_json, validate_filename};
pub use model::{
    EndpointKey, MockSet, ResponseEntry, ResponseFile, join_storage, storage_filename,
};
