pub mod adb;
pub mod store;
pub mod sync;

pub use adb::{BridgeConfig, BridgeError, DeviceBridge};
pub use store::{MockStore, StoreError};
pub use sync::MockSync;
